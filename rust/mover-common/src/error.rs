use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_session(stateid: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidSession {
                stateid: stateid.into(),
            }
            .into(),
        )
    }

    pub fn permission(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Permission {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn storage_full(requested: u64, source: std::io::Error) -> Error {
        Error(ErrorKind::StorageFull { requested, source }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn internal<E>(context: impl Into<String>, source: E) -> Error
    where
        E: Into<StdErrorBoxed>,
    {
        Error(
            ErrorKind::Internal {
                context: context.into(),
                source: source.into(),
            }
            .into(),
        )
    }

    /// Classifies an I/O error raised while reserving backing space.
    ///
    /// Out-of-space conditions become [`ErrorKind::StorageFull`], anything else
    /// is reported as a plain I/O failure.
    pub fn from_reserve(requested: u64, source: std::io::Error) -> Error {
        match source.kind() {
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => {
                Error::storage_full(requested, source)
            }
            _ => Error::io("reserve", source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("no transfer registered for stateid {stateid}")]
    InvalidSession { stateid: String },

    #[error("permission denied: {message}")]
    Permission { message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("failed to reserve {requested} bytes of backing space: {source}")]
    StorageFull {
        requested: u64,
        source: std::io::Error,
    },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("internal error: {context}")]
    Internal {
        context: String,
        source: StdErrorBoxed,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_classification() {
        let err = Error::from_reserve(
            64,
            std::io::Error::from(std::io::ErrorKind::StorageFull),
        );
        assert!(matches!(
            err.kind(),
            ErrorKind::StorageFull { requested: 64, .. }
        ));

        let err = Error::from_reserve(64, std::io::Error::other("disk on fire"));
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    }

    #[test]
    fn test_display() {
        let err = Error::invalid_session("00000001deadbeef");
        assert_eq!(
            err.to_string(),
            "no transfer registered for stateid 00000001deadbeef"
        );
        let err = Error::internal("lock poisoned", "session mutex");
        assert_eq!(err.to_string(), "internal error: lock poisoned");
    }
}
