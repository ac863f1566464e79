//! NFSv4.1 WRITE operation as served by a pNFS data server.
//!
//! Decoding of `WRITE4args` and encoding of `WRITE4res` happen in the RPC
//! layer; this module takes the decoded arguments, runs them through the
//! [`WriteHandler`] and maps the outcome to the protocol's status codes.

use mover_common::error::ErrorKind;

use crate::{
    session::StateId,
    write::{StableHow, WriteHandler},
};

/// Write verifier returned with every successful WRITE.
pub type Verifier4 = [u8; 8];

/// NFSv4 status codes produced by the WRITE path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Nfsstat4 {
    Ok = 0,
    Perm = 1,
    Io = 5,
    Inval = 22,
    NoSpc = 28,
    ServerFault = 10006,
    BadStateid = 10025,
}

impl From<&ErrorKind> for Nfsstat4 {
    fn from(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidSession { .. } => Nfsstat4::BadStateid,
            ErrorKind::Permission { .. } => Nfsstat4::Perm,
            ErrorKind::InvalidArgument { .. } => Nfsstat4::Inval,
            ErrorKind::StorageFull { .. } => Nfsstat4::NoSpc,
            ErrorKind::Io { .. } => Nfsstat4::Io,
            ErrorKind::Internal { .. } => Nfsstat4::ServerFault,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Write4Args {
    pub stateid: StateId,
    pub offset: u64,
    /// Requested commitment; the data server always answers with `FileSync`.
    pub stable: StableHow,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write4ResOk {
    pub count: u32,
    pub committed: StableHow,
    pub writeverf: Verifier4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write4Res {
    Ok(Write4ResOk),
    Err(Nfsstat4),
}

impl Write4Res {
    pub fn status(&self) -> Nfsstat4 {
        match self {
            Write4Res::Ok(_) => Nfsstat4::Ok,
            Write4Res::Err(status) => *status,
        }
    }
}

/// The data-server side of WRITE.
pub struct DataServer {
    handler: WriteHandler,
    verifier: Verifier4,
}

impl DataServer {
    /// Creates a data server with a fresh random write verifier.
    pub fn new(handler: WriteHandler) -> DataServer {
        let mut verifier = [0u8; 8];
        fastrand::fill(&mut verifier);
        Self::with_verifier(handler, verifier)
    }

    pub fn with_verifier(handler: WriteHandler, verifier: Verifier4) -> DataServer {
        DataServer { handler, verifier }
    }

    pub fn verifier(&self) -> &Verifier4 {
        &self.verifier
    }

    pub fn handler(&self) -> &WriteHandler {
        &self.handler
    }

    pub fn write(&self, args: &Write4Args) -> Write4Res {
        if u32::try_from(args.data.len()).is_err() {
            return Write4Res::Err(Nfsstat4::Inval);
        }
        match self
            .handler
            .handle_write(&args.stateid, args.offset, &args.data)
        {
            Ok(outcome) => Write4Res::Ok(Write4ResOk {
                // Bounded by `args.data.len()`, checked above.
                count: outcome.count as u32,
                committed: outcome.committed,
                writeverf: self.verifier,
            }),
            Err(e) => {
                let status = Nfsstat4::from(e.kind());
                log::debug!("WRITE {} failed with {status:?}: {e}", args.stateid);
                Write4Res::Err(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mover_common::error::Error;
    use mover_io::{MemoryChannel, NoopAllocator};

    use super::*;
    use crate::{
        config::MoverConfig,
        registry::MoverRegistry,
        session::{IoMode, WriteSession},
    };

    fn server(mode: IoMode) -> (DataServer, Arc<MemoryChannel>, StateId) {
        let registry = Arc::new(MoverRegistry::new());
        let channel = Arc::new(MemoryChannel::new());
        let id = StateId::new(1, *b"dataserver01");
        registry.register(WriteSession::new(
            id,
            mode,
            channel.clone(),
            Arc::new(NoopAllocator),
            0,
        ));
        let handler = WriteHandler::new(registry, &MoverConfig::default()).unwrap();
        (
            DataServer::with_verifier(handler, *b"verifier"),
            channel,
            id,
        )
    }

    #[test]
    fn test_write_ok() {
        let (server, channel, id) = server(IoMode::Write);
        let res = server.write(&Write4Args {
            stateid: id,
            offset: 2,
            stable: StableHow::Unstable,
            data: b"hello".to_vec(),
        });
        assert_eq!(
            res,
            Write4Res::Ok(Write4ResOk {
                count: 5,
                committed: StableHow::FileSync,
                writeverf: *b"verifier",
            })
        );
        assert_eq!(res.status(), Nfsstat4::Ok);
        assert_eq!(channel.contents(), b"\0\0hello");
    }

    #[test]
    fn test_bad_stateid() {
        let (server, _, _) = server(IoMode::Write);
        let res = server.write(&Write4Args {
            stateid: StateId::new(9, [0; 12]),
            offset: 0,
            stable: StableHow::FileSync,
            data: b"x".to_vec(),
        });
        assert_eq!(res, Write4Res::Err(Nfsstat4::BadStateid));
    }

    #[test]
    fn test_read_only_transfer() {
        let (server, channel, id) = server(IoMode::Read);
        let res = server.write(&Write4Args {
            stateid: id,
            offset: 0,
            stable: StableHow::FileSync,
            data: b"x".to_vec(),
        });
        assert_eq!(res.status(), Nfsstat4::Perm);
        assert!(channel.contents().is_empty());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::invalid_session("00"), Nfsstat4::BadStateid),
            (Error::permission("read-only"), Nfsstat4::Perm),
            (Error::invalid_arg("offset", "overflow"), Nfsstat4::Inval),
            (
                Error::storage_full(1, std::io::ErrorKind::StorageFull.into()),
                Nfsstat4::NoSpc,
            ),
            (
                Error::io("write", std::io::Error::other("eio")),
                Nfsstat4::Io,
            ),
            (Error::internal("bug", "unexpected"), Nfsstat4::ServerFault),
        ];
        for (err, status) in cases {
            assert_eq!(Nfsstat4::from(err.kind()), status);
        }
        assert_eq!(Nfsstat4::BadStateid as u32, 10025);
        assert_eq!(Nfsstat4::ServerFault as u32, 10006);
    }

    #[test]
    fn test_random_verifier_is_stable() {
        let handler =
            WriteHandler::new(Arc::new(MoverRegistry::new()), &MoverConfig::default()).unwrap();
        let server = DataServer::new(handler);
        let verifier = *server.verifier();
        assert_eq!(server.verifier(), &verifier);
    }
}
