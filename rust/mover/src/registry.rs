use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};

use crate::session::{StateId, WriteSession};

/// Shared handle to a registered session.
///
/// The mutex is held for the duration of a single write; it keeps the growth
/// decision and the accounting of one request consistent but does not order
/// requests coming from different callers.
pub type SessionRef = Arc<Mutex<WriteSession>>;

/// Lookup of in-flight transfers by their stateid.
pub trait SessionRegistry: Send + Sync + 'static {
    fn lookup(&self, id: &StateId) -> Option<SessionRef>;
}

impl<T> SessionRegistry for Arc<T>
where
    T: SessionRegistry + ?Sized,
{
    fn lookup(&self, id: &StateId) -> Option<SessionRef> {
        self.as_ref().lookup(id)
    }
}

/// In-memory transfer table.
#[derive(Default)]
pub struct MoverRegistry {
    sessions: RwLock<HashMap<StateId, SessionRef>>,
}

impl MoverRegistry {
    pub fn new() -> MoverRegistry {
        Default::default()
    }

    /// Registers `session` under its stateid, replacing any previous one.
    pub fn register(&self, session: WriteSession) -> SessionRef {
        let id = *session.id();
        let session = Arc::new(Mutex::new(session));
        log::debug!("registering transfer {id}");
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, session.clone());
        session
    }

    /// Removes the transfer registered for `id`, returning it if present.
    pub fn remove(&self, id: &StateId) -> Option<SessionRef> {
        log::debug!("removing transfer {id}");
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionRegistry for MoverRegistry {
    fn lookup(&self, id: &StateId) -> Option<SessionRef> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }
}
