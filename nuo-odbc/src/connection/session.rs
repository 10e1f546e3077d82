use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    Error,
    remote::{DatabaseMetaData, RemoteConnection},
};

/// An open remote connection, shared by the connection handle and its statements.
///
/// Statements report executions through [`Session::transaction_started`], so the connection can
/// refuse to disconnect in the middle of a transaction.
pub struct Session {
    remote: Box<dyn RemoteConnection>,
    auto_commit: AtomicBool,
    transaction_pending: AtomicBool,
}

impl Session {
    pub fn new(remote: Box<dyn RemoteConnection>, auto_commit: bool) -> Self {
        Self {
            remote,
            auto_commit: AtomicBool::new(auto_commit),
            transaction_pending: AtomicBool::new(false),
        }
    }

    pub fn remote(&self) -> &dyn RemoteConnection {
        self.remote.as_ref()
    }

    pub fn meta_data(&self) -> Result<Arc<dyn DatabaseMetaData>, Error> {
        Ok(self.remote.meta_data()?)
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit.load(Ordering::Relaxed)
    }

    pub fn set_auto_commit(&self, auto_commit: bool) -> Result<(), Error> {
        self.remote.set_auto_commit(auto_commit)?;
        self.auto_commit.store(auto_commit, Ordering::Relaxed);
        Ok(())
    }

    /// A statement has been executed. Outside of auto commit mode this leaves a transaction open.
    pub fn transaction_started(&self) {
        if !self.auto_commit() {
            self.transaction_pending.store(true, Ordering::Relaxed);
        }
    }

    /// Commit or rollback.
    pub fn transaction_ended(&self) {
        self.transaction_pending.store(false, Ordering::Relaxed);
    }

    pub fn is_transaction_pending(&self) -> bool {
        self.transaction_pending.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use crate::remote::{Driver, Properties, memory::MemoryDatabase};

    use super::Session;

    fn session(auto_commit: bool) -> Session {
        let db = MemoryDatabase::new();
        let remote = db.connect("test", &Properties::new()).unwrap();
        Session::new(remote, auto_commit)
    }

    #[test]
    fn executing_in_auto_commit_mode_leaves_no_transaction() {
        let session = session(true);

        session.transaction_started();

        assert!(!session.is_transaction_pending());
    }

    #[test]
    fn manual_commit_tracks_transaction() {
        let session = session(false);

        session.transaction_started();
        assert!(session.is_transaction_pending());

        session.transaction_ended();
        assert!(!session.is_transaction_pending());
    }
}
