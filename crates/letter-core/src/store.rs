use std::sync::Arc;

use letter_db::Database;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::CoreError;

/// Runs store work on the blocking pool so async workers only ever wait
/// on the store boundary.
#[derive(Clone)]
pub(crate) struct Store {
    db: Arc<Database>,
}

impl Store {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Runs `f` against the database unless `cancel` fires first.
    ///
    /// A job that has not started when `cancel` fires never touches the
    /// store. A job already executing its statement is left to finish,
    /// since each statement commits atomically, but the caller gets
    /// [`CoreError::Cancelled`] without waiting for it.
    pub(crate) async fn run<F, T>(&self, op: &'static str, cancel: &CancellationToken, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&Database) -> Result<T, CoreError> + Send + 'static,
        T: Send + 'static,
    {
        if cancel.is_cancelled() {
            warn!("{} cancelled before reaching the store", op);
            return Err(CoreError::Cancelled);
        }

        let db = self.db.clone();
        let job_cancel = cancel.clone();
        let job = tokio::task::spawn_blocking(move || {
            if job_cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            f(&db)
        });

        tokio::select! {
            biased;
            joined = job => joined.map_err(|e| {
                error!("spawn_blocking join error in {}: {}", op, e);
                CoreError::Internal("store task failed".into())
            })?,
            _ = cancel.cancelled() => {
                warn!("{} cancelled while waiting on the store", op);
                Err(CoreError::Cancelled)
            }
        }
    }
}
