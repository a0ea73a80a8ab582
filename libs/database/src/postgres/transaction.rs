//! Ambient transactions.
//!
//! [`TransactionManager::within_transaction`] runs a unit of work with a
//! database transaction installed in a tokio task-local. Repositories call
//! [`current_transaction`] and run their statements on it when present, or on
//! the pool otherwise, so the service layer decides transaction boundaries
//! without passing a handle through every repository signature.
//!
//! ```ignore
//! let task = tx_manager
//!     .within_transaction::<_, TaskError>(Box::pin(async move {
//!         repository.create(&mut task).await?;
//!         publisher.publish_task_created(&task).await;
//!         Ok(task)
//!     }))
//!     .await?;
//! ```
//!
//! Outcome of the work | Effect
//! --------------------|-------------------------------------------------
//! `Ok`                | commit; a commit failure becomes the result
//! `Err`               | rollback; the work's error is returned
//! panic               | the transaction is dropped (sea-orm rolls back) and the panic keeps unwinding

use async_trait::async_trait;
use futures::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use std::sync::Arc;
use tracing::{debug, error};

tokio::task_local! {
    static CURRENT_TRANSACTION: Arc<DatabaseTransaction>;
}

/// The transaction opened by the enclosing
/// [`within_transaction`](TransactionManager::within_transaction) call on this
/// task, if any.
pub fn current_transaction() -> Option<Arc<DatabaseTransaction>> {
    CURRENT_TRANSACTION.try_with(Arc::clone).ok()
}

/// Runs units of work atomically.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn within_transaction<T, E>(&self, work: BoxFuture<'_, Result<T, E>>) -> Result<T, E>
    where
        T: Send,
        E: From<DbErr> + Send;
}

/// Postgres-backed [`TransactionManager`].
#[derive(Clone)]
pub struct PgTransactionManager {
    db: DatabaseConnection,
}

impl PgTransactionManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn within_transaction<T, E>(&self, work: BoxFuture<'_, Result<T, E>>) -> Result<T, E>
    where
        T: Send,
        E: From<DbErr> + Send,
    {
        if current_transaction().is_some() {
            return Err(DbErr::Custom("nested transactions are not supported".to_string()).into());
        }

        let txn = Arc::new(self.db.begin().await?);
        debug!("Transaction started");

        let outcome = CURRENT_TRANSACTION.scope(Arc::clone(&txn), work).await;

        // A leaked handle is dropped here and rolls back
        let txn = Arc::try_unwrap(txn).map_err(|_| {
            DbErr::Custom("transaction handle outlived its unit of work".to_string())
        })?;

        match outcome {
            Ok(value) => {
                txn.commit().await?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                match txn.rollback().await {
                    Ok(()) => debug!("Transaction rolled back"),
                    Err(rollback_err) => {
                        error!(error = %rollback_err, "Failed to roll back transaction")
                    }
                }
                Err(err)
            }
        }
    }
}

/// Runs the work as-is. For stores without transactions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTransactionManager;

#[async_trait]
impl TransactionManager for NoopTransactionManager {
    async fn within_transaction<T, E>(&self, work: BoxFuture<'_, Result<T, E>>) -> Result<T, E>
    where
        T: Send,
        E: From<DbErr> + Send,
    {
        work.await
    }
}
