use sea_orm::{
    DatabaseBackend, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use tracing::warn;

use crate::error::AppError;

/// Opens a transaction for one logical operation. Postgres runs it at
/// SERIALIZABLE; SQLite already serialises writers on its single connection.
pub async fn begin(db: &DatabaseConnection) -> Result<DatabaseTransaction, AppError> {
    let txn = match db.get_database_backend() {
        DatabaseBackend::Postgres => {
            db.begin_with_config(Some(IsolationLevel::Serializable), None)
                .await?
        }
        _ => db.begin().await?,
    };
    Ok(txn)
}

/// Commits on `Ok`, rolls back on `Err`. A failed commit is reported as a
/// storage failure; a failed rollback is logged and the operation's error
/// is returned.
pub async fn finalize<T>(
    txn: DatabaseTransaction,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
