use thiserror::Error;

/// Store-level error taxonomy. Constraint violations and empty updates are
/// normalised here so the services above never see raw driver errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key")]
    DuplicateKey,

    #[error("not found")]
    NotFound,

    #[error("no rows updated")]
    NoRowsUpdated,

    /// A row that must exist by construction (e.g. the balance row created
    /// with its user) was missing. The surrounding transaction is aborted.
    #[error("ledger corruption: {0}")]
    Corruption(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateKey,
            _ => StoreError::Database(err),
        }
    }
}
