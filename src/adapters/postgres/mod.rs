//! PostgreSQL adapter - transactional store over `sqlx`.
//!
//! - `PostgresTransactionManager` - opens one transaction per unit of work
//! - `PostgresTransaction` - store gateway bound to that transaction
//!
//! Schema lives in `migrations/`; run it with [`run_migrations`].

mod rows;
mod transaction;

pub use transaction::{PostgresTransaction, PostgresTransactionManager};

use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Migration failed: {}", e)))
}
