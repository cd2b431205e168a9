//! Postgres-backed stores.
//!
//! Explicit SQL with `$n` binds, every statement filtered by `company_id`,
//! and transactions around the invariant-maintenance routines. The schema is
//! applied out-of-band (`migrations/0001_init.sql`); these stores never
//! migrate.

pub mod company;
pub mod currency;
pub mod inventory;
pub mod pricing;

pub use company::PostgresCompanyStore;
pub use currency::PostgresCurrencyStore;
pub use inventory::PostgresInventoryStore;
pub use pricing::PostgresPricingStore;

use crate::stores::error::StoreError;

/// Map sqlx errors to `StoreError`.
///
/// | Postgres code | Meaning | Mapped to |
/// |---------------|--------------------------|--------------------|
/// | `23505` | unique violation | `Conflict` |
/// | `23503` | foreign key violation | `MissingReference` |
/// | other | check violation, etc. | `Backend` |
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

pub(crate) fn decode_error(operation: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("failed to decode row in {operation}: {err}"))
}
