//! Persistence collaborator: a small transactional record store.
//!
//! Domain records are mapped to flat [`Row`]s through the [`Record`] trait, so
//! one generic implementation per backend serves every table. All reads and
//! writes go through a [`UnitOfWork`]: changes become visible on `commit` and
//! are discarded when the unit of work is dropped.
//!
//! ## Backends
//!
//! - [`InMemoryStore`]: tests and local development. A unit of work holds the
//!   store-wide lock for its whole lifetime, so units of work are serialized.
//! - [`PostgresStore`]: production. A unit of work is a SQL transaction; rows
//!   read with `get_for_update` are locked with `SELECT ... FOR UPDATE`.
//!
//! ## Error mapping
//!
//! | Backend condition | `StoreError` |
//! |---|---|
//! | duplicate value in a unique column (`23505`) | `UniqueViolation` |
//! | dangling reference (`23503`) | `ForeignKeyViolation` |
//! | `save`/stock update on a missing row | `NotFound` |
//! | `Underflow::Reject` would go negative | `InsufficientStock` |
//! | numeric value out of range (`22003`), stock overflow | `OutOfRange` |
//! | anything else | `Backend` |

use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::VariantId;
use stockroom_inventory::Underflow;

pub mod any;
pub mod memory;
pub mod postgres;
mod record;
mod records;

pub use any::{AppStore, AppUnitOfWork};
pub use memory::{InMemoryStore, InMemoryUnitOfWork};
pub use postgres::{PostgresStore, PostgresUnitOfWork};
pub use record::{ColumnType, Filter, Record, Row, SortOrder, Value};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("referenced record does not exist: {0}")]
    ForeignKeyViolation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient stock for variant {variant}: available {available}, requested {requested}")]
    InsufficientStock {
        variant: VariantId,
        available: i64,
        requested: i64,
    },

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("failed to decode {table} row: {message}")]
    Decode { table: &'static str, message: String },
}

impl StoreError {
    pub fn decode(table: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            table,
            message: message.into(),
        }
    }
}

/// Handle to a record store. Cheap to clone.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// One transactional scope over the store.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] rolls it back.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    async fn get<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>>;

    /// Like [`UnitOfWork::get`], but the row stays locked until the unit of
    /// work ends.
    async fn get_for_update<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>>;

    /// Rows matching `filter`, ordered by [`Record::ORDER_BY`] with the id as
    /// tie-break.
    async fn find<R: Record>(&mut self, filter: Filter) -> StoreResult<Vec<R>>;

    async fn create<R: Record>(&mut self, record: &R) -> StoreResult<()>;

    /// Overwrite an existing row. `NotFound` if it does not exist.
    async fn save<R: Record>(&mut self, record: &R) -> StoreResult<()>;

    /// Returns whether a row was removed.
    async fn delete<R: Record>(&mut self, id: R::Id) -> StoreResult<bool>;

    /// Returns the number of rows removed.
    async fn delete_where<R: Record>(&mut self, filter: Filter) -> StoreResult<u64>;

    /// Atomically add `delta` to a variant's stock and return the new value.
    async fn adjust_stock_atomic(
        &mut self,
        variant: VariantId,
        delta: i64,
        underflow: Underflow,
    ) -> StoreResult<i64>;

    /// Overwrite a variant's stock and return the new value.
    async fn set_stock(&mut self, variant: VariantId, value: i64) -> StoreResult<i64>;

    async fn commit(self) -> StoreResult<()>;

    /// [`UnitOfWork::get`], with a missing row reported as `NotFound`.
    async fn require<R: Record>(&mut self, id: R::Id) -> StoreResult<R> {
        self.get::<R>(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} {id}", R::NOUN)))
    }

    /// [`UnitOfWork::get_for_update`], with a missing row reported as `NotFound`.
    async fn require_for_update<R: Record>(&mut self, id: R::Id) -> StoreResult<R> {
        self.get_for_update::<R>(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} {id}", R::NOUN)))
    }

    /// Convenience: whether any row matches `filter`.
    async fn exists<R: Record>(&mut self, filter: Filter) -> StoreResult<bool> {
        Ok(!self.find::<R>(filter).await?.is_empty())
    }
}
