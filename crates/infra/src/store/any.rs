//! Runtime-selected backend (in-memory or Postgres).

use async_trait::async_trait;

use stockroom_core::VariantId;
use stockroom_inventory::Underflow;

use super::memory::{InMemoryStore, InMemoryUnitOfWork};
use super::postgres::{PostgresStore, PostgresUnitOfWork};
use super::record::{Filter, Record};
use super::{Store, StoreResult, UnitOfWork};

/// Store chosen at startup from configuration.
#[derive(Debug, Clone)]
pub enum AppStore {
    Memory(InMemoryStore),
    Postgres(PostgresStore),
}

impl AppStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

pub enum AppUnitOfWork {
    Memory(InMemoryUnitOfWork),
    Postgres(PostgresUnitOfWork),
}

macro_rules! delegate {
    ($self:ident, $uow:ident => $call:expr) => {
        match $self {
            AppUnitOfWork::Memory($uow) => $call.await,
            AppUnitOfWork::Postgres($uow) => $call.await,
        }
    };
}

#[async_trait]
impl Store for AppStore {
    type Tx = AppUnitOfWork;

    async fn begin(&self) -> StoreResult<AppUnitOfWork> {
        Ok(match self {
            Self::Memory(store) => AppUnitOfWork::Memory(store.begin().await?),
            Self::Postgres(store) => AppUnitOfWork::Postgres(store.begin().await?),
        })
    }
}

#[async_trait]
impl UnitOfWork for AppUnitOfWork {
    async fn get<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>> {
        delegate!(self, uow => uow.get::<R>(id))
    }

    async fn get_for_update<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>> {
        delegate!(self, uow => uow.get_for_update::<R>(id))
    }

    async fn find<R: Record>(&mut self, filter: Filter) -> StoreResult<Vec<R>> {
        delegate!(self, uow => uow.find::<R>(filter))
    }

    async fn create<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        delegate!(self, uow => uow.create(record))
    }

    async fn save<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        delegate!(self, uow => uow.save(record))
    }

    async fn delete<R: Record>(&mut self, id: R::Id) -> StoreResult<bool> {
        delegate!(self, uow => uow.delete::<R>(id))
    }

    async fn delete_where<R: Record>(&mut self, filter: Filter) -> StoreResult<u64> {
        delegate!(self, uow => uow.delete_where::<R>(filter))
    }

    async fn adjust_stock_atomic(
        &mut self,
        variant: VariantId,
        delta: i64,
        underflow: Underflow,
    ) -> StoreResult<i64> {
        delegate!(self, uow => uow.adjust_stock_atomic(variant, delta, underflow))
    }

    async fn set_stock(&mut self, variant: VariantId, value: i64) -> StoreResult<i64> {
        delegate!(self, uow => uow.set_stock(variant, value))
    }

    async fn commit(self) -> StoreResult<()> {
        delegate!(self, uow => uow.commit())
    }
}
