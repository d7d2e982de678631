//! Postgres-backed store.
//!
//! SQL is generated from [`Record::COLUMNS`]; table and column names are
//! compile-time constants, and every value is bound as a parameter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use stockroom_core::{EntityId, VariantId};
use stockroom_inventory::Underflow;
use stockroom_products::Variant;

use super::record::{ColumnType, Filter, Record, Row, Value};
use super::{Store, StoreError, StoreResult, UnitOfWork};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Handle to a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresUnitOfWork;

    async fn begin(&self) -> StoreResult<PostgresUnitOfWork> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresUnitOfWork { tx })
    }
}

/// A SQL transaction. Dropping it without `commit` rolls back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PostgresUnitOfWork {
    async fn select_by_id<R: Record>(&mut self, id: R::Id, lock: bool) -> StoreResult<Option<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1{}",
            column_list::<R>(),
            R::TABLE,
            if lock { " FOR UPDATE" } else { "" }
        );
        let row = sqlx::query(&sql)
            .bind(id.uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|row| decode_row::<R>(&row).and_then(|row| R::from_row(&row)))
            .transpose()
    }

    async fn current_stock(&mut self, variant: VariantId) -> StoreResult<Option<i64>> {
        let sql = format!("SELECT stock FROM {} WHERE id = $1", <Variant as Record>::TABLE);
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(variant.uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("current_stock", e))
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn get<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>> {
        self.select_by_id::<R>(id, false).await
    }

    async fn get_for_update<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>> {
        self.select_by_id::<R>(id, true).await
    }

    #[instrument(skip(self, filter), fields(table = R::TABLE, rows = tracing::field::Empty), err)]
    async fn find<R: Record>(&mut self, filter: Filter) -> StoreResult<Vec<R>> {
        let mut binds = Vec::new();
        let clause = where_clause::<R>(&filter, &mut binds)?;
        let (order_column, order) = R::ORDER_BY;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} {dir}, id {dir}",
            column_list::<R>(),
            R::TABLE,
            clause,
            order_column,
            dir = order.sql(),
        );

        let mut query = sqlx::query(&sql);
        for (value, ty) in &binds {
            query = bind(query, value, *ty);
        }
        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find", e))?;

        Span::current().record("rows", rows.len());
        rows.iter()
            .map(|row| decode_row::<R>(row).and_then(|row| R::from_row(&row)))
            .collect()
    }

    async fn create<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            column_list::<R>(),
            placeholders.join(", ")
        );

        let row = record.to_row();
        let mut query = sqlx::query(&sql);
        for (column, ty) in R::COLUMNS {
            query = bind(query, row.get(column), *ty);
        }
        query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("create", e))?;
        Ok(())
    }

    async fn save<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let assignments: Vec<String> = R::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, (column, _))| format!("{column} = ${}", i + 1))
            .collect();
        let sql = format!("UPDATE {} SET {} WHERE id = $1", R::TABLE, assignments.join(", "));

        let row = record.to_row();
        let mut query = sqlx::query(&sql);
        for (column, ty) in R::COLUMNS {
            query = bind(query, row.get(column), *ty);
        }
        let result = query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("save", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{} {}", R::TABLE, record.id())));
        }
        Ok(())
    }

    async fn delete<R: Record>(&mut self, id: R::Id) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", R::TABLE);
        let result = sqlx::query(&sql)
            .bind(id.uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where<R: Record>(&mut self, filter: Filter) -> StoreResult<u64> {
        let mut binds = Vec::new();
        let clause = where_clause::<R>(&filter, &mut binds)?;
        let sql = format!("DELETE FROM {} WHERE {}", R::TABLE, clause);

        let mut query = sqlx::query(&sql);
        for (value, ty) in &binds {
            query = bind(query, value, *ty);
        }
        let result = query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_where", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(variant_id = %variant), err)]
    async fn adjust_stock_atomic(
        &mut self,
        variant: VariantId,
        delta: i64,
        underflow: Underflow,
    ) -> StoreResult<i64> {
        let table = <Variant as Record>::TABLE;
        let sql = match underflow {
            Underflow::Allow => {
                format!("UPDATE {table} SET stock = stock + $2 WHERE id = $1 RETURNING stock")
            }
            Underflow::ClampToZero => format!(
                "UPDATE {table} SET stock = GREATEST(stock + $2, 0) WHERE id = $1 RETURNING stock"
            ),
            Underflow::Reject => format!(
                "UPDATE {table} SET stock = stock + $2 WHERE id = $1 AND stock + $2 >= 0 RETURNING stock"
            ),
        };

        let updated = sqlx::query_scalar::<_, i64>(&sql)
            .bind(variant.uuid())
            .bind(delta)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("adjust_stock", e))?;

        match updated {
            Some(stock) => Ok(stock),
            None => match self.current_stock(variant).await? {
                Some(available) => Err(StoreError::InsufficientStock {
                    variant,
                    available,
                    requested: delta.saturating_neg(),
                }),
                None => Err(StoreError::NotFound(format!("variant {variant}"))),
            },
        }
    }

    #[instrument(skip(self), fields(variant_id = %variant), err)]
    async fn set_stock(&mut self, variant: VariantId, value: i64) -> StoreResult<i64> {
        let sql = format!(
            "UPDATE {} SET stock = $2 WHERE id = $1 RETURNING stock",
            <Variant as Record>::TABLE
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(variant.uuid())
            .bind(value)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_stock", e))?
            .ok_or_else(|| StoreError::NotFound(format!("variant {variant}")))
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn column_list<R: Record>() -> String {
    R::COLUMNS
        .iter()
        .map(|(column, _)| *column)
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_type<R: Record>(column: &str) -> StoreResult<ColumnType> {
    R::column_type(column)
        .ok_or_else(|| StoreError::Backend(format!("unknown column {}.{column}", R::TABLE)))
}

/// Render `filter` as SQL, pushing parameters onto `binds` (numbered from `$1`).
fn where_clause<R: Record>(
    filter: &Filter,
    binds: &mut Vec<(Value, ColumnType)>,
) -> StoreResult<String> {
    Ok(match filter {
        Filter::All => "TRUE".to_string(),
        Filter::Eq(column, Value::Null) => {
            column_type::<R>(column)?;
            format!("{column} IS NULL")
        }
        Filter::Ne(column, Value::Null) => {
            column_type::<R>(column)?;
            format!("{column} IS NOT NULL")
        }
        Filter::Eq(column, value) => {
            binds.push((value.clone(), column_type::<R>(column)?));
            format!("{column} = ${}", binds.len())
        }
        Filter::Ne(column, value) => {
            binds.push((value.clone(), column_type::<R>(column)?));
            format!("{column} IS DISTINCT FROM ${}", binds.len())
        }
        Filter::Contains(column, needle) => {
            column_type::<R>(column)?;
            binds.push((Value::Text(format!("%{}%", escape_like(needle))), ColumnType::Text));
            format!("{column}::text ILIKE ${}", binds.len())
        }
        Filter::And(filters) if filters.is_empty() => "TRUE".to_string(),
        Filter::And(filters) => {
            let parts = filters
                .iter()
                .map(|f| where_clause::<R>(f, binds))
                .collect::<StoreResult<Vec<_>>>()?;
            format!("({})", parts.join(" AND "))
        }
    })
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn bind<'q>(query: PgQuery<'q>, value: &Value, ty: ColumnType) -> PgQuery<'q> {
    match (value, ty) {
        (Value::Null, ColumnType::Uuid | ColumnType::NullableUuid) => query.bind(None::<Uuid>),
        (Value::Null, ColumnType::Int) => query.bind(None::<i64>),
        (Value::Null, ColumnType::Timestamp) => query.bind(None::<DateTime<Utc>>),
        (Value::Null, ColumnType::Text | ColumnType::NullableText) => query.bind(None::<String>),
        (Value::Int(v), _) => query.bind(*v),
        (Value::Text(v), _) => query.bind(v.clone()),
        (Value::Uuid(v), _) => query.bind(*v),
        (Value::Timestamp(v), _) => query.bind(*v),
    }
}

fn decode_row<R: Record>(pg: &PgRow) -> StoreResult<Row> {
    let mut row = Row::new(R::TABLE);
    for (column, ty) in R::COLUMNS {
        let column: &'static str = *column;
        let value = match ty {
            ColumnType::Int => pg.try_get::<i64, _>(column).map(Value::Int),
            ColumnType::Text => pg.try_get::<String, _>(column).map(Value::Text),
            ColumnType::NullableText => pg
                .try_get::<Option<String>, _>(column)
                .map(|v| v.map_or(Value::Null, Value::Text)),
            ColumnType::Uuid => pg.try_get::<Uuid, _>(column).map(Value::Uuid),
            ColumnType::NullableUuid => pg
                .try_get::<Option<Uuid>, _>(column)
                .map(|v| v.map_or(Value::Null, Value::Uuid)),
            ColumnType::Timestamp => pg.try_get::<DateTime<Utc>, _>(column).map(Value::Timestamp),
        }
        .map_err(|e| StoreError::decode(R::TABLE, format!("column '{column}': {e}")))?;
        row.set(column, value);
    }
    Ok(row)
}

/// Map SQLx errors onto the store's error model.
///
/// | PostgreSQL code | `StoreError` |
/// |---|---|
/// | `23505` unique violation | `UniqueViolation` |
/// | `23503` foreign key violation | `ForeignKeyViolation` |
/// | `22003` numeric value out of range | `OutOfRange` |
/// | anything else | `Backend` |
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let target = db_err
                .constraint()
                .map(str::to_string)
                .unwrap_or_else(|| db_err.message().to_string());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(target),
                Some("23503") => StoreError::ForeignKeyViolation(target),
                Some("22003") => StoreError::OutOfRange(db_err.message().to_string()),
                _ => StoreError::Backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(operation.to_string()),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}
