//! Row model shared by all backends.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockroom_core::{Entity, EntityId};

use super::{StoreError, StoreResult};

/// A single column value.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn id(id: impl EntityId) -> Self {
        Self::Uuid(id.uuid())
    }

    pub fn opt_id<I: EntityId>(id: Option<I>) -> Self {
        id.map_or(Self::Null, Self::id)
    }

    pub fn opt_text(text: Option<impl Into<String>>) -> Self {
        text.map_or(Self::Null, |t| Self::Text(t.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Lowercased text form used by [`Filter::Contains`].
    fn search_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(v.to_string()),
            Self::Text(v) => Some(v.to_lowercase()),
            Self::Uuid(v) => Some(v.to_string()),
            Self::Timestamp(v) => Some(v.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// SQL-facing column type, used to bind typed NULLs and decode rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
    NullableText,
    Uuid,
    NullableUuid,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Flat column → value map for one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    table: &'static str,
    values: BTreeMap<&'static str, Value>,
}

impl Row {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.values.insert(column, value.into());
        self
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
        self.values.insert(column, value.into());
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn get(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&Value::Null)
    }

    fn mismatch(&self, column: &str, expected: &str) -> StoreError {
        StoreError::decode(
            self.table,
            format!("column '{column}': expected {expected}, found {:?}", self.get(column)),
        )
    }

    pub fn int(&self, column: &str) -> StoreResult<i64> {
        match self.get(column) {
            Value::Int(v) => Ok(*v),
            _ => Err(self.mismatch(column, "integer")),
        }
    }

    pub fn text(&self, column: &str) -> StoreResult<String> {
        match self.get(column) {
            Value::Text(v) => Ok(v.clone()),
            _ => Err(self.mismatch(column, "text")),
        }
    }

    pub fn opt_text(&self, column: &str) -> StoreResult<Option<String>> {
        match self.get(column) {
            Value::Null => Ok(None),
            _ => self.text(column).map(Some),
        }
    }

    pub fn timestamp(&self, column: &str) -> StoreResult<DateTime<Utc>> {
        match self.get(column) {
            Value::Timestamp(v) => Ok(*v),
            _ => Err(self.mismatch(column, "timestamp")),
        }
    }

    pub fn id<I: EntityId>(&self, column: &str) -> StoreResult<I> {
        match self.get(column) {
            Value::Uuid(v) => Ok(I::from_uuid(*v)),
            _ => Err(self.mismatch(column, "uuid")),
        }
    }

    pub fn opt_id<I: EntityId>(&self, column: &str) -> StoreResult<Option<I>> {
        match self.get(column) {
            Value::Null => Ok(None),
            _ => self.id(column).map(Some),
        }
    }

    /// Decode a text column through `FromStr` (enums stored by name).
    pub fn parse<T>(&self, column: &str) -> StoreResult<T>
    where
        T: FromStr,
        T::Err: core::fmt::Display,
    {
        let raw = self.text(column)?;
        raw.parse()
            .map_err(|e: T::Err| StoreError::decode(self.table, format!("column '{column}': {e}")))
    }

    pub fn opt_parse<T>(&self, column: &str) -> StoreResult<Option<T>>
    where
        T: FromStr,
        T::Err: core::fmt::Display,
    {
        match self.get(column) {
            Value::Null => Ok(None),
            _ => self.parse(column).map(Some),
        }
    }
}

/// A domain type persisted as one row of one table.
///
/// `COLUMNS` lists every column with the primary key `id` first.
pub trait Record: Entity + Clone + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Human-readable name used in error messages (`variant 0190...`).
    const NOUN: &'static str;
    const COLUMNS: &'static [(&'static str, ColumnType)];
    /// Columns whose non-null values must be unique across the table.
    const UNIQUE: &'static [&'static str] = &[];
    const ORDER_BY: (&'static str, SortOrder) = ("id", SortOrder::Asc);

    fn to_row(&self) -> Row;

    fn from_row(row: &Row) -> StoreResult<Self>;

    fn column_type(column: &str) -> Option<ColumnType> {
        Self::COLUMNS
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, ty)| *ty)
    }
}

/// Row predicate understood by every backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    /// `column = value`; `Value::Null` matches NULL.
    Eq(&'static str, Value),
    /// Negation of [`Filter::Eq`]; NULL differs from every non-null value.
    Ne(&'static str, Value),
    /// Case-insensitive substring match on the column's text form.
    Contains(&'static str, String),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self::Eq(column, value.into())
    }

    pub fn ne(column: &'static str, value: impl Into<Value>) -> Self {
        Self::Ne(column, value.into())
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Self::Contains(column, needle.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::All, f) | (f, Self::All) => f,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), f) => {
                left.push(f);
                Self::And(left)
            }
            (f, Self::And(mut right)) => {
                right.insert(0, f);
                Self::And(right)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::All => true,
            Self::Eq(column, value) => row.get(column) == value,
            Self::Ne(column, value) => row.get(column) != value,
            Self::Contains(column, needle) => row
                .get(column)
                .search_text()
                .is_some_and(|text| text.contains(&needle.to_lowercase())),
            Self::And(filters) => filters.iter().all(|f| f.matches(row)),
        }
    }
}
