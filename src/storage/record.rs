//! Records and static table descriptors.

use crate::{Error, Result};
use rusqlite::types::Value;

/// `SQLite` storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// `TEXT`
    Text,
    /// `INTEGER`
    Integer,
    /// `REAL`
    Real,
    /// `BLOB`
    Blob,
}

impl SqlType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
        }
    }
}

/// Compile-time description of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column identifier.
    pub name: &'static str,
    /// Storage class.
    pub sql_type: SqlType,
    /// Whether the column may be named as an upsert conflict target.
    pub conflict_key: bool,
}

impl Column {
    /// Declares a column that is not a conflict target.
    #[must_use]
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            conflict_key: false,
        }
    }

    /// Declares a column usable in `ON CONFLICT(...)`.
    #[must_use]
    pub const fn conflict_key(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            conflict_key: true,
        }
    }
}

/// A concrete table type.
///
/// Implementors describe their table statically. The store builds every
/// statement from these descriptors, so identifiers never come from callers.
/// Every table must carry a text `id` identity column.
pub trait Table: Send + Sync {
    /// Table identifier.
    fn name(&self) -> &'static str;

    /// Declared columns, in schema order.
    fn columns(&self) -> &'static [Column];

    /// The `CREATE TABLE` statement (plus any indexes) for this table.
    ///
    /// Implementors must make it idempotent (`IF NOT EXISTS`).
    ///
    /// # Errors
    ///
    /// The default returns [`Error::NotImplemented`].
    fn create_table_sql(&self) -> Result<String> {
        Err(Error::NotImplemented(format!(
            "create_table for table '{}'",
            self.name()
        )))
    }

    /// Looks up a declared column by name.
    fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }
}

/// One row to persist: an ordered column -> value mapping.
///
/// Order defines the positional bind order. Setting an existing column
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder form of [`Record::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets a column value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Returns a column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Column names in bind order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Values in bind order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves caller-supplied names to the table's static identifiers.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for a name the table does not declare.
pub fn resolve_columns<'a, T: Table + ?Sized>(
    table: &T,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<&'static str>> {
    names
        .into_iter()
        .map(|name| {
            table.column(name).map(|c| c.name).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "table '{}' has no column '{name}'",
                    table.name()
                ))
            })
        })
        .collect()
}
