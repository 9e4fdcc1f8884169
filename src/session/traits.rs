//! Query session trait definitions

use std::path::Path;
use thiserror::Error;

/// Errors that can occur while running a projection
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session connection lock poisoned")]
    Poisoned,

    #[error("Unbound query parameter: {0}")]
    UnboundParameter(String),

    #[error("Column {index} out of range (row has {len} columns)")]
    MissingColumn { index: usize, len: usize },

    #[error("Column {index} holds text that is not valid UTF-8: {source}")]
    InvalidText {
        index: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Column {index}: expected {expected}, found {found}")]
    Unwrap {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// A wrapped column value as returned by a projection
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Long(i64),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
        }
    }
}

/// One row of a projection. Columns are addressed by position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn get(&self, index: usize) -> SessionResult<&Value> {
        self.0.get(index).ok_or(SessionError::MissingColumn {
            index,
            len: self.0.len(),
        })
    }

    /// Unwrap an integer column
    pub fn long(&self, index: usize) -> SessionResult<i64> {
        match self.get(index)? {
            Value::Long(v) => Ok(*v),
            other => Err(SessionError::Unwrap {
                index,
                expected: "long",
                found: other.type_name(),
            }),
        }
    }

    /// Unwrap a text column
    pub fn string(&self, index: usize) -> SessionResult<String> {
        match self.get(index)? {
            Value::String(v) => Ok(v.clone()),
            other => Err(SessionError::Unwrap {
                index,
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// Unwrap a text column that may be NULL
    pub fn optional_string(&self, index: usize) -> SessionResult<Option<String>> {
        match self.get(index)? {
            Value::Null => Ok(None),
            _ => self.string(index).map(Some),
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Types that can be built positionally from a projection row
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> SessionResult<Self>;
}

/// Unwrap every row of a projection into `T`
pub fn unwrap_rows<T: FromRow>(rows: Vec<Row>) -> SessionResult<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

/// A value bound to a named placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Long(i64),
    String(String),
}

/// Named parameters for a projection template.
///
/// Placeholders are written `:name` in the template. Binding a name twice
/// replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Vec<(String, Param)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    fn bind(mut self, name: impl Into<String>, value: Param) -> Self {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    /// Bind `:id`
    pub fn add_id(self, id: i64) -> Self {
        self.bind("id", Param::Long(id))
    }

    pub fn add_long(self, name: impl Into<String>, value: i64) -> Self {
        self.bind(name, Param::Long(value))
    }

    pub fn add_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.bind(name, Param::String(value.into()))
    }

    /// Bind `:offset` and `:limit`
    pub fn page(self, offset: i64, limit: i64) -> Self {
        self.add_long("offset", offset).add_long("limit", limit)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A read-only session against the metadata store.
///
/// Implementations must be thread-safe (Send + Sync) so a session can be
/// attached to GraphQL request data.
pub trait QuerySession: Send + Sync {
    /// Run a parametrized projection and return its rows in order
    fn projection(&self, query: &str, params: &Params) -> SessionResult<Vec<Row>>;
}

/// Extension trait for opening sessions from paths
pub trait OpenSession: QuerySession + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> SessionResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> SessionResult<Self>;
}
