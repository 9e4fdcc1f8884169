//! SQLite-backed query session

use super::traits::{
    OpenSession, Param, Params, QuerySession, Row, SessionError, SessionResult, Value,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Statement};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed metadata session
///
/// Holds one connection behind a mutex. The schema mirrors the parts of the
/// imaging repository the resolvers read: containers, their link tables, and
/// map annotations stored one key/value pair per row.
pub struct SqliteSession {
    conn: Mutex<Connection>,
}

impl SqliteSession {
    fn init_schema(conn: &Connection) -> SessionResult<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS project (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS dataset (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS image (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projectdatasetlink (
                id INTEGER PRIMARY KEY,
                parent INTEGER NOT NULL REFERENCES project(id) ON DELETE CASCADE,
                child INTEGER NOT NULL REFERENCES dataset(id) ON DELETE CASCADE,
                UNIQUE (parent, child)
            );

            CREATE TABLE IF NOT EXISTS datasetimagelink (
                id INTEGER PRIMARY KEY,
                parent INTEGER NOT NULL REFERENCES dataset(id) ON DELETE CASCADE,
                child INTEGER NOT NULL REFERENCES image(id) ON DELETE CASCADE,
                UNIQUE (parent, child)
            );

            -- discriminator is the annotation class, e.g. 'MapAnnotation'
            CREATE TABLE IF NOT EXISTS annotation (
                id INTEGER PRIMARY KEY,
                discriminator TEXT NOT NULL,
                ns TEXT
            );

            -- One row per key/value pair; idx preserves the map's order
            CREATE TABLE IF NOT EXISTS annotation_mapvalue (
                annotation_id INTEGER NOT NULL REFERENCES annotation(id) ON DELETE CASCADE,
                idx INTEGER NOT NULL,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (annotation_id, idx)
            );

            CREATE TABLE IF NOT EXISTS imageannotationlink (
                id INTEGER PRIMARY KEY,
                parent INTEGER NOT NULL REFERENCES image(id) ON DELETE CASCADE,
                child INTEGER NOT NULL REFERENCES annotation(id) ON DELETE CASCADE,
                UNIQUE (parent, child)
            );

            CREATE INDEX IF NOT EXISTS idx_pdl_child ON projectdatasetlink(child);
            CREATE INDEX IF NOT EXISTS idx_dil_child ON datasetimagelink(child);
            CREATE INDEX IF NOT EXISTS idx_ial_child ON imageannotationlink(child);
            CREATE INDEX IF NOT EXISTS idx_annotation_ns ON annotation(ns);
            CREATE INDEX IF NOT EXISTS idx_mapvalue_name ON annotation_mapvalue(name);
            "#,
        )?;
        Ok(())
    }

    /// Register `unicode_lower(text)`. SQLite's built-in `lower()` only folds
    /// ASCII letters.
    fn register_functions(conn: &Connection) -> SessionResult<()> {
        conn.create_scalar_function(
            "unicode_lower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
        )?;
        Ok(())
    }

    fn connection(&self) -> SessionResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SessionError::Poisoned)
    }

    /// Bind every placeholder in the statement from `params`.
    ///
    /// Names in `params` that the statement does not use are ignored; a
    /// placeholder with no value is an error rather than an implicit NULL.
    fn bind(stmt: &mut Statement<'_>, params: &Params) -> SessionResult<()> {
        for index in 1..=stmt.parameter_count() {
            let placeholder = stmt
                .parameter_name(index)
                .map(str::to_string)
                .unwrap_or_else(|| format!("?{}", index));
            let name = placeholder.trim_start_matches([':', '@', '$']);
            match params.get(name) {
                Some(Param::Long(v)) => stmt.raw_bind_parameter(index, v)?,
                Some(Param::String(s)) => stmt.raw_bind_parameter(index, s)?,
                None => return Err(SessionError::UnboundParameter(placeholder)),
            }
        }
        Ok(())
    }

    fn wrap(index: usize, value: ValueRef<'_>) -> SessionResult<Value> {
        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Long(v),
            ValueRef::Real(v) => Value::Double(v),
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|source| SessionError::InvalidText { index, source })?;
                Value::String(text.to_string())
            }
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        })
    }

    /// Run a parametrized write (fixture loading, imports)
    pub fn execute(&self, sql: &str, params: &Params) -> SessionResult<usize> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        Self::bind(&mut stmt, params)?;
        Ok(stmt.raw_execute()?)
    }

    /// Run a batch of statements with no parameters (SQL dumps)
    pub fn execute_batch(&self, sql: &str) -> SessionResult<()> {
        let conn = self.connection()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl OpenSession for SqliteSession {
    fn open(path: impl AsRef<Path>) -> SessionResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::register_functions(&conn)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> SessionResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::register_functions(&conn)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl QuerySession for SqliteSession {
    fn projection(&self, query: &str, params: &Params) -> SessionResult<Vec<Row>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(query)?;
        Self::bind(&mut stmt, params)?;

        let columns = stmt.column_count();
        let mut out = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let values = (0..columns)
                .map(|i| Self::wrap(i, row.get_ref(i)?))
                .collect::<SessionResult<Vec<_>>>()?;
            out.push(Row::new(values));
        }

        tracing::debug!(rows = out.len(), params = params.len(), "projection");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session() -> SqliteSession {
        let session = SqliteSession::open_in_memory().unwrap();
        session
            .execute_batch(
                r#"
                INSERT INTO project (id, name) VALUES (1, 'alpha'), (2, 'beta');
                INSERT INTO dataset (id, name) VALUES (10, 'plate-a');
                INSERT INTO projectdatasetlink (parent, child) VALUES (2, 10), (1, 10);
                "#,
            )
            .unwrap();
        session
    }

    #[test]
    fn test_projection_binds_id() {
        let session = create_test_session();
        let rows = session
            .projection("SELECT id, name FROM project WHERE id = :id", &Params::new().add_id(2))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].long(0).unwrap(), 2);
        assert_eq!(rows[0].string(1).unwrap(), "beta");
    }

    #[test]
    fn test_projection_no_rows() {
        let session = create_test_session();
        let rows = session
            .projection("SELECT id, name FROM project WHERE id = :id", &Params::new().add_id(99))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_projection_ignores_unused_params() {
        let session = create_test_session();
        let params = Params::new().add_id(1).add_string("unused", "x");
        let rows = session
            .projection("SELECT name FROM project WHERE id = :id", &params)
            .unwrap();
        assert_eq!(rows[0].string(0).unwrap(), "alpha");
    }

    #[test]
    fn test_projection_rejects_unbound_placeholder() {
        let session = create_test_session();
        let err = session
            .projection("SELECT name FROM project WHERE name = :name", &Params::new())
            .unwrap_err();
        assert!(matches!(err, SessionError::UnboundParameter(ref p) if p == ":name"));
    }

    #[test]
    fn test_projection_page() {
        let session = create_test_session();
        let rows = session
            .projection(
                "SELECT id FROM project ORDER BY id ASC LIMIT :limit OFFSET :offset",
                &Params::new().page(1, 10),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].long(0).unwrap(), 2);
    }

    #[test]
    fn test_projection_wraps_null() {
        let session = create_test_session();
        let rows = session.projection("SELECT NULL, 1.5", &Params::new()).unwrap();
        assert_eq!(rows[0].values(), &[Value::Null, Value::Double(1.5)]);
    }

    #[test]
    fn test_projection_rejects_invalid_utf8_text() {
        let session = create_test_session();
        let err = session
            .projection("SELECT 1, CAST(x'C328' AS TEXT)", &Params::new())
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidText { index: 1, .. }));
    }

    #[test]
    fn test_unicode_lower_folds_non_ascii() {
        let session = create_test_session();
        let rows = session
            .projection(
                "SELECT unicode_lower('ÉPITHÉLIAL Ω Ärger'), unicode_lower(NULL)",
                &Params::new(),
            )
            .unwrap();
        assert_eq!(rows[0].string(0).unwrap(), "épithélial ω ärger");
        assert_eq!(rows[0].get(1).unwrap(), &Value::Null);
    }

    #[test]
    fn test_unicode_lower_on_reopened_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.db");
        drop(SqliteSession::open(&path).unwrap());
        let session = SqliteSession::open(&path).unwrap();
        let rows = session
            .projection("SELECT unicode_lower('Ωmega')", &Params::new())
            .unwrap();
        assert_eq!(rows[0].string(0).unwrap(), "ωmega");
    }

    #[test]
    fn test_execute_with_params() {
        let session = create_test_session();
        let changed = session
            .execute(
                "INSERT INTO image (id, name) VALUES (:id, :name)",
                &Params::new().add_id(5).add_string("name", "well-1"),
            )
            .unwrap();
        assert_eq!(changed, 1);
        let rows = session
            .projection("SELECT name FROM image WHERE id = :id", &Params::new().add_id(5))
            .unwrap();
        assert_eq!(rows[0].string(0).unwrap(), "well-1");
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let session = create_test_session();
        let err = session.execute_batch("INSERT INTO datasetimagelink (parent, child) VALUES (10, 404);");
        assert!(err.is_err());
    }

    #[test]
    fn test_open_file_creates_parent_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metadata.db");
        {
            let session = SqliteSession::open(&path).unwrap();
            session.execute_batch("INSERT INTO project (id, name) VALUES (7, 'kept');").unwrap();
        }
        let session = SqliteSession::open(&path).unwrap();
        let rows = session
            .projection("SELECT name FROM project WHERE id = :id", &Params::new().add_id(7))
            .unwrap();
        assert_eq!(rows[0].string(0).unwrap(), "kept");
    }
}
