//! Query sessions against the metadata store
//!
//! Resolvers reach the relational store through the `QuerySession` trait.
//! The bundled implementation is `SqliteSession`.

mod sqlite;
mod traits;

pub use sqlite::SqliteSession;
pub use traits::{
    unwrap_rows, FromRow, OpenSession, Param, Params, QuerySession, Row, SessionError,
    SessionResult, Value,
};
