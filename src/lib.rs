//! idr-graphql: GraphQL over imaging repository metadata
//!
//! Exposes projects, datasets, images and map annotations (gene and
//! phenotype tags) as a GraphQL schema. Only selected fields are resolved;
//! each relationship field runs one parametrized projection against the
//! session attached to the request.
//!
//! # Example
//!
//! ```
//! use idr_graphql::{build_schema, execute, OpenSession, SqliteSession};
//! use std::sync::Arc;
//!
//! let session = SqliteSession::open_in_memory().unwrap();
//! let schema = build_schema();
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let response = runtime.block_on(execute(&schema, Arc::new(session), "{ image(id: 1) { id } }"));
//! assert!(response.errors.is_empty());
//! ```

pub mod config;
pub mod schema;
pub mod session;

pub use config::{Config, ConfigError};
pub use schema::{
    build_schema, execute, Annotation, AnnotationError, AnnotationType, Dataset, Gene, IdrSchema,
    Image, MaprAnnotation, NameValue, Phenotype, Project, QueryRoot, SessionHandle,
};
pub use session::{
    OpenSession, Params, QuerySession, Row, SessionError, SessionResult, SqliteSession, Value,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
