//! Common test utilities for idr-graphql integration tests
//!
//! Provides a fixture builder for the metadata store and a session wrapper
//! that records every projection it runs. Each test binary pulls in only
//! the items it uses.

#![allow(dead_code)]

pub mod fixtures;
pub mod recording;

use idr_graphql::{build_schema, execute, QuerySession};
use serde_json::Value;
use std::sync::Arc;

/// Execute `query` and return `data` as JSON, failing on any GraphQL error
pub async fn query_data(session: Arc<dyn QuerySession>, query: &str) -> Value {
    let schema = build_schema();
    let response = execute(&schema, session, query).await;
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}
