//! Session wrapper that records projections

use idr_graphql::{Params, QuerySession, Row, SessionResult};
use std::sync::Mutex;

/// Forwards to an inner session and keeps every query it was asked to run
pub struct RecordingSession<S: QuerySession> {
    inner: S,
    queries: Mutex<Vec<String>>,
}

impl<S: QuerySession> RecordingSession<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    /// Number of recorded queries that mention `table`
    pub fn count_touching(&self, table: &str) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.contains(table))
            .count()
    }
}

impl<S: QuerySession> QuerySession for RecordingSession<S> {
    fn projection(&self, query: &str, params: &Params) -> SessionResult<Vec<Row>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.inner.projection(query, params)
    }
}
