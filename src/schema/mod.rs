//! GraphQL schema over the metadata store
//!
//! Query execution is delegated to `async-graphql`. The session a request
//! reads from travels in the request's data and is fetched by each resolver
//! from its `Context`; nothing is held by the schema itself.

mod annotation;
mod entities;
mod grouping;
mod queries;
mod root;


pub use annotation::{
    Annotation, AnnotationError, AnnotationType, Gene, MaprAnnotation, NameValue, Phenotype,
    MAPR_NAMESPACE_PREFIX,
};
pub use entities::{Dataset, Image, Project};
pub use grouping::{group_annotations, AnnotationRow, GroupAnnotations, Variant};
pub use root::{search_annotations, QueryRoot, SEARCH_LIMIT};

use crate::session::QuerySession;
use async_graphql::{Context, EmptyMutation, EmptySubscription, Request, Response, Schema};
use std::sync::Arc;

pub type IdrSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Request data carrying the session resolvers read from
#[derive(Clone)]
pub struct SessionHandle(pub Arc<dyn QuerySession>);

pub fn build_schema() -> IdrSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish()
}

/// Execute one request against `session`
pub async fn execute(
    schema: &IdrSchema,
    session: Arc<dyn QuerySession>,
    request: impl Into<Request>,
) -> Response {
    let request = request.into().data(SessionHandle(session));
    let response = schema.execute(request).await;
    if response.is_err() {
        tracing::debug!(errors = response.errors.len(), "request finished with errors");
    }
    response
}

pub(crate) fn session<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a dyn QuerySession> {
    Ok(ctx.data::<SessionHandle>()?.0.as_ref())
}
