//! Query root: lookups by id and key/value searches

use super::annotation::{AnnotationError, AnnotationType, Gene, MaprAnnotation, Phenotype};
use super::entities::{by_id, Dataset, Image, Project};
use super::grouping::{group_annotations, AnnotationRow, Variant};
use super::{queries, session};
use crate::session::{unwrap_rows, Params, QuerySession};
use async_graphql::{Context, Object};

/// Maximum number of annotations a search returns
pub const SEARCH_LIMIT: i64 = 10;

/// Annotations of `kind` whose `key` equals `value`, ignoring case.
///
/// At most `SEARCH_LIMIT` annotations, ordered by id.
pub fn search_annotations(
    session: &dyn QuerySession,
    kind: AnnotationType,
    key: &str,
    value: &str,
) -> Result<Vec<MaprAnnotation>, AnnotationError> {
    let params = Params::new()
        .add_string("ns", kind.namespace())
        .add_string("key", key)
        .add_string("value", value.to_lowercase())
        .page(0, SEARCH_LIMIT);

    let rows = session.projection(queries::SEARCH_ANNOTATIONS, &params)?;
    let rows = unwrap_rows::<AnnotationRow>(rows)?;
    group_annotations(rows, Variant::Fixed(kind)).collect()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn image(&self, ctx: &Context<'_>, id: i64) -> async_graphql::Result<Option<Image>> {
        Ok(by_id(session(ctx)?, queries::IMAGE_BY_ID, id)?)
    }

    async fn dataset(&self, ctx: &Context<'_>, id: i64) -> async_graphql::Result<Option<Dataset>> {
        Ok(by_id(session(ctx)?, queries::DATASET_BY_ID, id)?)
    }

    async fn project(&self, ctx: &Context<'_>, id: i64) -> async_graphql::Result<Option<Project>> {
        Ok(by_id(session(ctx)?, queries::PROJECT_BY_ID, id)?)
    }

    /// Gene annotations whose `key` (default "Gene Symbol") matches `value`
    async fn gene(
        &self,
        ctx: &Context<'_>,
        key: Option<String>,
        value: String,
    ) -> async_graphql::Result<Vec<Gene>> {
        let kind = AnnotationType::Gene;
        let key = key.unwrap_or_else(|| kind.primary_key().to_string());
        let found = search_annotations(session(ctx)?, kind, &key, &value)?;
        Ok(found.into_iter().map(Gene).collect())
    }

    /// Phenotype annotations whose `key` (default "Phenotype") matches `value`
    async fn phenotype(
        &self,
        ctx: &Context<'_>,
        key: Option<String>,
        value: String,
    ) -> async_graphql::Result<Vec<Phenotype>> {
        let kind = AnnotationType::Phenotype;
        let key = key.unwrap_or_else(|| kind.primary_key().to_string());
        let found = search_annotations(session(ctx)?, kind, &key, &value)?;
        Ok(found.into_iter().map(Phenotype).collect())
    }
}
