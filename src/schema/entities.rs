//! Container entities: projects, datasets and images
//!
//! Each entity is an immutable `(id, name)` snapshot. Relationship fields
//! run one projection each, and only when the field is selected.

use super::annotation::{Annotation, AnnotationError, AnnotationType};
use super::grouping::{group_annotations, AnnotationRow, GroupAnnotations, Variant};
use super::{queries, session};
use crate::session::{unwrap_rows, FromRow, Params, QuerySession, Row, SessionResult};
use async_graphql::{Context, Object};

/// Run a link lookup bound to one owning id
fn linked<T: FromRow>(session: &dyn QuerySession, query: &str, id: i64) -> SessionResult<Vec<T>> {
    let rows = session.projection(query, &Params::new().add_id(id))?;
    unwrap_rows(rows)
}

/// Fetch a single entity by primary key
pub(crate) fn by_id<T: FromRow>(
    session: &dyn QuerySession,
    query: &str,
    id: i64,
) -> SessionResult<Option<T>> {
    let rows = session.projection(query, &Params::new().add_id(id))?;
    rows.first().map(T::from_row).transpose()
}

macro_rules! impl_from_row {
    ($($name:ident),*) => {
        $(
            impl FromRow for $name {
                fn from_row(row: &Row) -> SessionResult<Self> {
                    Ok(Self {
                        id: row.long(0)?,
                        name: row.string(1)?,
                    })
                }
            }
        )*
    };
}

impl_from_row!(Project, Dataset, Image);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

impl Project {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    pub fn load_datasets(&self, session: &dyn QuerySession) -> SessionResult<Vec<Dataset>> {
        linked(session, queries::DATASETS_OF_PROJECT, self.id)
    }
}

#[Object]
impl Project {
    async fn id(&self) -> i64 {
        self.id
    }

    async fn name(&self) -> &str {
        &self.name
    }

    /// Datasets in this project, ordered by id
    async fn datasets(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Dataset>> {
        Ok(self.load_datasets(session(ctx)?)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
}

impl Dataset {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    pub fn load_projects(&self, session: &dyn QuerySession) -> SessionResult<Vec<Project>> {
        linked(session, queries::PROJECTS_OF_DATASET, self.id)
    }

    pub fn load_images(&self, session: &dyn QuerySession) -> SessionResult<Vec<Image>> {
        linked(session, queries::IMAGES_OF_DATASET, self.id)
    }
}

#[Object]
impl Dataset {
    async fn id(&self) -> i64 {
        self.id
    }

    async fn name(&self) -> &str {
        &self.name
    }

    /// Projects containing this dataset, ordered by id
    async fn projects(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Project>> {
        Ok(self.load_projects(session(ctx)?)?)
    }

    /// Images in this dataset, ordered by id
    async fn images(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Image>> {
        Ok(self.load_images(session(ctx)?)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: i64,
    pub name: String,
}

impl Image {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    pub fn load_datasets(&self, session: &dyn QuerySession) -> SessionResult<Vec<Dataset>> {
        linked(session, queries::DATASETS_OF_IMAGE, self.id)
    }

    /// Annotations linked to this image, optionally limited to one namespace.
    ///
    /// The returned iterator groups lazily and can be consumed once.
    pub fn load_annotations(
        &self,
        session: &dyn QuerySession,
        mapr: Option<AnnotationType>,
    ) -> Result<GroupAnnotations<std::vec::IntoIter<AnnotationRow>>, AnnotationError> {
        let kinds = match mapr {
            Some(kind) => vec![kind],
            None => AnnotationType::ALL.to_vec(),
        };

        let mut params = Params::new().add_id(self.id);
        for kind in &kinds {
            let p = kind.param_prefix();
            params = params
                .add_string(format!("{p}ns"), kind.namespace())
                .add_string(format!("{p}pk"), kind.primary_key());
        }

        let rows = session.projection(&queries::annotations_of_image(&kinds), &params)?;
        let rows = unwrap_rows::<AnnotationRow>(rows)?;
        Ok(group_annotations(rows, Variant::ByNamespace))
    }
}

#[Object]
impl Image {
    async fn id(&self) -> i64 {
        self.id
    }

    async fn name(&self) -> &str {
        &self.name
    }

    /// Datasets containing this image, ordered by id
    async fn datasets(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Dataset>> {
        Ok(self.load_datasets(session(ctx)?)?)
    }

    /// Map annotations on this image, ordered by annotation id
    async fn annotations(
        &self,
        ctx: &Context<'_>,
        mapr: Option<AnnotationType>,
    ) -> async_graphql::Result<Vec<Annotation>> {
        let annotations = self
            .load_annotations(session(ctx)?, mapr)?
            .map(|group| group.map(Annotation::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(annotations)
    }
}
