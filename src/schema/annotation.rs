//! Map annotations and their namespace variants

use super::entities::Image;
use super::{queries, session};
use crate::session::{unwrap_rows, Params, QuerySession, SessionError, SessionResult};
use async_graphql::{Context, Enum, Interface, Object, SimpleObject};
use thiserror::Error;

/// Prefix shared by every mapr namespace
pub const MAPR_NAMESPACE_PREFIX: &str = "openmicroscopy.org/mapr/";

/// Errors raised while turning annotation rows into annotation objects
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Unknown annotation namespace: {0}")]
    UnknownNamespace(String),

    #[error("Annotation {id} has no namespace")]
    MissingNamespace { id: i64 },

    #[error("Annotation rows out of order: {current} follows {previous}")]
    RowsOutOfOrder { previous: i64, current: i64 },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Annotation category selector.
///
/// Each value maps 1:1 to a mapr namespace. A new namespace needs a variant
/// here and an entry in every match below.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Gene,
    Phenotype,
}

impl AnnotationType {
    pub const ALL: [AnnotationType; 2] = [AnnotationType::Gene, AnnotationType::Phenotype];

    pub fn namespace(self) -> &'static str {
        match self {
            AnnotationType::Gene => "openmicroscopy.org/mapr/gene",
            AnnotationType::Phenotype => "openmicroscopy.org/mapr/phenotype",
        }
    }

    /// Key whose value is the annotation's display name
    pub fn primary_key(self) -> &'static str {
        match self {
            AnnotationType::Gene => "Gene Symbol",
            AnnotationType::Phenotype => "Phenotype",
        }
    }

    /// Short prefix used to name this namespace's query parameters
    pub fn param_prefix(self) -> &'static str {
        match self {
            AnnotationType::Gene => "ge",
            AnnotationType::Phenotype => "ph",
        }
    }

    pub fn from_namespace(ns: &str) -> Result<Self, AnnotationError> {
        Self::ALL
            .into_iter()
            .find(|t| t.namespace() == ns)
            .ok_or_else(|| AnnotationError::UnknownNamespace(ns.to_string()))
    }
}

/// One key/value pair of a map annotation
#[derive(SimpleObject, Debug, Clone, PartialEq, Eq)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

impl NameValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A grouped map annotation, before it is exposed as a GraphQL variant
#[derive(Debug, Clone, PartialEq)]
pub struct MaprAnnotation {
    pub id: i64,
    /// Value of the namespace's primary key
    pub name: String,
    pub kind: AnnotationType,
    pub value: Vec<NameValue>,
}

impl MaprAnnotation {
    /// Images linked to this annotation, ordered by id
    pub fn images(&self, session: &dyn QuerySession) -> SessionResult<Vec<Image>> {
        let rows = session.projection(queries::IMAGES_OF_ANNOTATION, &Params::new().add_id(self.id))?;
        unwrap_rows(rows)
    }
}

macro_rules! mapr_object {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub MaprAnnotation);

        #[Object]
        impl $name {
            async fn id(&self) -> &i64 {
                &self.0.id
            }

            async fn name(&self) -> &String {
                &self.0.name
            }

            async fn images(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Image>> {
                Ok(self.0.images(session(ctx)?)?)
            }

            async fn value(&self) -> &Vec<NameValue> {
                &self.0.value
            }
        }
    };
}

mapr_object!(Gene, "Annotation in the gene namespace");
mapr_object!(Phenotype, "Annotation in the phenotype namespace");

#[derive(Interface, Debug, Clone, PartialEq)]
#[graphql(
    field(name = "id", ty = "&i64"),
    field(name = "name", ty = "&String"),
    field(name = "images", ty = "Vec<Image>"),
    field(name = "value", ty = "&Vec<NameValue>")
)]
pub enum Annotation {
    Gene(Gene),
    Phenotype(Phenotype),
}

impl Annotation {
    pub fn kind(&self) -> AnnotationType {
        self.inner().kind
    }

    pub fn inner(&self) -> &MaprAnnotation {
        match self {
            Annotation::Gene(a) => &a.0,
            Annotation::Phenotype(a) => &a.0,
        }
    }
}

impl From<MaprAnnotation> for Annotation {
    fn from(ann: MaprAnnotation) -> Self {
        match ann.kind {
            AnnotationType::Gene => Annotation::Gene(Gene(ann)),
            AnnotationType::Phenotype => Annotation::Phenotype(Phenotype(ann)),
        }
    }
}
