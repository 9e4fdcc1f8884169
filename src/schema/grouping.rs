//! Reassembles flat key/value rows into grouped annotations
//!
//! A map annotation is stored one key/value pair per row, so a lookup that
//! joins the map twice (once for the primary-key row, once for every key)
//! yields one row per key. Grouping is by adjacency: rows of one annotation
//! must be contiguous, which holds when the feed is sorted by annotation id.
//! A feed that violates this is reported, never regrouped.

use super::annotation::{AnnotationError, AnnotationType, MaprAnnotation, NameValue};
use crate::session::{FromRow, Row, SessionResult};
use std::collections::HashSet;
use std::iter::Peekable;

/// One row of an annotation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRow {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub value: String,
    pub namespace: Option<String>,
}

impl FromRow for AnnotationRow {
    /// Reads `(id, name, key, value[, namespace])`
    fn from_row(row: &Row) -> SessionResult<Self> {
        Ok(Self {
            id: row.long(0)?,
            name: row.string(1)?,
            key: row.string(2)?,
            value: row.string(3)?,
            namespace: if row.len() > 4 {
                row.optional_string(4)?
            } else {
                None
            },
        })
    }
}

/// How a group's variant is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Every group becomes this variant; the namespace is not part of the key
    Fixed(AnnotationType),
    /// The namespace column is part of the key and picks the variant
    ByNamespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    id: i64,
    name: String,
    namespace: Option<String>,
}

impl GroupKey {
    fn of(row: &AnnotationRow, variant: Variant) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            namespace: match variant {
                Variant::Fixed(_) => None,
                Variant::ByNamespace => row.namespace.clone(),
            },
        }
    }

    fn matches(&self, row: &AnnotationRow, variant: Variant) -> bool {
        self.id == row.id
            && self.name == row.name
            && match variant {
                Variant::Fixed(_) => true,
                Variant::ByNamespace => self.namespace == row.namespace,
            }
    }
}

/// Lazy, single-pass iterator over grouped annotations.
///
/// Stops after the first error.
pub struct GroupAnnotations<I: Iterator<Item = AnnotationRow>> {
    rows: Peekable<I>,
    variant: Variant,
    previous_id: Option<i64>,
    // keys already emitted for `previous_id`
    closed: HashSet<GroupKey>,
    failed: bool,
}

impl<I: Iterator<Item = AnnotationRow>> GroupAnnotations<I> {
    fn check_order(&mut self, key: &GroupKey) -> Result<(), AnnotationError> {
        if let Some(previous) = self.previous_id {
            if key.id < previous || (key.id == previous && self.closed.contains(key)) {
                return Err(AnnotationError::RowsOutOfOrder {
                    previous,
                    current: key.id,
                });
            }
            if key.id != previous {
                self.closed.clear();
            }
        }
        self.previous_id = Some(key.id);
        self.closed.insert(key.clone());
        Ok(())
    }

    fn kind_of(&self, key: &GroupKey) -> Result<AnnotationType, AnnotationError> {
        match self.variant {
            Variant::Fixed(kind) => Ok(kind),
            Variant::ByNamespace => match key.namespace.as_deref() {
                Some(ns) => AnnotationType::from_namespace(ns),
                None => Err(AnnotationError::MissingNamespace { id: key.id }),
            },
        }
    }

    fn next_group(&mut self, first: AnnotationRow) -> Result<MaprAnnotation, AnnotationError> {
        let key = GroupKey::of(&first, self.variant);
        self.check_order(&key)?;
        let kind = self.kind_of(&key)?;

        let variant = self.variant;
        let mut value = vec![NameValue::new(first.key, first.value)];
        while let Some(row) = self.rows.next_if(|r| key.matches(r, variant)) {
            value.push(NameValue::new(row.key, row.value));
        }

        Ok(MaprAnnotation {
            id: key.id,
            name: key.name,
            kind,
            value,
        })
    }
}

impl<I: Iterator<Item = AnnotationRow>> Iterator for GroupAnnotations<I> {
    type Item = Result<MaprAnnotation, AnnotationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let first = self.rows.next()?;
        let group = self.next_group(first);
        self.failed = group.is_err();
        Some(group)
    }
}

/// Group id-sorted rows into annotations
pub fn group_annotations<R>(rows: R, variant: Variant) -> GroupAnnotations<R::IntoIter>
where
    R: IntoIterator<Item = AnnotationRow>,
{
    GroupAnnotations {
        rows: rows.into_iter().peekable(),
        variant,
        previous_id: None,
        closed: HashSet::new(),
        failed: false,
    }
}
