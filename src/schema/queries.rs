//! Projection templates
//!
//! Every template binds `:id` unless noted. Link lookups return
//! `(id, name)` of the far side, ordered by that id.

use super::annotation::AnnotationType;

pub const PROJECT_BY_ID: &str = "SELECT id, name FROM project WHERE id = :id";
pub const DATASET_BY_ID: &str = "SELECT id, name FROM dataset WHERE id = :id";
pub const IMAGE_BY_ID: &str = "SELECT id, name FROM image WHERE id = :id";

pub const DATASETS_OF_PROJECT: &str = r#"
    SELECT d.id, d.name
    FROM projectdatasetlink pdl
    JOIN dataset d ON d.id = pdl.child
    WHERE pdl.parent = :id
    ORDER BY d.id ASC
"#;

pub const PROJECTS_OF_DATASET: &str = r#"
    SELECT p.id, p.name
    FROM projectdatasetlink pdl
    JOIN project p ON p.id = pdl.parent
    WHERE pdl.child = :id
    ORDER BY p.id ASC
"#;

pub const IMAGES_OF_DATASET: &str = r#"
    SELECT i.id, i.name
    FROM datasetimagelink dil
    JOIN image i ON i.id = dil.child
    WHERE dil.parent = :id
    ORDER BY i.id ASC
"#;

pub const DATASETS_OF_IMAGE: &str = r#"
    SELECT d.id, d.name
    FROM datasetimagelink dil
    JOIN dataset d ON d.id = dil.parent
    WHERE dil.child = :id
    ORDER BY d.id ASC
"#;

pub const IMAGES_OF_ANNOTATION: &str = r#"
    SELECT i.id, i.name
    FROM imageannotationlink ial
    JOIN image i ON i.id = ial.parent
    JOIN annotation a ON a.id = ial.child
    WHERE ial.child = :id
    AND a.discriminator = 'MapAnnotation'
    ORDER BY i.id ASC
"#;

/// Annotations of one image, restricted to `kinds`.
///
/// Rows are `(id, primary value, key, value, ns)`. Each kind binds
/// `:<prefix>ns` and `:<prefix>pk`.
pub fn annotations_of_image(kinds: &[AnnotationType]) -> String {
    let clauses = kinds
        .iter()
        .map(|kind| {
            let p = kind.param_prefix();
            format!("(a.ns = :{p}ns AND mvq.name = :{p}pk)")
        })
        .collect::<Vec<_>>()
        .join(" OR ");

    format!(
        r#"
    SELECT a.id, mvq.value, mv.name, mv.value, a.ns
    FROM imageannotationlink ial
    JOIN annotation a ON a.id = ial.child
    JOIN annotation_mapvalue mv ON mv.annotation_id = a.id
    JOIN annotation_mapvalue mvq ON mvq.annotation_id = a.id
    WHERE ial.parent = :id
    AND a.discriminator = 'MapAnnotation'
    AND ({clauses})
    ORDER BY a.id ASC, mvq.value ASC, mv.idx ASC
"#
    )
}

/// Annotations in `:ns` whose `:key` row equals the lowercased `:value`.
///
/// Stored values are folded with `unicode_lower`, registered by the session,
/// so the comparison agrees with `str::to_lowercase` on the bound value.
///
/// `:limit`/`:offset` page the matching annotations, not rows, so every
/// returned annotation carries all of its keys. Rows are
/// `(id, primary value, key, value)`.
pub const SEARCH_ANNOTATIONS: &str = r#"
    WITH matched AS (
        SELECT DISTINCT a.id AS id, mvq.value AS name
        FROM annotation a
        JOIN annotation_mapvalue mvq ON mvq.annotation_id = a.id
        WHERE a.discriminator = 'MapAnnotation'
        AND a.ns = :ns
        AND mvq.name = :key
        AND unicode_lower(mvq.value) = :value
        ORDER BY a.id ASC, mvq.value ASC
        LIMIT :limit OFFSET :offset
    )
    SELECT m.id, m.name, mv.name, mv.value
    FROM matched m
    JOIN annotation_mapvalue mv ON mv.annotation_id = m.id
    ORDER BY m.id ASC, m.name ASC, mv.idx ASC
"#;
