//! Relationship fields run lookups only when selected

mod common;

use common::fixtures::idr_fixture;
use common::query_data;
use common::recording::RecordingSession;
use std::sync::Arc;

#[tokio::test]
async fn scalar_selection_runs_one_projection() {
    let session = Arc::new(RecordingSession::new(idr_fixture()));
    query_data(session.clone(), "{ project(id: 151) { id name } }").await;

    assert_eq!(session.count(), 1);
    assert_eq!(session.count_touching("projectdatasetlink"), 0);
}

#[tokio::test]
async fn each_selected_relationship_runs_once_per_owner() {
    let session = Arc::new(RecordingSession::new(idr_fixture()));
    query_data(session.clone(), "{ dataset(id: 369) { images { id datasets { id } } } }").await;

    // dataset by id, its images, then datasets for each of the two images
    assert_eq!(session.count(), 4);
    assert_eq!(session.count_touching("imageannotationlink"), 0);
}

#[tokio::test]
async fn annotations_not_fetched_unless_selected() {
    let session = Arc::new(RecordingSession::new(idr_fixture()));
    query_data(session.clone(), "{ image(id: 1030631) { id datasets { id } } }").await;
    assert_eq!(session.count_touching("annotation_mapvalue"), 0);

    query_data(session.clone(), "{ image(id: 1030631) { annotations { id } } }").await;
    assert_eq!(session.count_touching("annotation_mapvalue"), 1);
}

#[tokio::test]
async fn repeated_entities_are_refetched() {
    let session = Arc::new(RecordingSession::new(idr_fixture()));
    query_data(
        session.clone(),
        "{ a: project(id: 151) { datasets { id } } b: project(id: 151) { datasets { id } } }",
    )
    .await;
    assert_eq!(session.count_touching("projectdatasetlink"), 2);
}
