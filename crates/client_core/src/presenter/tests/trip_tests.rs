use super::*;

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use chrono::Duration;

use crate::test_support::{loaded_fixture, sample_point, FakeApi, HostOp, RecordingHost};

fn close_flag() -> (Arc<AtomicBool>, NewSessionClose) {
    let flag = Arc::new(AtomicBool::new(false));
    let cloned = flag.clone();
    (
        flag,
        Box::new(move || cloned.store(true, AtomicOrdering::SeqCst)),
    )
}

fn ids(row_order: &[PointId]) -> Vec<&str> {
    row_order.iter().map(|id| id.0.as_str()).collect()
}

#[tokio::test]
async fn loading_placeholder_shows_until_init() {
    let api = Arc::new(FakeApi::new(vec![
        sample_point("p2", 12, 2, 200),
        sample_point("p1", 10, 2, 100),
        sample_point("p3", 14, 2, 300),
    ]));
    let points = Arc::new(PointsStore::new(api.clone()));
    let filter = Arc::new(FilterStore::new());
    let host = Arc::new(RecordingHost::new());
    let presenter = TripPresenter::new(points.clone(), filter, host.clone());

    presenter.init();
    assert!(host.has_loading());
    assert!(host.sort_bar().is_none());

    points.load().await.expect("load");
    assert!(!host.has_loading());
    assert_eq!(ids(&host.row_order()), ["p1", "p2", "p3"]);
    assert_eq!(host.sort_bar(), Some(SortKind::Day));
}

#[tokio::test]
async fn rows_render_with_placeholders_when_catalogs_failed() {
    let api = Arc::new(FakeApi::new(vec![sample_point("p1", 10, 2, 100)]).failing_catalogs());
    let points = Arc::new(PointsStore::new(api.clone()));
    let filter = Arc::new(FilterStore::new());
    let host = Arc::new(RecordingHost::new());
    let presenter = TripPresenter::new(points.clone(), filter, host.clone());
    presenter.init();

    points.load().await.expect("load");

    match host.row_for(&PointId::new("p1")) {
        Some(ViewSpec::PointRow {
            destination,
            offers,
            ..
        }) => {
            assert!(destination.is_none());
            assert!(offers.is_empty());
        }
        other => panic!("expected p1 row, got {other:?}"),
    }
}

#[tokio::test]
async fn three_points_under_everything_sort_by_ascending_start() {
    // Id order deliberately disagrees with date order.
    let fixture = loaded_fixture(vec![
        sample_point("b", 10, 2, 100),
        sample_point("a", 12, 2, 100),
        sample_point("c", 11, 2, 100),
    ])
    .await;

    assert_eq!(ids(&fixture.host.row_order()), ["b", "c", "a"]);
    assert_eq!(fixture.host.row_order().len(), 3);
}

#[tokio::test]
async fn sort_change_reflows_and_same_kind_is_a_noop() {
    let fixture = loaded_fixture(vec![
        sample_point("cheap", 10, 2, 10),
        sample_point("dear", 12, 2, 900),
    ])
    .await;

    fixture.presenter.set_sort(SortKind::Price);
    assert_eq!(ids(&fixture.host.row_order()), ["dear", "cheap"]);
    assert_eq!(fixture.host.sort_bar(), Some(SortKind::Price));

    fixture.host.take_ops();
    fixture.presenter.set_sort(SortKind::Price);
    assert!(fixture.host.take_ops().is_empty());
}

#[tokio::test]
async fn major_notification_resets_sort_to_the_default() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 10),
        sample_point("p2", 12, 2, 900),
    ])
    .await;
    fixture.presenter.set_sort(SortKind::Price);
    assert_eq!(fixture.presenter.current_sort(), SortKind::Price);

    // The fixture's points lie in the past, so they survive a Past filter.
    fixture
        .filter
        .set_filter(UpdateKind::Major, FilterKind::Past);

    assert_eq!(fixture.presenter.current_sort(), SortKind::Day);
    assert_eq!(fixture.host.sort_bar(), Some(SortKind::Day));
    assert_eq!(ids(&fixture.host.row_order()), ["p1", "p2"]);
}

#[tokio::test]
async fn filter_change_reapplies_the_predicate() {
    let now = Utc::now();
    let mut future = sample_point("future", 10, 2, 100);
    future.date_from = now + Duration::days(2);
    future.date_to = now + Duration::days(3);
    let past = sample_point("past", 10, 2, 100);
    let fixture = loaded_fixture(vec![future, past]).await;

    fixture
        .filter
        .set_filter(UpdateKind::Major, FilterKind::Future);

    assert_eq!(ids(&fixture.host.row_order()), ["future"]);
}

#[tokio::test]
async fn patch_rerenders_only_the_affected_row() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 100),
        sample_point("p2", 12, 2, 200),
        sample_point("p3", 14, 2, 300),
    ])
    .await;
    // A row being edited elsewhere must keep its open form across the patch.
    fixture.presenter.open_editor(&PointId::new("p1"));
    fixture.host.take_ops();

    fixture
        .presenter
        .toggle_favorite(&PointId::new("p2"))
        .await
        .expect("toggle");

    let ops = fixture.host.take_ops();
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(op, HostOp::Replace(_)))
            .count(),
        1
    );
    assert!(!ops
        .iter()
        .any(|op| matches!(op, HostOp::Mount(_) | HostOp::Unmount(_))));

    match fixture.host.row_for(&PointId::new("p2")) {
        Some(ViewSpec::PointRow { point, .. }) => assert!(point.is_favorite),
        other => panic!("expected p2 row, got {other:?}"),
    }
    assert!(fixture.host.editor_for(Some(&PointId::new("p1"))).is_some());
    assert_eq!(fixture.host.sort_bar(), Some(SortKind::Day));
}

#[tokio::test]
async fn patch_for_a_missing_session_is_a_noop() {
    let now = Utc::now();
    let mut future = sample_point("future", 10, 2, 100);
    future.date_from = now + Duration::days(2);
    future.date_to = now + Duration::days(3);
    let past = sample_point("past", 10, 2, 100);
    let fixture = loaded_fixture(vec![future, past]).await;
    fixture
        .filter
        .set_filter(UpdateKind::Major, FilterKind::Future);
    fixture.host.take_ops();

    // "past" has no live session under the Future filter; its notification
    // must land harmlessly.
    let updated = sample_point("past", 10, 2, 100).with_favorite(true);
    fixture
        .points
        .update_point(UpdateKind::Patch, updated)
        .await
        .expect("store update");

    assert!(fixture.host.take_ops().is_empty());
    assert_eq!(ids(&fixture.host.row_order()), ["future"]);
}

#[tokio::test]
async fn at_most_one_row_is_editable() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 100),
        sample_point("p2", 12, 2, 200),
    ])
    .await;

    fixture.presenter.open_editor(&PointId::new("p1"));
    fixture.presenter.open_editor(&PointId::new("p2"));

    assert!(fixture.host.editor_for(Some(&PointId::new("p1"))).is_none());
    assert!(fixture.host.editor_for(Some(&PointId::new("p2"))).is_some());
    assert!(fixture.host.row_for(&PointId::new("p1")).is_some());
    assert_eq!(fixture.host.escape_attached(), 1);
}

#[tokio::test]
async fn escape_cancels_the_edit_without_touching_data() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 100),
        sample_point("p2", 12, 2, 200),
    ])
    .await;
    let before = fixture.points.points();

    fixture.presenter.open_editor(&PointId::new("p2"));
    assert_eq!(fixture.host.escape_attached(), 1);
    fixture.presenter.escape();

    assert_eq!(fixture.points.points(), before);
    assert!(fixture.host.editor_for(Some(&PointId::new("p2"))).is_none());
    assert!(fixture.host.row_for(&PointId::new("p2")).is_some());
    assert_eq!(fixture.host.escape_attached(), 0);
}

#[tokio::test]
async fn escape_listener_detaches_on_every_exit_path() {
    let fixture = loaded_fixture(vec![sample_point("p1", 10, 2, 100)]).await;
    let id = PointId::new("p1");

    fixture.presenter.open_editor(&id);
    assert_eq!(fixture.host.escape_attached(), 1);
    fixture.presenter.close_editor(&id);
    assert_eq!(fixture.host.escape_attached(), 0);

    fixture.presenter.open_editor(&id);
    let draft = fixture.points.points()[0].to_draft();
    fixture
        .presenter
        .submit_editor(&id, draft)
        .await
        .expect("submit");
    assert_eq!(fixture.host.escape_attached(), 0);
}

#[tokio::test]
async fn failed_update_leaves_the_model_untouched_and_the_form_open() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 100),
        sample_point("p2", 12, 2, 200),
    ])
    .await;
    fixture.api.set_fail_mutations(true);
    let before = fixture.points.points();
    let id = PointId::new("p1");

    fixture.presenter.open_editor(&id);
    let mut draft = before[0].to_draft();
    draft.base_price = 9999;
    let result = fixture.presenter.submit_editor(&id, draft).await;

    assert!(result.is_err());
    assert_eq!(fixture.points.points(), before);
    assert_eq!(fixture.api.server_points(), before);
    match fixture.host.editor_for(Some(&id)) {
        Some(ViewSpec::PointEditor {
            pending, rejected, ..
        }) => {
            assert!(!pending);
            assert!(rejected);
        }
        other => panic!("expected open editor for p1, got {other:?}"),
    }

    // The session is still live: an explicit close restores the row.
    fixture.api.set_fail_mutations(false);
    fixture.presenter.close_editor(&id);
    assert!(fixture.host.row_for(&id).is_some());
}

#[tokio::test]
async fn successful_delete_removes_the_row_and_its_session() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 100),
        sample_point("p2", 12, 2, 200),
    ])
    .await;

    fixture
        .presenter
        .request_delete(&PointId::new("p1"))
        .await
        .expect("delete");

    assert_eq!(fixture.points.points().len(), 1);
    assert_eq!(ids(&fixture.host.row_order()), ["p2"]);
    // The registry entry is gone: opening the editor for p1 is a no-op.
    fixture.host.take_ops();
    fixture.presenter.open_editor(&PointId::new("p1"));
    assert!(fixture.host.take_ops().is_empty());
}

#[tokio::test]
async fn create_on_an_empty_list_swaps_placeholder_for_the_form() {
    let fixture = loaded_fixture(Vec::new()).await;
    assert_eq!(
        fixture.host.no_points_filter(),
        Some(FilterKind::Everything)
    );

    let (_flag, on_close) = close_flag();
    fixture.presenter.create_point(on_close);

    assert_eq!(fixture.host.no_points_filter(), None);
    assert!(fixture.host.editor_for(None).is_some());
    assert_eq!(fixture.host.escape_attached(), 1);
}

#[tokio::test]
async fn cancelling_creation_restores_placeholder_and_fires_close() {
    let fixture = loaded_fixture(Vec::new()).await;
    let (flag, on_close) = close_flag();
    fixture.presenter.create_point(on_close);

    fixture.presenter.escape();

    assert!(flag.load(AtomicOrdering::SeqCst));
    assert!(fixture.host.editor_for(None).is_none());
    assert_eq!(
        fixture.host.no_points_filter(),
        Some(FilterKind::Everything)
    );
    assert_eq!(fixture.host.escape_attached(), 0);
}

#[tokio::test]
async fn committing_creation_renders_the_new_row_and_fires_close() {
    let fixture = loaded_fixture(Vec::new()).await;
    let (flag, on_close) = close_flag();
    fixture.presenter.create_point(on_close);

    let mut draft = PointDraft::blank(Utc::now());
    draft.destination = Some(shared::domain::DestinationId::new("geneva"));
    draft.base_price = 42;
    let created = fixture
        .presenter
        .submit_new(draft)
        .await
        .expect("creation");

    assert!(flag.load(AtomicOrdering::SeqCst));
    assert!(fixture.host.editor_for(None).is_none());
    assert_eq!(ids(&fixture.host.row_order()), [created.id.0.as_str()]);
    assert_eq!(fixture.host.no_points_filter(), None);
}

#[tokio::test]
async fn opening_a_row_editor_closes_the_creation_form() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 100),
        sample_point("p2", 12, 2, 200),
    ])
    .await;
    let (flag, on_close) = close_flag();
    fixture.presenter.create_point(on_close);
    assert!(fixture.host.editor_for(None).is_some());

    fixture.presenter.open_editor(&PointId::new("p1"));

    assert!(flag.load(AtomicOrdering::SeqCst));
    assert!(fixture.host.editor_for(None).is_none());
    assert!(fixture.host.editor_for(Some(&PointId::new("p1"))).is_some());
    assert_eq!(fixture.host.escape_attached(), 1);
}

#[tokio::test]
async fn a_pending_submit_blocks_a_second_intent_on_the_same_point() {
    let fixture = loaded_fixture(vec![sample_point("p1", 10, 2, 100)]).await;
    let gate = Arc::new(tokio::sync::Notify::new());
    fixture.api.set_gate(gate.clone());
    let id = PointId::new("p1");

    fixture.presenter.open_editor(&id);
    let draft = fixture.points.points()[0].to_draft();
    let presenter = fixture.presenter.clone();
    let submit_id = id.clone();
    let pending_submit =
        tokio::spawn(async move { presenter.submit_editor(&submit_id, draft).await });
    // Let the submit reach the gated remote call.
    tokio::task::yield_now().await;

    let refused = fixture.presenter.request_delete(&id).await;
    assert!(refused.is_err());
    assert_eq!(fixture.api.delete_calls(), 0);

    gate.notify_one();
    pending_submit
        .await
        .expect("join")
        .expect("gated submit completes");
    assert_eq!(fixture.api.update_calls(), 1);
}

#[tokio::test]
async fn destroy_tears_down_and_stops_reacting() {
    let fixture = loaded_fixture(vec![
        sample_point("p1", 10, 2, 100),
        sample_point("p2", 12, 2, 200),
    ])
    .await;

    fixture.presenter.destroy();

    assert!(fixture.host.list_children().is_empty());
    assert!(fixture.host.sort_bar().is_none());
    assert_eq!(fixture.host.escape_attached(), 0);

    fixture.host.take_ops();
    let updated = sample_point("p1", 10, 2, 100).with_favorite(true);
    fixture
        .points
        .update_point(UpdateKind::Patch, updated)
        .await
        .expect("store update");
    assert!(fixture.host.take_ops().is_empty());
}

#[tokio::test]
async fn init_after_destroy_rebuilds_from_current_state() {
    let fixture = loaded_fixture(vec![sample_point("p1", 10, 2, 100)]).await;

    fixture.presenter.destroy();
    fixture.presenter.init();

    assert!(!fixture.host.has_loading());
    assert_eq!(ids(&fixture.host.row_order()), ["p1"]);
    assert_eq!(fixture.host.sort_bar(), Some(SortKind::Day));
}

#[tokio::test]
async fn destroying_with_an_open_creation_form_fires_its_close_callback() {
    let fixture = loaded_fixture(vec![sample_point("p1", 10, 2, 100)]).await;
    let (flag, on_close) = close_flag();
    fixture.presenter.create_point(on_close);

    fixture.presenter.destroy();

    assert!(flag.load(AtomicOrdering::SeqCst));
    assert_eq!(fixture.host.escape_attached(), 0);
}
