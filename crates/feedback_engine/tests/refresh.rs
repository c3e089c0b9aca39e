mod common;

use common::*;
use feedback_core::{ListingMetadata, SortOrder, StoreKind, TaskKind, TaskOutcome};
use feedback_engine::{RemoteError, RemoteErrorKind, TaskPhase};
use pretty_assertions::assert_eq;

fn five_listings() -> Vec<ListingMetadata> {
    (1..=5)
        .map(|n| ListingMetadata::new(n.to_string(), format!("Lamp {n}"), 100 - n as i64))
        .collect()
}

#[test]
fn refresh_streams_items_and_thumbnails_then_reports_ready() {
    let fx = fixture(FakeListings::with(five_listings()), std::sync::Arc::default());
    fx.images.missing.lock().unwrap().insert("3".to_string());
    let mut sink = RecordingSink::observing(fx.engine.picklist());

    fx.engine.start_search("").unwrap();
    pump_until(&fx.engine, &mut sink, |s| !s.finished.is_empty());

    let picklist = fx.engine.picklist().snapshot().unwrap();
    assert_eq!(picklist.ids(), ids(&["1", "2", "3", "4", "5"]));
    assert!(picklist.get("3").unwrap().thumbnail.is_none());
    let handle = picklist.get("1").unwrap().thumbnail.unwrap();
    assert_eq!(
        fx.engine.picklist().thumbnail(handle).unwrap().as_deref(),
        Some(&b"img-1"[..])
    );

    let image_ids: Vec<&str> = sink.images.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(image_ids, vec!["1", "2", "4", "5"]);

    let loading: Vec<Option<u8>> = sink
        .statuses
        .iter()
        .filter(|(message, _)| message == "Loading...")
        .map(|(_, percent)| *percent)
        .collect();
    assert_eq!(
        loading,
        vec![Some(0), Some(20), Some(40), Some(60), Some(80), Some(100)]
    );
    assert_eq!(sink.last_status(), Some(&("Ready".to_string(), Some(100))));
    assert_eq!(sink.finished[0].1.outcome, TaskOutcome::Completed);
    assert!(sink.store_changes.iter().all(|store| *store == StoreKind::Picklist));
}

#[test]
fn cancelled_refresh_keeps_processed_items_and_reports_stopped() {
    let fx = fixture(FakeListings::with(five_listings()), std::sync::Arc::default());
    let entered = fx.images.gates.close("2");
    let mut sink = RecordingSink::observing(fx.engine.picklist());

    fx.engine.start_search("").unwrap();
    wait_entered(&entered, "2");
    assert!(fx.engine.cancel(TaskKind::Search));
    fx.images.gates.open("2");

    pump_until(&fx.engine, &mut sink, |s| !s.finished.is_empty());
    settle(&fx.engine, &mut sink);

    assert_eq!(sink.finished.len(), 1);
    let report = &sink.finished[0].1;
    assert_eq!(report.outcome, TaskOutcome::Cancelled);
    assert_eq!(report.percent, 40);
    assert_eq!(sink.last_status(), Some(&("Stopped".to_string(), Some(40))));
    assert_eq!(fx.engine.picklist().ids().unwrap(), ids(&["1", "2"]));
    assert_eq!(*fx.images.calls.lock().unwrap(), ids(&["1", "2"]));
    assert_eq!(fx.engine.phase(TaskKind::Search), TaskPhase::Idle);
}

#[test]
fn only_the_latest_query_is_published() {
    let listings = vec![
        ListingMetadata::new("1", "abc lamp", 3),
        ListingMetadata::new("2", "abcd chair", 2),
        ListingMetadata::new("3", "xyz", 1),
        ListingMetadata::new("4", "ABCD table", 4),
    ];
    let fx = fixture(FakeListings::with(listings), std::sync::Arc::default());
    let entered = fx.listings.gates.close("abc");
    let mut sink = RecordingSink::observing(fx.engine.picklist());

    let first = fx.engine.start_search("abc").unwrap();
    wait_entered(&entered, "abc");
    let second = fx.engine.start_search("abcd").unwrap();
    assert!(first.is_superseded());
    assert!(second.is_current());

    pump_until(&fx.engine, &mut sink, |s| !s.finished.is_empty());

    // Let the stale pass finish its fetch after the newer one already won.
    fx.listings.gates.open("abc");
    let deadline = std::time::Instant::now() + WAIT;
    while fx.listings.returned.lock().unwrap().len() < 2 {
        assert!(std::time::Instant::now() < deadline, "stale fetch never returned");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    settle(&fx.engine, &mut sink);

    assert_eq!(sink.finished.len(), 1);
    assert_eq!(sink.finished[0].1.total, 2);
    assert!(!sink.picklist_views.is_empty());
    for view in &sink.picklist_views {
        for title in view {
            assert!(title.to_lowercase().contains("abcd"), "stale title {title:?} published");
        }
    }
    assert_eq!(fx.engine.picklist().ids().unwrap(), ids(&["4", "2"]));
}

#[test]
fn picklist_order_follows_the_store_sort() {
    let listings = vec![
        ListingMetadata::new("old", "Lamp old", 1),
        ListingMetadata::new("new", "Lamp new", 9),
        ListingMetadata::new("mid", "Chair", 5),
    ];

    let fx = fixture_sorted(
        FakeListings::with(listings.clone()),
        std::sync::Arc::default(),
        SortOrder::Insertion,
    );
    let mut sink = RecordingSink::observing(fx.engine.picklist());
    fx.engine.start_search("").unwrap();
    pump_until(&fx.engine, &mut sink, |s| !s.finished.is_empty());
    assert_eq!(fx.engine.picklist().ids().unwrap(), ids(&["old", "new", "mid"]));

    let fx = fixture_sorted(
        FakeListings::with(listings),
        std::sync::Arc::default(),
        SortOrder::TimestampDesc,
    );
    let mut sink = RecordingSink::observing(fx.engine.picklist());
    fx.engine.start_search("lamp").unwrap();
    pump_until(&fx.engine, &mut sink, |s| !s.finished.is_empty());
    assert_eq!(fx.engine.picklist().ids().unwrap(), ids(&["new", "old"]));
}

#[test]
fn listing_failure_is_reported_and_store_left_alone() {
    let fx = fixture(FakeListings::with(five_listings()), std::sync::Arc::default());
    let mut sink = RecordingSink::observing(fx.engine.picklist());

    fx.engine.start_search("").unwrap();
    pump_until(&fx.engine, &mut sink, |s| !s.finished.is_empty());
    assert_eq!(fx.engine.picklist().len().unwrap(), 5);

    *fx.listings.fail_with.lock().unwrap() =
        Some(RemoteError::new(RemoteErrorKind::Timeout, "deadline elapsed"));
    fx.engine.start_search("lamp").unwrap();
    pump_until(&fx.engine, &mut sink, |s| s.finished.len() == 2);

    let report = &sink.finished[1].1;
    assert_eq!(report.outcome, TaskOutcome::Failed);
    assert!(report.message.starts_with("Could not load listings"));
    assert_eq!(fx.engine.picklist().len().unwrap(), 5);
    assert_eq!(fx.engine.phase(TaskKind::Search), TaskPhase::Idle);
}

#[test]
fn refresh_and_bulk_feedback_run_side_by_side() {
    let fx = fixture(FakeListings::with(five_listings()), std::sync::Arc::default());
    let entered = fx.images.gates.close("1");
    fx.engine.queue().sync_ids(&ids(&["a", "b"])).unwrap();
    let mut sink = RecordingSink::observing(fx.engine.picklist());

    fx.engine.start_search("").unwrap();
    wait_entered(&entered, "1");
    fx.engine.start_bulk_feedback(false).unwrap();
    pump_until(&fx.engine, &mut sink, |s| {
        !s.finished_of(TaskKind::BulkFeedback).is_empty()
    });
    assert_eq!(fx.engine.phase(TaskKind::Search), TaskPhase::Running);

    fx.images.gates.open("1");
    pump_until(&fx.engine, &mut sink, |s| !s.finished_of(TaskKind::Search).is_empty());
    assert_eq!(fx.engine.picklist().len().unwrap(), 5);
    assert_eq!(fx.submitter.called_ids(), ids(&["a", "b"]));
}
