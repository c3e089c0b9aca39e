#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use feedback_core::{
    FeedbackUpdate, ImageHandle, ListingMetadata, SortOrder, StoreKind, TaskKind, TaskReport,
    WorkItemStore,
};
use feedback_engine::{
    Collaborators, EngineHandle, FeedbackSubmitter, ImageSource, ListingSource, RemoteError,
    RemoteErrorKind, ReporterSink, SearchState,
};
use tokio::sync::Notify;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Blocks a fake remote call on a chosen key until the test releases it.
#[derive(Default)]
pub struct Gates {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    entered_tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl Gates {
    pub fn close(&self, key: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        *self.entered_tx.lock().unwrap() = Some(tx);
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::new(Notify::new()));
        rx
    }

    pub fn open(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(key) {
            gate.notify_one();
        }
    }

    async fn pass(&self, key: &str) {
        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            if let Some(tx) = self.entered_tx.lock().unwrap().as_ref() {
                let _ = tx.send(key.to_string());
            }
            gate.notified().await;
        }
    }
}

#[derive(Default)]
pub struct FakeListings {
    pub listings: Mutex<Vec<ListingMetadata>>,
    pub fail_with: Mutex<Option<RemoteError>>,
    pub gates: Gates,
    pub returned: Mutex<Vec<String>>,
}

impl FakeListings {
    pub fn with(listings: Vec<ListingMetadata>) -> Arc<Self> {
        Arc::new(Self {
            listings: Mutex::new(listings),
            ..Self::default()
        })
    }
}

#[async_trait::async_trait]
impl ListingSource for FakeListings {
    async fn fetch_browsable_listings(
        &self,
        search: &SearchState,
    ) -> Result<Vec<ListingMetadata>, RemoteError> {
        self.gates.pass(&search.query).await;
        self.returned.lock().unwrap().push(search.query.clone());
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.listings.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub missing: Mutex<HashSet<String>>,
    pub gates: Gates,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ImageSource for FakeImages {
    async fn fetch_thumbnail(&self, listing_id: &str) -> Result<Bytes, RemoteError> {
        self.calls.lock().unwrap().push(listing_id.to_string());
        self.gates.pass(listing_id).await;
        if self.missing.lock().unwrap().contains(listing_id) {
            return Err(RemoteError::new(RemoteErrorKind::HttpStatus(404), "404 Not Found"));
        }
        Ok(Bytes::from(format!("img-{listing_id}")))
    }
}

#[derive(Default)]
pub struct FakeSubmitter {
    pub failing: Mutex<HashSet<String>>,
    pub gates: Gates,
    pub calls: Mutex<Vec<(String, FeedbackUpdate)>>,
}

impl FakeSubmitter {
    pub fn failing(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: Mutex::new(ids.iter().map(|id| id.to_string()).collect()),
            ..Self::default()
        })
    }

    pub fn called_ids(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl FeedbackSubmitter for FakeSubmitter {
    async fn submit_feedback(
        &self,
        listing_id: &str,
        update: FeedbackUpdate,
    ) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((listing_id.to_string(), update));
        self.gates.pass(listing_id).await;
        if self.failing.lock().unwrap().contains(listing_id) {
            return Err(RemoteError::new(RemoteErrorKind::HttpStatus(500), "500 Internal Server Error"));
        }
        Ok(())
    }
}

pub struct Fixture {
    pub engine: EngineHandle,
    pub listings: Arc<FakeListings>,
    pub images: Arc<FakeImages>,
    pub submitter: Arc<FakeSubmitter>,
}

pub fn fixture(listings: Arc<FakeListings>, submitter: Arc<FakeSubmitter>) -> Fixture {
    fixture_sorted(listings, submitter, SortOrder::TimestampDesc)
}

pub fn fixture_sorted(
    listings: Arc<FakeListings>,
    submitter: Arc<FakeSubmitter>,
    picklist_sort: SortOrder,
) -> Fixture {
    init_logging();
    let images = Arc::new(FakeImages::default());
    let collaborators = Collaborators {
        listings: listings.clone(),
        images: images.clone(),
        feedback: submitter.clone(),
    };
    let engine = EngineHandle::with_collaborators(collaborators, picklist_sort, 2)
        .expect("engine");
    Fixture {
        engine,
        listings,
        images,
        submitter,
    }
}

/// Foreground stand-in that records everything the pump delivers.
pub struct RecordingSink {
    picklist: WorkItemStore,
    pub statuses: Vec<(String, Option<u8>)>,
    pub store_changes: Vec<StoreKind>,
    /// Picklist titles as seen at each picklist change notification.
    pub picklist_views: Vec<Vec<String>>,
    pub images: Vec<(String, ImageHandle)>,
    pub finished: Vec<(TaskKind, TaskReport)>,
}

impl RecordingSink {
    pub fn observing(picklist: &WorkItemStore) -> Self {
        Self {
            picklist: picklist.clone(),
            statuses: Vec::new(),
            store_changes: Vec::new(),
            picklist_views: Vec::new(),
            images: Vec::new(),
            finished: Vec::new(),
        }
    }

    pub fn finished_of(&self, kind: TaskKind) -> Vec<&TaskReport> {
        self.finished
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, report)| report)
            .collect()
    }

    pub fn last_status(&self) -> Option<&(String, Option<u8>)> {
        self.statuses.last()
    }
}

impl ReporterSink for RecordingSink {
    fn on_status(&mut self, message: &str, percent: Option<u8>) {
        self.statuses.push((message.to_string(), percent));
    }

    fn on_store_changed(&mut self, store: StoreKind) {
        self.store_changes.push(store);
        if store == StoreKind::Picklist {
            let titles = self
                .picklist
                .snapshot()
                .unwrap()
                .iter()
                .map(|item| item.title.clone())
                .collect();
            self.picklist_views.push(titles);
        }
    }

    fn on_item_image_ready(&mut self, listing_id: &str, handle: ImageHandle) {
        self.images.push((listing_id.to_string(), handle));
    }

    fn on_task_finished(&mut self, kind: TaskKind, report: &TaskReport) {
        self.finished.push((kind, report.clone()));
    }
}

/// Pumps engine events on the test thread (the foreground) until `done` holds.
pub fn pump_until(
    engine: &EngineHandle,
    sink: &mut RecordingSink,
    mut done: impl FnMut(&RecordingSink) -> bool,
) {
    let deadline = Instant::now() + WAIT;
    loop {
        engine.pump(sink);
        if done(sink) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for engine events");
        thread::sleep(Duration::from_millis(5));
    }
}

/// Gives stray background work a chance to run, then drains once more.
pub fn settle(engine: &EngineHandle, sink: &mut RecordingSink) {
    thread::sleep(Duration::from_millis(100));
    engine.pump(sink);
}

pub fn wait_entered(rx: &mpsc::Receiver<String>, key: &str) {
    let entered = rx.recv_timeout(WAIT).expect("remote call never started");
    assert_eq!(entered, key);
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|id| id.to_string()).collect()
}
