//! Background feed loading.
//!
//! [`FeedAggregator`] fans a poll out to every active source, one tokio task
//! per request, and reports results to the UI as [`FeedEvent`]s over an
//! [`mpsc`] channel.
//!
//! ```text
//!  SourceRegistry ──changes──► FeedAggregator ──spawn──► DataSource::fetch
//!                                   │    ▲                     │
//!                                   │    └─ source_loaded / ◄──┘
//!                                   │       load_failed
//!                                   ▼
//!                           FeedEvent channel ──► App
//! ```
//!
//! ## Bookkeeping
//!
//! Per-source page counters, the in-flight table and the busy counter all
//! live in one mutex-guarded [`State`].  Events are sent while that lock is
//! held, so the order the UI sees them in is the order the state changed in.
//!
//! A request that is cancelled (because its source was switched off, or by
//! [`FeedAggregator::cancel_all_loading`]) releases its busy count right
//! away; should its response still turn up, the in-flight table no longer
//! knows its [`RequestId`] and the response is dropped untouched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::inflight::{InFlightTable, LoadingCounter, RequestId};
use crate::page_tracker::PageTracker;
use crate::registry::{Source, SourceRegistry};
use crate::source::{DataSources, Family, FeedItem};
use crate::weigher::weigher_for;

/// Tag a freshly fetched page with where it came from, then weigh it.
pub(crate) fn prepare_batch(items: &mut [FeedItem], key: &str, family: Family, page: u32) {
    for item in items.iter_mut() {
        item.page = page;
        item.data_source = key.to_string();
    }
    weigher_for(family).weigh(items);
}

/// Messages sent from the aggregator to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Nothing was loading and now something is.
    LoadingStarted,
    /// The last outstanding request has completed, failed or been cancelled.
    LoadingFinished,
    /// A weighed page of items from a single source.
    BatchReady(Vec<FeedItem>),
    /// The source with this key was switched off; its items should go.
    SourceDeactivated(String),
}

/// What [`FeedAggregator::load_source`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Dispatched { page: u32 },
    /// The source is switched off, or no longer in the registry.
    Inactive,
    /// A request for this source is still outstanding.
    AlreadyInFlight,
    /// No client is registered for the source's family.
    NoDataSource,
}

#[derive(Debug, Default)]
struct State {
    pages: PageTracker,
    inflight: InFlightTable,
    loading: LoadingCounter,
}

struct Inner {
    registry: SourceRegistry,
    sources: DataSources,
    events: mpsc::UnboundedSender<FeedEvent>,
    state: Mutex<State>,
}

/// Loads pages from every active source and merges them into one stream of
/// weighed batches.  Cloning yields another handle to the same aggregator.
///
/// Loading methods spawn tokio tasks and so must be called from within a
/// tokio runtime.
#[derive(Clone)]
pub struct FeedAggregator {
    inner: Arc<Inner>,
}

impl FeedAggregator {
    /// Create an aggregator over `registry`, fetching through `sources`.
    ///
    /// Returns the receiver the UI should drain for [`FeedEvent`]s.
    pub fn new(
        registry: SourceRegistry,
        sources: DataSources,
    ) -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pages = PageTracker::with_sources(
            registry.list_sources().iter().map(|s| s.key.as_str()),
        );
        let aggregator = Self {
            inner: Arc::new(Inner {
                registry,
                sources,
                events: tx,
                state: Mutex::new(State {
                    pages,
                    ..State::default()
                }),
            }),
        };
        (aggregator, rx)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FeedEvent) {
        // A closed channel means the UI is gone; there is nobody left to tell.
        let _ = self.inner.events.send(event);
    }

    fn loading_started(&self, state: &mut State) {
        if state.loading.started() {
            self.emit(FeedEvent::LoadingStarted);
        }
    }

    fn loading_finished(&self, state: &mut State) {
        if state.loading.finished() {
            self.emit(FeedEvent::LoadingFinished);
        }
    }

    /// Poll every active source once.
    pub fn load_all_active_sources(&self) {
        for source in self.inner.registry.list_sources() {
            if source.active {
                self.load_source(&source);
            }
        }
    }

    /// Request the next page of `source`.
    pub fn load_source(&self, source: &Source) -> LoadOutcome {
        if !source.active {
            return LoadOutcome::Inactive;
        }
        let family = source.kind.family();
        let Some(data_source) = self.inner.sources.get(family) else {
            warn!(source = %source.key, family = family.name(), "no data source registered");
            return LoadOutcome::NoDataSource;
        };

        let mut state = self.lock();
        // `source` may be a stale snapshot; the registry has the final say.
        if !self.inner.registry.get(&source.key).is_some_and(|s| s.active) {
            debug!(source = %source.key, "source no longer active, not dispatching");
            return LoadOutcome::Inactive;
        }
        if state.inflight.contains(&source.key) {
            debug!(source = %source.key, "already loading, not dispatching again");
            return LoadOutcome::AlreadyInFlight;
        }
        let page = state.pages.next_page(&source.key);
        let Some(request) = state.inflight.begin(&source.key, page) else {
            return LoadOutcome::AlreadyInFlight;
        };
        self.loading_started(&mut state);

        debug!(source = %source.key, page, request, "dispatching");
        let this = self.clone();
        let key = source.key.clone();
        let kind = source.kind.clone();
        let task = tokio::spawn(async move {
            match data_source.fetch(&kind, page).await {
                Ok(items) => this.source_loaded(&key, family, request, page, items),
                Err(err) => this.load_failed(&key, request, page, &err),
            }
        });
        state.inflight.attach(&source.key, request, task.abort_handle());

        LoadOutcome::Dispatched { page }
    }

    /// Completion path for a successful fetch.
    fn source_loaded(
        &self,
        key: &str,
        family: Family,
        request: RequestId,
        page: u32,
        mut items: Vec<FeedItem>,
    ) {
        let mut state = self.lock();
        if !state.inflight.finish(key, request) {
            debug!(source = %key, page, request, "dropping response to a cancelled request");
            return;
        }

        if items.is_empty() {
            debug!(source = %key, page, "empty page");
        } else if !state.pages.is_enabled(key) {
            debug!(source = %key, page, "source disabled while loading, dropping page");
        } else {
            prepare_batch(&mut items, key, family, page);
            debug!(source = %key, page, count = items.len(), "batch ready");
            self.emit(FeedEvent::BatchReady(items));
        }

        self.loading_finished(&mut state);
    }

    /// Completion path for a failed fetch.  No retry; the UI only learns
    /// that loading finished.
    fn load_failed(&self, key: &str, request: RequestId, page: u32, err: &FetchError) {
        let mut state = self.lock();
        if !state.inflight.finish(key, request) {
            debug!(source = %key, page, request, "ignoring failure of a cancelled request");
            return;
        }
        warn!(source = %key, page, error = %err, "load failed");
        self.loading_finished(&mut state);
    }

    /// React to a source being switched on or off.
    pub fn on_source_changed(&self, source: &Source) {
        if source.active {
            info!(source = %source.key, "source activated");
            self.load_source(source);
            return;
        }

        let mut state = self.lock();
        let page = state.inflight.page_for(&source.key);
        if state.inflight.cancel(&source.key) {
            debug!(source = %source.key, page = ?page, "cancelled in-flight request");
            self.loading_finished(&mut state);
        }
        state.pages.reset(&source.key);
        info!(source = %source.key, "source deactivated");
        self.emit(FeedEvent::SourceDeactivated(source.key.clone()));
    }

    /// Cancel every outstanding request.
    pub fn cancel_all_loading(&self) {
        let mut state = self.lock();
        let cancelled = state.inflight.cancel_all();
        if cancelled == 0 {
            return;
        }
        debug!(cancelled, "cancelled all loading");
        if state.loading.finished_many(cancelled) {
            self.emit(FeedEvent::LoadingFinished);
        }
    }

    /// Apply registry changes as they happen.  The returned task runs until
    /// aborted.
    pub fn watch(&self) -> JoinHandle<()> {
        let mut changes = self.inner.registry.subscribe();
        let this = self.clone();
        tokio::spawn(async move {
            while let Some(source) = changes.recv().await {
                this.on_source_changed(&source);
            }
        })
    }

    pub fn is_data_loading(&self) -> bool {
        self.lock().loading.is_loading()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.lock().inflight.contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().inflight.len()
    }

    /// The last page requested for `key`, or 0 if it has not been polled
    /// since it was enabled.
    pub fn current_page(&self, key: &str) -> u32 {
        self.lock().pages.current(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
