//! Ad-hoc searches across Designer News and Dribbble.
//!
//! A search is not a registry source: it has its own query, its own page
//! counter and its own busy count, but reports through the same
//! [`FeedEvent`]s as the feed so a UI can reuse its list handling.  Results
//! are tagged with the key of the matching search source
//! (`DESIGNER_NEWS_QUERY_<q>` / `DRIBBBLE_QUERY_<q>`); changing or
//! clearing the query reports `SourceDeactivated` for the old keys.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::aggregator::{prepare_batch, FeedEvent};
use crate::inflight::{InFlightTable, LoadingCounter};
use crate::registry::SourceKind;
use crate::source::{DataSources, FeedItem};

#[derive(Debug, Default)]
struct SearchState {
    query: Option<String>,
    page: u32,
    inflight: InFlightTable,
    loading: LoadingCounter,
}

struct Inner {
    sources: DataSources,
    events: mpsc::UnboundedSender<FeedEvent>,
    state: Mutex<SearchState>,
}

/// Runs one query at a time against every search-capable API.  Cloning
/// yields another handle to the same search.
#[derive(Clone)]
pub struct SearchManager {
    inner: Arc<Inner>,
}

fn search_kinds(query: &str) -> [SourceKind; 2] {
    [
        SourceKind::DesignerNewsSearch {
            query: query.to_string(),
        },
        SourceKind::DribbbleSearch {
            query: query.to_string(),
        },
    ]
}

impl SearchManager {
    pub fn new(sources: DataSources) -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = Self {
            inner: Arc::new(Inner {
                sources,
                events: tx,
                state: Mutex::new(SearchState::default()),
            }),
        };
        (manager, rx)
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FeedEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Search for `query`.
    ///
    /// A new query drops whatever the previous one was doing and starts at
    /// page 1; repeating the current query asks for its next page.  Returns
    /// the page requested, or `None` if nothing was dispatched (blank query,
    /// or the current page is still loading).
    pub fn search_for(&self, query: &str) -> Option<u32> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let mut state = self.lock();
        if state.query.as_deref() != Some(query) {
            self.reset(&mut state);
            info!(query, "new search");
            state.query = Some(query.to_string());
        } else if !state.inflight.is_empty() {
            debug!(query, page = state.page, "search page still loading");
            return None;
        }

        state.page += 1;
        let page = state.page;
        let mut dispatched = false;
        for kind in search_kinds(query) {
            dispatched |= self.dispatch(&mut state, kind, page);
        }
        if !dispatched {
            warn!(query, "no data source can search");
            state.page -= 1;
            return None;
        }
        Some(page)
    }

    /// Next page of the current query.
    pub fn load_more(&self) -> Option<u32> {
        let query = self.lock().query.clone()?;
        self.search_for(&query)
    }

    /// Cancel everything and forget the query, telling the UI to drop its
    /// results.
    pub fn clear(&self) {
        let mut state = self.lock();
        self.reset(&mut state);
    }

    pub fn query(&self) -> Option<String> {
        self.lock().query.clone()
    }

    pub fn page(&self) -> u32 {
        self.lock().page
    }

    pub fn is_data_loading(&self) -> bool {
        self.lock().loading.is_loading()
    }

    fn reset(&self, state: &mut SearchState) {
        let cancelled = state.inflight.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "cancelled search requests");
        }
        let was_loading = state.loading.is_loading();
        state.loading.reset();
        let previous = state.query.take();
        state.page = 0;
        if was_loading {
            self.emit(FeedEvent::LoadingFinished);
        }
        // Results of the old query are no longer wanted in the list.
        if let Some(previous) = previous {
            for kind in search_kinds(&previous) {
                self.emit(FeedEvent::SourceDeactivated(kind.key()));
            }
        }
    }

    fn dispatch(&self, state: &mut SearchState, kind: SourceKind, page: u32) -> bool {
        let family = kind.family();
        let Some(data_source) = self.inner.sources.get(family) else {
            return false;
        };
        let key = kind.key();
        let Some(request) = state.inflight.begin(&key, page) else {
            return false;
        };
        if state.loading.started() {
            self.emit(FeedEvent::LoadingStarted);
        }

        debug!(source = %key, page, request, "dispatching search");
        let this = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let result = data_source.fetch(&kind, page).await;
            let mut state = this.lock();
            if !state.inflight.finish(&task_key, request) {
                debug!(source = %task_key, page, request, "dropping stale search response");
                return;
            }
            match result {
                Ok(items) => this.deliver(&task_key, &kind, page, items),
                Err(err) => warn!(source = %task_key, page, error = %err, "search failed"),
            }
            if state.loading.finished() {
                this.emit(FeedEvent::LoadingFinished);
            }
        });
        state.inflight.attach(&key, request, task.abort_handle());
        true
    }

    fn deliver(&self, key: &str, kind: &SourceKind, page: u32, mut items: Vec<FeedItem>) {
        if items.is_empty() {
            debug!(source = %key, page, "no search results");
            return;
        }
        prepare_batch(&mut items, key, kind.family(), page);
        self.emit(FeedEvent::BatchReady(items));
    }

    #[cfg(test)]
    fn request_for(&self, key: &str) -> Option<crate::inflight::RequestId> {
        self.lock().inflight.request_for(key)
    }
}
