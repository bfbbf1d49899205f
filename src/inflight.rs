//! Bookkeeping for outstanding requests.
//!
//! [`InFlightTable`] holds at most one request per source key, each tagged
//! with a [`RequestId`] so that a completion can tell whether it is still
//! the request the table knows about.  [`LoadingCounter`] is the busy count
//! behind the "is anything loading" indicator.

use std::collections::HashMap;

use tokio::task::AbortHandle;

/// Identifies one dispatched request.  Never reused within a table.
pub type RequestId = u64;

#[derive(Debug)]
struct InFlightRequest {
    id: RequestId,
    page: u32,
    handle: Option<AbortHandle>,
}

#[derive(Debug, Default)]
pub struct InFlightTable {
    requests: HashMap<String, InFlightRequest>,
    next_id: RequestId,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.requests.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// The id of the request outstanding for `key`, if any.
    pub fn request_for(&self, key: &str) -> Option<RequestId> {
        self.requests.get(key).map(|r| r.id)
    }

    /// The page being fetched for `key`, if any.
    pub fn page_for(&self, key: &str) -> Option<u32> {
        self.requests.get(key).map(|r| r.page)
    }

    /// Record a new request for `key`.  Returns `None` while another request
    /// for the same key is still outstanding.
    pub fn begin(&mut self, key: &str, page: u32) -> Option<RequestId> {
        if self.contains(key) {
            return None;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.requests.insert(
            key.to_string(),
            InFlightRequest {
                id,
                page,
                handle: None,
            },
        );
        Some(id)
    }

    /// Attach the task running request `id`.  Ignored if that request has
    /// already finished or been cancelled.
    pub fn attach(&mut self, key: &str, id: RequestId, handle: AbortHandle) {
        match self.requests.get_mut(key) {
            Some(request) if request.id == id => request.handle = Some(handle),
            _ => {}
        }
    }

    /// Remove request `id` for `key`.  Returns `false` if the table no
    /// longer tracks it, i.e. it was cancelled or superseded.
    pub fn finish(&mut self, key: &str, id: RequestId) -> bool {
        match self.requests.get(key) {
            Some(request) if request.id == id => {
                self.requests.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Abort and forget the request for `key`.  Returns whether there was one.
    pub fn cancel(&mut self, key: &str) -> bool {
        match self.requests.remove(key) {
            Some(request) => {
                if let Some(handle) = request.handle {
                    handle.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Abort everything.  Returns how many requests were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.requests.len();
        for (_, request) in self.requests.drain() {
            if let Some(handle) = request.handle {
                handle.abort();
            }
        }
        cancelled
    }
}

/// Number of requests that have started but not yet finished.
///
/// `started` and `finished` report the idle/busy transitions so callers only
/// notify listeners when the overall state flips.
#[derive(Debug, Default)]
pub struct LoadingCounter {
    count: usize,
}

impl LoadingCounter {
    /// Returns `true` if this start moved us from idle to busy.
    pub fn started(&mut self) -> bool {
        self.count += 1;
        self.count == 1
    }

    /// Returns `true` if this finish moved us from busy to idle.
    pub fn finished(&mut self) -> bool {
        match self.count {
            0 => false,
            _ => {
                self.count -= 1;
                self.count == 0
            }
        }
    }

    /// Release `n` requests at once, e.g. after a bulk cancel.
    pub fn finished_many(&mut self, n: usize) -> bool {
        if n == 0 || self.count == 0 {
            return false;
        }
        self.count = self.count.saturating_sub(n);
        self.count == 0
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn is_loading(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- InFlightTable -------------------------------------------------------

    #[test]
    fn at_most_one_request_per_key() {
        let mut table = InFlightTable::new();
        let first = table.begin("a", 1);
        assert!(first.is_some());
        assert_eq!(table.begin("a", 2), None);
        assert_eq!(table.page_for("a"), Some(1));

        assert!(table.begin("b", 1).is_some(), "other keys are independent");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn finish_ignores_stale_ids() {
        let mut table = InFlightTable::new();
        let old = table.begin("a", 1).unwrap();
        assert!(table.cancel("a"));
        let new = table.begin("a", 1).unwrap();
        assert_ne!(old, new);

        assert!(!table.finish("a", old), "cancelled request no longer tracked");
        assert!(table.contains("a"));
        assert!(table.finish("a", new));
        assert!(table.is_empty());
    }

    #[test]
    fn cancel_unknown_key_reports_nothing() {
        let mut table = InFlightTable::new();
        assert!(!table.cancel("missing"));
    }

    #[tokio::test]
    async fn cancel_aborts_the_running_task() {
        let mut table = InFlightTable::new();
        let id = table.begin("a", 1).unwrap();
        let task = tokio::spawn(std::future::pending::<()>());
        table.attach("a", id, task.abort_handle());

        assert!(table.cancel("a"));
        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_all_aborts_everything() {
        let mut table = InFlightTable::new();
        let mut tasks = Vec::new();
        for key in ["a", "b", "c"] {
            let id = table.begin(key, 1).unwrap();
            let task = tokio::spawn(std::future::pending::<()>());
            table.attach(key, id, task.abort_handle());
            tasks.push(task);
        }

        assert_eq!(table.cancel_all(), 3);
        assert!(table.is_empty());
        for task in tasks {
            assert!(task.await.unwrap_err().is_cancelled());
        }
    }

    // -- LoadingCounter ------------------------------------------------------

    #[test]
    fn counter_reports_only_transitions() {
        let mut counter = LoadingCounter::default();
        assert!(counter.started());
        assert!(!counter.started());
        assert!(!counter.finished());
        assert!(counter.is_loading());
        assert!(counter.finished());
        assert!(!counter.is_loading());
    }

    #[test]
    fn counter_never_underflows() {
        let mut counter = LoadingCounter::default();
        assert!(!counter.finished());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn finished_many_releases_in_bulk() {
        let mut counter = LoadingCounter::default();
        counter.started();
        counter.started();
        counter.started();
        assert!(!counter.finished_many(2));
        assert_eq!(counter.count(), 1);
        assert!(counter.finished_many(5));
        assert!(!counter.finished_many(1));
    }
}
