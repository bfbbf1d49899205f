//! Per-source pagination counters.
//!
//! A stored value of 0 means "not polled since it was (re-)enabled"; the
//! aggregator leans on that to drop responses for sources that were switched
//! off while a request was in flight.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PageTracker {
    pages: HashMap<String, u32>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every given source at 0.
    pub fn with_sources<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            pages: keys.into_iter().map(|k| (k.to_string(), 0)).collect(),
        }
    }

    /// Advance `key` and return the page to request.  Unknown sources start
    /// at page 1.
    pub fn next_page(&mut self, key: &str) -> u32 {
        let page = self.pages.entry(key.to_string()).or_insert(0);
        *page += 1;
        *page
    }

    /// Forget progress so the next poll requests page 1 again.
    pub fn reset(&mut self, key: &str) {
        self.pages.insert(key.to_string(), 0);
    }

    /// True once `key` has been polled since it was last reset.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.current(key) != 0
    }

    /// The last page handed out for `key`, or 0.
    pub fn current(&self, key: &str) -> u32 {
        self.pages.get(key).copied().unwrap_or(0)
    }
}
