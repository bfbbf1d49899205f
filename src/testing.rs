//! Test helpers: item builders and a scripted [`DataSource`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{FetchError, Result};
use crate::registry::SourceKind;
use crate::source::{DataSource, FeedItem, ItemDetail};

pub fn shot(id: &str, likes: u64) -> FeedItem {
    FeedItem::new(
        id,
        format!("Shot {id}"),
        ItemDetail::Shot {
            likes_count: likes,
            views_count: 0,
            comments_count: 0,
            image_url: None,
            animated: false,
            author: None,
            weight_boost: 0.0,
        },
    )
}

pub fn story(id: &str, votes: u32, comments: u32) -> FeedItem {
    FeedItem::new(
        id,
        format!("Story {id}"),
        ItemDetail::Story {
            vote_count: votes,
            comment_count: comments,
            hostname: None,
            badge: None,
        },
    )
}

pub fn post(id: &str, votes: u32, comments: u32) -> FeedItem {
    FeedItem::new(
        id,
        format!("Post {id}"),
        ItemDetail::Post {
            votes_count: votes,
            comments_count: comments,
            tagline: String::new(),
            discussion_url: None,
        },
    )
}

pub fn deviation(id: &str, size: u64) -> FeedItem {
    FeedItem::new(
        id,
        format!("Deviation {id}"),
        ItemDetail::Deviation {
            content_size: size,
            image_url: None,
        },
    )
}

/// What a [`MockSource`] does when asked for a page.
#[derive(Debug, Clone)]
pub enum Script {
    Items(Vec<FeedItem>),
    Empty,
    Fail,
    /// Never completes; only cancellation ends the request.
    Hang,
}

/// Every `(source key, page)` a mock was asked for, in order.
pub type CallLog = Arc<Mutex<Vec<(String, u32)>>>;

pub fn pages_requested(log: &CallLog, key: &str) -> Vec<u32> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, page)| *page)
        .collect()
}

pub struct MockSource {
    default: Script,
    by_key: HashMap<String, Script>,
    log: CallLog,
}

impl MockSource {
    pub fn new(default: Script) -> Self {
        Self {
            default,
            by_key: HashMap::new(),
            log: CallLog::default(),
        }
    }

    /// Use a different script for one source key.
    pub fn on(mut self, key: &str, script: Script) -> Self {
        self.by_key.insert(key.to_string(), script);
        self
    }

    /// Record calls into a shared log.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl DataSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, kind: &SourceKind, page: u32) -> Result<Vec<FeedItem>> {
        let key = kind.key();
        self.log.lock().unwrap().push((key.clone(), page));
        match self.by_key.get(&key).unwrap_or(&self.default).clone() {
            Script::Items(items) => Ok(items),
            Script::Empty => Ok(Vec::new()),
            Script::Fail => Err(FetchError::Status {
                source_name: "mock".into(),
                status: 503,
            }),
            Script::Hang => std::future::pending().await,
        }
    }
}
