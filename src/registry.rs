//! The configured content sources and the user's on/off choices for them.
//!
//! A [`Source`] is identified by a stable string key; its [`SourceKind`]
//! carries whatever is needed to route it to the right fetcher and weigher.
//! The [`SourceRegistry`] is shared between the UI (which toggles sources)
//! and the aggregator (which reads them and subscribes to changes).

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;
use tracing::debug;

use crate::source::Family;

pub const SOURCE_DESIGNER_NEWS_POPULAR: &str = "SOURCE_DESIGNER_NEWS_POPULAR";
pub const SOURCE_DESIGNER_NEWS_RECENT: &str = "SOURCE_DESIGNER_NEWS_RECENT";
pub const SOURCE_DRIBBBLE_POPULAR: &str = "SOURCE_DRIBBBLE_POPULAR";
pub const SOURCE_DRIBBBLE_FOLLOWING: &str = "SOURCE_DRIBBBLE_FOLLOWING";
pub const SOURCE_DRIBBBLE_USER_LIKES: &str = "SOURCE_DRIBBBLE_USER_LIKES";
pub const SOURCE_DRIBBBLE_USER_SHOTS: &str = "SOURCE_DRIBBBLE_USER_SHOTS";
pub const SOURCE_DRIBBBLE_RECENT: &str = "SOURCE_DRIBBBLE_RECENT";
pub const SOURCE_DRIBBBLE_DEBUTS: &str = "SOURCE_DRIBBBLE_DEBUTS";
pub const SOURCE_DRIBBBLE_ANIMATED: &str = "SOURCE_DRIBBBLE_ANIMATED";
pub const SOURCE_PRODUCT_HUNT: &str = "SOURCE_PRODUCT_HUNT";
pub const SOURCE_DEVIANTART_POPULAR: &str = "SOURCE_DEVIANTART_POPULAR";

pub const DESIGNER_NEWS_QUERY_PREFIX: &str = "DESIGNER_NEWS_QUERY_";
pub const DRIBBBLE_QUERY_PREFIX: &str = "DRIBBBLE_QUERY_";

const DESIGNER_NEWS_SEARCH_SORT_ORDER: u32 = 200;
const DRIBBBLE_SEARCH_SORT_ORDER: u32 = 400;

/// What a source fetches.  Parameterised kinds carry their query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
    DesignerNewsPopular,
    DesignerNewsRecent,
    DesignerNewsSearch { query: String },
    DribbblePopular,
    DribbbleFollowing,
    DribbbleUserShots,
    DribbbleUserLikes,
    DribbbleRecent,
    DribbbleDebuts,
    DribbbleAnimated,
    DribbbleSearch { query: String },
    ProductHunt,
    DeviantArtPopular,
}

impl SourceKind {
    pub fn family(&self) -> Family {
        match self {
            SourceKind::DesignerNewsPopular
            | SourceKind::DesignerNewsRecent
            | SourceKind::DesignerNewsSearch { .. } => Family::DesignerNews,
            SourceKind::DribbblePopular
            | SourceKind::DribbbleFollowing
            | SourceKind::DribbbleUserShots
            | SourceKind::DribbbleUserLikes
            | SourceKind::DribbbleRecent
            | SourceKind::DribbbleDebuts
            | SourceKind::DribbbleAnimated
            | SourceKind::DribbbleSearch { .. } => Family::Dribbble,
            SourceKind::ProductHunt => Family::ProductHunt,
            SourceKind::DeviantArtPopular => Family::DeviantArt,
        }
    }

    /// The stable key sources of this kind are registered under.
    pub fn key(&self) -> String {
        match self {
            SourceKind::DesignerNewsPopular => SOURCE_DESIGNER_NEWS_POPULAR.into(),
            SourceKind::DesignerNewsRecent => SOURCE_DESIGNER_NEWS_RECENT.into(),
            SourceKind::DesignerNewsSearch { query } => {
                format!("{DESIGNER_NEWS_QUERY_PREFIX}{query}")
            }
            SourceKind::DribbblePopular => SOURCE_DRIBBBLE_POPULAR.into(),
            SourceKind::DribbbleFollowing => SOURCE_DRIBBBLE_FOLLOWING.into(),
            SourceKind::DribbbleUserShots => SOURCE_DRIBBBLE_USER_SHOTS.into(),
            SourceKind::DribbbleUserLikes => SOURCE_DRIBBBLE_USER_LIKES.into(),
            SourceKind::DribbbleRecent => SOURCE_DRIBBBLE_RECENT.into(),
            SourceKind::DribbbleDebuts => SOURCE_DRIBBBLE_DEBUTS.into(),
            SourceKind::DribbbleAnimated => SOURCE_DRIBBBLE_ANIMATED.into(),
            SourceKind::DribbbleSearch { query } => format!("{DRIBBBLE_QUERY_PREFIX}{query}"),
            SourceKind::ProductHunt => SOURCE_PRODUCT_HUNT.into(),
            SourceKind::DeviantArtPopular => SOURCE_DEVIANTART_POPULAR.into(),
        }
    }

    /// Inverse of [`SourceKind::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(query) = key.strip_prefix(DESIGNER_NEWS_QUERY_PREFIX) {
            return Some(SourceKind::DesignerNewsSearch { query: query.to_string() });
        }
        if let Some(query) = key.strip_prefix(DRIBBBLE_QUERY_PREFIX) {
            return Some(SourceKind::DribbbleSearch { query: query.to_string() });
        }
        let kind = match key {
            SOURCE_DESIGNER_NEWS_POPULAR => SourceKind::DesignerNewsPopular,
            SOURCE_DESIGNER_NEWS_RECENT => SourceKind::DesignerNewsRecent,
            SOURCE_DRIBBBLE_POPULAR => SourceKind::DribbblePopular,
            SOURCE_DRIBBBLE_FOLLOWING => SourceKind::DribbbleFollowing,
            SOURCE_DRIBBBLE_USER_SHOTS => SourceKind::DribbbleUserShots,
            SOURCE_DRIBBBLE_USER_LIKES => SourceKind::DribbbleUserLikes,
            SOURCE_DRIBBBLE_RECENT => SourceKind::DribbbleRecent,
            SOURCE_DRIBBBLE_DEBUTS => SourceKind::DribbbleDebuts,
            SOURCE_DRIBBBLE_ANIMATED => SourceKind::DribbbleAnimated,
            SOURCE_PRODUCT_HUNT => SourceKind::ProductHunt,
            SOURCE_DEVIANTART_POPULAR => SourceKind::DeviantArtPopular,
            _ => return None,
        };
        Some(kind)
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            SourceKind::DesignerNewsSearch { query } | SourceKind::DribbbleSearch { query } => {
                Some(query)
            }
            _ => None,
        }
    }
}

/// One configured content origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub key: String,
    pub name: String,
    /// Display priority; lower sorts first.
    pub sort_order: u32,
    pub active: bool,
    pub kind: SourceKind,
}

impl Source {
    pub fn new(kind: SourceKind, name: impl Into<String>, sort_order: u32, active: bool) -> Self {
        Self {
            key: kind.key(),
            name: name.into(),
            sort_order,
            active,
            kind,
        }
    }

    pub fn designer_news_search(query: impl Into<String>, active: bool) -> Self {
        let query = query.into();
        let name = format!("“{query}”");
        Self::new(
            SourceKind::DesignerNewsSearch { query },
            name,
            DESIGNER_NEWS_SEARCH_SORT_ORDER,
            active,
        )
    }

    pub fn dribbble_search(query: impl Into<String>, active: bool) -> Self {
        let query = query.into();
        let name = format!("“{query}”");
        Self::new(
            SourceKind::DribbbleSearch { query },
            name,
            DRIBBBLE_SEARCH_SORT_ORDER,
            active,
        )
    }

    /// Only user-added searches may be removed from the registry.
    pub fn is_dismissable(&self) -> bool {
        self.kind.query().is_some()
    }
}

/// The sources a fresh install starts with.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new(SourceKind::DesignerNewsPopular, "Designer News Popular", 100, true),
        Source::new(SourceKind::DesignerNewsRecent, "Designer News Recent", 101, false),
        Source::new(SourceKind::DribbblePopular, "Popular Dribbble Shots", 300, true),
        Source::new(SourceKind::DribbbleFollowing, "Dribbble Following", 301, false),
        Source::new(SourceKind::DribbbleUserShots, "My Dribbble Shots", 302, false),
        Source::new(SourceKind::DribbbleUserLikes, "My Dribbble Likes", 303, false),
        Source::new(SourceKind::DribbbleRecent, "Recent Dribbble Shots", 304, false),
        Source::new(SourceKind::DribbbleDebuts, "Dribbble Debuts", 305, false),
        Source::new(SourceKind::DribbbleAnimated, "Animated Dribbble Shots", 306, false),
        Source::dribbble_search("Material Design", true),
        Source::new(SourceKind::ProductHunt, "Product Hunt", 500, false),
        Source::new(SourceKind::DeviantArtPopular, "Popular Deviations", 600, false),
    ]
}

struct RegistryInner {
    sources: Vec<Source>,
    subscribers: Vec<mpsc::UnboundedSender<Source>>,
}

impl RegistryInner {
    /// Send `source` to every live subscriber, forgetting closed ones.
    fn notify(&mut self, source: &Source) {
        self.subscribers.retain(|tx| tx.send(source.clone()).is_ok());
    }
}

/// Shared, observable list of sources.  Cloning yields another handle to the
/// same registry.
#[derive(Clone)]
pub struct SourceRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl SourceRegistry {
    pub fn new(mut sources: Vec<Source>) -> Self {
        sources.sort_by_key(|s| s.sort_order);
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                sources,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_sources())
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// All sources, ordered by `sort_order`.
    pub fn list_sources(&self) -> Vec<Source> {
        self.read().sources.clone()
    }

    pub fn get(&self, key: &str) -> Option<Source> {
        self.read().sources.iter().find(|s| s.key == key).cloned()
    }

    /// Receive every source whose `active` flag changes from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Source> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.write().subscribers.push(tx);
        rx
    }

    /// Toggle a source.  Subscribers are only notified when the flag really
    /// changes; returns whether it did.
    pub fn set_active(&self, key: &str, active: bool) -> bool {
        let mut inner = self.write();
        let Some(source) = inner.sources.iter_mut().find(|s| s.key == key) else {
            return false;
        };
        if source.active == active {
            return false;
        }
        source.active = active;
        let changed = source.clone();
        debug!(source = %key, active, "source toggled");
        inner.notify(&changed);
        true
    }

    /// Register a new source (typically a search).  Returns `false` if the
    /// key is already taken.  An active addition is announced to subscribers
    /// so that it starts loading straight away.
    pub fn add_source(&self, source: Source) -> bool {
        let mut inner = self.write();
        if inner.sources.iter().any(|s| s.key == source.key) {
            return false;
        }
        let position = inner
            .sources
            .partition_point(|s| s.sort_order <= source.sort_order);
        inner.sources.insert(position, source.clone());
        if source.active {
            inner.notify(&source);
        }
        true
    }

    /// Remove a source.  Subscribers see it one last time, inactive, so any
    /// loading for it is torn down.
    pub fn remove_source(&self, key: &str) -> Option<Source> {
        let mut inner = self.write();
        let index = inner.sources.iter().position(|s| s.key == key)?;
        let mut removed = inner.sources.remove(index);
        if removed.active {
            removed.active = false;
            inner.notify(&removed);
        }
        Some(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ordered_by_sort_order() {
        let registry = SourceRegistry::with_defaults();
        let orders: Vec<u32> = registry.list_sources().iter().map(|s| s.sort_order).collect();

        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
        assert_eq!(registry.list_sources()[0].key, SOURCE_DESIGNER_NEWS_POPULAR);
    }

    #[test]
    fn default_active_set() {
        let active: Vec<String> = default_sources()
            .into_iter()
            .filter(|s| s.active)
            .map(|s| s.key)
            .collect();
        assert_eq!(
            active,
            [
                SOURCE_DESIGNER_NEWS_POPULAR.to_string(),
                SOURCE_DRIBBBLE_POPULAR.to_string(),
                "DRIBBBLE_QUERY_Material Design".to_string(),
            ]
        );
    }

    #[test]
    fn search_keys_parse_back_to_their_query() {
        let kind = SourceKind::from_key("DRIBBBLE_QUERY_Material Design").unwrap();
        assert_eq!(kind, SourceKind::DribbbleSearch { query: "Material Design".into() });
        assert_eq!(kind.family(), Family::Dribbble);

        let kind = SourceKind::from_key("DESIGNER_NEWS_QUERY_motion").unwrap();
        assert_eq!(kind.query(), Some("motion"));
        assert_eq!(kind.family(), Family::DesignerNews);
    }

    #[test]
    fn every_default_key_round_trips() {
        for source in default_sources() {
            assert_eq!(SourceKind::from_key(&source.key), Some(source.kind.clone()));
        }
        assert_eq!(SourceKind::from_key("SOURCE_HACKER_NEWS"), None);
    }

    #[test]
    fn only_searches_are_dismissable() {
        assert!(Source::designer_news_search("ux", true).is_dismissable());
        assert!(!Source::new(SourceKind::ProductHunt, "PH", 500, true).is_dismissable());
    }

    #[test]
    fn set_active_notifies_only_on_change() {
        let registry = SourceRegistry::with_defaults();
        let mut changes = registry.subscribe();

        assert!(!registry.set_active(SOURCE_DRIBBBLE_POPULAR, true), "already active");
        assert!(changes.try_recv().is_err());

        assert!(registry.set_active(SOURCE_DRIBBBLE_POPULAR, false));
        let changed = changes.try_recv().unwrap();
        assert_eq!(changed.key, SOURCE_DRIBBBLE_POPULAR);
        assert!(!changed.active);
        assert!(!registry.get(SOURCE_DRIBBBLE_POPULAR).unwrap().active);
    }

    #[test]
    fn set_active_on_unknown_key_is_noop() {
        let registry = SourceRegistry::with_defaults();
        assert!(!registry.set_active("nope", true));
    }

    #[test]
    fn add_source_keeps_sort_order_and_rejects_duplicates() {
        let registry = SourceRegistry::with_defaults();
        let mut changes = registry.subscribe();

        assert!(registry.add_source(Source::designer_news_search("motion", true)));
        assert!(!registry.add_source(Source::designer_news_search("motion", false)));

        let keys: Vec<String> = registry.list_sources().into_iter().map(|s| s.key).collect();
        let dn_recent = keys.iter().position(|k| k == SOURCE_DESIGNER_NEWS_RECENT).unwrap();
        let search = keys.iter().position(|k| k == "DESIGNER_NEWS_QUERY_motion").unwrap();
        let dribbble = keys.iter().position(|k| k == SOURCE_DRIBBBLE_POPULAR).unwrap();
        assert!(dn_recent < search && search < dribbble);

        assert_eq!(changes.try_recv().unwrap().key, "DESIGNER_NEWS_QUERY_motion");
        assert!(changes.try_recv().is_err(), "rejected duplicate is not announced");
    }

    #[test]
    fn remove_source_announces_deactivation() {
        let registry = SourceRegistry::with_defaults();
        let mut changes = registry.subscribe();

        let removed = registry.remove_source("DRIBBBLE_QUERY_Material Design").unwrap();
        assert!(!removed.active);
        assert!(registry.get("DRIBBBLE_QUERY_Material Design").is_none());

        let change = changes.try_recv().unwrap();
        assert_eq!(change.key, "DRIBBBLE_QUERY_Material Design");
        assert!(!change.active);
    }

    #[test]
    fn dropped_subscribers_are_forgotten() {
        let registry = SourceRegistry::with_defaults();
        drop(registry.subscribe());
        registry.set_active(SOURCE_PRODUCT_HUNT, true);
        assert!(registry.read().subscribers.is_empty());
    }
}
