use std::collections::HashSet;

use tracing::debug;

use crate::aggregator::FeedEvent;
use crate::source::{Family, FeedItem, ItemDetail};
use crate::weigher::{apply_boost, DUPE_WEIGHT_BOOST};

pub struct App {
    /// De-duplicated items, lightest weight first.
    pub items: Vec<FeedItem>,
    /// Identities already in `items`, to avoid inserting duplicates.
    seen: HashSet<(Family, String)>,
    /// Whether any source is loading.
    pub loading: bool,
    /// Last loading status message.
    pub status: String,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            loading: false,
            status: "Starting…".into(),
        }
    }

    /// Apply one message from the aggregator or the search manager.
    pub fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::LoadingStarted => {
                self.loading = true;
                self.status = "Loading…".into();
            }
            FeedEvent::LoadingFinished => {
                self.loading = false;
                self.status = format!("{} items", self.items.len());
            }
            FeedEvent::BatchReady(items) => self.merge_items(items),
            FeedEvent::SourceDeactivated(key) => self.remove_data_source(&key),
        }
    }

    /// Merge a freshly weighed batch, de-duplicate, and re-sort.
    ///
    /// An item another feed already delivered is not added again; the copy
    /// already listed gets [`DUPE_WEIGHT_BOOST`] instead.  The sort is
    /// stable, so items of equal weight keep arrival order.
    pub fn merge_items(&mut self, new_items: Vec<FeedItem>) {
        for item in new_items {
            if self.seen.insert((item.family(), item.id.clone())) {
                self.items.push(item);
                continue;
            }
            if let Some(existing) = self.items.iter_mut().find(|i| i.is_same_item(&item)) {
                if apply_boost(existing, DUPE_WEIGHT_BOOST) {
                    debug!(id = %existing.id, source = %item.data_source, "boosted duplicate");
                }
            }
        }
        self.items.sort_by(FeedItem::cmp_weight);
    }

    /// Drop every item that came from the source with `key`.
    pub fn remove_data_source(&mut self, key: &str) {
        let seen = &mut self.seen;
        self.items.retain(|item| {
            if item.data_source == key {
                seen.remove(&(item.family(), item.id.clone()));
                false
            } else {
                true
            }
        });
    }

    /// One line per item, for plain-text output.
    pub fn lines(&self, limit: usize) -> Vec<String> {
        self.items
            .iter()
            .take(limit)
            .map(|item| {
                let weight = item
                    .weight
                    .map(|w| format!("{w:>7.3}"))
                    .unwrap_or_else(|| format!("{:>7}", "-"));
                let url = item.url.as_deref().unwrap_or("");
                format!(
                    "{weight}  {:<8} {}  [{}] {}",
                    item.family().name(),
                    item.title,
                    engagement(&item.detail),
                    url
                )
                .trim_end()
                .to_string()
            })
            .collect()
    }
}

fn engagement(detail: &ItemDetail) -> String {
    match detail {
        ItemDetail::Story {
            vote_count,
            comment_count,
            ..
        } => format!("{vote_count} votes, {comment_count} comments"),
        ItemDetail::Shot { likes_count, .. } => format!("{likes_count} likes"),
        ItemDetail::Post {
            votes_count,
            comments_count,
            ..
        } => format!("{votes_count} votes, {comments_count} comments"),
        ItemDetail::Deviation { content_size, .. } => format!("{content_size} bytes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{post, shot, story};

    fn make_item(mut item: FeedItem, source: &str, weight: f32) -> FeedItem {
        item.data_source = source.to_string();
        item.page = weight.floor() as u32;
        item.weight = Some(weight);
        item
    }

    fn sample_items() -> Vec<FeedItem> {
        vec![
            make_item(shot("1", 10), "SOURCE_DRIBBBLE_POPULAR", 2.5),
            make_item(shot("2", 30), "SOURCE_DRIBBBLE_POPULAR", 1.0),
            make_item(shot("3", 20), "SOURCE_DRIBBBLE_POPULAR", 1.5),
        ]
    }

    fn ids(app: &App) -> Vec<&str> {
        app.items.iter().map(|i| i.id.as_str()).collect()
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty() {
        let app = App::new();
        assert!(app.items.is_empty());
        assert!(!app.loading);
    }

    // -- merge_items ---------------------------------------------------------

    #[test]
    fn merge_items_inserts_and_sorts_by_weight() {
        let mut app = App::new();
        app.merge_items(sample_items());

        assert_eq!(ids(&app), ["2", "3", "1"], "lightest first");
    }

    #[test]
    fn merge_items_interleaves_batches_from_different_sources() {
        let mut app = App::new();
        app.merge_items(sample_items());
        app.merge_items(vec![
            make_item(story("s1", 5, 1), "SOURCE_DESIGNER_NEWS_POPULAR", 1.2),
            make_item(story("s2", 1, 0), "SOURCE_DESIGNER_NEWS_POPULAR", 2.0),
        ]);

        assert_eq!(ids(&app), ["2", "s1", "3", "s2", "1"]);
    }

    #[test]
    fn merge_items_deduplicates_by_identity() {
        let mut app = App::new();
        let mut first = make_item(shot("dup", 5), "SOURCE_DRIBBBLE_POPULAR", 1.0);
        first.title = "First".into();
        app.merge_items(vec![first]);
        app.merge_items(vec![
            make_item(shot("dup", 5), "SOURCE_DRIBBBLE_RECENT", 1.2),
            make_item(shot("new", 5), "SOURCE_DRIBBBLE_RECENT", 1.1),
        ]);

        assert_eq!(app.items.len(), 2);
        // The first copy is kept, not overwritten.
        assert!(app.items.iter().any(|i| i.id == "dup" && i.title == "First"));
    }

    #[test]
    fn duplicate_shot_boosts_the_listed_copy() {
        let mut app = App::new();
        app.merge_items(vec![
            make_item(shot("dup", 5), "SOURCE_DRIBBBLE_POPULAR", 1.3),
            make_item(shot("other", 5), "SOURCE_DRIBBBLE_POPULAR", 1.5),
        ]);
        assert_eq!(ids(&app), ["dup", "other"]);

        app.merge_items(vec![make_item(shot("dup", 5), "SOURCE_DRIBBBLE_RECENT", 1.0)]);

        assert_eq!(app.items.len(), 2);
        assert_eq!(ids(&app), ["other", "dup"], "re-sorted after the boost");
        let dup = &app.items[1];
        assert_eq!(dup.data_source, "SOURCE_DRIBBBLE_POPULAR", "first copy kept");
        assert!((dup.weight.unwrap() - 1.7).abs() < 1e-4);
        match dup.detail {
            ItemDetail::Shot { weight_boost, .. } => assert_eq!(weight_boost, DUPE_WEIGHT_BOOST),
            ref other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn duplicate_boost_stays_within_the_page_and_does_not_stack() {
        let mut app = App::new();
        app.merge_items(vec![make_item(shot("dup", 5), "SOURCE_DRIBBBLE_POPULAR", 1.9)]);
        app.merge_items(vec![make_item(shot("dup", 5), "SOURCE_DRIBBBLE_RECENT", 1.0)]);
        app.merge_items(vec![make_item(shot("dup", 5), "SOURCE_DRIBBBLE_DEBUTS", 1.0)]);

        assert_eq!(app.items.len(), 1);
        assert!((app.items[0].weight.unwrap() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn duplicate_story_is_dropped_without_boost() {
        let mut app = App::new();
        app.merge_items(vec![make_item(story("s", 1, 1), "SOURCE_DESIGNER_NEWS_POPULAR", 1.2)]);
        app.merge_items(vec![make_item(story("s", 1, 1), "DESIGNER_NEWS_QUERY_motion", 1.0)]);

        assert_eq!(app.items.len(), 1);
        assert_eq!(app.items[0].weight, Some(1.2));
    }

    #[test]
    fn same_id_from_another_family_is_not_a_duplicate() {
        let mut app = App::new();
        app.merge_items(vec![
            make_item(shot("7", 1), "SOURCE_DRIBBBLE_POPULAR", 1.0),
            make_item(post("7", 1, 1), "SOURCE_PRODUCT_HUNT", 1.0),
        ]);
        assert_eq!(app.items.len(), 2);
    }

    #[test]
    fn merge_items_keeps_arrival_order_for_equal_weights() {
        let mut app = App::new();
        app.merge_items(vec![
            make_item(shot("a", 1), "SOURCE_DRIBBBLE_POPULAR", 1.0),
            make_item(shot("b", 1), "SOURCE_DRIBBBLE_POPULAR", 1.0),
        ]);
        app.merge_items(vec![make_item(story("c", 1, 1), "SOURCE_DESIGNER_NEWS_POPULAR", 1.0)]);
        assert_eq!(ids(&app), ["a", "b", "c"]);
    }

    #[test]
    fn unweighed_items_sort_last() {
        let mut app = App::new();
        app.merge_items(vec![shot("raw", 1)]);
        app.merge_items(sample_items());
        assert_eq!(app.items.last().unwrap().id, "raw");
    }

    #[test]
    fn merge_items_handles_empty_input() {
        let mut app = App::new();
        app.merge_items(vec![]);
        assert!(app.items.is_empty());
    }

    // -- remove_data_source --------------------------------------------------

    #[test]
    fn remove_data_source_drops_only_that_source() {
        let mut app = App::new();
        app.merge_items(sample_items());
        app.merge_items(vec![make_item(story("s", 1, 1), "SOURCE_DESIGNER_NEWS_POPULAR", 1.1)]);

        app.remove_data_source("SOURCE_DRIBBBLE_POPULAR");
        assert_eq!(ids(&app), ["s"]);
    }

    #[test]
    fn removed_items_can_come_back() {
        let mut app = App::new();
        app.merge_items(sample_items());
        app.remove_data_source("SOURCE_DRIBBBLE_POPULAR");
        app.merge_items(sample_items());
        assert_eq!(app.items.len(), 3);
    }

    // -- handle_event --------------------------------------------------------

    #[test]
    fn events_drive_loading_flag_and_list() {
        let mut app = App::new();
        app.handle_event(FeedEvent::LoadingStarted);
        assert!(app.loading);

        app.handle_event(FeedEvent::BatchReady(sample_items()));
        app.handle_event(FeedEvent::LoadingFinished);
        assert!(!app.loading);
        assert_eq!(app.status, "3 items");

        app.handle_event(FeedEvent::SourceDeactivated("SOURCE_DRIBBBLE_POPULAR".into()));
        assert!(app.items.is_empty());
    }

    // -- lines ---------------------------------------------------------------

    #[test]
    fn lines_respect_limit_and_show_weight() {
        let mut app = App::new();
        app.merge_items(sample_items());

        let lines = app.lines(2);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1.000  Dribbble"), "{}", lines[0]);
        assert!(lines[0].contains("Shot 2"));
        assert!(lines[0].contains("[30 likes]"));
    }
}
