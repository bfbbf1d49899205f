//! Per-family weight calculation.
//!
//! Each weigher looks at one freshly fetched page and turns engagement
//! metrics into a fraction in `[0, 1]`, where 0 is the most engaging item of
//! the batch.  The fraction is then offset by the item's page, so every item
//! of page `p` lands in `[p, p + 1]`: pages never interleave, but within a
//! page the popular items sort first.
//!
//! A batch-wide maximum of 0 would make the fraction undefined; in that case
//! the metric contributes 0, so an all-zero batch weighs `p + 1` throughout.

use crate::source::{Family, FeedItem, ItemDetail};

/// Assigns `weight` to every item of a batch that shares a family.
///
/// Items of another family are left untouched.
pub trait Weigher: Send + Sync {
    fn weigh(&self, batch: &mut [FeedItem]);
}

/// The weigher used for items of `family`.
pub fn weigher_for(family: Family) -> &'static dyn Weigher {
    match family {
        Family::DesignerNews => &StoryWeigher,
        Family::Dribbble => &ShotWeigher,
        Family::ProductHunt => &PostWeigher,
        Family::DeviantArt => &DeviationWeigher,
    }
}

fn fraction(value: f32, max: f32) -> f32 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

fn single_metric_interest(value: f32, max: f32) -> f32 {
    1.0 - fraction(value, max)
}

/// Votes and comments count equally.
fn dual_metric_interest(votes: f32, max_votes: f32, comments: f32, max_comments: f32) -> f32 {
    1.0 - (fraction(comments, max_comments) + fraction(votes, max_votes)) / 2.0
}

/// Offset by page and cap at the start of the next page.
fn scoped_to_page(page: u32, interest: f32, boost: f32) -> f32 {
    let page = page as f32;
    (page + interest + boost).min(page + 1.0)
}

/// Boost given to a shot that more than one feed returned.
pub const DUPE_WEIGHT_BOOST: f32 = 0.4;

/// Raise an already weighed shot's boost to `boost`, adjusting its weight
/// in place; the result still stays within the item's page.  Returns
/// whether anything changed.  Other families carry no boost.
pub fn apply_boost(item: &mut FeedItem, boost: f32) -> bool {
    let page = item.page;
    let ItemDetail::Shot { weight_boost, .. } = &mut item.detail else {
        return false;
    };
    let Some(weight) = item.weight else {
        return false;
    };
    if *weight_boost >= boost {
        return false;
    }
    let extra = boost - *weight_boost;
    *weight_boost = boost;
    item.weight = Some(scoped_to_page(page, weight - page as f32, extra));
    true
}

/// Dribbble shots: likes relative to the best-liked shot, plus any boost.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShotWeigher;

impl Weigher for ShotWeigher {
    fn weigh(&self, batch: &mut [FeedItem]) {
        let max_likes = batch
            .iter()
            .filter_map(|item| match item.detail {
                ItemDetail::Shot { likes_count, .. } => Some(likes_count),
                _ => None,
            })
            .max()
            .unwrap_or(0) as f32;

        for item in batch.iter_mut() {
            if let ItemDetail::Shot { likes_count, weight_boost, .. } = item.detail {
                let interest = single_metric_interest(likes_count as f32, max_likes);
                item.weight = Some(scoped_to_page(item.page, interest, weight_boost));
            }
        }
    }
}

/// Weigh every item `metrics` recognises by its `(votes, comments)`, each
/// measured against the batch maximum.
fn weigh_votes_and_comments(
    batch: &mut [FeedItem],
    metrics: impl Fn(&ItemDetail) -> Option<(u32, u32)>,
) {
    let (mut max_votes, mut max_comments) = (0u32, 0u32);
    for (votes, comments) in batch.iter().filter_map(|item| metrics(&item.detail)) {
        max_votes = max_votes.max(votes);
        max_comments = max_comments.max(comments);
    }

    for item in batch.iter_mut() {
        if let Some((votes, comments)) = metrics(&item.detail) {
            let interest = dual_metric_interest(
                votes as f32,
                max_votes as f32,
                comments as f32,
                max_comments as f32,
            );
            item.weight = Some(scoped_to_page(item.page, interest, 0.0));
        }
    }
}

/// Designer News stories: votes and comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoryWeigher;

impl Weigher for StoryWeigher {
    fn weigh(&self, batch: &mut [FeedItem]) {
        weigh_votes_and_comments(batch, |detail| match *detail {
            ItemDetail::Story { vote_count, comment_count, .. } => Some((vote_count, comment_count)),
            _ => None,
        });
    }
}

/// Product Hunt posts: votes and comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostWeigher;

impl Weigher for PostWeigher {
    fn weigh(&self, batch: &mut [FeedItem]) {
        weigh_votes_and_comments(batch, |detail| match *detail {
            ItemDetail::Post { votes_count, comments_count, .. } => Some((votes_count, comments_count)),
            _ => None,
        });
    }
}

/// DeviantArt deviations: image size until the API exposes favourites.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviationWeigher;

impl Weigher for DeviationWeigher {
    fn weigh(&self, batch: &mut [FeedItem]) {
        let max_size = batch
            .iter()
            .filter_map(|item| match item.detail {
                ItemDetail::Deviation { content_size, .. } => Some(content_size),
                _ => None,
            })
            .max()
            .unwrap_or(0) as f32;

        for item in batch.iter_mut() {
            if let ItemDetail::Deviation { content_size, .. } = item.detail {
                let interest = single_metric_interest(content_size as f32, max_size);
                item.weight = Some(scoped_to_page(item.page, interest, 0.0));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
