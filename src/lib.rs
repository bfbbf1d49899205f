//! plaid-feed — one weighted feed from several design-news APIs.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌─────────────┐ changes ┌───────────────┐  spawn  ┌───────────┐
//! │ registry.rs │ ──────► │ aggregator.rs │ ──────► │  source/  │
//! │  (sources)  │         │ (fan-out)     │ ◄────── │ (HTTP)    │
//! └─────────────┘         └───────────────┘  items  └───────────┘
//!                           │  page_tracker, inflight, weigher
//!                           ▼ FeedEvent (channel)
//!                         ┌──────────┐
//!                         │  app.rs  │
//!                         │ (state)  │
//!                         └──────────┘
//! ```
//!
//! * **`source/`** — the `DataSource` trait, the shared `FeedItem` type and
//!   one client per API (Designer News, Dribbble, Product Hunt, DeviantArt).
//! * **`registry`** — the known sources, which are active, and change
//!   notification.
//! * **`aggregator`** — polls every active source, one task per request, and
//!   reports weighed batches as `FeedEvent`s.
//! * **`search`** — the same, for one ad-hoc query at a time.
//! * **`page_tracker`** / **`inflight`** — pagination and request
//!   bookkeeping used by both.
//! * **`weigher`** — turns engagement metrics into a sortable weight.
//! * **`app`** — merged, de-duplicated, weight-sorted item list.
//! * **`config`** / **`error`** — command line, credentials and errors.

pub mod aggregator;
pub mod app;
pub mod config;
pub mod error;
pub mod inflight;
pub mod page_tracker;
pub mod registry;
pub mod search;
pub mod source;
pub mod weigher;

#[cfg(test)]
mod testing;

pub use aggregator::{FeedAggregator, FeedEvent, LoadOutcome};
pub use app::App;
pub use registry::{Source, SourceKind, SourceRegistry};
pub use search::SearchManager;
