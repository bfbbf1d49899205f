//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait, the common [`FeedItem`]
//! type and [`DataSources`], the routing table from an API [`Family`] to the
//! client that serves it.  Concrete clients live in sub-modules, one per API.
//!
//! ## For contributors: adding a new API
//!
//! 1. Add a [`Family`] variant and an [`ItemDetail`] variant in `feed_item.rs`.
//! 2. Add the source kinds to `registry.rs` and a weigher to `weigher.rs`.
//! 3. Create a client module here implementing [`DataSource`]; keep JSON
//!    conversion in a pure `parse_*` function so it can be tested offline.
//! 4. Register it in [`DataSources::from_config`].

mod deviantart;
mod designer_news;
mod dribbble;
mod feed_item;
mod http;
mod product_hunt;

pub use deviantart::DeviantArtSource;
pub use designer_news::DesignerNewsSource;
pub use dribbble::DribbbleSource;
pub use feed_item::{Family, FeedItem, ItemDetail};
pub use product_hunt::ProductHuntSource;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::registry::SourceKind;

/// Trait that every API client must implement.
///
/// The aggregator calls [`fetch()`](DataSource::fetch) from spawned tokio
/// tasks, so implementations must be `Send + Sync`.
///
/// ## Implementing a new source
///
/// ```ignore
/// pub struct MySource { /* client, endpoint, credentials */ }
///
/// #[async_trait]
/// impl DataSource for MySource {
///     fn name(&self) -> &str { "my-api" }
///
///     async fn fetch(&self, kind: &SourceKind, page: u32) -> Result<Vec<FeedItem>> {
///         // Perform HTTP, then convert into FeedItem values.
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Label used in logs and error messages.
    fn name(&self) -> &str;

    /// Fetch one page of `kind`, in the API's own ranking order.
    ///
    /// `page` is 1-based; clients for 0-based APIs adjust it themselves.
    async fn fetch(&self, kind: &SourceKind, page: u32) -> Result<Vec<FeedItem>>;
}

/// The error for a kind routed to a client that does not serve it.
pub(crate) fn unsupported(source: &dyn DataSource, kind: &SourceKind) -> FetchError {
    FetchError::Unsupported {
        source_name: source.name().to_string(),
        key: kind.key(),
    }
}

/// Routes each [`Family`] to the client that fetches it.
#[derive(Clone, Default)]
pub struct DataSources {
    by_family: HashMap<Family, Arc<dyn DataSource>>,
}

impl DataSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the real HTTP clients.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http::build_client(&config.http)?;
        let endpoints = &config.endpoints;
        let credentials = &config.credentials;

        Ok(Self::new()
            .with(
                Family::DesignerNews,
                DesignerNewsSource::new(
                    client.clone(),
                    &endpoints.designer_news,
                    credentials.designer_news_client_id.clone(),
                ),
            )
            .with(
                Family::Dribbble,
                DribbbleSource::new(
                    client.clone(),
                    &endpoints.dribbble,
                    &endpoints.dribbble_search,
                    credentials,
                    config.dribbble_per_page,
                ),
            )
            .with(
                Family::ProductHunt,
                ProductHuntSource::new(
                    client.clone(),
                    &endpoints.product_hunt,
                    credentials.product_hunt_token.clone(),
                ),
            )
            .with(
                Family::DeviantArt,
                DeviantArtSource::new(
                    client,
                    &endpoints.deviantart,
                    credentials.deviantart_token.clone(),
                    config.deviantart_per_page,
                ),
            ))
    }

    /// Register (or replace) the client for `family`.
    pub fn with(mut self, family: Family, source: impl DataSource + 'static) -> Self {
        self.by_family.insert(family, Arc::new(source));
        self
    }

    pub fn get(&self, family: Family) -> Option<Arc<dyn DataSource>> {
        self.by_family.get(&family).cloned()
    }
}
