//! Command-line / environment configuration.
//!
//! Everything the fetchers need (endpoints, credentials, HTTP settings) is
//! collected here once and passed down explicitly.

use std::time::Duration;

use clap::Parser;

/// Aggregate Designer News, Dribbble, Product Hunt and DeviantArt into one
/// weighted feed.
#[derive(Debug, Clone, Parser)]
#[command(name = "plaid-feed", version, about)]
pub struct Args {
    /// Source key to enable (repeatable).  Replaces the default active set.
    #[arg(long = "source", value_name = "KEY")]
    pub sources: Vec<String>,

    /// Add an active Dribbble search for this query (repeatable).
    #[arg(long = "dribbble-query", value_name = "QUERY")]
    pub dribbble_queries: Vec<String>,

    /// Add an active Designer News search for this query (repeatable).
    #[arg(long = "designer-news-query", value_name = "QUERY")]
    pub designer_news_queries: Vec<String>,

    /// Run a one-off search across Designer News and Dribbble instead of
    /// loading the feed.
    #[arg(long)]
    pub search: Option<String>,

    /// Pages to load from every active source.
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Maximum number of feed lines to print.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Per-request HTTP timeout.
    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,

    #[arg(long, env = "DESIGNER_NEWS_CLIENT_ID", hide_env_values = true)]
    pub designer_news_client_id: Option<String>,

    #[arg(long, env = "DRIBBBLE_ACCESS_TOKEN", hide_env_values = true)]
    pub dribbble_access_token: Option<String>,

    /// Username of the signed-in Dribbble account.
    #[arg(long, env = "DRIBBBLE_USER")]
    pub dribbble_user: Option<String>,

    #[arg(long, env = "PRODUCT_HUNT_TOKEN", hide_env_values = true)]
    pub product_hunt_token: Option<String>,

    #[arg(long, env = "DEVIANTART_TOKEN", hide_env_values = true)]
    pub deviantart_token: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("plaid-feed/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Base URLs, each ending in `/`.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub designer_news: String,
    pub dribbble: String,
    pub dribbble_search: String,
    pub product_hunt: String,
    pub deviantart: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            designer_news: "https://www.designernews.co/".into(),
            dribbble: "https://api.dribbble.com/".into(),
            dribbble_search: "https://dribbble.com/".into(),
            product_hunt: "https://api.producthunt.com/".into(),
            deviantart: "https://www.deviantart.com/api/".into(),
        }
    }
}

/// API credentials.  Absent values simply mean the corresponding requests go
/// out unauthenticated (or, for account-only sources, fail).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub designer_news_client_id: Option<String>,
    pub dribbble_access_token: Option<String>,
    pub dribbble_user: Option<String>,
    pub product_hunt_token: Option<String>,
    pub deviantart_token: Option<String>,
}

impl Credentials {
    /// Both a token and a user are needed for the "my shots/likes" sources.
    pub fn dribbble_logged_in(&self) -> bool {
        self.dribbble_access_token.is_some() && self.dribbble_user.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub endpoints: Endpoints,
    pub credentials: Credentials,
    pub dribbble_per_page: u32,
    pub deviantart_per_page: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            endpoints: Endpoints::default(),
            credentials: Credentials::default(),
            dribbble_per_page: 30,
            deviantart_per_page: 12,
        }
    }
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Self {
            http: HttpConfig {
                timeout: Duration::from_secs(args.timeout_secs),
                ..HttpConfig::default()
            },
            credentials: Credentials {
                designer_news_client_id: args.designer_news_client_id.clone(),
                dribbble_access_token: args.dribbble_access_token.clone(),
                dribbble_user: args.dribbble_user.clone(),
                product_hunt_token: args.product_hunt_token.clone(),
                deviantart_token: args.deviantart_token.clone(),
            },
            ..Config::default()
        }
    }
}
