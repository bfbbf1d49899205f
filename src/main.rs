//! plaid-feed command line: load a few pages from every active source (or
//! run one search) and print the merged feed to stdout.  Logs go to stderr.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plaid_feed::config::{Args, Config};
use plaid_feed::registry::default_sources;
use plaid_feed::source::DataSources;
use plaid_feed::{App, FeedAggregator, FeedEvent, SearchManager, Source, SourceKind, SourceRegistry};

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let fallback = if verbose { "plaid_feed=debug" } else { "plaid_feed=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn source_for_key(key: &str) -> Result<Source> {
    let kind = SourceKind::from_key(key).with_context(|| format!("unknown source key {key}"))?;
    let source = match kind {
        SourceKind::DesignerNewsSearch { query } => Source::designer_news_search(query, true),
        SourceKind::DribbbleSearch { query } => Source::dribbble_search(query, true),
        kind => match default_sources().into_iter().find(|s| s.kind == kind) {
            Some(mut source) => {
                source.active = true;
                source
            }
            None => bail!("no default entry for source key {key}"),
        },
    };
    Ok(source)
}

/// The default catalogue, with `--source` replacing the active set and the
/// query flags adding searches.
fn build_registry(args: &Args) -> Result<SourceRegistry> {
    let registry = if args.sources.is_empty() {
        SourceRegistry::with_defaults()
    } else {
        let mut sources: Vec<Source> = default_sources()
            .into_iter()
            .filter(|s| !s.is_dismissable())
            .map(|mut s| {
                s.active = false;
                s
            })
            .collect();
        for key in &args.sources {
            let selected = source_for_key(key)?;
            sources.retain(|s| s.key != selected.key);
            sources.push(selected);
        }
        SourceRegistry::new(sources)
    };

    for query in &args.dribbble_queries {
        registry.add_source(Source::dribbble_search(query.as_str(), true));
    }
    for query in &args.designer_news_queries {
        registry.add_source(Source::designer_news_search(query.as_str(), true));
    }
    Ok(registry)
}

// ---------------------------------------------------------------------------
// Event draining
// ---------------------------------------------------------------------------

/// Feed events into `app` until loading finishes or `deadline` passes.
/// Returns `false` on timeout.
async fn drain_until_idle(
    rx: &mut mpsc::UnboundedReceiver<FeedEvent>,
    app: &mut App,
    loading: bool,
    deadline: Instant,
) -> bool {
    if !loading {
        while let Ok(event) = rx.try_recv() {
            app.handle_event(event);
        }
        return true;
    }
    loop {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) => {
                let finished = event == FeedEvent::LoadingFinished;
                app.handle_event(event);
                if finished {
                    return true;
                }
            }
            Ok(None) => return true,
            Err(_) => return false,
        }
    }
}

fn flush(rx: &mut mpsc::UnboundedReceiver<FeedEvent>, app: &mut App) {
    while let Ok(event) = rx.try_recv() {
        app.handle_event(event);
    }
}

async fn run_feed(args: &Args, sources: DataSources, app: &mut App) -> Result<()> {
    let registry = build_registry(args)?;
    let active: Vec<String> = registry
        .list_sources()
        .into_iter()
        .filter(|s| s.active)
        .map(|s| s.key)
        .collect();
    info!(sources = ?active, pages = args.pages, "loading feed");

    let (aggregator, mut rx) = FeedAggregator::new(registry, sources);
    let watcher = aggregator.watch();
    let wait = Duration::from_secs(args.timeout_secs.saturating_mul(2).max(1));

    for _ in 0..args.pages {
        aggregator.load_all_active_sources();
        let deadline = Instant::now() + wait;
        if !drain_until_idle(&mut rx, app, aggregator.is_data_loading(), deadline).await {
            warn!(in_flight = aggregator.in_flight_count(), "giving up on slow sources");
            aggregator.cancel_all_loading();
            flush(&mut rx, app);
        }
    }

    watcher.abort();
    Ok(())
}

async fn run_search(args: &Args, query: &str, sources: DataSources, app: &mut App) {
    let (search, mut rx) = SearchManager::new(sources);
    let wait = Duration::from_secs(args.timeout_secs.saturating_mul(2).max(1));

    for page in 0..args.pages {
        let dispatched = if page == 0 {
            search.search_for(query)
        } else {
            search.load_more()
        };
        if dispatched.is_none() {
            break;
        }
        let deadline = Instant::now() + wait;
        if !drain_until_idle(&mut rx, app, search.is_data_loading(), deadline).await {
            warn!(query, "giving up on slow search");
            search.clear();
            flush(&mut rx, app);
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // -- configure data sources ----------------------------------------------
    let config = Config::from_args(&args);
    let sources = DataSources::from_config(&config).context("building HTTP client")?;

    // -- load ----------------------------------------------------------------
    let mut app = App::new();
    match args.search.as_deref() {
        Some(query) => run_search(&args, query, sources, &mut app).await,
        None => run_feed(&args, sources, &mut app).await?,
    }

    // -- print ---------------------------------------------------------------
    info!(items = app.items.len(), "done");
    for line in app.lines(args.limit) {
        println!("{line}");
    }
    Ok(())
}
