use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use geo::Point;
use nextrip_core::bookmarks::{Bookmark, BookmarkStore};
use nextrip_core::catalogue::{load_catalogue, stops_around};
use nextrip_core::config::BoardConfig;
use nextrip_core::feed::{HttpFetcher, NexTripFeed};
use nextrip_core::notification::TracingSink;
use nextrip_core::refresh::{run_refresh_loop, SharedBoard};
use nextrip_core::storage::FsStorage;
use nextrip_core::{Board, NotificationSink};
use nextrip_transit::spatial::haversine_distance;
use nextrip_transit::{StaticTransitFeed, StopNumber, TransitFeed};
use tokio::sync::{oneshot, RwLock};
use tracing::{info, warn};
use tracing_subscriber::filter::{FilterFn, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(
    name = "nextrip-watcher",
    author,
    version,
    about = "Watch transit stops and log departure notifications"
)]
struct Args {
    /// JSON board configuration
    #[arg(short, long, env = "NEXTRIP_CONFIG")]
    config: Option<PathBuf>,

    /// Departures endpoint, `{stop}` is replaced with the stop number
    #[arg(long, env = "NEXTRIP_DEPARTURES_URL")]
    departures_url: Option<String>,

    /// Stop lookup endpoint used to resolve stop names
    #[arg(long, env = "NEXTRIP_STOP_URL")]
    stop_url: Option<String>,

    /// Directory holding saved-stops.json
    #[arg(long, env = "NEXTRIP_BOOKMARKS_DIR")]
    bookmarks_dir: Option<PathBuf>,

    /// JSON stop catalogue for nearby lookups and bookmark names
    #[arg(long, env = "NEXTRIP_CATALOGUE")]
    catalogue: Option<PathBuf>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh stops periodically and log notifications until interrupted
    Watch {
        /// Stops to watch in addition to configured and bookmarked ones
        #[arg(short, long = "stop")]
        stops: Vec<StopNumber>,

        /// Minutes before departure to notify
        #[arg(short, long)]
        lead_minutes: Option<u32>,

        #[arg(long)]
        interval_secs: Option<u64>,

        /// Ignore bookmarked stops
        #[arg(long)]
        no_bookmarks: bool,
    },
    /// List catalogue stops around a location
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Only stops within this many meters; without it the nearest stops are listed
        #[arg(short, long)]
        radius_m: Option<f64>,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// Bookmark the stops found
        #[arg(short, long)]
        bookmark: bool,
    },
    /// Manage bookmarked stops
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkAction,
    },
}

#[derive(Subcommand, Debug)]
enum BookmarkAction {
    Add { stops: Vec<StopNumber> },
    Remove { stops: Vec<StopNumber> },
    List,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = FilterFn::new(|meta| meta.module_path().unwrap_or_default().starts_with("nextrip"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .with(level)
        .init();
}

fn load_config(args: &Args) -> Result<BoardConfig> {
    let mut config = match &args.config {
        Some(path) => BoardConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BoardConfig::default(),
    };

    if let Some(url) = &args.departures_url {
        config.feed.departures_url = url.clone();
    }
    if let Some(url) = &args.stop_url {
        config.feed.stop_url = Some(url.clone());
    }
    if let Some(dir) = &args.bookmarks_dir {
        config.bookmarks_dir = Some(dir.clone());
    }
    if let Some(path) = &args.catalogue {
        config.catalogue = Some(path.clone());
    }
    if let Command::Watch { lead_minutes, interval_secs, .. } = &args.command {
        if let Some(lead) = lead_minutes {
            config.default_lead_minutes = *lead;
        }
        if let Some(secs) = interval_secs {
            config.refresh_interval_secs = *secs;
        }
    }

    config.validate()?;
    Ok(config)
}

fn bookmark_store(config: &BoardConfig) -> BookmarkStore<FsStorage> {
    let dir = config.bookmarks_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    BookmarkStore::new(FsStorage::new(dir))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = load_config(&args)?;
    let feed: Arc<dyn TransitFeed> = Arc::new(NexTripFeed::new(HttpFetcher::new(), &config.feed));

    match args.command {
        Command::Watch { stops, no_bookmarks, .. } => {
            watch(&config, feed, stops, no_bookmarks).await
        }
        Command::Nearby { lat, lon, radius_m, limit, bookmark } => {
            nearby(&config, Point::new(lon, lat), radius_m, limit, bookmark).await
        }
        Command::Bookmarks { action } => bookmarks(&config, feed.as_ref(), action).await,
    }
}

async fn catalogue(config: &BoardConfig) -> Result<Option<StaticTransitFeed>> {
    match &config.catalogue {
        Some(path) => Ok(Some(
            load_catalogue(path)
                .await
                .with_context(|| format!("Failed to load stop catalogue {}", path.display()))?,
        )),
        None => Ok(None),
    }
}

async fn nearby(
    config: &BoardConfig,
    point: Point,
    radius_m: Option<f64>,
    limit: usize,
    bookmark: bool,
) -> Result<()> {
    let Some(catalogue) = catalogue(config).await? else {
        bail!("No stop catalogue; pass --catalogue or set it in the config");
    };

    let found = stops_around(&catalogue, point, radius_m, limit);
    if found.is_empty() {
        info!("no stops found");
        return Ok(());
    }

    for stop in &found {
        let distance = stop
            .location
            .map(|loc| format!("{:.0} m", haversine_distance(point, loc)))
            .unwrap_or_default();
        println!("{}\t{}\t{}", stop.stop_number, stop.name, distance);
    }

    if bookmark {
        let saved = bookmark_store(config)
            .add(found.iter().map(|stop| Bookmark::from(&stop.metadata())))
            .await
            .context("Failed to save bookmarks")?;
        info!(bookmarks = saved.len(), "bookmarked nearby stops");
    }
    Ok(())
}

async fn watch(
    config: &BoardConfig,
    feed: Arc<dyn TransitFeed>,
    extra_stops: Vec<StopNumber>,
    no_bookmarks: bool,
) -> Result<()> {
    let mut stops = config.stops.clone();
    stops.extend(extra_stops);
    if !no_bookmarks {
        let saved = bookmark_store(config)
            .load()
            .await
            .context("Failed to load bookmarks")?;
        stops.extend(saved.into_iter().map(|b| b.stop_id));
    }
    if stops.is_empty() {
        bail!("No stops to watch; pass --stop, configure stops or add bookmarks");
    }

    let mut board = Board::new();
    let now = Utc::now();
    for stop in stops {
        if board.add_stop(stop.clone()) {
            board.set_notification(&stop, config.default_lead_minutes, now)?;
        }
    }
    info!(
        stops = board.stops().len(),
        lead_minutes = config.default_lead_minutes,
        "watching stops"
    );

    let board: SharedBoard = Arc::new(RwLock::new(board));
    let sink = Arc::new(TracingSink::new());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let refresh = tokio::spawn(run_refresh_loop(
        board.clone(),
        feed,
        sink.clone(),
        config.refresh_interval(),
        shutdown_rx,
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("shutting down");
    // The loop may already have exited on its own
    let _ = shutdown_tx.send(());
    refresh.await.context("Refresh loop panicked")?;

    let mut board = board.write().await;
    for stop in board.stop_numbers() {
        for request in board.close_stop(&stop)? {
            sink.cancel(request.id);
        }
    }

    Ok(())
}

async fn bookmarks(config: &BoardConfig, feed: &dyn TransitFeed, action: BookmarkAction) -> Result<()> {
    let store = bookmark_store(config);

    let saved = match action {
        BookmarkAction::Add { stops } => {
            let catalogue = catalogue(config).await?;
            let mut additions = Vec::with_capacity(stops.len());
            for stop in stops {
                additions.push(describe_stop(catalogue.as_ref(), feed, stop).await);
            }
            store.add(additions).await?
        }
        BookmarkAction::Remove { stops } => {
            let mut saved = Vec::new();
            for stop in &stops {
                saved = store.remove(stop).await?;
            }
            if stops.is_empty() {
                saved = store.load().await?;
            }
            saved
        }
        BookmarkAction::List => store.load().await?,
    };

    for bookmark in &saved {
        println!("{}\t{}", bookmark.stop_id, bookmark.stop_name);
    }
    Ok(())
}

/// Look a stop up for bookmarking: the catalogue first, then the feed, and
/// finally its number as the name
async fn describe_stop(
    catalogue: Option<&StaticTransitFeed>,
    feed: &dyn TransitFeed,
    stop: StopNumber,
) -> Bookmark {
    if let Some(record) = catalogue.and_then(|c| c.get_stop(&stop)) {
        return Bookmark::from(&record.metadata());
    }

    match feed.stop_metadata(&stop).await {
        Ok(meta) => Bookmark::from(&meta),
        Err(e) => {
            warn!(stop = %stop, error = %e, "stop lookup failed, saving without a name");
            Bookmark {
                stop_name: stop.to_string(),
                stop_id: stop,
                stop_lat: None,
                stop_lon: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_watch() {
        let args = Args::try_parse_from([
            "nextrip-watcher",
            "watch",
            "--stop",
            "56043",
            "-s",
            "17940",
            "--lead-minutes",
            "7",
        ])
        .unwrap();

        match args.command {
            Command::Watch { stops, lead_minutes, .. } => {
                assert_eq!(stops, vec![StopNumber::new("56043"), StopNumber::new("17940")]);
                assert_eq!(lead_minutes, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "nextrip-watcher",
            "--departures-url",
            "http://localhost/{stop}",
            "watch",
            "--interval-secs",
            "10",
        ])
        .unwrap();

        let config = load_config(&args).unwrap();
        assert_eq!(config.feed.departures_url, "http://localhost/{stop}");
        assert_eq!(config.refresh_interval_secs, 10);
    }

    #[test]
    fn test_args_parse_nearby() {
        let args = Args::try_parse_from([
            "nextrip-watcher",
            "--catalogue",
            "stops.json",
            "nearby",
            "--lat",
            "44.9556",
            "--lon",
            "-93.1672",
            "--radius-m",
            "400",
            "--bookmark",
        ])
        .unwrap();

        let config = load_config(&args).unwrap();
        assert_eq!(config.catalogue, Some(PathBuf::from("stops.json")));
        match args.command {
            Command::Nearby { lat, lon, radius_m, limit, bookmark } => {
                assert_eq!((lat, lon), (44.9556, -93.1672));
                assert_eq!(radius_m, Some(400.0));
                assert_eq!(limit, 5);
                assert!(bookmark);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_describe_stop_prefers_catalogue() {
        let catalogue = nextrip_core::catalogue::parse_catalogue(
            br#"[{"stop_id": 56043, "stop_name": "Snelling Ave & University Ave", "stop_lat": 44.9556, "stop_lon": -93.1672}]"#,
        )
        .unwrap();
        let feed = StaticTransitFeed::new();

        let bookmark = describe_stop(Some(&catalogue), &feed, StopNumber::new("56043")).await;
        assert_eq!(bookmark.stop_name, "Snelling Ave & University Ave");
        assert_eq!(bookmark.stop_lat, Some(44.9556));

        // Neither source knows the stop
        let bookmark = describe_stop(Some(&catalogue), &feed, StopNumber::new("1")).await;
        assert_eq!(bookmark.stop_name, "1");
        assert_eq!(bookmark.stop_lat, None);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let args =
            Args::try_parse_from(["nextrip-watcher", "watch", "--interval-secs", "0"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}
