use clap::Parser;
use fave_rank::host::web::WebDriverPage;
use fave_rank::host::HostPage;
use fave_rank::store::{self, JsonFileStore};
use fave_rank::{
    Activation, CollectorConfig, Handled, ItemRecord, Outcome, Session, SettlePolicy,
};
use std::time::Duration;
use tokio::sync::watch;

mod args;
use args::{Args, Mode};

/// How often the page-side controls are polled in watch mode
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            return;
        }
    };

    let state_store = JsonFileStore::new(&config.state_path);

    if let Some(enabled) = args.set_enabled {
        match store::save_enabled(&state_store, enabled).await {
            Ok(()) => ::log::info!("Sorting {}", if enabled { "enabled" } else { "disabled" }),
            Err(e) => ::log::error!("Failed to save enable flag: {}", e),
        }
        return;
    }

    println!("Note: fave-rank requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default {}",
        config.webdriver_url
    );

    let host = match WebDriverPage::connect(&config.webdriver_url, config.notice_ttl_ms).await {
        Ok(host) => host,
        Err(e) => {
            ::log::error!("Failed to start browser session: {}", e);
            return;
        }
    };

    if let Some(url) = &config.start_url {
        if let Err(e) = host.open(url).await {
            ::log::error!("Failed to open {}: {}", url, e);
            host.close().await;
            return;
        }
    }

    let mut session = Session::new(state_store, host, config);

    // Ctrl-C disables further cycles; a stored run stays resumable
    let enable = session.enable_handle();
    let (shutdown_tx, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::warn!("Interrupted, stopping after the current step");
            enable.send_replace(false);
            shutdown_tx.send_replace(true);
        }
    });

    match session.activate().await {
        Activation::Disabled => {
            ::log::info!("Sorting is disabled; run with --set-enabled true to turn it on");
            if args.mode == Mode::Watch {
                watch_page(&mut session, args.output.as_deref(), &shutdown).await;
            }
        }
        Activation::Resumed(outcome) => {
            report(&outcome, args.output.as_deref());
            if args.mode == Mode::Watch {
                watch_page(&mut session, args.output.as_deref(), &shutdown).await;
            }
        }
        Activation::Idle => match args.mode {
            Mode::Current => {
                if let Ok(items) = session.sort_current_page().await {
                    write_output(&items, args.output.as_deref());
                }
            }
            Mode::All => {
                if let Ok(outcome) = session.sort_all_pages().await {
                    report(&outcome, args.output.as_deref());
                }
            }
            Mode::Watch => watch_page(&mut session, args.output.as_deref(), &shutdown).await,
        },
    }

    session.into_host().close().await;
}

/// Builds the configuration from the optional file and command-line overrides
fn load_config(args: &Args) -> Result<CollectorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => CollectorConfig::from_file(path)?,
        None => CollectorConfig::default(),
    };

    if let Some(uri) = &args.uri {
        config.start_url = Some(uri.clone());
    }
    if let Some(state) = &args.state {
        config.state_path = state.clone();
    }
    if let Some(delay_ms) = args.settle_ms {
        config.settle = SettlePolicy::Fixed { delay_ms };
    }
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }

    Ok(config.with_env_overrides())
}

/// Acts on clicks of the in-page controls until interrupted
async fn watch_page(
    session: &mut Session<JsonFileStore, WebDriverPage>,
    output: Option<&str>,
    shutdown: &watch::Receiver<bool>,
) {
    ::log::info!("Waiting for sort requests from the page (Ctrl-C to stop)");

    while !*shutdown.borrow() {
        tokio::time::sleep(POLL_INTERVAL).await;

        match session.poll().await {
            None => {}
            Some(Ok(Handled::Sorted(items))) => write_output(&items, output),
            Some(Ok(Handled::Collected(outcome))) => report(&outcome, output),
            Some(Ok(Handled::Restored(_))) => {}
            Some(Err(e)) => ::log::warn!("Request not completed: {}", e),
        }
    }
}

fn report(outcome: &Outcome, output: Option<&str>) {
    match outcome {
        Outcome::Completed(items) => {
            ::log::info!("Sorted {} items by favorites", items.len());
            write_output(items, output);
        }
        Outcome::Suspended(state) => {
            ::log::info!(
                "Collection paused at page {} with {} items; run again to resume",
                state.current_page,
                state.items.len()
            );
        }
        Outcome::Failed(message) => ::log::error!("Collection failed: {}", message),
    }
}

fn write_output(items: &[ItemRecord], output: Option<&str>) {
    let Some(path) = output else {
        return;
    };

    let result = std::fs::File::create(path)
        .map_err(|e| e.to_string())
        .and_then(|file| serde_json::to_writer_pretty(file, items).map_err(|e| e.to_string()));
    match result {
        Ok(()) => ::log::info!("Wrote {} items to {}", items.len(), path),
        Err(e) => ::log::error!("Failed to write {}: {}", path, e),
    }
}
