use menu_sheet_sync::catalog::{CatalogSync, SyncOutcome};
use menu_sheet_sync::config::{load_config, AppConfig};
use menu_sheet_sync::page::Page;
use menu_sheet_sync::source::HttpFetcher;
use std::fs;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let fetcher = match HttpFetcher::new() {
        Ok(f) => Arc::new(f),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return;
        }
    };
    let sync = CatalogSync::new(&config, fetcher);

    loop {
        info!("Starting sync cycle...");
        run_cycle(&sync, &config).await;

        let Some(interval) = config.check_interval_seconds else {
            break;
        };
        info!("Waiting {}s before the next cycle...", interval);
        sleep(Duration::from_secs(interval)).await;
    }
}

/// Reads the page, syncs it against the sheet and writes the result.
async fn run_cycle(sync: &CatalogSync, config: &AppConfig) {
    let html = match fs::read_to_string(&config.page.input) {
        Ok(html) => html,
        Err(e) => {
            warn!("Cannot read page {}: {}", config.page.input.display(), e);
            return;
        }
    };
    let mut page = Page::parse(&html);

    match sync.sync(&mut page).await {
        SyncOutcome::Reconciled { source, outcome } => {
            info!("Sync finished from {:?}: {:?}", source, outcome);
        }
        SyncOutcome::Failed { fallback_shown } => {
            warn!("Sync failed, fallback message shown: {}", fallback_shown);
        }
    }

    if let Err(e) = fs::write(&config.page.output, page.to_html()) {
        warn!("Failed to write page {}: {}", config.page.output.display(), e);
    } else {
        info!("Saved page: {}", config.page.output.display());
    }
}
