use log::info;

use pix_cache::{CacheStore, Config, ImageCache, RefreshScheduler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;

    info!("Starting pix-cache");
    info!("Picture directory: {}", config.picture_dir.display());
    info!("Database: {}", config.db_path.display());
    info!("Extraction workers: {}", config.workers);

    let store = CacheStore::open(&config.db_path).await?;
    let cache = ImageCache::new(store.clone(), &config);
    let scheduler = RefreshScheduler::new(cache);

    if let Some(report) = scheduler.refresh_now().await? {
        info!("Initial refresh wrote {} rows", report.rows_written());
    }

    if config.refresh_interval > 0 {
        let interval = u32::try_from(config.refresh_interval)?;
        scheduler.start(interval);

        tokio::signal::ctrl_c().await?;
        info!("Shutdown requested");
    }

    let stats = store.stats().await?;
    info!(
        "Cache holds {} folders, {} files, {} metadata rows",
        stats.folders, stats.files, stats.metas
    );

    store.close().await;
    Ok(())
}
