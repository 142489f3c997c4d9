use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, warn};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use cistern::{EventProcessor, FeedReader, MemoryStore, Settings, ShardedReplayer};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    // Optional explicit config path as the first argument
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_path(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Settings::new()
            .context("Failed to load config. Please ensure config.{toml,yaml,json} is valid")?,
    };

    SimpleLogger::new()
        .with_level(settings.level_filter())
        .init()
        .context("Failed to initialize logger")?;

    let feed_path = settings
        .replay
        .feed_path
        .clone()
        .context("replay.feed_path is not configured")?;

    let store = Arc::new(MemoryStore::new());
    let processor = EventProcessor::from_settings(store.clone(), &settings);
    let replayer = ShardedReplayer::new(processor, &settings.replay);

    let reader = FeedReader::open(&feed_path).await?;
    info!("Replaying feed {}", feed_path);

    let cancellation_token = CancellationToken::new();
    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal (Ctrl+C), stopping replay...");
            signal_token.cancel();
        }
    });

    let summary = replayer
        .run(reader.into_stream(), cancellation_token)
        .await
        .context("Replay failed")?;

    for (pool, e) in &summary.failed_pools {
        error!("Pool {} failed: {}", pool, e);
    }

    match &settings.replay.output_path {
        Some(output_path) => {
            let export = store.export()?;
            let json = serde_json::to_vec_pretty(&export).context("Failed to encode store")?;
            tokio::fs::write(output_path, json)
                .await
                .with_context(|| format!("Failed to write {}", output_path))?;
            info!(
                "Wrote {} pools, {} snapshots, {} records to {}",
                export.pools.len(),
                export.snapshots.len(),
                export.records.len(),
                output_path
            );
        }
        None => warn!("replay.output_path not set, final state is not persisted"),
    }

    Ok(())
}
