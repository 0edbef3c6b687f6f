use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod batch;
mod classify;
mod config;
mod extractors;
mod fetch;
mod rate_limit;
mod record;
mod update;

use config::Config;
use fetch::BrowserSession;
use update::PaperUpdater;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env();
    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        mode = ?config.fetch_mode,
        "Starting paper info update"
    );

    let session = Arc::new(BrowserSession::new(config.browser_settings()));
    let handlers = config.build_handlers(session.clone()).unwrap_or_else(|e| {
        tracing::error!("{:#}; records will be copied without updates", e);
        Vec::new()
    });
    let updater = PaperUpdater::new(handlers);

    let summary = batch::run_batch(&config.input, &config.output, &updater, session.as_ref()).await?;
    if summary.written {
        tracing::info!(
            "Done: {} papers, {} updated, {} already complete",
            summary.total,
            summary.updated,
            summary.skipped_complete
        );
    } else {
        tracing::warn!("Finished without writing {}", config.output.display());
    }
    Ok(())
}
