//! Monitor daemon: polls the source, records the timeline, sends
//! notifications and serves the HTTP API until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use powerwatch::api::{self, SharedState};
use powerwatch::config::Config;
use powerwatch::monitor::Monitor;
use powerwatch::notify::{LogNotifier, Notifier, WebhookNotifier};
use powerwatch::source::HttpSampleSource;
use powerwatch::store::JsonFileStore;
use powerwatch::tracing::{self, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    tracing::init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        source = %config.source.url,
        data_dir = %config.data_dir.display(),
        check_interval = ?config.monitor.check_interval,
        "Starting powerwatch"
    );

    let source = Arc::new(HttpSampleSource::new(
        config.source.url.clone(),
        config.source.pointer.clone(),
        config.source.token.clone(),
    ));
    let notifier: Arc<dyn Notifier> = match &config.notify_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => {
            warn!("POWERWATCH_NOTIFY_URL not set, notifications go to the log only");
            Arc::new(LogNotifier)
        }
    };
    let store = Box::new(JsonFileStore::new(&config.data_dir));

    let monitor = Monitor::new(config.monitor.clone(), store, source, notifier);

    let shutdown = CancellationToken::new();
    let tracker = TaskTracker::new();

    tracker.spawn(monitor.clone().run_sampler(shutdown.clone()));
    tracker.spawn(monitor.clone().run_scheduler(shutdown.clone()));
    tracker.spawn({
        let shutdown = shutdown.clone();
        let state = SharedState { monitor };
        async move {
            if let Err(e) = api::serve(config.api_addr, state, shutdown.clone()).await {
                error!(error = %e, "API server failed");
                shutdown.cancel();
            }
        }
    });
    tracker.close();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();
    tracker.wait().await;

    info!("Stopped");
    Ok(())
}
