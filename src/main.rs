use std::process::ExitCode;

use dayflow_relay::config::Config;
use dayflow_relay::delivery::{DeliverySender, ReqwestTransport};
use dayflow_relay::queue::PersistentQueue;
use dayflow_relay::relay::Relay;
use dayflow_relay::security::redact_url;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dayflow_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "dayflow-relay exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default()?;
    let queue = PersistentQueue::open(config.queue.resolve_directory()?)?;
    info!(
        url = %redact_url(&config.webhook.url),
        queue = %queue.directory().display(),
        "starting"
    );

    let transport = ReqwestTransport::new(config.webhook.request_timeout())?;
    let sender = DeliverySender::new(&config.webhook, transport)?;

    // Nothing else is consuming the queue yet, so claims left on disk belong
    // to a run that died mid-flush.
    queue.recover_orphaned_claims()?;
    let pending = queue.count()?;

    let relay = Relay::new(sender, queue).configured(&config);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("ctrl-c received, shutting down");
        signal.cancel();
    });

    if pending > 0 {
        info!(pending, "flushing payloads left from an earlier run");
        relay.flush(&shutdown).await?;
    }
    relay.run(shutdown).await;
    Ok(())
}
