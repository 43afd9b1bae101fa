use std::{future::Future, time::Duration};

use once_cell::sync::Lazy;
use tracing::subscriber::set_global_default;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

fn configure_tracing() {
    LogTracer::builder()
        .ignore_crate("rustls")
        .with_max_level(log::LevelFilter::Debug)
        .init()
        .expect("Failed to create logger");

    let subscriber = Registry::default()
        .with(EnvFilter::try_from_env("LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
        .with(ErrorLayer::default());
    set_global_default(subscriber).expect("Setting subscriber");
}

/// Set `TEST_LOG` to see tracing output from the server under test.
pub static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        configure_tracing();
    }
});

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const POLL_TRIES: usize = 30;

/// Poll `f` until it returns `Some`. Gives up after 30 tries spaced 250ms
/// apart; the `Err` always means a timeout.
pub async fn wait_for<Fut, DATA>(f: impl Fn() -> Fut) -> Result<DATA, ()>
where
    Fut: Future<Output = Option<DATA>>,
    DATA: Send + Sync,
{
    for _ in 0..POLL_TRIES {
        if let Some(d) = f().await {
            return Ok(d);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Err(())
}
