use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use hookshot::config::HookshotConfig;
use hookshot::handlers::default_registry;
use hookshot::runner::run_hook;
use hookshot::transcript::TranscriptStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout belongs to the response line; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hookshot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let category = std::env::args().nth(1).unwrap_or_default();
    let config = HookshotConfig::load()?;

    let store = Arc::new(TranscriptStore::new());
    let _sweeper = store.start_sweeper();
    let registry = default_registry(&config, Arc::clone(&store));

    let outcome = run_hook(
        &category,
        &registry,
        tokio::io::stdin(),
        tokio::io::stdout(),
    )
    .await?;

    if outcome.terminal {
        // Session-end events must not linger once the response is out.
        std::process::exit(0);
    }
    Ok(())
}
