//! Plantwatch server entry point.

use api::{init_logging, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Plantwatch v{} ===", env!("CARGO_PKG_VERSION"));
    let settings = api::config::load()?;
    run_server(settings).await
}
