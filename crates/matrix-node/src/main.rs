//! Matrix Node binary
//!
//! Serves a persistent forced matrix over HTTP and a local admin socket.

use matrix_node::{MatrixNode, NodeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matrix_node=info,matrix_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Matrix Node");

    let config = NodeConfig::from_env()?;

    let node = MatrixNode::new(config)?;
    node.run().await?;

    Ok(())
}
