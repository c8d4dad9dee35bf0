//! Matrix Node - persistent forced matrix service
//!
//! Hosts a [`matrix_engine::MatrixEngine`] over RocksDB and exposes it to
//! the registration workflow and reporting collaborators.
//!
//! # Architecture
//!
//! - **Storage**: RocksDB-backed position store with atomic placement commits
//! - **Node**: configuration and the shared, lock-guarded engine
//! - **API**: HTTP endpoints for placement, stats, tree and upline views
//! - **Admin Socket**: Unix socket for local admin commands (matrix-admin CLI)
//!
//! # Example
//!
//! ```no_run
//! use matrix_node::{MatrixNode, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::from_env()?;
//!     let node = MatrixNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod storage;
pub mod node;
pub mod api;
pub mod admin_socket;
pub mod error;

pub use storage::Storage;
pub use node::{MatrixNode, NodeConfig, NodeState, SharedEngine};
pub use error::{Error, Result};
