//! Matrix Node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process owning one RocksDB position store
//! - The engine sits behind one lock shared by every surface, so placements
//!   are serialized
//! - HTTP API for registration and reporting collaborators
//! - Unix admin socket for local admin ops (matrix-admin CLI)

use crate::admin_socket::{self, AdminSocket};
use crate::api;
use crate::error::{Error, Result};
use crate::storage::Storage;
use matrix_engine::MatrixEngine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Engine shared between the API and the admin socket.
pub type SharedEngine = Arc<RwLock<MatrixEngine<Storage>>>;

/// Default tree depth returned by the API when none is requested.
pub const DEFAULT_TREE_DEPTH: u8 = 3;

/// Configuration for a matrix node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Admin socket path (for matrix-admin CLI)
    pub admin_socket: PathBuf,

    /// Tree depth used when a request does not name one
    pub default_tree_depth: u8,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(admin_socket::DEFAULT_DATA_DIR);
        Self {
            admin_socket: data_dir.join("admin.sock"),
            data_dir,
            api_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            default_tree_depth: DEFAULT_TREE_DEPTH,
        }
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let data_dir = lookup("MATRIX_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let api_addr = match lookup("MATRIX_API_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("MATRIX_API_ADDR={}: {}", raw, e)))?,
            None => defaults.api_addr,
        };

        let default_tree_depth = match lookup("MATRIX_TREE_DEPTH") {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("MATRIX_TREE_DEPTH={}: {}", raw, e)))?,
            None => defaults.default_tree_depth,
        };

        let admin_socket = admin_socket::socket_path_from(&lookup);

        Ok(Self {
            data_dir,
            api_addr,
            admin_socket,
            default_tree_depth,
        })
    }
}

/// Shared state for API handlers.
#[derive(Clone)]
pub struct NodeState {
    pub engine: SharedEngine,
    pub config: NodeConfig,
}

/// A matrix node instance.
pub struct MatrixNode {
    state: NodeState,
}

impl MatrixNode {
    /// Create a new node, opening its storage.
    pub fn new(config: NodeConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let storage = Storage::open(config.data_dir.join("positions"))?;
        let engine = Arc::new(RwLock::new(MatrixEngine::new(storage)));

        Ok(Self {
            state: NodeState { engine, config },
        })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> NodeState {
        self.state.clone()
    }

    /// Run the node (starts HTTP server and admin socket).
    pub async fn run(self) -> Result<()> {
        let config = &self.state.config;
        tracing::info!("Matrix node starting");
        tracing::info!("  API: http://{}", config.api_addr);
        tracing::info!("  Admin: {:?}", config.admin_socket);
        tracing::info!("  Data: {:?}", config.data_dir);

        let admin_socket = AdminSocket::new(Arc::clone(&self.state.engine), &config.admin_socket);
        tokio::spawn(async move {
            if let Err(e) = admin_socket.run().await {
                tracing::error!("Admin socket error: {}", e);
            }
        });

        let app = api::build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
