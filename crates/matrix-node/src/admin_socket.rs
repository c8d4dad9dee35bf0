//! Unix socket server for admin commands.
//!
//! Provides a local IPC interface for placing members by hand, toggling
//! activity and inspecting the matrix.

use crate::error::Result;
use crate::node::SharedEngine;
use matrix_engine::{check_invariants, PositionStore, UserId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Data directory used when `MATRIX_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "./matrix-data";

/// Admin command sent over the socket.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Place a member, optionally under a sponsor
    Place {
        user_id: UserId,
        #[serde(default)]
        sponsor_id: Option<UserId>,
    },
    /// Mark a position active again
    Activate { user_id: UserId },
    /// Mark a position inactive
    Deactivate { user_id: UserId },
    /// Network statistics for a member
    Stats { user_id: UserId },
    /// Matrix-wide summary
    Overview,
    /// Verify structural invariants over every stored position
    Check,
    /// Ping (health check)
    Ping,
}

/// Response from admin command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    Report { report: serde_json::Value },
    Pong,
}

impl AdminResponse {
    fn error(e: impl std::fmt::Display) -> Self {
        AdminResponse::Error {
            error: e.to_string(),
        }
    }

    fn report(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(report) => AdminResponse::Report { report },
            Err(e) => AdminResponse::error(e),
        }
    }
}

/// Admin socket server.
pub struct AdminSocket {
    engine: SharedEngine,
    socket_path: PathBuf,
}

impl AdminSocket {
    /// Create a new admin socket server.
    pub fn new(engine: SharedEngine, socket_path: &Path) -> Self {
        Self {
            engine,
            socket_path: socket_path.to_path_buf(),
        }
    }

    /// Run the admin socket server.
    pub async fn run(&self) -> Result<()> {
        // Remove existing socket file if present
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Admin socket listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let engine = SharedEngine::clone(&self.engine);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, engine).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, engine: SharedEngine) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => execute_command(cmd, &engine).await,
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

/// Run one admin command against the shared engine.
pub async fn execute_command(cmd: AdminCommand, engine: &SharedEngine) -> AdminResponse {
    match cmd {
        AdminCommand::Place {
            user_id,
            sponsor_id,
        } => match engine.write().await.place(user_id, sponsor_id) {
            Ok(position) => AdminResponse::Ok {
                message: format!(
                    "Placed {} at level {} position {}",
                    user_id, position.level, position.position
                ),
            },
            Err(e) => AdminResponse::error(e),
        },

        AdminCommand::Activate { user_id } => set_active(engine, user_id, true).await,

        AdminCommand::Deactivate { user_id } => set_active(engine, user_id, false).await,

        AdminCommand::Stats { user_id } => match engine.read().await.network_stats(user_id) {
            Ok(stats) => AdminResponse::report(stats),
            Err(e) => AdminResponse::error(e),
        },

        AdminCommand::Overview => match engine.read().await.overview() {
            Ok(overview) => AdminResponse::report(overview),
            Err(e) => AdminResponse::error(e),
        },

        AdminCommand::Check => {
            let positions = match engine.read().await.store().positions() {
                Ok(positions) => positions,
                Err(e) => return AdminResponse::error(e),
            };
            match check_invariants(&positions) {
                Ok(()) => AdminResponse::Ok {
                    message: format!("{} positions consistent", positions.len()),
                },
                Err(violation) => {
                    tracing::error!("Matrix invariant violated: {}", violation);
                    AdminResponse::error(violation)
                }
            }
        }

        AdminCommand::Ping => AdminResponse::Pong,
    }
}

async fn set_active(engine: &SharedEngine, user_id: UserId, active: bool) -> AdminResponse {
    let state = if active { "active" } else { "inactive" };
    match engine.write().await.set_active(user_id, active) {
        Ok(true) => {
            tracing::info!("Marked {} {}", user_id, state);
            AdminResponse::Ok {
                message: format!("Marked {} {}", user_id, state),
            }
        }
        Ok(false) => AdminResponse::Ok {
            message: format!("{} already {}", user_id, state),
        },
        Err(e) => AdminResponse::error(e),
    }
}

/// Socket path from `MATRIX_ADMIN_SOCKET`, else `admin.sock` in `MATRIX_DATA_DIR`.
pub fn socket_path_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("MATRIX_ADMIN_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let data_dir = lookup("MATRIX_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
            PathBuf::from(data_dir).join("admin.sock")
        })
}

/// Default socket path, resolved from the environment the same way the node does.
pub fn default_socket_path() -> PathBuf {
    socket_path_from(|name| std::env::var(name).ok())
}
