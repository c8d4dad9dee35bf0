//! matrix-admin CLI tool
//!
//! Places members and inspects the matrix held by a running matrix-node.
//!
//! Usage:
//!   matrix-admin place <user_id> [sponsor_id]
//!   matrix-admin activate <user_id>
//!   matrix-admin deactivate <user_id>
//!   matrix-admin stats <user_id>
//!   matrix-admin overview
//!   matrix-admin check
//!   matrix-admin ping

use matrix_engine::UserId;
use matrix_node::admin_socket::{self, AdminCommand, AdminResponse};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("matrix-admin - Manage the forced matrix of a matrix-node");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  matrix-admin place <user_id> [sponsor_id]  Place a member");
    eprintln!("  matrix-admin activate <user_id>            Mark a position active");
    eprintln!("  matrix-admin deactivate <user_id>          Mark a position inactive");
    eprintln!("  matrix-admin stats <user_id>               Show network statistics");
    eprintln!("  matrix-admin overview                      Show matrix-wide summary");
    eprintln!("  matrix-admin check                         Verify stored positions");
    eprintln!("  matrix-admin ping                          Check if daemon is running");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MATRIX_SOCKET        Path to admin socket");
    eprintln!("  MATRIX_ADMIN_SOCKET  Socket path shared with matrix-node");
    eprintln!("  MATRIX_DATA_DIR      Node data dir (default socket: <dir>/admin.sock)");
}

fn get_socket_path() -> PathBuf {
    std::env::var("MATRIX_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| admin_socket::default_socket_path())
}

fn send_command(cmd: AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = get_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to matrix-node at {:?}: {}\n\
             Is the matrix-node running?",
            socket_path, e
        )
    })?;

    // Send command
    let cmd_json = serde_json::to_string(&cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    // Read response
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn user_arg(args: &[String], index: usize, command: &str, name: &str) -> UserId {
    let Some(raw) = args.get(index) else {
        eprintln!("Error: {} requires a {} argument", command, name);
        std::process::exit(1);
    };
    match raw.parse::<u64>() {
        Ok(id) => UserId(id),
        Err(_) => {
            eprintln!("Error: {} must be a numeric id, got {:?}", name, raw);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = match args[1].as_str() {
        "place" => AdminCommand::Place {
            user_id: user_arg(&args, 2, "place", "user_id"),
            sponsor_id: (args.len() > 3).then(|| user_arg(&args, 3, "place", "sponsor_id")),
        },
        "activate" => AdminCommand::Activate {
            user_id: user_arg(&args, 2, "activate", "user_id"),
        },
        "deactivate" => AdminCommand::Deactivate {
            user_id: user_arg(&args, 2, "deactivate", "user_id"),
        },
        "stats" => AdminCommand::Stats {
            user_id: user_arg(&args, 2, "stats", "user_id"),
        },
        "overview" => AdminCommand::Overview,
        "check" => AdminCommand::Check,
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(cmd) {
        Ok(response) => match response {
            AdminResponse::Ok { message } => {
                println!("{}", message);
            }
            AdminResponse::Error { error } => {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            AdminResponse::Report { report } => match serde_json::to_string_pretty(&report) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            },
            AdminResponse::Pong => {
                println!("pong - matrix-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
