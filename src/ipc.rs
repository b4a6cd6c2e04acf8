//! IPC commands, the published status snapshot, and the Unix socket listener.
//!
//! Commands arrive on a background thread, are parsed here, and pushed onto
//! the input bus for the main loop. `status` is answered directly from the
//! last snapshot the main loop published.

use serde::Serialize;
use std::sync::{Mutex, OnceLock};

use crate::input::{push_input, IslandInput};

/// A command destined for the main thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcCommand {
    /// Drop cached notch geometry and move the island back over the notch.
    Reposition,
    Expand,
    Collapse,
    Toggle,
    /// Re-read the config file.
    Reload,
}

/// What `status` reports. Published by the main loop after every pass that
/// changed something.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IslandStatus {
    pub state: String,
    pub expanded: bool,
    pub hovering: bool,
    /// A plug-in arrived while hover or a tap held the island.
    pub suppressed_charge: bool,
    pub has_notch: bool,
    pub battery_level: Option<u8>,
    pub charging_state: Option<String>,
}

static STATUS: OnceLock<Mutex<IslandStatus>> = OnceLock::new();

fn status_cell() -> &'static Mutex<IslandStatus> {
    STATUS.get_or_init(|| Mutex::new(IslandStatus::default()))
}

pub fn publish_status(status: IslandStatus) {
    if let Ok(mut guard) = status_cell().lock() {
        *guard = status;
    }
}

fn current_status() -> IslandStatus {
    status_cell()
        .lock()
        .map(|s| s.clone())
        .unwrap_or_default()
}

/// Maps a command line to an [`IpcCommand`]. `status` is not a command; it is
/// answered inline by [`handle_ipc_command`].
fn parse_command(verb: &str) -> Option<IpcCommand> {
    match verb {
        "reposition" => Some(IpcCommand::Reposition),
        "expand" => Some(IpcCommand::Expand),
        "collapse" => Some(IpcCommand::Collapse),
        "toggle" => Some(IpcCommand::Toggle),
        "reload" => Some(IpcCommand::Reload),
        _ => None,
    }
}

/// Parses and dispatches a single IPC command string, returning a response.
pub fn handle_ipc_command(command: &str) -> String {
    let verb = command.split_whitespace().next().unwrap_or("");

    if verb == "status" {
        let mut status = serde_json::to_value(current_status())
            .unwrap_or_else(|_| serde_json::json!({}));
        if let Some(map) = status.as_object_mut() {
            map.insert("version".to_string(), crate::VERSION.into());
            map.insert("running".to_string(), true.into());
        }
        return status.to_string();
    }

    match parse_command(verb) {
        Some(cmd) => {
            push_input(IslandInput::Command(cmd));
            format!("OK: {} requested", verb)
        }
        None if verb.is_empty() => "ERR: empty command".to_string(),
        None => format!("ERR: unknown command '{}'", verb),
    }
}

pub fn socket_path() -> std::path::PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    std::path::PathBuf::from(runtime_dir).join("islet.sock")
}

/// Starts the IPC listener on a Unix socket, spawning a background thread.
pub fn start_ipc_listener(socket_path: &std::path::Path) -> std::io::Result<()> {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::{UnixListener, UnixStream};

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let listener = match UnixListener::bind(socket_path) {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            if UnixStream::connect(socket_path).is_ok() {
                eprintln!("islet is already running.");
                std::process::exit(0);
            }
            // Stale socket from a crashed instance
            let _ = std::fs::remove_file(socket_path);
            UnixListener::bind(socket_path)?
        }
        Err(err) => return Err(err),
    };

    std::thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            if let Err(e) = reader.read_line(&mut line) {
                log::warn!("Failed to read IPC command: {}", e);
                continue;
            }
            log::debug!("IPC command: {}", line.trim());
            let response = handle_ipc_command(&line);
            let mut stream = reader.into_inner();
            let _ = writeln!(stream, "{}", response);
        }
    });

    log::info!("IPC listening on {:?}", socket_path);
    Ok(())
}

/// Removes the Unix socket file on SIGINT/SIGTERM.
pub fn install_socket_cleanup(socket_path: std::path::PathBuf) {
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = std::fs::remove_file(&socket_path);
        std::process::exit(0);
    }) {
        log::warn!("Failed to install signal handler: {}", e);
    }
}
