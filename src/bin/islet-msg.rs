//! Sends a single command to a running islet and prints the reply.

use std::env;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

fn socket_path() -> PathBuf {
    let runtime_dir = env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("islet.sock")
}

fn print_usage() {
    eprintln!("Usage: islet-msg <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  reposition    Re-detect the notch and move the island over it");
    eprintln!("  expand        Expand the island and keep it open");
    eprintln!("  collapse      Collapse the island");
    eprintln!("  toggle        Same as tapping the island");
    eprintln!("  reload        Reload configuration");
    eprintln!("  status        Print island and battery status (JSON)");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() || matches!(args[0].as_str(), "-h" | "--help") {
        print_usage();
        std::process::exit(1);
    }

    let command = args.join(" ");
    let socket = socket_path();

    let mut stream = match UnixStream::connect(&socket) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Failed to connect to islet at {:?}: {}", socket, e);
            eprintln!("Is islet running?");
            std::process::exit(1);
        }
    };

    if let Err(e) = writeln!(stream, "{}", command) {
        eprintln!("Failed to send command: {}", e);
        std::process::exit(1);
    }

    let mut reader = BufReader::new(stream);
    let mut response = String::new();
    if let Err(e) = reader.read_line(&mut response) {
        eprintln!("Failed to read response: {}", e);
        std::process::exit(1);
    }

    let response = response.trim();
    println!("{}", response);
    if response.starts_with("ERR:") {
        std::process::exit(1);
    }
}
