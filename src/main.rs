mod config;
mod geometry;
mod input;
mod ipc;
mod island;
mod power;
mod timer;

#[cfg(target_os = "macos")]
mod app;
#[cfg(target_os = "macos")]
mod render;
#[cfg(target_os = "macos")]
mod view;
#[cfg(target_os = "macos")]
mod window;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    println!(
        "islet {}
A notch-anchored island for macOS that expands on hover, tap and charging

USAGE:
    islet [OPTIONS]

OPTIONS:
    -h, --help       Print this help message
    -v, --version    Print version information

ENVIRONMENT:
    RUST_LOG         Set log level (error, warn, info, debug, trace)

CONFIG:
    ~/.config/islet/config.toml

CONTROL:
    islet-msg <reposition|expand|collapse|toggle|reload|status>",
        VERSION
    );
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if !args.is_empty() {
        // Only the first argument is processed (flags don't combine)
        match args[0].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-v" | "--version" => {
                println!("islet {}", VERSION);
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[0]);
                eprintln!("Try 'islet --help' for more information.");
                std::process::exit(1);
            }
        }
    }

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    logger
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {:>5} {}] {}",
                chrono::Utc::now().to_rfc3339(),
                record.level(),
                record.target(),
                record.args()
            )?;
            buf.flush()
        })
        .init();

    log::info!("Starting islet v{}", VERSION);

    run();
}

#[cfg(target_os = "macos")]
fn run() {
    let Some(mtm) = objc2::MainThreadMarker::new() else {
        eprintln!("islet must be started on the main thread");
        std::process::exit(1);
    };

    let socket = ipc::socket_path();
    if let Err(err) = ipc::start_ipc_listener(&socket) {
        log::warn!("Failed to start IPC listener: {}", err);
    }
    ipc::install_socket_cleanup(socket);

    app::App::new(mtm).run(mtm);
}

#[cfg(not(target_os = "macos"))]
fn run() {
    eprintln!("islet only runs on macOS");
    std::process::exit(1);
}
