mod handler;
mod io;
mod protocol;

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use davshelf_core::config::{config_dir, ExplorerConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    eprintln!("Usage: davshelf-agent --stdio [--config <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio          Run in stdio mode (NDJSON over stdin/stdout)");
    eprintln!("  --config <path>  Explorer config file (default: <config dir>/config.json)");
    eprintln!("  --version        Print version and exit");
    eprintln!("  --help           Print this help message");
}

/// Where to read the explorer config from.
///
/// An explicit `--config` path is tilde-expanded; otherwise the default
/// config directory is used.
fn config_path(args: &[String]) -> Result<PathBuf, String> {
    match args.iter().position(|a| a == "--config") {
        Some(i) => args
            .get(i + 1)
            .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
            .ok_or_else(|| "--config requires a path".to_string()),
        None => Ok(config_dir().join("config.json")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--version" => {
            println!("davshelf-agent {}", VERSION);
            Ok(())
        }
        "--help" => {
            print_usage();
            Ok(())
        }
        "--stdio" => {
            // Configure tracing to stderr so it doesn't interfere with the protocol on stdout
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_writer(std::io::stderr)
                .init();

            let path = match config_path(&args[2..]) {
                Ok(path) => path,
                Err(e) => {
                    eprintln!("{}", e);
                    print_usage();
                    std::process::exit(1);
                }
            };
            let config = ExplorerConfig::load_from(&path);

            info!("davshelf-agent {} starting in stdio mode", VERSION);

            let shutdown = CancellationToken::new();
            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Interrupt received, shutting down");
                        signal_token.cancel();
                    }
                    Err(e) => warn!("Failed to listen for interrupt: {}", e),
                }
            });

            io::stdio::run_stdio_loop(config, shutdown).await
        }
        other => {
            eprintln!("Unknown option: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn explicit_config_path_is_used() {
        let path = config_path(&args(&["--config", "/etc/davshelf.json"])).unwrap();
        assert_eq!(path, PathBuf::from("/etc/davshelf.json"));
    }

    #[test]
    fn config_path_expands_tilde() {
        let path = config_path(&args(&["--config", "~/shelf.json"])).unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("shelf.json"));
    }

    #[test]
    fn missing_config_value_is_an_error() {
        assert!(config_path(&args(&["--config"])).is_err());
    }

    #[test]
    fn default_config_path_is_in_config_dir() {
        let path = config_path(&[]).unwrap();
        assert!(path.ends_with("davshelf/config.json"));
    }
}
