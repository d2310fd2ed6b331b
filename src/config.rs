// Configuration module
// Loads settings from an optional servedir.toml file, SERVEDIR_* environment
// variables, and --port/--root command line overrides.

use clap::Parser;
use serde::Deserialize;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Command line overrides, applied after file and environment sources.
/// Unknown flags are rejected by clap with a usage error at startup.
#[derive(Debug, Parser)]
#[command(name = "servedir", about = "Minimal static file server with directory listings")]
pub struct CliArgs {
    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,
    /// Root directory to serve
    #[arg(long)]
    pub root: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Root directory to serve. Defaults to the directory containing the
    /// running executable when unset.
    pub root: Option<String>,
    pub logging: LoggingConfig,
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, or custom pattern)
    pub access_log_format: String,
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Files served in place of a directory listing when present
    pub index_files: Vec<String>,
}

impl Config {
    /// Load configuration from the default sources and apply command line
    /// overrides.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut cfg = Self::load_from("servedir")?;
        cfg.apply_cli_overrides(CliArgs::parse());
        Ok(cfg)
    }

    /// Load configuration from the specified file path (without extension).
    /// The file is optional; defaults apply when it is absent.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVEDIR"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("routes.index_files", vec!["index.html", "index.htm"])?
            .build()?;

        settings.try_deserialize()
    }

    /// Apply `--port` and `--root` command line overrides.
    pub fn apply_cli_overrides(&mut self, args: CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(root) = args.root {
            self.root = Some(root);
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve the served root to a canonical absolute path.
    ///
    /// Falls back to the directory containing the running executable when no
    /// root is configured, matching the behavior of serving "the program's
    /// own folder".
    pub fn resolved_root(&self) -> io::Result<PathBuf> {
        let root = match &self.root {
            Some(dir) => PathBuf::from(dir),
            None => {
                let exe = std::env::current_exe()?;
                exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        "executable has no parent directory",
                    )
                })?
            }
        };
        root.canonicalize()
    }
}

/// Shared application state, read-only for the process lifetime.
pub struct AppState {
    pub config: Config,
    /// Canonical absolute path of the served root
    pub root: PathBuf,
}

impl AppState {
    pub const fn new(config: Config, root: PathBuf) -> Self {
        Self { config, root }
    }
}
