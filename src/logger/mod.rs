//! Logger module
//!
//! Console logging for the server: lifecycle banners, access logging with
//! multiple formats, and error/warning output.

mod format;

pub use format::AccessLogEntry;

use std::path::Path;

/// Print the startup banner: served root, URL, and how to stop the server.
pub fn log_server_start(root: &Path, port: u16) {
    println!("======================================");
    println!("Serving folder '{}'", root.display());
    println!("Listening on: http://localhost:{port}");
    println!("Press Ctrl+C to stop the server");
    println!("======================================\n");
}

pub fn log_server_stopped() {
    println!("\nServer stopped.");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    eprintln!("[WARN] {message}");
}

/// Log a formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    println!("{}", entry.format(format));
}
