//! servedir - a minimal static file server.
//!
//! Binds a TCP port and maps each HTTP request path to a file under a fixed
//! root directory, returning file contents, a generated directory listing,
//! or an error response. Requests are independent and share only the
//! read-only root configuration.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
