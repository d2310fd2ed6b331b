//! Request handler module
//!
//! Maps request paths to filesystem paths under the served root and builds
//! the matching response: file bytes, a directory listing, or an error.

pub mod resolve;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
