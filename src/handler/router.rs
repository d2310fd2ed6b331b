//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! resolution against the served root, and dispatch to file or directory
//! serving.

use crate::config::AppState;
use crate::handler::resolve::{self, ResolveError};
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Request context for a single request
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let version = http_version_str(req.version());
    let referer = header_value(&req, "referer");
    let user_agent = header_value(&req, "user-agent");
    let is_head = method == Method::HEAD;

    let response = if matches!(method, Method::GET | Method::HEAD) {
        let ctx = RequestContext {
            path: &path,
            is_head,
        };
        route_request(&ctx, &state).await
    } else {
        logger::log_warning(&format!("Method not allowed: {method}"));
        http::build_405_response()
    };

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path);
        entry.query = query;
        entry.http_version = version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.referer = referer;
        entry.user_agent = user_agent;
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Resolve the request path and dispatch to the matching serving routine
async fn route_request(ctx: &RequestContext<'_>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let file_path = match resolve::resolve(&state.root, ctx.path) {
        Ok(p) => p,
        Err(ResolveError::BadEncoding) => {
            logger::log_warning(&format!("Malformed request path: {}", ctx.path));
            return http::build_400_response();
        }
        Err(ResolveError::Traversal) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            return http::build_403_response();
        }
    };

    let metadata = match tokio::fs::metadata(&file_path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return http::build_404_response();
        }
        Err(e) => {
            logger::log_error(&format!("Failed to stat '{}': {e}", file_path.display()));
            return http::build_500_response();
        }
    };

    if metadata.is_dir() {
        // Directories are addressed with a trailing slash so relative links
        // in the generated listing resolve correctly.
        if !ctx.path.ends_with('/') {
            return http::build_redirect_response(&format!("{}/", ctx.path));
        }
        return static_files::serve_directory(ctx, &file_path, &state.config.routes.index_files)
            .await;
    }

    // A trailing slash names a directory; a regular file there is a miss
    if ctx.path.ends_with('/') {
        return http::build_404_response();
    }

    static_files::serve_file(ctx, &file_path).await
}

fn header_value(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn http_version_str(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}
