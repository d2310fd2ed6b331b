//! Static file serving module
//!
//! Loads file bytes, detects MIME types, and generates directory listings.

use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::Path;
use tokio::fs;

/// Characters percent-encoded in listing hrefs
const HREF_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'%');

/// Serve a regular file from an already resolved path
pub async fn serve_file(ctx: &RequestContext<'_>, file_path: &Path) -> Response<Full<Bytes>> {
    let content = match fs::read(file_path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // File removed between stat and read
            return http::build_404_response();
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return http::build_500_response();
        }
    };

    let content_type = mime::content_type_for(file_path.extension().and_then(|e| e.to_str()));
    http::build_file_response(Bytes::from(content), content_type, ctx.is_head)
}

/// Serve a directory: the first matching index file when one exists,
/// otherwise a generated listing of the directory's immediate children.
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    dir_path: &Path,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    for index_file in index_files {
        let index_path = dir_path.join(index_file);
        if fs::metadata(&index_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return serve_file(ctx, &index_path).await;
        }
    }

    match read_listing_entries(dir_path).await {
        Ok(entries) => {
            let html = render_listing_html(ctx.path, &entries);
            http::build_html_response(html, ctx.is_head)
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to list directory '{}': {e}",
                dir_path.display()
            ));
            http::build_500_response()
        }
    }
}

/// Collect a directory's immediate children as (name, `is_dir`) pairs,
/// sorted by name.
async fn read_listing_entries(dir_path: &Path) -> std::io::Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir_path).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push((name, is_dir));
    }
    entries.sort();
    Ok(entries)
}

/// Render the auto-generated HTML listing page.
///
/// Directories carry a trailing slash. Names are HTML-escaped in link text
/// and percent-encoded in hrefs so unusual filenames cannot break the page.
fn render_listing_html(request_path: &str, entries: &[(String, bool)]) -> String {
    let title = format!("Directory listing for {request_path}");
    let escaped_title = escape_html(&title);

    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{escaped_title}</title>\n"));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{escaped_title}</h1>\n<hr>\n<ul>\n"));

    for (name, is_dir) in entries {
        let suffix = if *is_dir { "/" } else { "" };
        let href = format!("{}{suffix}", utf8_percent_encode(name, HREF_ENCODE_SET));
        let text = escape_html(&format!("{name}{suffix}"));
        html.push_str(&format!("<li><a href=\"{href}\">{text}</a></li>\n"));
    }

    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

/// Escape special characters for HTML text
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
