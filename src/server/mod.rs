// Server module
// Listener setup, the accept loop, per-connection serving, and signals.

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::AppState;
use crate::logger;

/// Accept connections until the shutdown signal fires.
///
/// Each accepted connection is served on its own task. A failed accept is
/// logged and the loop continues; one bad connection never terminates the
/// server. On shutdown the loop stops accepting and returns, leaving
/// in-flight connection tasks to finish in the background.
pub async fn run(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::spawn_connection(stream, peer_addr, Arc::clone(&state));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                return;
            }
        }
    }
}
