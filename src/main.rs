use std::sync::Arc;

use servedir::config::{AppState, Config};
use servedir::logger;
use servedir::server;
use servedir::server::signal::{start_signal_handler, SignalHandler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let root = cfg
        .resolved_root()
        .map_err(|e| format!("Cannot resolve root directory: {e}"))?;

    // A bind failure (port in use, insufficient privilege) is fatal; the
    // error propagates out of main, which prints it once and exits non-zero.
    let listener = server::listener::create_listener(addr)
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    let port = cfg.server.port;
    let state = Arc::new(AppState::new(cfg, root));

    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals));

    logger::log_server_start(&state.root, port);

    server::run(listener, state, Arc::clone(&signals.shutdown)).await;

    logger::log_server_stopped();
    Ok(())
}
