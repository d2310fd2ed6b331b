// Listener setup module
// Creates the TCP listener through socket2 so socket options are explicit.

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Create a `TcpListener` bound to `addr`.
///
/// `SO_REUSEADDR` is enabled so a quickly restarted server can rebind a
/// port still in TIME_WAIT. Bind failures (port in use, insufficient
/// privilege) are returned to the caller; startup treats them as fatal and
/// does not retry.
pub fn create_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Allow rebinding a port left in TIME_WAIT state
    socket.set_reuse_address(true)?;

    // Non-blocking mode for tokio compatibility
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
