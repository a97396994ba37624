// Listening endpoint module
// Binds the gateway's TCP listener and records the canonical server name and port

use std::net::{SocketAddr, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{GatewayError, Result};

/// Host used when the configured host is empty
const ALL_INTERFACES: &str = "0.0.0.0";

/// The bound, listening socket plus the identity recorded at bind time
#[derive(Debug)]
pub struct ListenEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
    server_name: String,
}

impl ListenEndpoint {
    /// Resolve `host:port`, bind, start listening and record the server name.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(
        host: &str,
        port: u16,
        backlog: i32,
        server_name_override: Option<&str>,
    ) -> Result<Self> {
        let addr = resolve_bind_addr(host, port)?;
        let bind_error = |source: std::io::Error| GatewayError::Bind {
            addr: addr.to_string(),
            source,
        };

        let listener = create_reusable_listener(addr, backlog).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        let server_name = resolve_server_name(&local_addr, server_name_override);

        Ok(Self {
            listener,
            local_addr,
            server_name,
        })
    }

    /// Wait for the next client
    pub async fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }

    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub const fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

/// Resolve a configured host/port pair; an empty host means all interfaces
pub fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let host = if host.is_empty() { ALL_INTERFACES } else { host };
    let invalid = |source: std::io::Error| GatewayError::Bind {
        addr: format!("{host}:{port}"),
        source,
    };

    (host, port)
        .to_socket_addrs()
        .map_err(invalid)?
        .next()
        .ok_or_else(|| {
            invalid(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "host resolved to no addresses",
            ))
        })
}

/// Canonical name reported as `SERVER_NAME`.
///
/// An explicit override wins. Wildcard and loopback addresses report the
/// machine's host name, falling back to `localhost`. Any other address
/// reports its reverse-DNS name, or the IP text when there is none.
pub fn resolve_server_name(addr: &SocketAddr, server_name_override: Option<&str>) -> String {
    if let Some(name) = server_name_override.filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    let ip = addr.ip();
    if ip.is_unspecified() || ip.is_loopback() {
        local_host_name().unwrap_or_else(|| "localhost".to_string())
    } else {
        dns_lookup::lookup_addr(&ip)
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| ip.to_string())
    }
}

/// The operating system's host name, if it is set and valid UTF-8
fn local_host_name() -> Option<String> {
    gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|h| !h.is_empty())
}

/// Create a `TcpListener` with `SO_REUSEADDR` enabled.
///
/// # Arguments
///
/// * `addr` - The socket address to bind to
/// * `backlog` - Pending connection queue length
///
/// # Returns
///
/// * `Ok(TcpListener)` - Successfully created and bound listener
/// * `Err(std::io::Error)` - Failed to create or bind socket
pub fn create_reusable_listener(addr: SocketAddr, backlog: i32) -> std::io::Result<TcpListener> {
    // Create socket with appropriate domain (IPv4 or IPv6)
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Allow rebinding a port still in TIME_WAIT after a restart
    socket.set_reuse_address(true)?;

    // Set non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    // Convert socket2::Socket to std::net::TcpListener, then to tokio::net::TcpListener
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
