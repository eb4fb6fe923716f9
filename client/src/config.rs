//! Client tuning knobs and server address parsing.

use shared::PORT;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long to wait for the reply to `join_game`.
    pub connect_timeout: Duration,
    /// Longest single wait for a datagram once connected.
    pub recv_timeout: Duration,
    /// Spacing between two control messages.
    pub control_interval: Duration,
    /// Pause at the end of every sync loop iteration.
    pub idle_sleep: Duration,
    pub use_compression: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            recv_timeout: Duration::from_millis(100),
            control_interval: Duration::from_secs_f64(1.0 / 30.0),
            idle_sleep: Duration::from_millis(1),
            use_compression: shared::USE_COMPRESSION,
        }
    }
}

/// Accepts `ip:port`, a bare IP (default port) or `hostname[:port]`.
pub fn resolve_server(input: &str) -> io::Result<SocketAddr> {
    let input = input.trim();
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, PORT));
    }

    let mut candidates = if input.contains(':') {
        input.to_socket_addrs()?
    } else {
        (input, PORT).to_socket_addrs()?
    };
    candidates.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", input),
        )
    })
}
