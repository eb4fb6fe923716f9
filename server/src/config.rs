//! Server tuning knobs. Defaults are the protocol constants.

use crate::utils::rate_to_interval;
use shared::PORT;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Minimum spacing between two broadcasts.
    pub broadcast_interval: Duration,
    /// How long the network thread waits for a datagram before doing
    /// housekeeping.
    pub poll_interval: Duration,
    /// Silence after which a session is torn down.
    pub session_timeout: Duration,
    /// Simulation ticks per second, used by the tick loop.
    pub tick_rate: u32,
    pub use_compression: bool,
    /// Gives the operator a fighter of their own in slot 0.
    pub host_player: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, PORT)),
            broadcast_interval: Duration::from_secs_f64(1.0 / 60.0),
            poll_interval: Duration::from_millis(1),
            session_timeout: Duration::from_secs(5),
            tick_rate: 60,
            use_compression: shared::USE_COMPRESSION,
            host_player: false,
        }
    }
}

impl ServerConfig {
    pub fn with_bind(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Self::default()
        }
    }

    /// Duration of one simulation tick.
    pub fn tick_duration(&self) -> Duration {
        rate_to_interval(self.tick_rate)
    }
}
