use log::debug;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

// Address of the interface that routes to the outside world. Connecting a UDP
// socket sends nothing, it only selects a route.
pub fn discover_local_ip() -> IpAddr {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((Ipv4Addr::new(10, 255, 255, 255), 1))?;
        Ok(socket.local_addr()?.ip())
    };

    match probe() {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        Err(e) => {
            debug!("Local address discovery failed: {}", e);
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        }
    }
}

// Rates on the command line are per second, the engine wants intervals
pub fn rate_to_interval(per_second: u32) -> std::time::Duration {
    std::time::Duration::from_secs_f64(1.0 / per_second.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_never_fails() {
        let ip = discover_local_ip();
        assert!(ip.is_ipv4());
    }

    #[test]
    fn test_rate_to_interval() {
        assert_eq!(rate_to_interval(10).as_millis(), 100);
        assert_eq!(rate_to_interval(0).as_secs(), 1);
    }
}
