//! Manual protocol probe: sends the plain requests to a running server and
//! prints what comes back, then optionally listens for broadcasts.

use clap::Parser;
use shared::{Frame, SnapshotCodec, MAX_DATAGRAM, PORT};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Duration};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address, e.g. 192.168.1.20:65432
    #[clap(default_value_t = SocketAddr::from(([127, 0, 0, 1], PORT)))]
    server: SocketAddr,
    /// Number of broadcast frames to print after joining
    #[clap(short, long, default_value = "0")]
    listen: usize,
}

fn describe(data: &[u8], codec: &SnapshotCodec) -> String {
    match Frame::parse(data, codec) {
        Ok(Frame::Sequenced(message)) => {
            let mut out = format!(
                "SEQ {} with {} entities",
                message.sequence,
                message.snapshot.len()
            );
            for (name, entity) in &message.snapshot {
                out.push_str(&format!(
                    "\n  {:<10} {} at ({}, {}) {:?}",
                    name, entity.image, entity.x, entity.y, entity.facing
                ));
            }
            out
        }
        Ok(frame) => format!("{:?}", frame),
        Err(e) => format!("undecodable ({} bytes): {}", data.len(), e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let codec = SnapshotCodec::default();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(args.server).await?;
    println!("Probe bound to {}", socket.local_addr()?);

    let mut buf = vec![0u8; MAX_DATAGRAM];
    let requests: [&[u8]; 3] = [b"echo", b"get_frame", b"join_game"];
    for request in requests {
        socket.send(request).await?;
        match timeout(Duration::from_secs(2), socket.recv(&mut buf)).await {
            Ok(Ok(len)) => println!(
                "{:<10} -> {}",
                String::from_utf8_lossy(request),
                describe(&buf[..len], &codec)
            ),
            Ok(Err(e)) => println!("{:<10} -> error: {}", String::from_utf8_lossy(request), e),
            Err(_) => println!("{:<10} -> no reply", String::from_utf8_lossy(request)),
        }
    }

    let idle = shared::protocol::controls_message(&Default::default())?;
    for _ in 0..args.listen {
        // Controls double as a keepalive while listening
        socket.send(&idle).await?;
        match timeout(Duration::from_secs(5), socket.recv(&mut buf)).await {
            Ok(Ok(len)) => println!("{}", describe(&buf[..len], &codec)),
            Ok(Err(e)) => {
                println!("Receive failed: {}", e);
                break;
            }
            Err(_) => {
                println!("No broadcast within 5s");
                break;
            }
        }
    }

    Ok(())
}
