//! Server network layer: one dedicated I/O thread serving the UDP socket.
//!
//! The thread owns a current-thread tokio runtime and loops until the running
//! flag is cleared:
//!
//! 1. wait up to `poll_interval` for a datagram, dispatch it against the
//!    shared [`Game`] and send the reply, if any
//! 2. once a second, tear down sessions that went silent
//! 3. if the broadcast interval elapsed, build the next frame under the lock,
//!    release the lock, then send the frame to every session
//!
//! The simulation tick runs elsewhere (see the `server` binary) and meets the
//! network thread only through the shared lock.

use crate::config::ServerConfig;
use crate::game::{Broadcast, Game};
use crate::world::Simulation;
use log::{debug, error, info, warn};
use shared::{SnapshotCodec, MAX_DATAGRAM};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::RwLock;
use tokio::time::timeout;

const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("could not build the network runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("could not spawn the network thread: {0}")]
    Thread(#[source] io::Error),
    #[error("the network thread is already running")]
    AlreadyRunning,
}

/// The match as shared between the network thread and the tick loop.
pub type SharedGame<W> = Arc<RwLock<Game<W>>>;

/// Rate limiter for broadcasts: fires at most once per `interval`.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    interval: Duration,
    last: Option<Instant>,
}

impl Broadcaster {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true, and starts a new interval, if a broadcast may go out at `now`.
    pub fn due(&mut self, now: Instant) -> bool {
        let due = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

pub struct Server<W> {
    config: ServerConfig,
    game: SharedGame<W>,
    socket: Option<std::net::UdpSocket>,
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<W> Server<W>
where
    W: Simulation + Send + Sync + 'static,
{
    /// Binds the server socket. Nothing is served until [`Server::start`].
    pub fn bind(config: ServerConfig, world: W) -> Result<Self, ServerError> {
        let addr = config.bind;
        let bind_error = |source| ServerError::Bind { addr, source };

        let socket = std::net::UdpSocket::bind(addr).map_err(bind_error)?;
        socket.set_nonblocking(true).map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;
        info!("Server bound to {}", local_addr);

        let codec = SnapshotCodec::new(config.use_compression);
        let mut game = Game::new(world, codec);
        if config.host_player {
            game = game.with_host_player();
        }
        Ok(Self {
            config,
            game: Arc::new(RwLock::new(game)),
            socket: Some(socket),
            local_addr,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn game(&self) -> SharedGame<W> {
        Arc::clone(&self.game)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts the network thread.
    pub fn start(&mut self) -> Result<(), ServerError> {
        let socket = self.socket.take().ok_or(ServerError::AlreadyRunning)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        let game = Arc::clone(&self.game);
        let running = Arc::clone(&self.running);
        let config = self.config.clone();

        running.store(true, Ordering::SeqCst);
        let handle = std::thread::Builder::new()
            .name("server-net".to_string())
            .spawn(move || network_thread(runtime, socket, game, running, config))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                ServerError::Thread(e)
            })?;

        self.handle = Some(handle);
        info!("Network thread started on {}", self.local_addr);
        Ok(())
    }

    /// Stops the network thread and waits for it. The socket is closed once
    /// this returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Network thread panicked");
            }
            info!("Server on {} stopped", self.local_addr);
        }
        self.socket = None;
    }
}

impl<W> Drop for Server<W> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn network_thread<W: Simulation>(
    runtime: Runtime,
    socket: std::net::UdpSocket,
    game: SharedGame<W>,
    running: Arc<AtomicBool>,
    config: ServerConfig,
) {
    runtime.block_on(async move {
        match UdpSocket::from_std(socket) {
            Ok(socket) => event_loop(socket, game, running, config).await,
            Err(e) => {
                error!("Could not register server socket: {}", e);
                running.store(false, Ordering::SeqCst);
            }
        }
    });
}

async fn event_loop<W: Simulation>(
    socket: UdpSocket,
    game: SharedGame<W>,
    running: Arc<AtomicBool>,
    config: ServerConfig,
) {
    let mut buffer = vec![0u8; MAX_DATAGRAM];
    let mut broadcaster = Broadcaster::new(config.broadcast_interval);
    let mut last_sweep = Instant::now();

    while running.load(Ordering::SeqCst) {
        match timeout(config.poll_interval, socket.recv_from(&mut buffer)).await {
            Ok(Ok((len, endpoint))) => {
                let reply =
                    game.write()
                        .await
                        .handle_datagram(endpoint, &buffer[..len], Instant::now());
                if let Some(reply) = reply {
                    if let Err(e) = socket.send_to(&reply, endpoint).await {
                        warn!("Failed to reply to {}: {}", endpoint, e);
                    }
                }
            }
            // ICMP errors from earlier sends surface here on some platforms
            Ok(Err(e)) => debug!("Receive error: {}", e),
            Err(_) => {}
        }

        let now = Instant::now();
        if now.duration_since(last_sweep) >= SWEEP_INTERVAL {
            last_sweep = now;
            let expired = game
                .write()
                .await
                .expire_sessions(now, config.session_timeout);
            if !expired.is_empty() {
                debug!("Expired {} sessions", expired.len());
            }
        }

        if broadcaster.due(now) {
            let next = game.write().await.next_broadcast();
            match next {
                Ok(Some(broadcast)) => send_broadcast(&socket, &broadcast).await,
                Ok(None) => {}
                Err(e) => warn!("Skipped broadcast: {}", e),
            }
        }
    }

    info!("Network thread exiting");
}

async fn send_broadcast(socket: &UdpSocket, broadcast: &Broadcast) {
    for target in &broadcast.targets {
        if let Err(e) = socket.send_to(&broadcast.frame, target).await {
            warn!("Failed to send frame to {}: {}", target, e);
        }
    }
}
