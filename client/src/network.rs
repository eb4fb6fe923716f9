//! Client network layer: handshake and the background sync thread.
//!
//! `ClientEngine::connect` performs the join handshake on the calling thread.
//! `start` then moves the socket into a dedicated thread that keeps sending
//! the latest controls (they double as a keepalive) and applies every frame
//! it receives to the shared [`SyncState`].

use crate::config::ClientConfig;
use crate::sync::{Applied, SyncState};
use log::{debug, error, info, warn};
use shared::protocol::{self, GAME_ALREADY_STARTED, JOIN_GAME, OK};
use shared::{ControlState, SnapshotCodec, MAX_DATAGRAM};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{watch, RwLock};
use tokio::time::{sleep, timeout};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the match has already started, try again after it ends")]
    AdmissionRejected,
    #[error("no reply from {server} within {waited:?}")]
    HandshakeTimeout { server: SocketAddr, waited: Duration },
    #[error("connection refused by {0}, is the server running?")]
    ConnectionRefused(SocketAddr),
    #[error("unexpected reply to join: {0:?}")]
    UnexpectedResponse(String),
    #[error("connection reset by server")]
    ConnectionReset,
    #[error("network error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Sorts a socket error into the transport failures that end a connection.
    fn from_transport(e: io::Error, server: SocketAddr) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionRefused => ClientError::ConnectionRefused(server),
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                ClientError::ConnectionReset
            }
            _ => ClientError::Io(e),
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, ClientError::Io(_))
    }
}

pub struct ClientEngine {
    server: SocketAddr,
    config: ClientConfig,
    state: Arc<RwLock<SyncState>>,
    failure: Arc<RwLock<Option<ClientError>>>,
    controls: watch::Sender<ControlState>,
    running: Arc<AtomicBool>,
    pending: Option<(Runtime, UdpSocket, watch::Receiver<ControlState>)>,
    handle: Option<JoinHandle<()>>,
}

impl ClientEngine {
    /// Joins the server. Blocks for at most `config.connect_timeout`.
    ///
    /// Must not be called from inside a tokio runtime.
    pub fn connect(server: SocketAddr, config: ClientConfig) -> Result<Self, ClientError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let socket = runtime.block_on(handshake(server, &config))?;
        info!("Joined server at {}", server);

        let (controls, controls_rx) = watch::channel(ControlState::default());
        Ok(Self {
            server,
            config,
            state: Arc::new(RwLock::new(SyncState::new())),
            failure: Arc::new(RwLock::new(None)),
            controls,
            running: Arc::new(AtomicBool::new(false)),
            pending: Some((runtime, socket, controls_rx)),
            handle: None,
        })
    }

    /// Starts the sync thread. Does nothing if it was already started.
    pub fn start(&mut self) -> Result<(), ClientError> {
        let Some((runtime, socket, controls)) = self.pending.take() else {
            return Ok(());
        };

        let sync = SyncLoop {
            server: self.server,
            socket,
            state: Arc::clone(&self.state),
            failure: Arc::clone(&self.failure),
            controls,
            running: Arc::clone(&self.running),
            codec: SnapshotCodec::new(self.config.use_compression),
            config: self.config.clone(),
        };

        self.running.store(true, Ordering::SeqCst);
        let handle = std::thread::Builder::new()
            .name("client-sync".to_string())
            .spawn(move || runtime.block_on(sync.run()))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                ClientError::Io(e)
            })?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Replaces the controls the sync thread keeps sending.
    pub fn push_controls(&self, controls: ControlState) {
        self.controls.send_replace(controls);
    }

    /// Handle to the working state, for readers outside any tokio runtime
    /// (`blocking_read`) or inside one (`read().await`).
    pub fn sync_state(&self) -> Arc<RwLock<SyncState>> {
        Arc::clone(&self.state)
    }

    /// Takes the error that ended the sync thread, if any.
    ///
    /// Must not be called from inside a tokio runtime.
    pub fn take_failure(&self) -> Option<ClientError> {
        self.failure.blocking_write().take()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Stops the sync thread. Returns within roughly one receive timeout.
    pub fn disconnect(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Sync thread panicked");
            }
            info!("Disconnected from {}", self.server);
        }
        self.pending = None;
    }
}

impl Drop for ClientEngine {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

async fn handshake(server: SocketAddr, config: &ClientConfig) -> Result<UdpSocket, ClientError> {
    let local: SocketAddr = if server.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    debug!("Client socket bound to {}", socket.local_addr()?);

    socket
        .send(JOIN_GAME)
        .await
        .map_err(|e| ClientError::from_transport(e, server))?;

    let mut buffer = vec![0u8; MAX_DATAGRAM];
    let len = match timeout(config.connect_timeout, socket.recv(&mut buffer)).await {
        Ok(received) => received.map_err(|e| ClientError::from_transport(e, server))?,
        Err(_) => {
            return Err(ClientError::HandshakeTimeout {
                server,
                waited: config.connect_timeout,
            })
        }
    };

    let reply = &buffer[..len];
    if reply == OK {
        Ok(socket)
    } else if reply == GAME_ALREADY_STARTED {
        Err(ClientError::AdmissionRejected)
    } else {
        Err(ClientError::UnexpectedResponse(
            String::from_utf8_lossy(reply).into_owned(),
        ))
    }
}

struct SyncLoop {
    server: SocketAddr,
    socket: UdpSocket,
    state: Arc<RwLock<SyncState>>,
    failure: Arc<RwLock<Option<ClientError>>>,
    controls: watch::Receiver<ControlState>,
    running: Arc<AtomicBool>,
    codec: SnapshotCodec,
    config: ClientConfig,
}

impl SyncLoop {
    async fn run(self) {
        let mut buffer = vec![0u8; MAX_DATAGRAM];
        let mut next_control = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= next_control {
                next_control = now + self.config.control_interval;
                if let Err(e) = self.send_controls().await {
                    if self.fail(e).await {
                        break;
                    }
                }
            }

            let wait = self
                .config
                .recv_timeout
                .min(next_control.saturating_duration_since(Instant::now()))
                .max(Duration::from_millis(1));
            match timeout(wait, self.socket.recv(&mut buffer)).await {
                Ok(Ok(len)) => self.receive(&buffer[..len]).await,
                Ok(Err(e)) => {
                    if self.fail(ClientError::from_transport(e, self.server)).await {
                        break;
                    }
                }
                Err(_) => {}
            }

            sleep(self.config.idle_sleep).await;
        }

        self.running.store(false, Ordering::SeqCst);
        debug!("Sync thread exiting");
    }

    async fn send_controls(&self) -> Result<(), ClientError> {
        let current = *self.controls.borrow();
        let message = match protocol::controls_message(&current) {
            Ok(message) => message,
            Err(e) => {
                warn!("Could not encode controls: {}", e);
                return Ok(());
            }
        };
        self.socket
            .send(&message)
            .await
            .map_err(|e| ClientError::from_transport(e, self.server))?;
        Ok(())
    }

    async fn receive(&self, data: &[u8]) {
        let applied = self
            .state
            .write()
            .await
            .apply_datagram(data, &self.codec, Instant::now());
        match applied {
            Ok(Applied::StateChanged(state)) => debug!("Match state is now {:?}", state),
            Ok(_) => {}
            Err(e) => debug!("Dropped undecodable frame ({} bytes): {}", data.len(), e),
        }
    }

    /// Records a fatal error and returns true; logs anything else.
    async fn fail(&self, e: ClientError) -> bool {
        if !e.is_fatal() {
            warn!("Socket error: {}", e);
            return false;
        }
        error!("Lost connection to {}: {}", self.server, e);
        *self.failure.write().await = Some(e);
        true
    }
}
