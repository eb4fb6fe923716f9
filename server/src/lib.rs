//! # Game Server Library
//!
//! Authoritative server for the arena brawler. The server owns the only real
//! copy of the world, steps it at a fixed rate, and broadcasts full snapshots
//! of everything visible to every admitted endpoint.
//!
//! ## Core Responsibilities
//!
//! ### Admission
//! Endpoints join while the lobby is open. Once the operator starts the match
//! the lobby closes and further joins are answered with
//! `game_already_started`.
//!
//! ### Authoritative Simulation
//! Clients only send control flags. Physics, hits and deaths are decided here.
//! When one player or none is left standing the match ends and the survivor,
//! if any, is announced.
//!
//! ### State Broadcasting
//! Snapshots go out as sequence-numbered datagrams. Clients drop anything
//! older than what they already applied, so lost or reordered datagrams never
//! roll the view back.
//!
//! ## Threading
//!
//! Two OS threads touch the match:
//! - **Network thread** (`network`): owns the socket, answers requests,
//!   expires silent sessions and rate-limits broadcasts.
//! - **Tick loop** (the `server` binary): advances the world at the tick rate
//!   and serves the operator console.
//!
//! Both go through one `tokio::sync::RwLock` around [`game::Game`]; no lock is
//! held across a socket operation.
//!
//! ## Module Organization
//!
//! - `registry`: sessions in admission order and their liveness
//! - `game`: the match state machine on top of registry and world
//! - `world`: the [`world::Simulation`] seam between match logic and physics
//! - `arena`: the built-in platform brawler implementing that seam
//! - `network`: socket thread and broadcast scheduling
//! - `menu`: operator console tables
//! - `host`: console steering for the operator's own fighter
//! - `config`: tunables with protocol defaults
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::arena::Arena;
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::bind(ServerConfig::default(), Arena::new())?;
//!     server.start()?;
//!
//!     let game = server.game();
//!     // ... once players have joined:
//!     game.blocking_write().start_match()?;
//!     loop {
//!         game.blocking_write().tick(1.0 / 60.0);
//!         std::thread::sleep(std::time::Duration::from_millis(16));
//!     }
//! }
//! ```

pub mod arena;
pub mod config;
pub mod game;
pub mod host;
pub mod menu;
pub mod network;
pub mod registry;
pub mod utils;
pub mod world;
