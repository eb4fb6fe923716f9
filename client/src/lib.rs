//! # Game Client Library
//!
//! Viewer for the arena brawler. The client predicts nothing: it sends its
//! control flags and draws whatever the server last broadcast.
//!
//! ## Architecture Overview
//!
//! Two threads cooperate through one `tokio::sync::RwLock<SyncState>`:
//!
//! ### Sync Thread (`network`)
//! Owns the socket after the join handshake. Sends the latest controls at a
//! fixed rate, which also keeps the session alive, and applies every received
//! frame to the working state. Broadcasts that are not newer than the last
//! one applied are dropped, so the view never moves backwards.
//!
//! ### Render Thread (the `client` binary)
//! Samples the keyboard, pushes the controls, reconciles its scene against the
//! latest snapshot and draws it. A fatal transport error recorded by the sync
//! thread ends the session here.
//!
//! ## Module Organization
//!
//! - `config`: timeouts and rates, server address parsing
//! - `network`: handshake, [`network::ClientEngine`] and [`network::ClientError`]
//! - `sync`: the working state and its ordering rules
//! - `scene`: displayed entities and snapshot reconciliation
//! - `input`: keyboard to control flags
//! - `rendering`: macroquad drawing
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::network::ClientEngine;
//! use client::scene::{reconcile, SceneGraph};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = "127.0.0.1:65432".parse()?;
//!     let mut engine = ClientEngine::connect(server, ClientConfig::default())?;
//!     engine.start()?;
//!
//!     let mut scene = SceneGraph::new();
//!     let state = engine.sync_state();
//!     reconcile(&mut scene, state.blocking_read().snapshot());
//!
//!     engine.disconnect();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod input;
pub mod network;
pub mod rendering;
pub mod scene;
pub mod sync;
