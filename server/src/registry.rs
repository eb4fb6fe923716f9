//! Endpoint bookkeeping for the authoritative server
//!
//! This module tracks who is taking part in the current match:
//! - Admission of new endpoints while the lobby is open
//! - Binding each admitted endpoint to a simulated player at match start
//! - Liveness tracking so silent endpoints can be torn down
//!
//! UDP has no connection to close, so "teardown" here means an endpoint that
//! has been silent for longer than the configured session timeout.

use crate::world::PlayerRef;
use log::info;
use shared::protocol::{GAME_ALREADY_STARTED, OK};
use shared::MatchState;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Outcome of a `join_game` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    AlreadyStarted,
}

impl Admission {
    /// Datagram sent back to the joining endpoint.
    pub fn reply(self) -> &'static [u8] {
        match self {
            Admission::Accepted => OK,
            Admission::AlreadyStarted => GAME_ALREADY_STARTED,
        }
    }
}

/// One admitted endpoint
#[derive(Debug, Clone)]
pub struct Session {
    pub endpoint: SocketAddr,
    /// `None` in the lobby, bound once per match start
    pub player: Option<PlayerRef>,
    /// Last time any datagram arrived from this endpoint
    pub last_seen: Instant,
}

impl Session {
    pub fn new(endpoint: SocketAddr, now: Instant) -> Self {
        Self {
            endpoint,
            player: None,
            last_seen: now,
        }
    }

    pub fn is_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }
}

/// Sessions in admission order, at most one per endpoint.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits `endpoint` if the lobby is still open.
    ///
    /// A repeated join from an endpoint that is already admitted is accepted
    /// again without creating a second session.
    pub fn admit(&mut self, endpoint: SocketAddr, state: MatchState, now: Instant) -> Admission {
        if !state.accepts_joins() {
            return Admission::AlreadyStarted;
        }

        if let Some(session) = self.get_mut(endpoint) {
            session.last_seen = now;
        } else {
            info!("Endpoint {} joined the lobby", endpoint);
            self.sessions.push(Session::new(endpoint, now));
        }
        Admission::Accepted
    }

    /// Binds a session to a simulated player. Returns false for unknown endpoints.
    pub fn bind(&mut self, endpoint: SocketAddr, player: PlayerRef) -> bool {
        match self.get_mut(endpoint) {
            Some(session) => {
                session.player = Some(player);
                true
            }
            None => false,
        }
    }

    pub fn unbind_all(&mut self) {
        for session in &mut self.sessions {
            session.player = None;
        }
    }

    pub fn remove(&mut self, endpoint: SocketAddr) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.endpoint == endpoint)?;
        let session = self.sessions.remove(index);
        info!("Endpoint {} left", endpoint);
        Some(session)
    }

    pub fn get(&self, endpoint: SocketAddr) -> Option<&Session> {
        self.sessions.iter().find(|s| s.endpoint == endpoint)
    }

    fn get_mut(&mut self, endpoint: SocketAddr) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.endpoint == endpoint)
    }

    /// Refreshes liveness for a known endpoint.
    pub fn touch(&mut self, endpoint: SocketAddr, now: Instant) -> bool {
        match self.get_mut(endpoint) {
            Some(session) => {
                session.last_seen = now;
                true
            }
            None => false,
        }
    }

    pub fn player_of(&self, endpoint: SocketAddr) -> Option<PlayerRef> {
        self.get(endpoint).and_then(|s| s.player)
    }

    /// Endpoints in admission order.
    pub fn endpoints(&self) -> Vec<SocketAddr> {
        self.sessions.iter().map(|s| s.endpoint).collect()
    }

    pub fn bound_players(&self) -> Vec<PlayerRef> {
        self.sessions.iter().filter_map(|s| s.player).collect()
    }

    /// Endpoints that have been silent for longer than `timeout`.
    pub fn timed_out(&self, now: Instant, timeout: Duration) -> Vec<SocketAddr> {
        self.sessions
            .iter()
            .filter(|s| s.is_timed_out(now, timeout))
            .map(|s| s.endpoint)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
