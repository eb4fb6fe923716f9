//! Authoritative match state: lobby, active match, game over and rematch.
//!
//! `Game` owns the session registry and the world so that a single lock
//! guards every mutation, whichever thread makes it.

use crate::registry::{Admission, Session, SessionRegistry};
use crate::world::{PlayerRef, Simulation};
use log::{debug, info, warn};
use shared::protocol::{self, Request, UNKNOWN, WAITING};
use shared::{ControlState, EncodeError, MatchState, SnapshotCodec, SKIN_COUNT};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("a match can only be started from the lobby (state is {0:?})")]
    NotWaiting(MatchState),
    #[error("a rematch needs a finished match (state is {0:?})")]
    NotGameOver(MatchState),
}

/// A frame ready to go out to every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub frame: Vec<u8>,
    pub targets: Vec<SocketAddr>,
}

pub struct Game<W> {
    state: MatchState,
    registry: SessionRegistry,
    world: W,
    winner: Option<String>,
    sequence: u64,
    codec: SnapshotCodec,
    /// Whether the server operator plays too.
    hosted: bool,
    host: Option<PlayerRef>,
}

impl<W: Simulation> Game<W> {
    pub fn new(world: W, codec: SnapshotCodec) -> Self {
        Self {
            state: MatchState::Waiting,
            registry: SessionRegistry::new(),
            world,
            winner: None,
            sequence: 0,
            codec,
            hosted: false,
            host: None,
        }
    }

    /// Reserves slot 0 of every match for a fighter steered on the server
    /// itself through [`Game::set_host_controls`].
    pub fn with_host_player(mut self) -> Self {
        self.hosted = true;
        self
    }

    pub fn is_hosted(&self) -> bool {
        self.hosted
    }

    /// The host's fighter in the current match.
    pub fn host_player(&self) -> Option<PlayerRef> {
        self.host
    }

    /// Everyone who would take part in a match started now.
    pub fn participant_count(&self) -> usize {
        self.registry.len() + usize::from(self.hosted)
    }

    pub fn set_host_controls(&mut self, controls: ControlState) {
        if let Some(host) = self.host {
            self.world.set_controls(host, controls);
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Image of the sole survivor of the last match, if there was one.
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Sequence number of the last SEQ frame handed out.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn admit(&mut self, endpoint: SocketAddr, now: Instant) -> Admission {
        let admission = self.registry.admit(endpoint, self.state, now);
        if admission == Admission::AlreadyStarted {
            info!("Rejected join from {}: match already started", endpoint);
        }
        admission
    }

    /// Operator action: leave the lobby and start the first match.
    pub fn start_match(&mut self) -> Result<(), MatchError> {
        if self.state != MatchState::Waiting {
            return Err(MatchError::NotWaiting(self.state));
        }
        self.begin();
        Ok(())
    }

    /// Operator action: start another match with everyone still registered.
    pub fn rematch(&mut self) -> Result<(), MatchError> {
        if self.state != MatchState::GameOver {
            return Err(MatchError::NotGameOver(self.state));
        }
        self.begin();
        Ok(())
    }

    fn begin(&mut self) {
        self.world.reset();
        self.registry.unbind_all();

        self.host = self.hosted.then(|| self.world.spawn_player(0, 0));
        let first_remote = usize::from(self.hosted);

        for (index, endpoint) in self.registry.endpoints().into_iter().enumerate() {
            let slot = first_remote + index;
            let player = self.world.spawn_player(slot, slot % SKIN_COUNT);
            self.registry.bind(endpoint, player);
            debug!("Bound {} to {:?} in slot {}", endpoint, player, slot);
        }

        self.winner = None;
        self.state = MatchState::Active;
        info!("Match started with {} players", self.participant_count());
    }

    /// Tears down a session. May end an active match.
    pub fn remove(&mut self, endpoint: SocketAddr) -> Option<Session> {
        let session = self.registry.remove(endpoint)?;
        if let Some(player) = session.player {
            self.world.despawn_player(player);
        }
        if self.state == MatchState::Active {
            self.check_game_over();
        }
        Some(session)
    }

    /// Removes every session silent for longer than `timeout`.
    pub fn expire_sessions(&mut self, now: Instant, timeout: Duration) -> Vec<SocketAddr> {
        let expired = self.registry.timed_out(now, timeout);
        for endpoint in &expired {
            info!("Session {} timed out", endpoint);
            self.remove(*endpoint);
        }
        expired
    }

    /// Stores decoded controls on the endpoint's player. Undecodable blobs
    /// are dropped and the previous controls stay in effect.
    pub fn apply_controls(&mut self, endpoint: SocketAddr, raw: &[u8]) {
        let Some(player) = self.registry.player_of(endpoint) else {
            return;
        };
        match ControlState::decode(raw) {
            Ok(controls) => self.world.set_controls(player, controls),
            Err(e) => debug!("Dropped controls from {}: {}", endpoint, e),
        }
    }

    pub fn alive_players(&self) -> Vec<PlayerRef> {
        self.host
            .into_iter()
            .chain(self.registry.bound_players())
            .filter(|player| self.world.is_alive(*player))
            .collect()
    }

    /// One simulation tick. Only an active match moves.
    pub fn tick(&mut self, dt: f32) {
        if self.state != MatchState::Active {
            return;
        }
        self.world.step(dt);
        self.check_game_over();
    }

    fn check_game_over(&mut self) {
        let alive = self.alive_players();
        if alive.len() > 1 {
            return;
        }

        self.winner = match alive.as_slice() {
            [survivor] => self.world.player_image(*survivor),
            _ => None,
        };
        self.state = MatchState::GameOver;
        match &self.winner {
            Some(image) => info!("Game over, {} wins", image),
            None => info!("Game over, nobody survived"),
        }
    }

    /// Dispatches one received datagram and returns the reply, if any.
    pub fn handle_datagram(
        &mut self,
        endpoint: SocketAddr,
        data: &[u8],
        now: Instant,
    ) -> Option<Vec<u8>> {
        self.registry.touch(endpoint, now);

        match Request::parse(data) {
            Request::Join => Some(self.admit(endpoint, now).reply().to_vec()),
            Request::Controls(raw) => {
                self.apply_controls(endpoint, raw);
                None
            }
            Request::GetFrame => match self.current_frame() {
                Ok(frame) => Some(frame),
                Err(e) => {
                    warn!("Could not encode frame for {}: {}", endpoint, e);
                    None
                }
            },
            Request::Echo => Some(data.to_vec()),
            Request::Unknown => Some(UNKNOWN.to_vec()),
        }
    }

    /// The frame a polling client should see right now. Does not advance the
    /// sequence counter.
    pub fn current_frame(&self) -> Result<Vec<u8>, EncodeError> {
        match self.state {
            MatchState::Waiting => Ok(WAITING.to_vec()),
            MatchState::Active => {
                protocol::sequenced_frame(self.sequence, &self.world.snapshot(), &self.codec)
            }
            MatchState::GameOver => Ok(protocol::game_over_frame(self.winner.as_deref())),
        }
    }

    /// Builds the next broadcast. Nothing goes out from the lobby or to an
    /// empty registry; SEQ frames advance the sequence counter.
    pub fn next_broadcast(&mut self) -> Result<Option<Broadcast>, EncodeError> {
        if self.state == MatchState::Waiting || self.registry.is_empty() {
            return Ok(None);
        }

        let frame = match self.state {
            MatchState::Active => {
                let next = self.sequence + 1;
                let frame = protocol::sequenced_frame(next, &self.world.snapshot(), &self.codec)?;
                self.sequence = next;
                frame
            }
            _ => protocol::game_over_frame(self.winner.as_deref()),
        };

        Ok(Some(Broadcast {
            frame,
            targets: self.registry.endpoints(),
        }))
    }
}
