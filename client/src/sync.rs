//! The client's working copy of the match.
//!
//! Written only by the sync thread, read by the render thread. Snapshots are
//! applied strictly in sequence order; anything not newer than the last
//! applied snapshot is dropped.

use log::{debug, info};
use shared::{DecodeError, Frame, MatchState, SequenceGate, Snapshot, SnapshotCodec};
use std::time::Instant;

/// What applying one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A newer snapshot replaced the working one.
    Snapshot,
    /// The snapshot was not newer than the last one applied.
    Stale,
    StateChanged(MatchState),
    /// The frame carries no world state.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct SyncState {
    state: MatchState,
    gate: SequenceGate,
    snapshot: Snapshot,
    winner: Option<String>,
    received_at: Option<Instant>,
    version: u64,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, frame: Frame, now: Instant) -> Applied {
        match frame {
            Frame::Sequenced(message) => {
                if !self.gate.accept(message.sequence) {
                    return Applied::Stale;
                }
                if self.state != MatchState::Active {
                    info!("Match running");
                    self.winner = None;
                }
                self.snapshot = message.snapshot;
                self.received_at = Some(now);
                self.state = MatchState::Active;
                self.version += 1;
                Applied::Snapshot
            }
            Frame::GameOver(winner) => {
                if self.state != MatchState::GameOver {
                    match &winner {
                        Some(image) => info!("Game over, {} wins", image),
                        None => info!("Game over, nobody survived"),
                    }
                }
                self.state = MatchState::GameOver;
                self.winner = winner;
                if !self.snapshot.is_empty() {
                    self.snapshot = Snapshot::new();
                    self.version += 1;
                }
                Applied::StateChanged(MatchState::GameOver)
            }
            Frame::Waiting => {
                self.state = MatchState::Waiting;
                Applied::StateChanged(MatchState::Waiting)
            }
            Frame::Ok | Frame::Echo | Frame::Unknown | Frame::GameAlreadyStarted => {
                Applied::Ignored
            }
        }
    }

    /// Parses and applies a raw datagram. A decode failure leaves the state
    /// untouched.
    pub fn apply_datagram(
        &mut self,
        data: &[u8],
        codec: &SnapshotCodec,
        now: Instant,
    ) -> Result<Applied, DecodeError> {
        let frame = Frame::parse(data, codec)?;
        let applied = self.apply(frame, now);
        if applied == Applied::Stale {
            debug!("Dropped stale snapshot (last applied {})", self.gate.last());
        }
        Ok(applied)
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn last_sequence(&self) -> u64 {
        self.gate.last()
    }

    /// When the current snapshot arrived.
    pub fn received_at(&self) -> Option<Instant> {
        self.received_at
    }

    /// Bumped whenever the displayed entities change.
    pub fn version(&self) -> u64 {
        self.version
    }
}
