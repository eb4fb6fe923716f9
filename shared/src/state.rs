use crate::protocol::Frame;

/// Lifecycle of one play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchState {
    #[default]
    Waiting,
    Active,
    GameOver,
}

impl MatchState {
    /// The state a viewer infers from a received frame. Only the three
    /// state-bearing shapes move it; everything else leaves it alone.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame {
            Frame::Waiting => Some(MatchState::Waiting),
            Frame::Sequenced(_) => Some(MatchState::Active),
            Frame::GameOver(_) => Some(MatchState::GameOver),
            _ => None,
        }
    }

    pub fn accepts_joins(self) -> bool {
        self == MatchState::Waiting
    }
}

/// Drops broadcasts that are not newer than the last one applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceGate {
    last: u64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and advances if `sequence` is strictly newer.
    pub fn accept(&mut self, sequence: u64) -> bool {
        if sequence > self.last {
            self.last = sequence;
            true
        } else {
            false
        }
    }

    pub fn last(&self) -> u64 {
        self.last
    }
}
