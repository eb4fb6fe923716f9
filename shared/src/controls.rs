use crate::codec::{self, DecodeError, EncodeError};
use serde::{Deserialize, Serialize};

/// Control flags sampled from whichever endpoint owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub shoot: bool,
}

impl ControlState {
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        codec::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        codec::deserialize(bytes)
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}
