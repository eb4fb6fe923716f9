//! Types and wire formats shared by the authoritative server and its viewers.
//!
//! Everything that has to agree byte-for-byte on both ends of the socket lives
//! here: message tags, the snapshot codec, the control blob, the match state
//! enum and the sequence gate used to drop stale broadcasts.

pub mod codec;
pub mod controls;
pub mod protocol;
pub mod snapshot;
pub mod state;

pub use codec::{DecodeError, EncodeError, SnapshotCodec};
pub use controls::ControlState;
pub use protocol::{Frame, Request};
pub use snapshot::{EntityState, Facing, InvalidFacing, Snapshot};
pub use state::{MatchState, SequenceGate};

/// Well-known server port.
pub const PORT: u16 = 65432;

/// Largest payload a single UDP datagram can carry.
pub const MAX_DATAGRAM: usize = 65507;

/// Compression is a build-wide decision; both binaries read this constant.
pub const USE_COMPRESSION: bool = true;

/// Number of distinct player skins; slot `i` wears skin `i % SKIN_COUNT`.
pub const SKIN_COUNT: usize = 3;

pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const PLAYER_SIZE: f32 = 32.0;
pub const PLATFORM_WIDTH: f32 = 128.0;
pub const PLATFORM_HEIGHT: f32 = 16.0;
pub const SHOT_WIDTH: f32 = 12.0;
pub const SHOT_HEIGHT: f32 = 4.0;

/// Image reference for a player skin.
pub fn skin_image(skin: usize) -> String {
    format!("images/player{}.png", skin % SKIN_COUNT)
}

/// Image reference for a level tile.
pub fn level_image(index: usize) -> String {
    format!("images/level/{}.png", index)
}

pub const SHOT_IMAGE: &str = "images/attacks/shoot0.png";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_image_wraps() {
        assert_eq!(skin_image(0), "images/player0.png");
        assert_eq!(skin_image(2), "images/player2.png");
        assert_eq!(skin_image(3), "images/player0.png");
        assert_eq!(skin_image(7), "images/player1.png");
    }

    #[test]
    fn test_level_image() {
        assert_eq!(level_image(4), "images/level/4.png");
    }

    #[test]
    fn test_datagram_ceiling() {
        assert!(MAX_DATAGRAM <= u16::MAX as usize);
    }
}
