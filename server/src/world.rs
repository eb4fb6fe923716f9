//! The narrow seam between the match/network layer and whatever simulates
//! the game world.

use shared::{ControlState, Snapshot};

/// Handle to a simulated player actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerRef(pub u32);

/// What the server needs from an authoritative world.
pub trait Simulation {
    /// Clears everything and loads the starting layout of a match.
    fn reset(&mut self);

    /// Spawns a player in spawn slot `slot` wearing skin `skin`.
    fn spawn_player(&mut self, slot: usize, skin: usize) -> PlayerRef;

    /// Removes a player actor, e.g. when its owner goes away mid-match.
    fn despawn_player(&mut self, player: PlayerRef);

    /// Latest control flags for a player; kept until replaced.
    fn set_controls(&mut self, player: PlayerRef, controls: ControlState);

    /// Advances the world by `dt` seconds.
    fn step(&mut self, dt: f32);

    fn is_alive(&self, player: PlayerRef) -> bool;

    /// Image reference of a player, used to name a winner.
    fn player_image(&self, player: PlayerRef) -> Option<String>;

    /// Every visible entity, positions rounded to pixels.
    fn snapshot(&self) -> Snapshot;
}
