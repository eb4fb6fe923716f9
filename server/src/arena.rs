//! The built-in platform brawler.
//!
//! Rules run in fixed 60 Hz frames, whatever `dt` the tick loop hands in:
//! leftover time is carried to the next step. All speeds are pixels per frame.
//!
//! - Players accelerate left/right, lose a quarter of their horizontal speed to
//!   friction every frame and fall under gravity.
//! - Platforms are one-way: players land on them from above and can jump
//!   through them from below. The whole level drifts downward and platforms
//!   that leave the bottom reappear at the top at a random x.
//! - Pressing shoot fires one shot; holding it does not fire again. Shots
//!   stop at the first fighter or platform they touch.
//! - A player dies when health reaches zero or when they fall off the bottom.

use crate::world::{PlayerRef, Simulation};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    level_image, skin_image, ControlState, EntityState, Facing, Snapshot, PLATFORM_HEIGHT,
    PLATFORM_WIDTH, PLAYER_SIZE, SHOT_HEIGHT, SHOT_IMAGE, SHOT_WIDTH, WORLD_HEIGHT, WORLD_WIDTH,
};

const FRAME: f32 = 1.0 / 60.0;

pub const MOVE_ACCELERATION: f32 = 4.0;
pub const FRICTION: f32 = 0.25;
pub const JUMP_VELOCITY: f32 = 24.0;
pub const GRAVITY: f32 = 2.0;
pub const SCROLL_SPEED: f32 = 1.0;

pub const MAX_HEALTH: i32 = 100;
pub const SHOT_SPEED: f32 = 10.0 + MOVE_ACCELERATION;
pub const SHOT_DAMAGE: i32 = 5;
pub const SHOT_RANGE: f32 = 400.0;

pub const SPAWN_Y: f32 = 200.0;
pub const SPAWN_SPACING: f32 = 100.0;

/// Platforms below this line wrap back to the top.
const WRAP_Y: f32 = WORLD_HEIGHT + 120.0;

/// Starting platform positions (left, top).
const LEVEL_LAYOUT: [(f32, f32); 8] = [
    (336.0, 260.0),
    (80.0, 180.0),
    (560.0, 180.0),
    (200.0, 380.0),
    (470.0, 400.0),
    (40.0, 520.0),
    (620.0, 520.0),
    (330.0, 100.0),
];

#[derive(Debug, Clone, Copy)]
struct Bounds {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl Bounds {
    fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    fn intersects(&self, other: &Bounds) -> bool {
        !(self.right <= other.left
            || other.right <= self.left
            || self.bottom <= other.top
            || other.bottom <= self.top)
    }
}

#[derive(Debug, Clone)]
struct Platform {
    index: usize,
    x: f32,
    y: f32,
}

impl Platform {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, PLATFORM_WIDTH, PLATFORM_HEIGHT)
    }
}

#[derive(Debug, Clone)]
struct Fighter {
    id: PlayerRef,
    slot: usize,
    image: String,
    x: f32,
    y: f32,
    vel_x: f32,
    vel_y: f32,
    facing: Facing,
    grounded: bool,
    health: i32,
    controls: ControlState,
    shoot_held: bool,
}

impl Fighter {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }
}

#[derive(Debug, Clone)]
struct Shot {
    id: u64,
    owner: PlayerRef,
    x: f32,
    y: f32,
    vel_x: f32,
    travelled: f32,
}

impl Shot {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, SHOT_WIDTH, SHOT_HEIGHT)
    }

    fn facing(&self) -> Facing {
        Facing::from_sign(self.vel_x)
    }
}

pub struct Arena {
    platforms: Vec<Platform>,
    fighters: Vec<Fighter>,
    shots: Vec<Shot>,
    next_player: u32,
    next_shot: u64,
    accumulator: f32,
    rng: StdRng,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Arena whose platform wrapping is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut arena = Self {
            platforms: Vec::new(),
            fighters: Vec::new(),
            shots: Vec::new(),
            next_player: 0,
            next_shot: 0,
            accumulator: 0.0,
            rng,
        };
        arena.reset();
        arena
    }

    pub fn spawn_position(slot: usize) -> (f32, f32) {
        let x = (WORLD_WIDTH / 2.0 + SPAWN_SPACING * slot as f32) % (WORLD_WIDTH - PLAYER_SIZE);
        (x, SPAWN_Y)
    }

    fn fighter(&self, player: PlayerRef) -> Option<&Fighter> {
        self.fighters.iter().find(|f| f.id == player)
    }

    fn frame(&mut self) {
        self.scroll_level();

        let mut fired = Vec::new();
        for fighter in &mut self.fighters {
            if let Some(shot) = Self::read_controls(fighter) {
                fired.push(shot);
            }
            Self::move_fighter(fighter, &self.platforms);
        }
        for (owner, x, y, facing) in fired {
            self.next_shot += 1;
            self.shots.push(Shot {
                id: self.next_shot,
                owner,
                x,
                y,
                vel_x: SHOT_SPEED * facing.sign() as f32,
                travelled: 0.0,
            });
        }

        self.move_shots();

        self.fighters.retain(|fighter| {
            let alive = fighter.health > 0;
            if !alive {
                debug!("{:?} in slot {} died", fighter.id, fighter.slot);
            }
            alive
        });
    }

    fn scroll_level(&mut self) {
        for platform in &mut self.platforms {
            platform.y += SCROLL_SPEED;
            if platform.y > WRAP_Y {
                platform.y = -PLATFORM_HEIGHT;
                platform.x = self.rng.gen_range(0.0..WORLD_WIDTH - PLATFORM_WIDTH);
            }
        }
    }

    /// Applies the fighter's controls. Returns a shot to spawn on a fresh
    /// shoot press.
    fn read_controls(fighter: &mut Fighter) -> Option<(PlayerRef, f32, f32, Facing)> {
        let controls = fighter.controls;
        if controls.left {
            fighter.facing = Facing::Left;
            fighter.vel_x -= MOVE_ACCELERATION;
        }
        if controls.right {
            fighter.facing = Facing::Right;
            fighter.vel_x += MOVE_ACCELERATION;
        }
        if controls.jump && fighter.grounded {
            fighter.vel_y = -JUMP_VELOCITY;
            fighter.grounded = false;
        }

        let pressed = controls.shoot && !fighter.shoot_held;
        fighter.shoot_held = controls.shoot;
        if !pressed {
            return None;
        }

        let x = match fighter.facing {
            Facing::Right => fighter.x + PLAYER_SIZE,
            Facing::Left => fighter.x - SHOT_WIDTH,
        };
        let y = fighter.y + (PLAYER_SIZE - SHOT_HEIGHT) / 2.0;
        Some((fighter.id, x, y, fighter.facing))
    }

    fn move_fighter(fighter: &mut Fighter, platforms: &[Platform]) {
        fighter.x += fighter.vel_x;
        let max_x = WORLD_WIDTH - PLAYER_SIZE;
        if fighter.x < 0.0 || fighter.x > max_x {
            fighter.x = fighter.x.clamp(0.0, max_x);
            fighter.vel_x = 0.0;
        }
        fighter.vel_x -= fighter.vel_x * FRICTION;

        let previous_bottom = fighter.y + PLAYER_SIZE;
        fighter.vel_y += GRAVITY;
        fighter.y += fighter.vel_y;

        fighter.grounded = false;
        if fighter.vel_y >= 0.0 {
            let body = fighter.bounds();
            let landing = platforms.iter().map(Platform::bounds).find(|platform| {
                body.right > platform.left
                    && body.left < platform.right
                    && previous_bottom <= platform.top
                    && body.bottom >= platform.top
            });
            if let Some(platform) = landing {
                fighter.y = platform.top - PLAYER_SIZE;
                fighter.vel_y = 0.0;
                fighter.grounded = true;
            }
        }

        if fighter.y >= WORLD_HEIGHT {
            fighter.health = 0;
        }
    }

    fn move_shots(&mut self) {
        let fighters = &mut self.fighters;
        let platforms = &self.platforms;
        self.shots.retain_mut(|shot| {
            shot.x += shot.vel_x;
            shot.travelled += shot.vel_x.abs();

            let bounds = shot.bounds();
            let hit = fighters
                .iter_mut()
                .find(|f| f.id != shot.owner && f.bounds().intersects(&bounds));
            if let Some(target) = hit {
                target.health -= SHOT_DAMAGE;
                target.vel_x += shot.vel_x / 2.0;
                debug!(
                    "Shot {} hit {:?}, health now {}",
                    shot.id, target.id, target.health
                );
                return false;
            }
            if platforms.iter().any(|p| p.bounds().intersects(&bounds)) {
                return false;
            }

            shot.x >= 0.0 && shot.x <= WORLD_WIDTH && shot.travelled <= SHOT_RANGE
        });
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation for Arena {
    fn reset(&mut self) {
        self.platforms = LEVEL_LAYOUT
            .iter()
            .enumerate()
            .map(|(index, &(x, y))| Platform { index, x, y })
            .collect();
        self.fighters.clear();
        self.shots.clear();
        self.accumulator = 0.0;
    }

    fn spawn_player(&mut self, slot: usize, skin: usize) -> PlayerRef {
        self.next_player += 1;
        let id = PlayerRef(self.next_player);
        let (x, y) = Self::spawn_position(slot);

        self.fighters.push(Fighter {
            id,
            slot,
            image: skin_image(skin),
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            facing: Facing::Right,
            grounded: false,
            health: MAX_HEALTH,
            controls: ControlState::default(),
            shoot_held: false,
        });
        debug!("Spawned {:?} in slot {} at ({}, {})", id, slot, x, y);
        id
    }

    fn despawn_player(&mut self, player: PlayerRef) {
        self.fighters.retain(|f| f.id != player);
        self.shots.retain(|s| s.owner != player);
    }

    fn set_controls(&mut self, player: PlayerRef, controls: ControlState) {
        if let Some(fighter) = self.fighters.iter_mut().find(|f| f.id == player) {
            fighter.controls = controls;
        }
    }

    fn step(&mut self, dt: f32) {
        self.accumulator += dt;
        while self.accumulator >= FRAME {
            self.frame();
            self.accumulator -= FRAME;
        }
    }

    fn is_alive(&self, player: PlayerRef) -> bool {
        self.fighter(player).is_some()
    }

    fn player_image(&self, player: PlayerRef) -> Option<String> {
        self.fighter(player).map(|f| f.image.clone())
    }

    fn snapshot(&self) -> Snapshot {
        let platforms = self.platforms.iter().map(|p| {
            (
                format!("level{}", p.index),
                EntityState::new(level_image(p.index), p.x, p.y, Facing::Right),
            )
        });
        let fighters = self.fighters.iter().map(|f| {
            (
                format!("player{}", f.slot),
                EntityState::new(f.image.clone(), f.x, f.y, f.facing),
            )
        });
        let shots = self.shots.iter().map(|s| {
            (
                format!("shot{}", s.id),
                EntityState::new(SHOT_IMAGE, s.x, s.y, s.facing()),
            )
        });

        platforms.chain(fighters).chain(shots).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn empty_arena() -> Arena {
        let mut arena = Arena::with_seed(7);
        arena.platforms.clear();
        arena
    }

    fn fighter_mut(arena: &mut Arena, player: PlayerRef) -> &mut Fighter {
        arena.fighters.iter_mut().find(|f| f.id == player).unwrap()
    }

    fn frames(arena: &mut Arena, count: usize) {
        for _ in 0..count {
            arena.step(FRAME);
        }
    }

    #[test]
    fn test_spawn_slots() {
        assert_eq!(Arena::spawn_position(0), (400.0, 200.0));
        assert_eq!(Arena::spawn_position(1), (500.0, 200.0));
        let (x, _) = Arena::spawn_position(9);
        assert!(x >= 0.0 && x <= WORLD_WIDTH - PLAYER_SIZE);
    }

    #[test]
    fn test_gravity_accelerates_falling() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);

        frames(&mut arena, 3);
        let fighter = arena.fighter(player).unwrap();
        assert_approx_eq!(fighter.y, SPAWN_Y + 2.0 + 4.0 + 6.0);
        assert_approx_eq!(fighter.vel_y, 3.0 * GRAVITY);
    }

    #[test]
    fn test_acceleration_and_friction() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);
        arena.set_controls(
            player,
            ControlState {
                right: true,
                ..Default::default()
            },
        );

        frames(&mut arena, 1);
        let fighter = arena.fighter(player).unwrap();
        assert_approx_eq!(fighter.x, 404.0);
        assert_approx_eq!(fighter.vel_x, 3.0);

        arena.set_controls(player, ControlState::default());
        frames(&mut arena, 1);
        let fighter = arena.fighter(player).unwrap();
        assert_approx_eq!(fighter.x, 407.0);
        assert_approx_eq!(fighter.vel_x, 2.25);
    }

    #[test]
    fn test_walls_stop_horizontal_motion() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);
        fighter_mut(&mut arena, player).x = 2.0;
        arena.set_controls(
            player,
            ControlState {
                left: true,
                ..Default::default()
            },
        );

        frames(&mut arena, 1);
        let fighter = arena.fighter(player).unwrap();
        assert_approx_eq!(fighter.x, 0.0);
        assert_approx_eq!(fighter.vel_x, 0.0);
        assert_eq!(fighter.facing, Facing::Left);
    }

    #[test]
    fn test_lands_and_rides_platform() {
        let mut arena = empty_arena();
        arena.platforms.push(Platform {
            index: 0,
            x: 350.0,
            y: 300.0,
        });
        let player = arena.spawn_player(0, 0);

        frames(&mut arena, 30);
        let platform_top = arena.platforms[0].y;
        let fighter = arena.fighter(player).unwrap();
        assert!(fighter.grounded);
        assert_approx_eq!(fighter.y, platform_top - PLAYER_SIZE);
        assert_approx_eq!(platform_top, 300.0 + 30.0 * SCROLL_SPEED);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);
        let jump = ControlState {
            jump: true,
            ..Default::default()
        };

        // Airborne: no jump.
        arena.set_controls(player, jump);
        frames(&mut arena, 1);
        assert!(arena.fighter(player).unwrap().vel_y > 0.0);

        arena.platforms.push(Platform {
            index: 0,
            x: 350.0,
            y: 300.0,
        });
        arena.set_controls(player, ControlState::default());
        frames(&mut arena, 30);
        assert!(arena.fighter(player).unwrap().grounded);

        let before = arena.fighter(player).unwrap().y;
        arena.set_controls(player, jump);
        frames(&mut arena, 1);
        let fighter = arena.fighter(player).unwrap();
        assert_approx_eq!(fighter.vel_y, -JUMP_VELOCITY + GRAVITY);
        assert!(fighter.y < before);
    }

    #[test]
    fn test_platform_wraps_to_top() {
        let mut arena = Arena::with_seed(3);
        arena.platforms[0].y = WRAP_Y;

        frames(&mut arena, 1);
        let platform = &arena.platforms[0];
        assert_approx_eq!(platform.y, -PLATFORM_HEIGHT);
        assert!(platform.x >= 0.0 && platform.x <= WORLD_WIDTH - PLATFORM_WIDTH);
    }

    #[test]
    fn test_wrapping_is_reproducible_per_seed() {
        let mut a = Arena::with_seed(11);
        let mut b = Arena::with_seed(11);
        a.platforms[2].y = WRAP_Y;
        b.platforms[2].y = WRAP_Y;
        frames(&mut a, 1);
        frames(&mut b, 1);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_falling_off_the_bottom_kills() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 1);
        fighter_mut(&mut arena, player).y = WORLD_HEIGHT - 1.0;

        frames(&mut arena, 1);
        assert!(!arena.is_alive(player));
        assert_eq!(arena.player_image(player), None);
        assert!(!arena.snapshot().contains("player0"));
    }

    #[test]
    fn test_shoot_is_edge_triggered() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);
        let shoot = ControlState {
            shoot: true,
            ..Default::default()
        };

        arena.set_controls(player, shoot);
        frames(&mut arena, 3);
        assert_eq!(arena.shots.len(), 1);

        arena.set_controls(player, ControlState::default());
        frames(&mut arena, 1);
        arena.set_controls(player, shoot);
        frames(&mut arena, 1);
        assert_eq!(arena.shots.len(), 2);
    }

    #[test]
    fn test_shot_range_is_limited() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);
        fighter_mut(&mut arena, player).x = 0.0;
        arena.set_controls(
            player,
            ControlState {
                shoot: true,
                ..Default::default()
            },
        );

        frames(&mut arena, 1);
        assert_eq!(arena.shots.len(), 1);
        let frames_in_range = (SHOT_RANGE / SHOT_SPEED) as usize;
        frames(&mut arena, frames_in_range + 1);
        assert!(arena.shots.is_empty());
    }

    #[test]
    fn test_shot_hits_and_knocks_back() {
        let mut arena = empty_arena();
        arena.platforms.push(Platform {
            index: 0,
            x: 100.0,
            y: 300.0,
        });
        let shooter = arena.spawn_player(0, 0);
        let target = arena.spawn_player(1, 1);
        for (player, x) in [(shooter, 100.0), (target, 190.0)] {
            let fighter = fighter_mut(&mut arena, player);
            fighter.x = x;
            fighter.y = 300.0 - PLAYER_SIZE;
        }
        frames(&mut arena, 2);
        assert!(arena.fighter(shooter).unwrap().grounded);

        arena.set_controls(
            shooter,
            ControlState {
                shoot: true,
                ..Default::default()
            },
        );
        frames(&mut arena, 6);

        let hit = arena.fighter(target).unwrap();
        assert_eq!(hit.health, MAX_HEALTH - SHOT_DAMAGE);
        assert!(hit.x > 190.0);
        assert!(arena.shots.is_empty());
        assert_eq!(arena.fighter(shooter).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn test_platforms_block_shots() {
        let mut arena = empty_arena();
        let shooter = arena.spawn_player(0, 0);
        let target = arena.spawn_player(1, 1);
        for (player, x) in [(shooter, 100.0), (target, 400.0)] {
            let fighter = fighter_mut(&mut arena, player);
            fighter.x = x;
            fighter.y = 300.0;
        }
        // Stacked platforms form a wall between the two
        for index in 0..7 {
            let y = 250.0 + index as f32 * PLATFORM_HEIGHT;
            arena.platforms.push(Platform { index, x: 180.0, y });
        }

        arena.set_controls(
            shooter,
            ControlState {
                shoot: true,
                ..Default::default()
            },
        );
        frames(&mut arena, 1);
        assert_eq!(arena.shots.len(), 1);

        frames(&mut arena, 10);
        assert!(arena.shots.is_empty());
        assert_eq!(arena.fighter(target).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn test_health_depletion_kills() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);
        fighter_mut(&mut arena, player).health = 0;
        frames(&mut arena, 1);
        assert!(!arena.is_alive(player));
    }

    #[test]
    fn test_step_carries_leftover_time() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);

        arena.step(FRAME / 2.0);
        assert_approx_eq!(arena.fighter(player).unwrap().y, SPAWN_Y);
        arena.step(FRAME / 2.0 + 0.0001);
        assert_approx_eq!(arena.fighter(player).unwrap().y, SPAWN_Y + GRAVITY);
    }

    #[test]
    fn test_snapshot_names_every_entity() {
        let mut arena = Arena::with_seed(1);
        arena.spawn_player(0, 0);
        arena.spawn_player(1, 1);

        let snapshot = arena.snapshot();
        assert_eq!(snapshot.len(), LEVEL_LAYOUT.len() + 2);
        assert_eq!(snapshot.get("level3").unwrap().image, "images/level/3.png");
        assert_eq!(snapshot.get("player1").unwrap().image, "images/player1.png");
        assert_eq!(snapshot.get("player0").unwrap().x, 400);
    }

    #[test]
    fn test_reset_restores_layout() {
        let mut arena = Arena::with_seed(5);
        let player = arena.spawn_player(0, 0);
        frames(&mut arena, 10);

        arena.reset();
        assert!(!arena.is_alive(player));
        assert_eq!(arena.platforms.len(), LEVEL_LAYOUT.len());
        assert_approx_eq!(arena.platforms[0].y, LEVEL_LAYOUT[0].1);
    }

    #[test]
    fn test_despawn_removes_player_and_shots() {
        let mut arena = empty_arena();
        let player = arena.spawn_player(0, 0);
        arena.set_controls(
            player,
            ControlState {
                shoot: true,
                ..Default::default()
            },
        );
        frames(&mut arena, 1);
        assert_eq!(arena.shots.len(), 1);

        arena.despawn_player(player);
        assert!(!arena.is_alive(player));
        assert!(arena.shots.is_empty());
    }
}
