use crate::scene::SceneGraph;
use macroquad::prelude::*;
use shared::{
    EntityState, Facing, MatchState, PLATFORM_HEIGHT, PLATFORM_WIDTH, PLAYER_SIZE, SHOT_HEIGHT,
    SHOT_WIDTH, WORLD_HEIGHT, WORLD_WIDTH,
};

/// How an entity is drawn, derived from its image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Platform,
    Player { skin: usize },
    Shot,
    Unknown,
}

impl Sprite {
    pub fn from_image(image: &str) -> Self {
        if image.starts_with("images/level") {
            Sprite::Platform
        } else if image.starts_with("images/attacks") {
            Sprite::Shot
        } else if let Some(rest) = image.strip_prefix("images/player") {
            let skin = rest
                .trim_end_matches(".png")
                .parse()
                .unwrap_or_default();
            Sprite::Player { skin }
        } else {
            Sprite::Unknown
        }
    }

    /// Size in world pixels.
    pub fn size(self) -> (f32, f32) {
        match self {
            Sprite::Platform => (PLATFORM_WIDTH, PLATFORM_HEIGHT),
            Sprite::Player { .. } | Sprite::Unknown => (PLAYER_SIZE, PLAYER_SIZE),
            Sprite::Shot => (SHOT_WIDTH, SHOT_HEIGHT),
        }
    }

    fn color(self) -> Color {
        match self {
            Sprite::Platform => Color::from_rgba(110, 96, 80, 255),
            Sprite::Player { skin } => match skin % 3 {
                0 => Color::from_rgba(68, 170, 255, 255),
                1 => Color::from_rgba(255, 68, 68, 255),
                _ => Color::from_rgba(120, 220, 90, 255),
            },
            Sprite::Shot => YELLOW,
            Sprite::Unknown => MAGENTA,
        }
    }
}

pub struct Renderer {
    scale_x: f32,
    scale_y: f32,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn render(&mut self, scene: &SceneGraph, state: MatchState, winner: Option<&str>) {
        self.scale_x = screen_width() / WORLD_WIDTH;
        self.scale_y = screen_height() / WORLD_HEIGHT;

        clear_background(Color::from_rgba(26, 26, 26, 255));

        match state {
            MatchState::Waiting => self.draw_banner("Waiting for the host to start...", WHITE),
            MatchState::Active => {
                for (_, entity) in scene.iter() {
                    self.draw_entity(entity);
                }
            }
            MatchState::GameOver => {
                let text = match winner.map(Sprite::from_image) {
                    Some(Sprite::Player { skin }) => format!("Game over! Player {} wins", skin + 1),
                    _ => "Game over! Nobody survived".to_string(),
                };
                self.draw_banner(&text, ORANGE);
            }
        }

        self.draw_ui(scene.len());
    }

    fn draw_entity(&self, entity: &EntityState) {
        let sprite = Sprite::from_image(&entity.image);
        let (width, height) = sprite.size();
        let x = entity.x as f32 * self.scale_x;
        let y = entity.y as f32 * self.scale_y;
        let w = width * self.scale_x;
        let h = height * self.scale_y;

        draw_rectangle(x, y, w, h, sprite.color());

        if let Sprite::Player { .. } = sprite {
            draw_rectangle_lines(x, y, w, h, 2.0, WHITE);
            // Eye on the side the player faces
            let eye_x = match entity.facing {
                Facing::Right => x + w * 0.7,
                Facing::Left => x + w * 0.3,
            };
            draw_circle(eye_x, y + h * 0.3, 3.0, WHITE);
        }
    }

    fn draw_banner(&self, text: &str, color: Color) {
        let size = 32.0;
        let dimensions = measure_text(text, None, size as u16, 1.0);
        draw_text(
            text,
            (screen_width() - dimensions.width) / 2.0,
            screen_height() / 2.0,
            size,
            color,
        );
    }

    fn draw_ui(&self, entity_count: usize) {
        let text = format!("{} entities  {} fps", entity_count, get_fps());
        draw_text(&text, 10.0, 20.0, 16.0, WHITE);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_from_image() {
        assert_eq!(Sprite::from_image("images/level/3.png"), Sprite::Platform);
        assert_eq!(
            Sprite::from_image("images/player2.png"),
            Sprite::Player { skin: 2 }
        );
        assert_eq!(Sprite::from_image("images/attacks/shoot0.png"), Sprite::Shot);
        assert_eq!(Sprite::from_image("sprites/tree.png"), Sprite::Unknown);
    }

    #[test]
    fn test_sprite_sizes() {
        assert_eq!(Sprite::Platform.size(), (PLATFORM_WIDTH, PLATFORM_HEIGHT));
        assert_eq!(Sprite::Player { skin: 0 }.size(), (PLAYER_SIZE, PLAYER_SIZE));
        assert_eq!(Sprite::Shot.size(), (SHOT_WIDTH, SHOT_HEIGHT));
    }
}
