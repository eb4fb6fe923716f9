use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use thiserror::Error;

/// Horizontal orientation of a sprite. On the wire it is the signed
/// direction, `-1` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(into = "i8", try_from = "i8")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Signed direction, `-1` for left and `1` for right.
    pub fn sign(self) -> i8 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    pub fn from_sign(sign: f32) -> Self {
        if sign < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("facing must be -1 or 1, got {0}")]
pub struct InvalidFacing(pub i8);

impl From<Facing> for i8 {
    fn from(facing: Facing) -> Self {
        facing.sign()
    }
}

impl TryFrom<i8> for Facing {
    type Error = InvalidFacing;

    fn try_from(sign: i8) -> Result<Self, Self::Error> {
        match sign {
            -1 => Ok(Facing::Left),
            1 => Ok(Facing::Right),
            other => Err(InvalidFacing(other)),
        }
    }
}

/// One visible entity as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    pub image: String,
    pub x: i32,
    pub y: i32,
    pub facing: Facing,
}

impl EntityState {
    /// Captures a world position, rounding to whole pixels.
    pub fn new(image: impl Into<String>, x: f32, y: f32, facing: Facing) -> Self {
        Self {
            image: image.into(),
            x: x.round() as i32,
            y: y.round() as i32,
            facing,
        }
    }
}

/// Every visible entity keyed by its stable name.
///
/// Keys are kept sorted so that encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    entities: BTreeMap<String, EntityState>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entity: EntityState) {
        self.entities.insert(name.into(), entity);
    }

    pub fn get(&self, name: &str) -> Option<&EntityState> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, EntityState> {
        self.entities.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

impl FromIterator<(String, EntityState)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, EntityState)>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a EntityState);
    type IntoIter = btree_map::Iter<'a, String, EntityState>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
