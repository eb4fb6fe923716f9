//! Displayed entities and their reconciliation against received snapshots.

use shared::{EntityState, Snapshot};
use std::collections::{BTreeMap, BTreeSet};

/// Something that keeps displayable entities by name.
pub trait Scene {
    fn create(&mut self, name: &str, entity: &EntityState);
    /// Moves an existing entity and turns it to `entity.facing`.
    fn update(&mut self, name: &str, entity: &EntityState);
    fn remove(&mut self, name: &str);
    fn names(&self) -> Vec<String>;
}

/// Counts of what one reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Makes `scene` show exactly the entities of `snapshot`.
pub fn reconcile<S: Scene + ?Sized>(scene: &mut S, snapshot: &Snapshot) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for name in scene.names() {
        if !snapshot.contains(&name) {
            scene.remove(&name);
            report.removed += 1;
        }
    }

    let shown: BTreeSet<String> = scene.names().into_iter().collect();
    for (name, entity) in snapshot {
        if shown.contains(name) {
            scene.update(name, entity);
            report.updated += 1;
        } else {
            scene.create(name, entity);
            report.created += 1;
        }
    }

    report
}

/// In-memory scene the renderer draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneGraph {
    entities: BTreeMap<String, EntityState>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&EntityState> {
        self.entities.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityState)> {
        self.entities.iter().map(|(name, entity)| (name.as_str(), entity))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Scene for SceneGraph {
    fn create(&mut self, name: &str, entity: &EntityState) {
        self.entities.insert(name.to_string(), entity.clone());
    }

    fn update(&mut self, name: &str, entity: &EntityState) {
        if let Some(shown) = self.entities.get_mut(name) {
            shown.x = entity.x;
            shown.y = entity.y;
            shown.facing = entity.facing;
        }
    }

    fn remove(&mut self, name: &str) {
        self.entities.remove(name);
    }

    fn names(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Facing;

    fn entity(image: &str, x: f32, facing: Facing) -> EntityState {
        EntityState::new(image, x, 0.0, facing)
    }

    #[test]
    fn test_first_snapshot_creates_everything() {
        let mut scene = SceneGraph::new();
        let snapshot: Snapshot = [
            ("level0".to_string(), entity("images/level/0.png", 1.0, Facing::Right)),
            ("player0".to_string(), entity("images/player0.png", 2.0, Facing::Left)),
        ]
        .into_iter()
        .collect();

        let report = reconcile(&mut scene, &snapshot);
        assert_eq!(
            report,
            ReconcileReport {
                created: 2,
                updated: 0,
                removed: 0
            }
        );
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get("player0").unwrap().facing, Facing::Left);
    }

    #[test]
    fn test_create_update_remove() {
        let mut scene = SceneGraph::new();
        scene.create("player0", &entity("images/player0.png", 0.0, Facing::Right));
        scene.create("shot1", &entity("images/attacks/shoot0.png", 5.0, Facing::Right));

        let mut snapshot = Snapshot::new();
        snapshot.insert("player0", entity("images/player0.png", 40.0, Facing::Left));
        snapshot.insert("player1", entity("images/player1.png", 80.0, Facing::Right));

        let report = reconcile(&mut scene, &snapshot);
        assert_eq!(
            report,
            ReconcileReport {
                created: 1,
                updated: 1,
                removed: 1
            }
        );
        assert!(scene.get("shot1").is_none());
        let moved = scene.get("player0").unwrap();
        assert_eq!((moved.x, moved.facing), (40, Facing::Left));
        assert_eq!(scene.get("player1").unwrap().x, 80);
    }

    #[test]
    fn test_update_keeps_image() {
        let mut scene = SceneGraph::new();
        scene.create("player0", &entity("images/player0.png", 0.0, Facing::Right));

        let mut snapshot = Snapshot::new();
        snapshot.insert("player0", entity("images/player2.png", 3.0, Facing::Right));
        reconcile(&mut scene, &snapshot);

        let shown = scene.get("player0").unwrap();
        assert_eq!(shown.image, "images/player0.png");
        assert_eq!(shown.x, 3);
    }

    #[test]
    fn test_empty_snapshot_clears_scene() {
        let mut scene = SceneGraph::new();
        scene.create("level0", &entity("images/level/0.png", 0.0, Facing::Right));
        scene.create("level1", &entity("images/level/1.png", 0.0, Facing::Right));

        let report = reconcile(&mut scene, &Snapshot::new());
        assert_eq!(report.removed, 2);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_reconcile_matches_snapshot_exactly() {
        let mut scene = SceneGraph::new();
        for round in 0..5u32 {
            let snapshot: Snapshot = (round..round + 4)
                .map(|i| {
                    (
                        format!("shot{}", i),
                        entity("images/attacks/shoot0.png", i as f32, Facing::Right),
                    )
                })
                .collect();
            reconcile(&mut scene, &snapshot);

            let shown: Vec<&str> = scene.iter().map(|(name, _)| name).collect();
            let expected: Vec<&str> = snapshot.names().collect();
            assert_eq!(shown, expected);
        }
    }
}
