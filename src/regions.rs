//! Sensor regions turned into enter/exit events.
//!
//! avian keeps the current overlap set of every sensor in
//! [`CollidingEntities`]; this module diffs it against last frame's set and
//! emits one event per change, which is what the perception, ladder, door and
//! pickup logic consume.

use crate::gameflow::GameplaySet;
use crate::kinds::EntityKind;
use crate::prelude::*;
use bevy::ecs::entity::hash_map::EntityHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum RegionKind {
    Vision,
    Attack,
    Ladder,
    DeadZone,
    Door,
    Arena,
    Pickup,
}

#[derive(Component, Debug, Clone)]
#[require(Sensor, CollidingEntities)]
pub struct TriggerRegion {
    pub kind: RegionKind,
    /// Entity the region reports to (an enemy for its vision sensor, the boss
    /// for its arena). Never reported as overlapping its own region.
    pub owner: Option<Entity>,
    inside: EntityHashMap<EntityKind>,
}

impl TriggerRegion {
    pub fn new(kind: RegionKind) -> Self {
        Self {
            kind,
            owner: None,
            inside: EntityHashMap::default(),
        }
    }

    pub fn owned_by(kind: RegionKind, owner: Entity) -> Self {
        Self {
            owner: Some(owner),
            ..Self::new(kind)
        }
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct RegionEntered {
    pub region: Entity,
    pub kind: RegionKind,
    pub owner: Option<Entity>,
    pub other: Entity,
    pub other_kind: EntityKind,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct RegionExited {
    pub region: Entity,
    pub kind: RegionKind,
    pub owner: Option<Entity>,
    pub other: Entity,
    pub other_kind: EntityKind,
}

#[derive(Debug, Default, PartialEq)]
pub struct OverlapDiff {
    pub entered: Vec<(Entity, EntityKind)>,
    pub exited: Vec<(Entity, EntityKind)>,
}

/// Both lists come back sorted by entity so event order is stable.
pub fn diff_overlaps(
    previous: &EntityHashMap<EntityKind>,
    current: &EntityHashMap<EntityKind>,
) -> OverlapDiff {
    let mut entered: Vec<_> = current
        .iter()
        .filter(|(e, _)| !previous.contains_key(*e))
        .map(|(e, k)| (*e, *k))
        .collect();
    let mut exited: Vec<_> = previous
        .iter()
        .filter(|(e, _)| !current.contains_key(*e))
        .map(|(e, k)| (*e, *k))
        .collect();
    entered.sort_by_key(|(e, _)| *e);
    exited.sort_by_key(|(e, _)| *e);
    OverlapDiff { entered, exited }
}

pub struct RegionPlugin;

impl Plugin for RegionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RegionEntered>()
            .add_event::<RegionExited>()
            .add_systems(Update, diff_trigger_regions.in_set(GameplaySet::Sense));
    }
}

fn diff_trigger_regions(
    mut regions: Query<(Entity, &mut TriggerRegion, &CollidingEntities)>,
    kinds: Query<&EntityKind>,
    mut entered: EventWriter<RegionEntered>,
    mut exited: EventWriter<RegionExited>,
) {
    for (region, mut trigger, colliding) in &mut regions {
        let current: EntityHashMap<EntityKind> = colliding
            .iter()
            .filter(|e| Some(**e) != trigger.owner)
            .filter_map(|e| kinds.get(*e).ok().map(|k| (*e, *k)))
            .collect();

        let diff = diff_overlaps(&trigger.inside, &current);
        for (other, other_kind) in diff.entered {
            entered.write(RegionEntered {
                region,
                kind: trigger.kind,
                owner: trigger.owner,
                other,
                other_kind,
            });
        }
        for (other, other_kind) in diff.exited {
            exited.write(RegionExited {
                region,
                kind: trigger.kind,
                owner: trigger.owner,
                other,
                other_kind,
            });
        }

        trigger.inside = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::EnemyKind;

    fn set(items: &[(u32, EntityKind)]) -> EntityHashMap<EntityKind> {
        items
            .iter()
            .map(|(i, k)| (Entity::from_raw(*i), *k))
            .collect()
    }

    #[test]
    fn reports_only_changes() {
        let goblin = EntityKind::Enemy(EnemyKind::Goblin);
        let before = set(&[(1, EntityKind::Player), (2, goblin)]);
        let after = set(&[(2, goblin), (3, EntityKind::Prop)]);

        let diff = diff_overlaps(&before, &after);
        assert_eq!(diff.entered, vec![(Entity::from_raw(3), EntityKind::Prop)]);
        assert_eq!(diff.exited, vec![(Entity::from_raw(1), EntityKind::Player)]);
    }

    #[test]
    fn steady_overlap_is_silent() {
        let same = set(&[(1, EntityKind::Player)]);
        assert_eq!(diff_overlaps(&same, &same), OverlapDiff::default());
    }
}
