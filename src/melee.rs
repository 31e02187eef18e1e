use crate::animations::Playhead;
use crate::combat::melee_offset;
use crate::damage::DamageEvent;
use crate::gameflow::GameplaySet;
use crate::kinds::EntityKind;
use crate::physics::GameLayer;
use crate::prelude::*;
use bevy::ecs::entity::hash_set::EntityHashSet;

const SWING_SECONDS: f32 = 0.2;
const HITBOX_SIZE: Vec2 = Vec2::new(20.0, 30.0);

/// An active swing. Each target is struck at most once per swing.
#[derive(Component, Debug)]
pub struct MeleeSwing {
    timer: Timer,
    damage: f32,
    already_hit: EntityHashSet,
}

impl MeleeSwing {
    pub fn new(damage: f32) -> Self {
        Self {
            timer: Timer::from_seconds(SWING_SECONDS, TimerMode::Once),
            damage,
            already_hit: EntityHashSet::default(),
        }
    }

    /// True the first time `target` is seen during this swing.
    pub fn strike(&mut self, target: Entity) -> bool {
        self.already_hit.insert(target)
    }
}

#[derive(Component)]
struct SwingHitbox;

pub struct MeleePlugin;

impl Plugin for MeleePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                spawn_hitbox_on_swing_start,
                keep_hitbox_facing,
                emit_swing_hits,
            )
                .chain()
                .in_set(GameplaySet::Act),
        )
        .add_systems(
            Update,
            (end_finished_swings, despawn_hitbox_on_swing_end)
                .chain()
                .in_set(GameplaySet::Cleanup),
        );
    }
}

fn facing_right(head: Option<&Playhead>) -> bool {
    head.map(|h| !h.flip_x).unwrap_or(true)
}

fn spawn_hitbox_on_swing_start(
    mut commands: Commands,
    added: Query<(Entity, Option<&Playhead>), Added<MeleeSwing>>,
) {
    for (attacker, head) in &added {
        let offset = melee_offset(facing_right(head));
        commands.entity(attacker).with_children(|c| {
            c.spawn((
                SwingHitbox,
                Sensor,
                Collider::rectangle(HITBOX_SIZE.x, HITBOX_SIZE.y),
                CollisionLayers::new(GameLayer::Trigger, [GameLayer::Enemy, GameLayer::Prop]),
                CollidingEntities::default(),
                Transform::from_translation(offset.extend(0.0)),
            ));
        });
    }
}

fn keep_hitbox_facing(
    attackers: Query<(&Children, Option<&Playhead>), With<MeleeSwing>>,
    mut hitboxes: Query<&mut Transform, With<SwingHitbox>>,
) {
    for (kids, head) in &attackers {
        let offset = melee_offset(facing_right(head));
        for &child in kids {
            if let Ok(mut tf) = hitboxes.get_mut(child) {
                tf.translation.x = offset.x;
            }
        }
    }
}

fn emit_swing_hits(
    mut writer: EventWriter<DamageEvent>,
    hitboxes: Query<(&ChildOf, &CollidingEntities), With<SwingHitbox>>,
    mut swings: Query<&mut MeleeSwing>,
    kinds: Query<&EntityKind>,
) {
    for (child_of, colliding) in &hitboxes {
        let attacker = child_of.parent();
        let Ok(mut swing) = swings.get_mut(attacker) else {
            continue;
        };
        for &target in colliding.iter() {
            if target == attacker {
                continue;
            }
            let damageable = kinds.get(target).is_ok_and(|k| k.is_damageable());
            if damageable && swing.strike(target) {
                writer.write(DamageEvent {
                    target,
                    amount: swing.damage,
                });
            }
        }
    }
}

fn end_finished_swings(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut MeleeSwing)>,
) {
    for (e, mut swing) in &mut q {
        if swing.timer.tick(time.delta()).finished() {
            commands.entity(e).remove::<MeleeSwing>();
        }
    }
}

fn despawn_hitbox_on_swing_end(
    mut commands: Commands,
    mut removed: RemovedComponents<MeleeSwing>,
    children: Query<&Children>,
    hitboxes: Query<(), With<SwingHitbox>>,
) {
    for attacker in removed.read() {
        let Ok(kids) = children.get(attacker) else {
            continue;
        };
        for &child in kids {
            if hitboxes.contains(child) {
                commands.entity(child).try_despawn();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_target_is_struck_once_per_swing() {
        let mut swing = MeleeSwing::new(5.0);
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        assert!(swing.strike(a));
        assert!(!swing.strike(a));
        assert!(swing.strike(b));

        let mut next = MeleeSwing::new(5.0);
        assert!(next.strike(a));
    }
}
