//! Damage queue, death handling and what breaks when.

use crate::animations::{Clip, Playhead};
use crate::behavior::{DeathEffect, EnemyBrain};
use crate::drops::{Breakable, DropTable, ItemKind};
use crate::gameflow::GameplaySet;
use crate::health::{DamageOutcome, Dying, Health};
use crate::kinds::EntityKind;
use crate::prelude::*;
use crate::sequence::{PendingSequence, Then};
use seldom_state::prelude::StateMachine;

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: Entity,
    pub amount: f32,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ActorDied {
    pub entity: Entity,
    pub kind: EntityKind,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SpawnPickup {
    pub kind: ItemKind,
    pub position: Vec2,
}

pub struct DamagePlugin;

impl Plugin for DamagePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageEvent>()
            .add_event::<ActorDied>()
            .add_event::<SpawnPickup>()
            .add_systems(Update, tick_hurt_windows.in_set(GameplaySet::Think))
            .add_systems(
                Update,
                (apply_damage_events, start_death_sequences)
                    .chain()
                    .in_set(GameplaySet::Resolve),
            );
    }
}

fn tick_hurt_windows(time: Res<Time>, mut q: Query<&mut Health>) {
    for mut health in &mut q {
        if health.is_hurt() {
            health.tick(time.delta());
        }
    }
}

fn apply_damage_events(
    mut commands: Commands,
    mut events: EventReader<DamageEvent>,
    mut targets: Query<(
        &EntityKind,
        &Transform,
        Option<&mut Health>,
        Option<&mut Breakable>,
    )>,
    mut died: EventWriter<ActorDied>,
    mut drops: EventWriter<SpawnPickup>,
) {
    for ev in events.read() {
        let Ok((kind, tf, health, breakable)) = targets.get_mut(ev.target) else {
            debug!("damage target {:?} no longer exists", ev.target);
            continue;
        };

        match (*kind, health, breakable) {
            (k, Some(mut health), _) if k.is_actor() => match health.apply_damage(ev.amount) {
                DamageOutcome::Died => {
                    died.write(ActorDied {
                        entity: ev.target,
                        kind: k,
                    });
                }
                DamageOutcome::Survived(left) => {
                    debug!("{:?} took {} damage, {} left", k, ev.amount, left);
                }
                DamageOutcome::Ignored => {}
            },
            (EntityKind::Prop, _, Some(mut crate_box)) => {
                if crate_box.hit() {
                    commands.entity(ev.target).try_despawn();
                    if let Some(item) = DropTable::roll(&mut rand::rng()) {
                        drops.write(SpawnPickup {
                            kind: item,
                            position: tf.translation.truncate(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

fn start_death_sequences(
    mut commands: Commands,
    mut died: EventReader<ActorDied>,
    mut actors: Query<(
        Option<&mut EnemyBrain>,
        Option<&mut Playhead>,
        Option<&mut LinearVelocity>,
        Has<Dying>,
    )>,
) {
    for ev in died.read() {
        let Ok((brain, head, vel, already_dying)) = actors.get_mut(ev.entity) else {
            continue;
        };
        if already_dying {
            continue;
        }

        // No more movement transitions; a respawn builds a fresh machine.
        commands.entity(ev.entity).remove::<StateMachine>();
        if let Some(mut head) = head {
            head.request(Clip::Death);
        }
        if let Some(mut vel) = vel {
            vel.0 = Vec2::ZERO;
        }

        let then = match (ev.kind, brain) {
            (EntityKind::Enemy(_), Some(mut brain)) => {
                brain.kill();
                // Corpses stop colliding but stay until the clip ends.
                commands
                    .entity(ev.entity)
                    .insert(RigidBody::Kinematic)
                    .remove::<Collider>();
                match brain.profile().death {
                    DeathEffect::Despawn => Then::Despawn,
                    DeathEffect::ReturnToMenu => Then::ReturnToMenu,
                }
            }
            (EntityKind::Player, _) => Then::ReloadLevel,
            _ => Then::Despawn,
        };

        info!("{:?} died", ev.kind);
        commands
            .entity(ev.entity)
            .insert((Dying, PendingSequence::after_animation(then)));
    }
}
