use crate::combat::{ContactEffect, Faction, projectile_contact};
use crate::damage::DamageEvent;
use crate::gameflow::{GameplayRoot, GameplaySet};
use crate::kinds::EntityKind;
use crate::physics::GameLayer;
use crate::prelude::*;
use crate::sequence::{PendingSequence, Then};

const LIFETIME_SECONDS: f32 = 3.0;
const RADIUS: f32 = 4.0;
const DEFAULT_BULLET: &str = "Orb";

#[derive(Component, Debug, Clone, Copy)]
pub struct Projectile {
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub faction: Faction,
}

pub fn spawn_projectile(
    commands: &mut Commands,
    assets: &AssetServer,
    origin: Vec2,
    projectile: Projectile,
    bullet: Option<&str>,
) -> Entity {
    let sprite = Sprite::from_image(assets.load(format!(
        "sprites/bullets/{}.png",
        bullet.unwrap_or(DEFAULT_BULLET)
    )));
    let velocity = projectile.direction * projectile.speed;
    let targets = match projectile.faction {
        Faction::Friendly => [GameLayer::Ground, GameLayer::Enemy, GameLayer::Prop],
        Faction::Hostile => [GameLayer::Ground, GameLayer::Player, GameLayer::Prop],
    };

    commands
        .spawn((
            (
                projectile,
                EntityKind::Projectile,
                GameplayRoot,
                Name::new("Projectile"),
                PendingSequence::after_seconds(LIFETIME_SECONDS, Then::Despawn),
            ),
            (
                RigidBody::Dynamic,
                GravityScale(0.0),
                Sensor,
                Collider::circle(RADIUS),
                CollisionLayers::new(GameLayer::Projectile, targets),
                CollidingEntities::default(),
                LinearVelocity(velocity),
            ),
            sprite,
            Transform::from_translation(origin.extend(2.0))
                .with_rotation(Quat::from_rotation_z(velocity.to_angle())),
        ))
        .id()
}

pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, resolve_projectile_contacts.in_set(GameplaySet::Act));
    }
}

fn resolve_projectile_contacts(
    mut commands: Commands,
    mut writer: EventWriter<DamageEvent>,
    projectiles: Query<(Entity, &Projectile, &CollidingEntities)>,
    kinds: Query<&EntityKind>,
) {
    for (e, projectile, colliding) in &projectiles {
        let mut hits: Vec<Entity> = colliding.iter().copied().collect();
        hits.sort();
        for other in hits {
            let Ok(kind) = kinds.get(other) else {
                continue;
            };
            match projectile_contact(projectile.faction, *kind) {
                ContactEffect::Pass => continue,
                ContactEffect::Stop => {}
                ContactEffect::Damage => {
                    writer.write(DamageEvent {
                        target: other,
                        amount: projectile.damage,
                    });
                }
            }
            commands.entity(e).try_despawn();
            break;
        }
    }
}
