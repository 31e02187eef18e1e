//! Ladders, doors, dead zones, breakable boxes and pickups.

use crate::combat::WeaponSlot;
use crate::damage::{ActorDied, SpawnPickup};
use crate::drops::{Bob, Breakable, ItemKind, Pickup};
use crate::gameflow::{GameplayRoot, GameplaySet};
use crate::health::{DamageOutcome, Dying, Health, Mana};
use crate::kinds::EntityKind;
use crate::physics::GameLayer;
use crate::prelude::*;
use crate::regions::{RegionEntered, RegionExited, RegionKind, TriggerRegion};
use crate::weapons::WeaponTable;

/// X of the ladder the player currently overlaps.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct LadderContact(pub Option<f32>);

#[derive(Component)]
pub struct Door;

const DOOR_CLOSED: usize = 0;
const DOOR_OPEN: usize = 1;
const PICKUP_SIZE: f32 = 12.0;

fn trigger_layers() -> CollisionLayers {
    CollisionLayers::new(GameLayer::Trigger, [GameLayer::Player, GameLayer::Enemy])
}

pub fn spawn_ladder(commands: &mut Commands, x: f32, bottom: f32, height: f32) -> Entity {
    commands
        .spawn((
            Name::new("Ladder"),
            GameplayRoot,
            TriggerRegion::new(RegionKind::Ladder),
            RigidBody::Static,
            Collider::rectangle(10.0, height),
            CollisionLayers::new(GameLayer::Trigger, GameLayer::Player),
            Sprite::from_color(Color::srgb(0.45, 0.3, 0.15), Vec2::new(10.0, height)),
            Transform::from_xyz(x, bottom + height / 2.0, -0.5),
        ))
        .id()
}

pub fn spawn_dead_zone(commands: &mut Commands, center: Vec2, size: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("DeadZone"),
            GameplayRoot,
            TriggerRegion::new(RegionKind::DeadZone),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            trigger_layers(),
            Transform::from_translation(center.extend(0.0)),
        ))
        .id()
}

pub fn spawn_door(
    commands: &mut Commands,
    assets: &AssetServer,
    layouts: &mut Assets<TextureAtlasLayout>,
    position: Vec2,
) -> Entity {
    let layout = layouts.add(TextureAtlasLayout::from_grid(UVec2::new(32, 48), 2, 1, None, None));
    commands
        .spawn((
            Name::new("Door"),
            Door,
            GameplayRoot,
            TriggerRegion::new(RegionKind::Door),
            RigidBody::Static,
            Collider::rectangle(32.0, 48.0),
            trigger_layers(),
            Sprite::from_atlas_image(
                assets.load("sprites/door.png"),
                TextureAtlas {
                    layout,
                    index: DOOR_CLOSED,
                },
            ),
            Transform::from_translation(position.extend(-0.5)),
        ))
        .id()
}

pub fn spawn_box(commands: &mut Commands, position: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("Box"),
            GameplayRoot,
            EntityKind::Prop,
            Breakable::default(),
            RigidBody::Static,
            Collider::rectangle(20.0, 20.0),
            CollisionLayers::new(
                GameLayer::Prop,
                [
                    GameLayer::Player,
                    GameLayer::Enemy,
                    GameLayer::Projectile,
                    GameLayer::Trigger,
                ],
            ),
            Sprite::from_color(Color::srgb(0.55, 0.4, 0.2), Vec2::splat(20.0)),
            Transform::from_translation(position.extend(0.0)),
        ))
        .id()
}

pub fn spawn_pickup(
    commands: &mut Commands,
    assets: &AssetServer,
    pickup: Pickup,
    position: Vec2,
) -> Entity {
    commands
        .spawn((
            Name::new(format!("{:?}", pickup.kind())),
            GameplayRoot,
            Sprite::from_image(assets.load(pickup.kind().sprite())),
            pickup,
            Bob::new(position.y),
            TriggerRegion::new(RegionKind::Pickup),
            RigidBody::Static,
            Collider::rectangle(PICKUP_SIZE, PICKUP_SIZE),
            CollisionLayers::new(GameLayer::Trigger, GameLayer::Player),
            Transform::from_translation(position.extend(0.5)),
        ))
        .id()
}

/// Turns an item kind into a concrete pickup; weapon drops draw from the table.
pub fn roll_pickup(kind: ItemKind, weapons: &WeaponTable) -> Option<Pickup> {
    match kind {
        ItemKind::HealPotion => Some(Pickup::HealPotion),
        ItemKind::ManaPotion => Some(Pickup::ManaPotion),
        ItemKind::Weapon => match weapons.pick(&mut rand::rng()) {
            Some(def) => Some(Pickup::Weapon(def.clone())),
            None => {
                warn!("weapon drop requested but the weapon table is empty");
                None
            }
        },
    }
}

pub struct PropsPlugin;

impl Plugin for PropsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                ladder_contacts,
                door_frames,
                dead_zones,
                collect_pickups,
                spawn_dropped_pickups,
            )
                .in_set(GameplaySet::Resolve),
        )
        .add_systems(Update, bob_pickups.in_set(GameplaySet::Cleanup));
    }
}

fn ladder_contacts(
    mut entered: EventReader<RegionEntered>,
    mut exited: EventReader<RegionExited>,
    ladders: Query<&GlobalTransform>,
    mut climbers: Query<&mut LadderContact>,
) {
    for ev in entered.read().filter(|ev| ev.kind == RegionKind::Ladder) {
        let (Ok(ladder), Ok(mut contact)) = (ladders.get(ev.region), climbers.get_mut(ev.other)) else {
            continue;
        };
        contact.0 = Some(ladder.translation().x);
    }
    for ev in exited.read().filter(|ev| ev.kind == RegionKind::Ladder) {
        if let Ok(mut contact) = climbers.get_mut(ev.other) {
            contact.0 = None;
        }
    }
}

fn door_frames(
    mut entered: EventReader<RegionEntered>,
    mut exited: EventReader<RegionExited>,
    mut doors: Query<&mut Sprite, With<Door>>,
) {
    let opened = entered
        .read()
        .filter(|ev| ev.kind == RegionKind::Door && ev.other_kind.is_actor())
        .map(|ev| (ev.region, DOOR_OPEN));
    let closed = exited
        .read()
        .filter(|ev| ev.kind == RegionKind::Door && ev.other_kind.is_actor())
        .map(|ev| (ev.region, DOOR_CLOSED));

    for (door, frame) in opened.chain(closed).collect::<Vec<_>>() {
        let Ok(mut sprite) = doors.get_mut(door) else {
            continue;
        };
        if let Some(atlas) = sprite.texture_atlas.as_mut() {
            atlas.index = frame;
        }
    }
}

/// Anything alive that falls in dies through the regular death path, so
/// the boss still ends the run and the player still reloads.
fn dead_zones(
    mut entered: EventReader<RegionEntered>,
    mut health: Query<&mut Health>,
    mut died: EventWriter<ActorDied>,
) {
    for ev in entered.read() {
        if ev.kind != RegionKind::DeadZone || !ev.other_kind.is_actor() {
            continue;
        }
        let Ok(mut h) = health.get_mut(ev.other) else {
            continue;
        };
        if h.kill() == DamageOutcome::Died {
            died.write(ActorDied {
                entity: ev.other,
                kind: ev.other_kind,
            });
        }
    }
}

fn collect_pickups(
    mut commands: Commands,
    mut entered: EventReader<RegionEntered>,
    pickups: Query<&Pickup>,
    mut players: Query<(&mut Health, &mut Mana, &mut WeaponSlot), Without<Dying>>,
) {
    for ev in entered.read() {
        if ev.kind != RegionKind::Pickup || !ev.other_kind.is_player() {
            continue;
        }
        let (Ok(pickup), Ok((mut health, mut mana, mut slot))) =
            (pickups.get(ev.region), players.get_mut(ev.other))
        else {
            continue;
        };
        pickup.apply(&mut health, &mut mana, &mut slot);
        info!("picked up {:?}", pickup.kind());
        commands.entity(ev.region).try_despawn();
    }
}

fn spawn_dropped_pickups(
    mut commands: Commands,
    assets: Res<AssetServer>,
    weapons: Res<WeaponTable>,
    mut requests: EventReader<SpawnPickup>,
) {
    for req in requests.read() {
        if let Some(pickup) = roll_pickup(req.kind, &weapons) {
            spawn_pickup(&mut commands, &assets, pickup, req.position);
        }
    }
}

fn bob_pickups(time: Res<Time>, mut q: Query<(&mut Bob, &mut Transform), With<Pickup>>) {
    let dt = time.delta_secs();
    for (mut bob, mut tf) in &mut q {
        tf.translation.y = bob.advance(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapons::WeaponDefinition;

    #[test]
    fn weapon_drop_needs_a_table_entry() {
        let empty = WeaponTable::default();
        assert_eq!(roll_pickup(ItemKind::Weapon, &empty), None);
        assert_eq!(roll_pickup(ItemKind::HealPotion, &empty), Some(Pickup::HealPotion));

        let table = WeaponTable::parse("h\n2,Staff,4,3,0.5,d,false,Orb\n");
        let Some(Pickup::Weapon(WeaponDefinition { id, .. })) = roll_pickup(ItemKind::Weapon, &table)
        else {
            panic!("expected a weapon pickup");
        };
        assert_eq!(id, 2);
    }

    mod dead_zone {
        use super::*;
        use crate::animations::Playhead;
        use crate::behavior::{EnemyBrain, EnemyProfile};
        use crate::damage::DamagePlugin;
        use crate::kinds::EnemyKind;
        use crate::sequence::{PendingSequence, Then};

        fn app() -> App {
            let mut app = App::new();
            app.add_plugins((MinimalPlugins, DamagePlugin))
                .add_event::<RegionEntered>()
                .add_systems(Update, dead_zones);
            app
        }

        fn fall_in(app: &mut App, other: Entity, other_kind: EntityKind) {
            app.world_mut().send_event(RegionEntered {
                region: Entity::PLACEHOLDER,
                kind: RegionKind::DeadZone,
                owner: None,
                other,
                other_kind,
            });
            app.update();
            app.update();
        }

        fn then_of(app: &App, e: Entity) -> Option<Then> {
            app.world().entity(e).get::<PendingSequence>().map(|p| p.then)
        }

        #[test]
        fn boss_in_pit_dies_and_ends_the_run() {
            let mut app = app();
            let kind = EntityKind::Enemy(EnemyKind::Balrog);
            let boss = app
                .world_mut()
                .spawn((
                    kind,
                    Transform::default(),
                    Health::new(50.0),
                    EnemyBrain::new(EnemyProfile::balrog(), Vec2::ZERO),
                    Playhead::default(),
                    LinearVelocity::default(),
                ))
                .id();

            fall_in(&mut app, boss, kind);

            let body = app.world().entity(boss);
            assert!(body.get::<Health>().is_some_and(Health::is_dead));
            assert!(body.get::<EnemyBrain>().is_some_and(EnemyBrain::is_dead));
            assert!(body.contains::<Dying>());
            assert_eq!(then_of(&app, boss), Some(Then::ReturnToMenu));
        }

        #[test]
        fn goblin_in_pit_plays_its_death_before_despawn() {
            let mut app = app();
            let kind = EntityKind::Enemy(EnemyKind::Goblin);
            let goblin = app
                .world_mut()
                .spawn((
                    kind,
                    Transform::default(),
                    Health::new(10.0),
                    EnemyBrain::new(EnemyProfile::goblin(), Vec2::ZERO),
                    Playhead::default(),
                ))
                .id();

            fall_in(&mut app, goblin, kind);
            assert_eq!(then_of(&app, goblin), Some(Then::Despawn));
            assert_eq!(
                app.world().entity(goblin).get::<Playhead>().map(Playhead::clip),
                Some(crate::animations::Clip::Death)
            );
        }

        #[test]
        fn player_in_pit_reloads() {
            let mut app = app();
            let player = app
                .world_mut()
                .spawn((EntityKind::Player, Transform::default(), Health::new(100.0)))
                .id();
            fall_in(&mut app, player, EntityKind::Player);
            assert_eq!(then_of(&app, player), Some(Then::ReloadLevel));
        }

        #[test]
        fn props_ignore_the_pit() {
            let mut app = app();
            let crate_box = app
                .world_mut()
                .spawn((EntityKind::Prop, Transform::default(), Breakable::default()))
                .id();
            fall_in(&mut app, crate_box, EntityKind::Prop);
            assert!(then_of(&app, crate_box).is_none());
            assert!(app.world().get_entity(crate_box).is_ok());
        }
    }
}
