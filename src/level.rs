//! The first (and only) level, laid out in code.

use crate::config::GameConfig;
use crate::damage::SpawnPickup;
use crate::drops::ItemKind;
use crate::enemy::{spawn_arena, spawn_enemy};
use crate::gameflow::{GameState, GameplayRoot};
use crate::kinds::{EnemyKind, EntityKind};
use crate::physics::GameLayer;
use crate::player::spawn_player;
use crate::prelude::*;
use crate::props::{spawn_box, spawn_dead_zone, spawn_door, spawn_ladder};
use crate::weapons::WeaponTable;

const GROUND_COLOR: Color = Color::srgb(0.22, 0.16, 0.14);

const PLAYER_START: Vec2 = Vec2::new(0.0, 40.0);

/// (center, size) of every solid block.
const SOLIDS: &[(Vec2, Vec2)] = &[
    // floor, with a pit between 600 and 700
    (Vec2::new(200.0, -20.0), Vec2::new(800.0, 40.0)),
    (Vec2::new(1100.0, -20.0), Vec2::new(800.0, 40.0)),
    (Vec2::new(1900.0, -20.0), Vec2::new(800.0, 40.0)),
    // outer walls
    (Vec2::new(-210.0, 150.0), Vec2::new(20.0, 340.0)),
    (Vec2::new(2310.0, 150.0), Vec2::new(20.0, 340.0)),
    // ledge reached by the ladder
    (Vec2::new(350.0, 110.0), Vec2::new(160.0, 16.0)),
    // step the goblin has to hop
    (Vec2::new(900.0, 12.0), Vec2::new(20.0, 24.0)),
];

/// Pickups placed by name, the way level data refers to them.
const PLACED_ITEMS: &[(&str, Vec2)] = &[
    ("weapon", Vec2::new(60.0, 20.0)),
    ("healPotion", Vec2::new(380.0, 135.0)),
    ("manaPotion", Vec2::new(1200.0, 20.0)),
];

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::InGame), spawn_level);
    }
}

fn spawn_solid(commands: &mut Commands, center: Vec2, size: Vec2) {
    commands.spawn((
        GameplayRoot,
        EntityKind::Terrain,
        RigidBody::Static,
        Collider::rectangle(size.x, size.y),
        CollisionLayers::new(GameLayer::Ground, LayerMask::ALL),
        Friction::ZERO,
        Sprite::from_color(GROUND_COLOR, size),
        Transform::from_translation(center.extend(0.0)),
    ));
}

pub fn spawn_level(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
    config: Res<GameConfig>,
    weapons: Res<WeaponTable>,
    mut pickups: EventWriter<SpawnPickup>,
) {
    for &(center, size) in SOLIDS {
        spawn_solid(&mut commands, center, size);
    }

    spawn_dead_zone(&mut commands, Vec2::new(1000.0, -300.0), Vec2::new(4000.0, 40.0));
    spawn_ladder(&mut commands, 255.0, 0.0, 130.0);
    spawn_door(&mut commands, &assets, &mut layouts, Vec2::new(1450.0, 24.0));

    spawn_box(&mut commands, Vec2::new(150.0, 10.0));
    spawn_box(&mut commands, Vec2::new(480.0, 10.0));
    spawn_box(&mut commands, Vec2::new(1250.0, 10.0));

    for &(name, position) in PLACED_ITEMS {
        if let Some(kind) = ItemKind::from_name(name) {
            pickups.write(SpawnPickup { kind, position });
        }
    }

    spawn_enemy(&mut commands, &config, EnemyKind::Goblin, Vec2::new(1000.0, 40.0));
    spawn_enemy(&mut commands, &config, EnemyKind::Skeleton, Vec2::new(1350.0, 40.0));
    if let Some(boss) = spawn_enemy(&mut commands, &config, EnemyKind::Balrog, Vec2::new(2050.0, 80.0)) {
        spawn_arena(&mut commands, boss, Vec2::new(1900.0, 120.0), Vec2::new(780.0, 280.0));
    }

    spawn_player(&mut commands, PLAYER_START, &config, &weapons);
}
