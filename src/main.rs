mod animations;
mod behavior;
mod camera;
mod combat;
mod config;
mod controls;
mod damage;
mod drops;
mod enemy;
mod gameflow;
mod health;
mod hud;
mod kinds;
mod level;
mod melee;
mod movement;
mod physics;
mod player;
mod prelude;
mod projectile;
mod props;
mod regions;
mod sequence;
mod weapons;

use crate::animations::ActorAnimationsPlugin;
use crate::camera::CameraPlugin;
use crate::config::ConfigPlugin;
use crate::controls::Action;
use crate::damage::DamagePlugin;
use crate::enemy::EnemyPlugin;
use crate::gameflow::GameFlowPlugin;
use crate::hud::HudPlugin;
use crate::level::LevelPlugin;
use crate::melee::MeleePlugin;
use crate::physics::ProbePlugin;
use crate::player::PlayerPlugin;
use crate::prelude::*;
use crate::projectile::ProjectilePlugin;
use crate::props::PropsPlugin;
use crate::regions::RegionPlugin;
use crate::sequence::SequencePlugin;
use crate::weapons::WeaponTablePlugin;
use avian2d::math::Vector;
use bevy_spritesheet_animation::prelude::SpritesheetAnimationPlugin;
use seldom_state::prelude::StateMachinePlugin;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: String::from("hellgate"),
                        ..Default::default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
            InputManagerPlugin::<Action>::default(),
            StateMachinePlugin::default(),
            PhysicsPlugins::default().with_length_unit(2.0),
//            PhysicsDebugPlugin::default(),
        ))
        .add_plugins(SpritesheetAnimationPlugin)
        .add_plugins((
            ConfigPlugin::new("assets/game.json"),
            WeaponTablePlugin::new("assets/weapons.csv"),
        ))
        .add_plugins((GameFlowPlugin, CameraPlugin, HudPlugin, ActorAnimationsPlugin))
        .add_plugins((
            RegionPlugin,
            ProbePlugin,
            PlayerPlugin,
            EnemyPlugin,
            MeleePlugin,
            ProjectilePlugin,
            DamagePlugin,
            PropsPlugin,
            SequencePlugin,
            LevelPlugin,
        ))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.03, 0.04)))
        .insert_resource(Gravity(Vector::NEG_Y * 980.0))
        .run();
}
