use crate::gameflow::{GameState, GameplaySet};
use crate::player::Player;
use crate::prelude::*;

#[derive(Component)]
pub struct MainCamera;

#[derive(Component)]
pub struct MenuCamera;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_menu_camera)
            .add_systems(
                OnEnter(GameState::InGame),
                (despawn_menu_camera, spawn_follow_camera).chain(),
            )
            .add_systems(OnExit(GameState::InGame), (despawn_main_camera, spawn_menu_camera))
            .add_systems(Update, camera_follow.in_set(GameplaySet::Cleanup));
    }
}

pub fn spawn_follow_camera(mut commands: Commands, existing: Query<(), With<MainCamera>>) {
    if existing.is_empty() {
        let mut projection = OrthographicProjection::default_2d();
        projection.scale = 0.5;
        commands.spawn((
            MainCamera,
            Camera2d,
            Msaa::Off,
            Projection::Orthographic(projection),
        ));
    }
}

pub fn camera_follow(
    time: Res<Time>,
    player_q: Query<&GlobalTransform, With<Player>>,
    mut cam_q: Query<&mut Transform, (With<MainCamera>, Without<Player>)>,
) {
    let Ok(player_gt) = player_q.single() else {
        return;
    };
    let Ok(mut cam_tf) = cam_q.single_mut() else {
        return;
    };
    let cam_adjust = Vec2::new(0., 24.);
    let target_xy = player_gt.translation().truncate() + cam_adjust;
    let current_xy = cam_tf.translation.truncate();
    let t = 1.0 - (-6.0 * time.delta_secs()).exp();
    let new_xy = current_xy.lerp(target_xy, t);
    cam_tf.translation.x = new_xy.x;
    cam_tf.translation.y = new_xy.y;
}

pub fn spawn_menu_camera(mut commands: Commands, q_existing: Query<(), With<MenuCamera>>) {
    if q_existing.is_empty() {
        commands.spawn((Camera2d, MenuCamera));
    }
}

pub fn despawn_menu_camera(mut commands: Commands, q: Query<Entity, With<MenuCamera>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}

pub fn despawn_main_camera(mut commands: Commands, q: Query<Entity, With<MainCamera>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
