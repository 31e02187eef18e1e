use crate::gameflow::GameplaySet;
use crate::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug)]
pub enum GameLayer {
    #[default]
    Default,
    Ground,
    Player,
    Enemy,
    Projectile,
    Prop,
    Trigger,
}

/// Vertical speed above which a body touching the floor still counts as
/// leaving it (the frame a jump starts).
const RISING_EPSILON: f32 = 1.0;
const GROUND_PROBE_DISTANCE: f32 = 3.0;
const WALL_PROBE_MARGIN: f32 = 6.0;

#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Grounded(pub bool);

#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WallAhead(pub bool);

/// Floor probe: a thin box cast a few pixels down from the feet.
pub fn ground_probe(half_width: f32, half_height: f32) -> (ShapeCaster, Grounded) {
    let caster = ShapeCaster::new(
        Collider::rectangle(half_width * 1.8, 2.0),
        Vec2::new(0.0, -half_height),
        0.0,
        Dir2::NEG_Y,
    )
    .with_max_distance(GROUND_PROBE_DISTANCE)
    .with_query_filter(SpatialQueryFilter::from_mask([GameLayer::Ground, GameLayer::Prop]));
    (caster, Grounded::default())
}

/// Horizontal ray from the body centre; its direction follows the body's
/// velocity every frame.
pub fn wall_probe(half_width: f32) -> (RayCaster, WallAhead) {
    let caster = RayCaster::new(Vec2::ZERO, Dir2::X)
        .with_max_distance(half_width + WALL_PROBE_MARGIN)
        .with_query_filter(SpatialQueryFilter::from_mask(GameLayer::Ground));
    (caster, WallAhead::default())
}

pub struct ProbePlugin;

impl Plugin for ProbePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (update_grounded, aim_wall_probes, update_wall_ahead).in_set(GameplaySet::Sense),
        );
    }
}

fn update_grounded(mut q: Query<(&ShapeHits, &LinearVelocity, &mut Grounded)>) {
    for (hits, vel, mut grounded) in &mut q {
        let on_floor = !hits.is_empty() && vel.y <= RISING_EPSILON;
        if grounded.0 != on_floor {
            grounded.0 = on_floor;
        }
    }
}

fn aim_wall_probes(mut q: Query<(&LinearVelocity, &mut RayCaster), With<WallAhead>>) {
    for (vel, mut ray) in &mut q {
        if vel.x > 0.0 {
            ray.direction = Dir2::X;
        } else if vel.x < 0.0 {
            ray.direction = Dir2::NEG_X;
        }
    }
}

fn update_wall_ahead(mut q: Query<(&RayHits, &mut WallAhead)>) {
    for (hits, mut wall) in &mut q {
        wall.0 = !hits.is_empty();
    }
}
