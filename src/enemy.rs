// enemy.rs
use crate::animations::{Clip, Playhead, SheetId};
use crate::behavior::{AttackStyle, Detection, EnemyBrain, EnemyProfile, Motion};
use crate::combat::Faction;
use crate::config::GameConfig;
use crate::damage::DamageEvent;
use crate::gameflow::{GameState, GameplayRoot, GameplaySet};
use crate::health::Health;
use crate::kinds::{EnemyKind, EntityKind};
use crate::physics::{GameLayer, Grounded, WallAhead, ground_probe, wall_probe};
use crate::player::PlayerJumped;
use crate::projectile::{Projectile, spawn_projectile};
use crate::regions::{RegionEntered, RegionExited, RegionKind, TriggerRegion};
use avian2d::prelude::*;
use bevy::prelude::*;
use big_brain::prelude::*;

const ENEMY_BULLET: &str = "Arrow";

#[derive(Component)]
pub struct Enemy;

/// Where the enemy and its tracked target were at the start of the tick.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct EnemySenses {
    pub position: Vec2,
    pub target: Option<Vec2>,
}

/// Body and sensor sizes per enemy kind.
struct Build {
    sheet: SheetId,
    radius: f32,
    length: f32,
    vision: Vec2,
    reach: Vec2,
}

fn build_for(kind: EnemyKind) -> Build {
    match kind {
        EnemyKind::Goblin => Build {
            sheet: SheetId::Goblin,
            radius: 8.0,
            length: 20.0,
            vision: Vec2::new(320.0, 96.0),
            reach: Vec2::new(44.0, 36.0),
        },
        EnemyKind::Skeleton => Build {
            sheet: SheetId::Skeleton,
            radius: 8.0,
            length: 24.0,
            vision: Vec2::new(480.0, 160.0),
            reach: Vec2::new(44.0, 36.0),
        },
        EnemyKind::Balrog => Build {
            sheet: SheetId::Balrog,
            radius: 20.0,
            length: 40.0,
            vision: Vec2::ZERO,
            reach: Vec2::new(110.0, 80.0),
        },
    }
}

fn sensor(kind: RegionKind, owner: Entity, size: Vec2) -> impl Bundle {
    (
        TriggerRegion::owned_by(kind, owner),
        Collider::rectangle(size.x, size.y),
        CollisionLayers::new(GameLayer::Trigger, GameLayer::Player),
        Transform::default(),
    )
}

/// Spawns an enemy configured by its profile. Fails with a warning when the
/// config has no profile for `kind`.
pub fn spawn_enemy(
    commands: &mut Commands,
    config: &GameConfig,
    kind: EnemyKind,
    position: Vec2,
) -> Option<Entity> {
    let Some(profile) = config.enemy(kind) else {
        warn!("no enemy profile for {:?}; skipping spawn", kind);
        return None;
    };
    Some(spawn_with_profile(commands, kind, profile.clone(), position))
}

fn spawn_with_profile(
    commands: &mut Commands,
    kind: EnemyKind,
    profile: EnemyProfile,
    position: Vec2,
) -> Entity {
    let build = build_for(kind);
    let half_height = build.radius + build.length / 2.0;
    let detection = profile.detection;
    let melee = profile.attack == AttackStyle::Melee;
    let hops = profile.hops_walls;

    let e = commands
        .spawn((
            (
                Enemy,
                EntityKind::Enemy(kind),
                Name::new(format!("Enemy ({})", kind.key())),
                GameplayRoot,
                build.sheet,
                Playhead::default(),
            ),
            Health::new(profile.max_health),
            EnemyBrain::new(profile, position),
            EnemySenses {
                position,
                target: None,
            },
            (
                RigidBody::Dynamic,
                LockedAxes::ROTATION_LOCKED,
                Restitution::ZERO.with_combine_rule(CoefficientCombine::Min),
                Friction::ZERO.with_combine_rule(CoefficientCombine::Min),
                Collider::capsule(build.radius, build.length),
                CollisionLayers::new(
                    GameLayer::Enemy,
                    [
                        GameLayer::Ground,
                        GameLayer::Player,
                        GameLayer::Projectile,
                        GameLayer::Prop,
                        GameLayer::Trigger,
                    ],
                ),
            ),
            ground_probe(build.radius, half_height),
            Transform::from_xyz(position.x, position.y, 0.5),
        ))
        .insert(
            Thinker::build()
                .picker(FirstToScore::new(0.5))
                .when(AttackInRange, Attack)
                .when(HasTarget, Chase)
                .otherwise(Patrol),
        )
        .id();

    if hops {
        commands.entity(e).insert(wall_probe(build.radius));
    }

    commands.entity(e).with_children(|c| {
        if detection == Detection::Vision {
            c.spawn(sensor(RegionKind::Vision, e, build.vision));
        }
        if melee {
            c.spawn(sensor(RegionKind::Attack, e, build.reach));
        }
    });

    e
}

/// Boss arena: a region reporting to the boss rather than sitting on it.
pub fn spawn_arena(commands: &mut Commands, boss: Entity, center: Vec2, size: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("BossArena"),
            GameplayRoot,
            RigidBody::Static,
            sensor(RegionKind::Arena, boss, size),
        ))
        .insert(Transform::from_translation(center.extend(0.0)))
        .id()
}

// ====== Scorers ======

#[derive(Debug, Clone, Component, ScorerBuilder)]
pub struct HasTarget;

fn has_target_scorer(
    mut q: Query<(&Actor, &mut Score), With<HasTarget>>,
    brains: Query<(&EnemyBrain, &EnemySenses)>,
) {
    for (Actor(actor), mut score) in q.iter_mut() {
        let engaged = brains
            .get(*actor)
            .is_ok_and(|(brain, senses)| brain.engaged(senses.target));
        score.set(if engaged { 1.0 } else { 0.0 });
    }
}

/// Ready to start a swing, or already in one; a swing in progress keeps the
/// thinker on `Attack` until its clip runs out.
#[derive(Debug, Clone, Component, ScorerBuilder)]
pub struct AttackInRange;

fn attack_in_range_scorer(
    mut q: Query<(&Actor, &mut Score), With<AttackInRange>>,
    brains: Query<(&EnemyBrain, &EnemySenses)>,
) {
    for (Actor(actor), mut score) in q.iter_mut() {
        let ok = brains.get(*actor).is_ok_and(|(brain, senses)| {
            !brain.is_dead() && (brain.is_attacking() || brain.ready_to_attack(senses.target))
        });
        score.set(if ok { 1.0 } else { 0.0 });
    }
}

// ====== Actions ======

#[derive(Debug, Clone, Component, ActionBuilder)]
pub struct Patrol;

#[derive(Debug, Clone, Component, ActionBuilder)]
pub struct Chase;

#[derive(Debug, Clone, Component, ActionBuilder)]
pub struct Attack;

fn steer(motion: Motion, brain: &EnemyBrain, vel: &mut LinearVelocity, head: &mut Playhead) {
    vel.x = motion.vx;
    head.request(motion.clip);
    if let Some(right) = motion.facing_right {
        head.flip_x = brain.flip_for(right);
    }
}

fn patrol_action(
    mut q: Query<(&Actor, &mut ActionState), With<Patrol>>,
    mut enemies: Query<(&mut EnemyBrain, &EnemySenses, &mut LinearVelocity, &mut Playhead)>,
) {
    for (Actor(actor), mut state) in q.iter_mut() {
        let Ok((mut brain, senses, mut vel, mut head)) = enemies.get_mut(*actor) else {
            continue;
        };
        match *state {
            ActionState::Init | ActionState::Requested => {
                *state = ActionState::Executing;
            }
            ActionState::Executing => {
                if brain.is_dead() {
                    vel.x = 0.0;
                    continue;
                }
                let motion = brain.patrol(senses.position);
                steer(motion, &brain, &mut vel, &mut head);
            }
            ActionState::Cancelled => {
                *state = ActionState::Failure;
            }
            ActionState::Success | ActionState::Failure => {
                *state = ActionState::Requested;
            }
        }
    }
}

fn chase_action(
    mut q: Query<(&Actor, &mut ActionState), With<Chase>>,
    mut enemies: Query<(&EnemyBrain, &EnemySenses, &mut LinearVelocity, &mut Playhead)>,
) {
    for (Actor(actor), mut state) in q.iter_mut() {
        let Ok((brain, senses, mut vel, mut head)) = enemies.get_mut(*actor) else {
            continue;
        };
        match *state {
            ActionState::Init | ActionState::Requested => {
                *state = ActionState::Executing;
            }
            ActionState::Executing => {
                if brain.is_dead() {
                    *state = ActionState::Failure;
                    continue;
                }
                match senses.target.filter(|_| brain.engaged(senses.target)) {
                    Some(at) => steer(brain.chase(senses.position, at), brain, &mut vel, &mut head),
                    None => {
                        vel.x = 0.0;
                        *state = ActionState::Success;
                    }
                }
            }
            ActionState::Cancelled => {
                *state = ActionState::Failure;
            }
            ActionState::Success | ActionState::Failure => {
                *state = ActionState::Requested;
            }
        }
    }
}

fn attack_action(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut damage: EventWriter<DamageEvent>,
    mut q: Query<(&Actor, &mut ActionState), With<Attack>>,
    mut enemies: Query<(&mut EnemyBrain, &EnemySenses, &mut LinearVelocity, &mut Playhead)>,
) {
    for (Actor(actor), mut state) in q.iter_mut() {
        let Ok((mut brain, senses, mut vel, mut head)) = enemies.get_mut(*actor) else {
            continue;
        };
        match *state {
            ActionState::Init | ActionState::Requested => {
                if !brain.is_attacking() {
                    if !brain.ready_to_attack(senses.target) {
                        *state = ActionState::Failure;
                        continue;
                    }
                    brain.begin_attack();
                    head.restart(Clip::Attack);
                }
                vel.x = 0.0;
                *state = ActionState::Executing;
            }
            ActionState::Executing => {
                if brain.is_dead() {
                    *state = ActionState::Failure;
                    continue;
                }
                vel.x = 0.0;
                let swing = brain.swing(senses.position, senses.target, head.view());
                if let Some(right) = swing.facing_right {
                    head.flip_x = brain.flip_for(right);
                }
                if let Some(strike) = swing.strike {
                    damage.write(DamageEvent {
                        target: strike.target,
                        amount: strike.damage,
                    });
                }
                if let Some(shot) = swing.projectile {
                    spawn_projectile(
                        &mut commands,
                        &assets,
                        shot.origin,
                        Projectile {
                            direction: shot.direction,
                            speed: shot.speed,
                            damage: shot.damage,
                            faction: Faction::Hostile,
                        },
                        Some(ENEMY_BULLET),
                    );
                }
                if swing.finished {
                    head.request(Clip::Idle);
                    *state = ActionState::Success;
                }
            }
            ActionState::Cancelled => {
                brain.abort_attack();
                *state = ActionState::Failure;
            }
            ActionState::Success | ActionState::Failure => {
                *state = ActionState::Requested;
            }
        }
    }
}

// ====== Plugin wiring ======

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(BigBrainPlugin::new(PreUpdate))
            // Perception before scorers.
            .add_systems(
                PreUpdate,
                sense_targets
                    .before(BigBrainSet::Scorers)
                    .run_if(in_state(GameState::InGame)),
            )
            .add_systems(
                PreUpdate,
                (
                    has_target_scorer.in_set(BigBrainSet::Scorers),
                    attack_in_range_scorer.in_set(BigBrainSet::Scorers),
                    patrol_action.in_set(BigBrainSet::Actions),
                    chase_action.in_set(BigBrainSet::Actions),
                    attack_action.in_set(BigBrainSet::Actions),
                )
                    .run_if(in_state(GameState::InGame)),
            )
            .add_systems(
                Update,
                (route_perception, mirror_player_jumps, kick_enemies)
                    .chain()
                    .in_set(GameplaySet::Think),
            );
    }
}

fn route_perception(
    mut entered: EventReader<RegionEntered>,
    mut exited: EventReader<RegionExited>,
    mut brains: Query<&mut EnemyBrain>,
) {
    let perceives = |kind: RegionKind| {
        matches!(kind, RegionKind::Vision | RegionKind::Attack | RegionKind::Arena)
    };

    for ev in entered.read() {
        if !perceives(ev.kind) || !ev.other_kind.is_player() {
            continue;
        }
        let Some(owner) = ev.owner else { continue };
        if let Ok(mut brain) = brains.get_mut(owner) {
            brain.on_region_entered(ev.kind, ev.other);
        }
    }
    for ev in exited.read() {
        if !perceives(ev.kind) || !ev.other_kind.is_player() {
            continue;
        }
        let Some(owner) = ev.owner else { continue };
        if let Ok(mut brain) = brains.get_mut(owner) {
            brain.on_region_exited(ev.kind, ev.other);
        }
    }
}

fn mirror_player_jumps(mut jumps: EventReader<PlayerJumped>, mut brains: Query<&mut EnemyBrain>) {
    if jumps.read().count() == 0 {
        return;
    }
    for mut brain in &mut brains {
        brain.on_player_jumped();
    }
}

fn sense_targets(
    time: Res<Time>,
    mut enemies: Query<(&mut EnemyBrain, &mut EnemySenses, &GlobalTransform)>,
    targets: Query<&GlobalTransform>,
) {
    let dt = time.delta_secs();
    for (mut brain, mut senses, gt) in &mut enemies {
        let target = brain
            .target()
            .and_then(|t| targets.get(t).ok())
            .map(|t| t.translation().truncate());
        brain.perceive(dt, target);
        senses.position = gt.translation().truncate();
        senses.target = target.filter(|_| brain.target().is_some());
    }
}

/// Mirrored player jumps and wall hops.
fn kick_enemies(
    mut q: Query<(&mut EnemyBrain, &Grounded, Option<&WallAhead>, &mut LinearVelocity), With<Enemy>>,
) {
    for (mut brain, grounded, wall, mut vel) in &mut q {
        if let Some(vy) = brain.vertical_kick(grounded.0, wall.is_some_and(|w| w.0), vel.x) {
            vel.y = vy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, BigBrainPlugin::new(PreUpdate)))
            .add_systems(PreUpdate, sense_targets.before(BigBrainSet::Scorers))
            .add_systems(
                PreUpdate,
                (
                    has_target_scorer.in_set(BigBrainSet::Scorers),
                    attack_in_range_scorer.in_set(BigBrainSet::Scorers),
                    patrol_action.in_set(BigBrainSet::Actions),
                    chase_action.in_set(BigBrainSet::Actions),
                ),
            );
        app
    }

    fn spawn_goblin(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((
                EnemyBrain::new(EnemyProfile::goblin(), Vec2::ZERO),
                EnemySenses::default(),
                GlobalTransform::IDENTITY,
                LinearVelocity::default(),
                Playhead::default(),
                Thinker::build()
                    .picker(FirstToScore::new(0.5))
                    .when(AttackInRange, Attack)
                    .when(HasTarget, Chase)
                    .otherwise(Patrol),
            ))
            .id()
    }

    fn run(app: &mut App, ticks: usize) {
        for _ in 0..ticks {
            app.update();
        }
    }

    fn velocity_x(app: &App, e: Entity) -> f32 {
        app.world().entity(e).get::<LinearVelocity>().map_or(f32::NAN, |v| v.x)
    }

    #[test]
    fn thinker_patrols_without_a_target() {
        let mut app = app();
        let goblin = spawn_goblin(&mut app);
        run(&mut app, 6);
        assert_eq!(velocity_x(&app, goblin), 100.0);
        assert_eq!(app.world().entity(goblin).get::<Playhead>().map(|h| h.clip()), Some(Clip::Walk));
    }

    #[test]
    fn thinker_switches_to_chase_when_the_player_is_seen() {
        let mut app = app();
        let goblin = spawn_goblin(&mut app);
        let player = app
            .world_mut()
            .spawn(GlobalTransform::from_translation(Vec3::new(-200.0, 0.0, 0.0)))
            .id();
        run(&mut app, 4);

        if let Some(mut brain) = app.world_mut().entity_mut(goblin).get_mut::<EnemyBrain>() {
            brain.on_region_entered(RegionKind::Vision, player);
        }
        run(&mut app, 8);
        assert_eq!(velocity_x(&app, goblin), -100.0);

        // The player vanishes: the goblin holds position instead of patrolling.
        app.world_mut().entity_mut(player).despawn();
        run(&mut app, 8);
        assert_eq!(velocity_x(&app, goblin), 0.0);
    }
}
