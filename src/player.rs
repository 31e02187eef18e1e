use crate::animations::{Clip, Playhead, SheetId};
use crate::combat::{AttackOutcome, Faction, WeaponSlot};
use crate::config::GameConfig;
use crate::controls::{Action, attack_input, default_input_map, movement_input};
use crate::gameflow::{GameplayRoot, GameplaySet};
use crate::health::{Dying, Health, Mana};
use crate::kinds::EntityKind;
use crate::melee::MeleeSwing;
use crate::movement::{
    Climbing, Falling, Idle, Jumping, Locomotion, MovementFrame, MovementState, Running, Surroundings,
    movement_machine,
};
use crate::physics::{GameLayer, Grounded, ground_probe};
use crate::prelude::*;
use crate::projectile::{Projectile, spawn_projectile};
use crate::props::LadderContact;
use crate::weapons::WeaponTable;

const RADIUS: f32 = 8.0;
const BODY_LENGTH: f32 = 26.0;
const MUZZLE_DISTANCE: f32 = 12.0;

#[derive(Component)]
pub struct Player;

/// Raised on the frame the player leaves the ground by jumping.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct PlayerJumped;

pub fn spawn_player(
    commands: &mut Commands,
    position: Vec2,
    config: &GameConfig,
    weapons: &WeaponTable,
) -> Entity {
    let cfg = &config.player;
    let slot = match weapons.get(cfg.starting_weapon) {
        Some(def) => WeaponSlot::new(def.clone()),
        None => {
            warn!(
                "starting weapon {} is not in the weapon table; player starts unarmed",
                cfg.starting_weapon
            );
            WeaponSlot::default()
        }
    };

    commands
        .spawn((
            (
                Player,
                EntityKind::Player,
                Name::new("Player"),
                GameplayRoot,
                SheetId::Player,
                Playhead::default(),
            ),
            (
                Health::new(cfg.max_health),
                Mana::new(cfg.max_mana),
                slot,
                LadderContact::default(),
            ),
            (
                Locomotion::new(cfg.movement),
                MovementFrame::default(),
                movement_machine(),
                Idle,
            ),
            default_input_map(),
            (
                RigidBody::Dynamic,
                LockedAxes::ROTATION_LOCKED,
                GravityScale(0.0),
                Restitution::ZERO.with_combine_rule(CoefficientCombine::Min),
                Friction::ZERO.with_combine_rule(CoefficientCombine::Min),
                Collider::capsule(RADIUS, BODY_LENGTH),
                CollisionLayers::new(
                    GameLayer::Player,
                    [
                        GameLayer::Ground,
                        GameLayer::Enemy,
                        GameLayer::Projectile,
                        GameLayer::Prop,
                        GameLayer::Trigger,
                    ],
                ),
                CollidingEntities::default(),
            ),
            ground_probe(RADIUS, RADIUS + BODY_LENGTH / 2.0),
            Transform::from_xyz(position.x, position.y, 1.0),
        ))
        .id()
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerJumped>()
            .add_systems(
                Update,
                (tick_weapon_slots, drive_player_movement)
                    .chain()
                    .in_set(GameplaySet::Think),
            )
            .add_systems(Update, player_attack.in_set(GameplaySet::Act));
    }
}

/// Only slots still cooling down are written, so `Changed<WeaponSlot>`
/// means an attack, an equip or a cooldown tick.
fn tick_weapon_slots(time: Res<Time>, mut q: Query<&mut WeaponSlot>) {
    let dt = time.delta_secs();
    for mut slot in &mut q {
        if slot.cooldown() > 0.0 {
            slot.tick(dt);
        }
    }
}

fn drive_player_movement(
    time: Res<Time>,
    mut jumped: EventWriter<PlayerJumped>,
    mut q: Query<
        (
            &ActionState<Action>,
            (&mut Locomotion, &mut MovementFrame),
            (Has<Running>, Option<&mut Jumping>, Has<Falling>, Has<Climbing>),
            (&Grounded, &LadderContact, &Health, Has<Dying>),
            &mut LinearVelocity,
            &mut Transform,
            &mut Playhead,
        ),
        With<Player>,
    >,
) {
    let dt = time.delta_secs();
    for (actions, (mut locomotion, mut frame), states, senses, mut vel, mut tf, mut head) in &mut q {
        let (running, jumping, falling, climbing) = states;
        let (grounded, ladder, health, dying) = senses;
        if dying {
            vel.0 = Vec2::ZERO;
            head.request(Clip::Death);
            continue;
        }

        let state = MovementState::from_markers(running, jumping.is_some(), falling, climbing);
        let launch = jumping.as_ref().is_some_and(|j| j.launch);
        let input = movement_input(actions);
        let env = Surroundings {
            grounded: grounded.0,
            velocity: vel.0,
            ladder: ladder.0,
        };

        let step = locomotion.step(state, launch, dt, input, env);
        if let (true, Some(mut jumping)) = (launch, jumping) {
            jumping.launch = false;
        }
        vel.0 = step.velocity;
        if let Some(x) = step.snap_x {
            tf.translation.x = x;
        }
        if step.jumped {
            jumped.write(PlayerJumped);
        }

        // The probe still touches the floor on the launch tick.
        *frame = locomotion.frame(
            input,
            Surroundings {
                grounded: grounded.0 && !step.jumped,
                velocity: step.velocity,
                ladder: ladder.0,
            },
        );

        head.request(if health.is_hurt() { Clip::Hit } else { step.clip });
        if vel.x > 0.0 {
            head.flip_x = false;
        } else if vel.x < 0.0 {
            head.flip_x = true;
        }
    }
}

fn player_attack(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut q: Query<
        (
            Entity,
            &ActionState<Action>,
            &mut WeaponSlot,
            &mut Mana,
            &Transform,
            &mut Playhead,
        ),
        (With<Player>, Without<Dying>, Without<MeleeSwing>),
    >,
) {
    for (e, actions, mut slot, mut mana, tf, mut head) in &mut q {
        let input = attack_input(actions);
        if !input.any() {
            continue;
        }
        let cost = slot.equipped().map(|w| w.cost as f32).unwrap_or(0.0);
        if !mana.can_afford(cost) {
            continue;
        }

        match slot.try_attack(&input) {
            AttackOutcome::Refused => continue,
            AttackOutcome::Melee { damage } => {
                if input.left != input.right {
                    head.flip_x = input.left;
                }
                commands.entity(e).insert(MeleeSwing::new(damage));
            }
            AttackOutcome::Ranged(shot) => {
                let origin = tf.translation.truncate() + shot.direction * MUZZLE_DISTANCE;
                spawn_projectile(
                    &mut commands,
                    &assets,
                    origin,
                    Projectile {
                        direction: shot.direction,
                        speed: shot.speed,
                        damage: shot.damage,
                        faction: Faction::Friendly,
                    },
                    shot.bullet.as_deref(),
                );
            }
        }
        mana.spend(cost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::AttackInput;
    use crate::weapons::WeaponDefinition;

    #[derive(Resource, Default)]
    struct ChangedSlots(usize);

    fn count_changed(q: Query<(), Changed<WeaponSlot>>, mut seen: ResMut<ChangedSlots>) {
        seen.0 = q.iter().count();
    }

    fn wand() -> WeaponDefinition {
        WeaponDefinition {
            id: 2,
            name: "Wand".into(),
            damage: 3.0,
            cost: 1,
            fire_rate: 0.5,
            description: String::new(),
            melee: false,
            bullet: Some("Orb".into()),
        }
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<ChangedSlots>()
            .add_systems(Update, (tick_weapon_slots, count_changed).chain());
        app
    }

    #[test]
    fn ready_slot_is_not_marked_changed_every_frame() {
        let mut app = app();
        app.world_mut().spawn(WeaponSlot::new(wand()));
        app.update();
        assert_eq!(app.world().resource::<ChangedSlots>().0, 1);
        for _ in 0..5 {
            app.update();
            assert_eq!(app.world().resource::<ChangedSlots>().0, 0);
        }
    }

    #[test]
    fn cooling_slot_is_marked_changed() {
        let mut app = app();
        let mut slot = WeaponSlot::new(wand());
        let fire = AttackInput {
            up: false,
            down: false,
            left: false,
            right: true,
        };
        assert!(slot.try_attack(&fire).attacked());
        app.world_mut().spawn(slot);
        app.update();
        app.update();
        assert_eq!(app.world().resource::<ChangedSlots>().0, 1);
    }
}
