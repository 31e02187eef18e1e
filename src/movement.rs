//! Player movement.
//!
//! The five movement states are seldom_state state components. Transitions
//! are triggers that read the [`MovementFrame`] the player system writes each
//! tick. [`Locomotion`] never touches the engine: given the current state and
//! a snapshot of input and surroundings it answers with the velocity to apply
//! and the clip to show.

use bevy::prelude::*;
use seldom_state::prelude::*;
use serde::Deserialize;

use crate::animations::Clip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum MovementState {
    #[default]
    Idle,
    Running,
    Jumping,
    Falling,
    Climbing,
}

impl MovementState {
    /// Reads the state back from whichever state component is present.
    pub fn from_markers(running: bool, jumping: bool, falling: bool, climbing: bool) -> Self {
        if climbing {
            MovementState::Climbing
        } else if jumping {
            MovementState::Jumping
        } else if falling {
            MovementState::Falling
        } else if running {
            MovementState::Running
        } else {
            MovementState::Idle
        }
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Idle;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Running;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Jumping {
    /// Set when entered through a jump whose impulse has not been applied yet.
    pub launch: bool,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Falling;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Climbing;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    pub speed: f32,
    pub jump_velocity: f32,
    pub climb_speed: f32,
    pub gravity: f32,
    pub coyote_seconds: f32,
    pub move_threshold: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed: 200.0,
            jump_velocity: 350.0,
            climb_speed: 120.0,
            gravity: 980.0,
            coyote_seconds: 0.15,
            move_threshold: 0.1,
        }
    }
}

/// Jump grace window after walking off a ledge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoyoteTimer {
    remaining: f32,
    max: f32,
}

impl CoyoteTimer {
    pub fn new(max: f32) -> Self {
        Self {
            remaining: 0.0,
            max: max.max(0.0),
        }
    }

    pub fn tick(&mut self, grounded: bool, dt: f32) {
        self.remaining = if grounded {
            self.max
        } else {
            (self.remaining - dt).max(0.0)
        };
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_open(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn consume(&mut self) {
        self.remaining = 0.0;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInput {
    /// -1.0 (left) ..= 1.0 (right)
    pub horizontal: f32,
    /// -1.0 (down) ..= 1.0 (up)
    pub vertical: f32,
    pub jump: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Surroundings {
    pub grounded: bool,
    pub velocity: Vec2,
    /// X of the ladder the body overlaps, if any.
    pub ladder: Option<f32>,
}

/// What the transition triggers see: this tick's input and the body after
/// the locomotion step.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementFrame {
    pub input: MovementInput,
    pub env: Surroundings,
    pub coyote_open: bool,
    pub move_threshold: f32,
}

impl MovementFrame {
    pub fn wants_climb(&self) -> bool {
        self.env.ladder.is_some() && self.input.vertical != 0.0
    }

    pub fn jump_from_ground(&self) -> bool {
        self.input.jump && (self.env.grounded || self.coyote_open)
    }

    pub fn coyote_jump(&self) -> bool {
        self.input.jump && self.coyote_open
    }

    pub fn ladder_jump(&self) -> bool {
        self.input.jump
    }

    pub fn rising(&self) -> bool {
        !self.env.grounded && self.env.velocity.y > 0.0
    }

    pub fn dropping(&self) -> bool {
        !self.env.grounded && self.env.velocity.y <= 0.0
    }

    pub fn starts_running(&self) -> bool {
        self.input.horizontal != 0.0 || self.env.velocity.x != 0.0
    }

    pub fn comes_to_rest(&self) -> bool {
        self.env.velocity.x.abs() < self.move_threshold && self.input.horizontal == 0.0
    }

    pub fn at_apex(&self) -> bool {
        self.env.velocity.y <= 0.0
    }

    pub fn landed_moving(&self) -> bool {
        self.env.grounded && self.env.velocity.x.abs() > self.move_threshold
    }

    pub fn landed_still(&self) -> bool {
        self.env.grounded && self.env.velocity.x.abs() <= self.move_threshold
    }

    pub fn off_ladder_airborne(&self) -> bool {
        self.env.ladder.is_none() && !self.env.grounded
    }

    pub fn off_ladder_moving(&self) -> bool {
        self.env.ladder.is_none() && self.landed_moving()
    }

    pub fn off_ladder_still(&self) -> bool {
        self.env.ladder.is_none() && self.landed_still()
    }
}

macro_rules! frame_triggers {
    ($($name:ident),* $(,)?) => {
        $(
            fn $name(In(entity): In<Entity>, frames: Query<&MovementFrame>) -> bool {
                frames.get(entity).is_ok_and(MovementFrame::$name)
            }
        )*
    };
}

frame_triggers!(
    wants_climb,
    jump_from_ground,
    coyote_jump,
    ladder_jump,
    rising,
    dropping,
    starts_running,
    comes_to_rest,
    at_apex,
    landed_moving,
    landed_still,
    off_ladder_airborne,
    off_ladder_moving,
    off_ladder_still,
);

/// Transitions between the movement states. Per source state the first
/// passing trigger wins, so the order below is the precedence.
pub fn movement_machine() -> StateMachine {
    StateMachine::default()
        .trans::<Idle, _>(wants_climb, Climbing)
        .trans::<Idle, _>(jump_from_ground, Jumping { launch: true })
        .trans::<Idle, _>(rising, Jumping { launch: false })
        .trans::<Idle, _>(dropping, Falling)
        .trans::<Idle, _>(starts_running, Running)
        .trans::<Running, _>(wants_climb, Climbing)
        .trans::<Running, _>(jump_from_ground, Jumping { launch: true })
        .trans::<Running, _>(rising, Jumping { launch: false })
        .trans::<Running, _>(dropping, Falling)
        .trans::<Running, _>(comes_to_rest, Idle)
        .trans::<Jumping, _>(wants_climb, Climbing)
        .trans::<Jumping, _>(at_apex, Falling)
        .trans::<Jumping, _>(landed_moving, Running)
        .trans::<Jumping, _>(landed_still, Idle)
        .trans::<Falling, _>(wants_climb, Climbing)
        .trans::<Falling, _>(coyote_jump, Jumping { launch: true })
        .trans::<Falling, _>(landed_moving, Running)
        .trans::<Falling, _>(landed_still, Idle)
        .trans::<Climbing, _>(ladder_jump, Jumping { launch: true })
        .trans::<Climbing, _>(off_ladder_airborne, Falling)
        .trans::<Climbing, _>(off_ladder_moving, Running)
        .trans::<Climbing, _>(off_ladder_still, Idle)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementStep {
    pub velocity: Vec2,
    pub jumped: bool,
    pub snap_x: Option<f32>,
    pub clip: Clip,
}

#[derive(Component, Debug, Clone)]
pub struct Locomotion {
    tuning: MovementTuning,
    coyote: CoyoteTimer,
}

impl Locomotion {
    pub fn new(tuning: MovementTuning) -> Self {
        Self {
            coyote: CoyoteTimer::new(tuning.coyote_seconds),
            tuning,
        }
    }

    pub fn coyote(&self) -> &CoyoteTimer {
        &self.coyote
    }

    /// Velocity and clip for one tick spent in `state`. `launch` applies the
    /// pending jump impulse of a freshly entered `Jumping`.
    pub fn step(
        &mut self,
        state: MovementState,
        launch: bool,
        dt: f32,
        input: MovementInput,
        env: Surroundings,
    ) -> MovementStep {
        self.coyote.tick(env.grounded, dt);

        let jumped = state == MovementState::Jumping && launch;
        let mut velocity = env.velocity;
        if jumped {
            velocity.y = self.tuning.jump_velocity;
            self.coyote.consume();
        }

        let mut snap_x = None;
        let clip = match state {
            MovementState::Idle => {
                velocity.x = 0.0;
                if env.grounded {
                    velocity.y = 0.0;
                }
                Clip::Idle
            }
            MovementState::Running => {
                velocity.x = self.horizontal_speed(input);
                if env.grounded {
                    velocity.y = 0.0;
                }
                Clip::Run
            }
            MovementState::Jumping | MovementState::Falling => {
                velocity.x = self.horizontal_speed(input);
                if !jumped {
                    velocity.y -= self.tuning.gravity * dt;
                }
                if state == MovementState::Jumping {
                    Clip::Jump
                } else {
                    Clip::Fall
                }
            }
            MovementState::Climbing => {
                snap_x = env.ladder;
                velocity = Vec2::new(0.0, input.vertical * self.tuning.climb_speed);
                if input.vertical.abs() > 0.01 {
                    Clip::Climb
                } else {
                    Clip::Idle
                }
            }
        };

        MovementStep {
            velocity,
            jumped,
            snap_x,
            clip,
        }
    }

    /// Snapshot for the transition triggers.
    pub fn frame(&self, input: MovementInput, env: Surroundings) -> MovementFrame {
        MovementFrame {
            input,
            env,
            coyote_open: self.coyote.is_open(),
            move_threshold: self.tuning.move_threshold,
        }
    }

    fn horizontal_speed(&self, input: MovementInput) -> f32 {
        if input.horizontal.abs() > 0.0 {
            input.horizontal.clamp(-1.0, 1.0) * self.tuning.speed
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn locomotion() -> Locomotion {
        Locomotion::new(MovementTuning::default())
    }

    fn ground(vx: f32) -> Surroundings {
        Surroundings {
            grounded: true,
            velocity: Vec2::new(vx, 0.0),
            ladder: None,
        }
    }

    fn air(vx: f32, vy: f32) -> Surroundings {
        Surroundings {
            grounded: false,
            velocity: Vec2::new(vx, vy),
            ladder: None,
        }
    }

    fn jump() -> MovementInput {
        MovementInput {
            jump: true,
            ..default()
        }
    }

    fn frame(input: MovementInput, env: Surroundings, coyote_open: bool) -> MovementFrame {
        MovementFrame {
            input,
            env,
            coyote_open,
            move_threshold: MovementTuning::default().move_threshold,
        }
    }

    #[test]
    fn idle_step_holds_the_body_still() {
        let mut l = locomotion();
        for _ in 0..100 {
            let step = l.step(MovementState::Idle, false, DT, MovementInput::default(), ground(0.0));
            assert_eq!(step.velocity, Vec2::ZERO);
            assert_eq!(step.clip, Clip::Idle);
        }
    }

    #[test]
    fn running_step_uses_full_speed() {
        let mut l = locomotion();
        let input = MovementInput {
            horizontal: -1.0,
            ..default()
        };
        let step = l.step(MovementState::Running, false, DT, input, ground(0.0));
        assert_eq!(step.velocity.x, -200.0);
        assert_eq!(step.clip, Clip::Run);
    }

    #[test]
    fn launch_applies_impulse_once_and_consumes_coyote() {
        let mut l = locomotion();
        let step = l.step(MovementState::Jumping, true, DT, jump(), ground(0.0));
        assert!(step.jumped);
        assert_eq!(step.velocity.y, 350.0);
        assert_eq!(l.coyote().remaining(), 0.0);

        let step = l.step(MovementState::Jumping, false, DT, MovementInput::default(), air(0.0, 350.0));
        assert!(!step.jumped);
        assert!(step.velocity.y < 350.0);
        assert_eq!(step.clip, Clip::Jump);
    }

    #[test]
    fn airborne_horizontal_is_digital_not_accumulated() {
        let mut l = locomotion();
        let step = l.step(
            MovementState::Falling,
            false,
            DT,
            MovementInput { horizontal: 1.0, ..default() },
            air(-500.0, -10.0),
        );
        assert_eq!(step.velocity.x, 200.0);
        let step = l.step(MovementState::Falling, false, DT, MovementInput::default(), air(200.0, -10.0));
        assert_eq!(step.velocity.x, 0.0);
        assert_eq!(step.clip, Clip::Fall);
    }

    #[test]
    fn climbing_snaps_to_ladder() {
        let mut l = locomotion();
        let env = Surroundings {
            ladder: Some(42.0),
            ..ground(0.0)
        };
        let step = l.step(MovementState::Climbing, false, DT, MovementInput { vertical: 1.0, ..default() }, env);
        assert_eq!(step.snap_x, Some(42.0));
        assert_eq!(step.velocity, Vec2::new(0.0, 120.0));
        assert_eq!(step.clip, Clip::Climb);

        let step = l.step(MovementState::Climbing, false, DT, MovementInput::default(), env);
        assert_eq!(step.velocity, Vec2::ZERO);
        assert_eq!(step.clip, Clip::Idle);
    }

    #[test]
    fn coyote_timer_refills_and_drains() {
        let mut c = CoyoteTimer::new(0.15);
        c.tick(true, 0.5);
        assert_eq!(c.remaining(), 0.15);
        c.tick(false, 0.1);
        assert!(c.is_open());
        c.tick(false, 0.1);
        assert_eq!(c.remaining(), 0.0);
        c.tick(false, 0.1);
        assert_eq!(c.remaining(), 0.0);
    }

    #[test]
    fn coyote_window_shows_in_the_frame() {
        let mut l = locomotion();
        l.step(MovementState::Running, false, DT, MovementInput::default(), ground(0.0));
        l.step(MovementState::Falling, false, 0.1, MovementInput::default(), air(0.0, -5.0));
        assert!(l.frame(jump(), air(0.0, -5.0)).coyote_jump());
        l.step(MovementState::Falling, false, 0.1, MovementInput::default(), air(0.0, -5.0));
        assert!(!l.frame(jump(), air(0.0, -5.0)).coyote_jump());
    }

    #[test]
    fn landing_splits_on_move_threshold() {
        let none = MovementInput::default();
        assert!(frame(none, ground(150.0), false).landed_moving());
        assert!(frame(none, ground(0.05), false).landed_still());
        assert!(!frame(none, air(150.0, -1.0), false).landed_moving());
    }

    #[test]
    fn jumping_needs_ground_or_coyote() {
        assert!(frame(jump(), ground(0.0), false).jump_from_ground());
        assert!(frame(jump(), air(0.0, -5.0), true).jump_from_ground());
        assert!(!frame(jump(), air(0.0, -5.0), false).jump_from_ground());
        assert!(!frame(MovementInput::default(), ground(0.0), true).jump_from_ground());
    }

    #[test]
    fn any_snapshot_sequence_keeps_velocity_finite() {
        let mut l = locomotion();
        let mut seed: u32 = 0x9e37_79b9;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };
        for _ in 0..2000 {
            let bits = next();
            let env = Surroundings {
                grounded: bits & 1 == 0,
                velocity: Vec2::new(
                    ((bits >> 1) % 400) as f32 - 200.0,
                    ((bits >> 10) % 800) as f32 - 400.0,
                ),
                ladder: if bits & 2 == 0 { Some(10.0) } else { None },
            };
            let input = MovementInput {
                horizontal: ((bits >> 20) % 3) as f32 - 1.0,
                vertical: ((bits >> 22) % 3) as f32 - 1.0,
                jump: bits & (1 << 24) != 0,
            };
            let state = MovementState::from_markers(
                bits & (1 << 25) != 0,
                bits & (1 << 26) != 0,
                bits & (1 << 27) != 0,
                bits & (1 << 28) != 0,
            );
            let step = l.step(state, bits & (1 << 29) != 0, DT, input, env);
            assert!(step.velocity.is_finite());
            assert_eq!(step.snap_x.is_some(), state == MovementState::Climbing && env.ladder.is_some());
        }
    }

    mod transitions {
        use super::*;

        fn app() -> App {
            let mut app = App::new();
            app.add_plugins((MinimalPlugins, StateMachinePlugin::default()));
            app
        }

        fn spawn(app: &mut App, state: impl Bundle, frame: MovementFrame) -> Entity {
            app.world_mut().spawn((movement_machine(), state, frame)).id()
        }

        fn settle(app: &mut App) {
            for _ in 0..3 {
                app.update();
            }
        }

        #[test]
        fn standing_still_stays_idle() {
            let mut app = app();
            let e = spawn(&mut app, Idle, frame(MovementInput::default(), ground(0.0), true));
            for _ in 0..100 {
                app.update();
            }
            assert!(app.world().entity(e).contains::<Idle>());
        }

        #[test]
        fn falling_lands_running_when_moving_fast() {
            let mut app = app();
            let e = spawn(&mut app, Falling, frame(MovementInput::default(), ground(150.0), true));
            settle(&mut app);
            let body = app.world().entity(e);
            assert!(body.contains::<Running>());
            assert!(!body.contains::<Falling>());
        }

        #[test]
        fn falling_lands_idle_when_slow() {
            let mut app = app();
            let e = spawn(&mut app, Falling, frame(MovementInput::default(), ground(0.05), true));
            settle(&mut app);
            assert!(app.world().entity(e).contains::<Idle>());
        }

        #[test]
        fn jump_enters_jumping_with_pending_launch() {
            let mut app = app();
            let e = spawn(&mut app, Idle, frame(jump(), air(0.0, 10.0), true));
            settle(&mut app);
            let jumping = app.world().entity(e).get::<Jumping>().copied();
            assert!(jumping.is_some_and(|j| j.launch));
        }

        #[test]
        fn jump_turns_into_fall_at_apex() {
            let mut app = app();
            let e = spawn(&mut app, Jumping { launch: false }, frame(MovementInput::default(), air(0.0, 0.0), false));
            settle(&mut app);
            assert!(app.world().entity(e).contains::<Falling>());
        }

        #[test]
        fn coyote_jump_only_inside_window() {
            let mut app = app();
            let open = spawn(&mut app, Falling, frame(jump(), air(0.0, 10.0), true));
            let closed = spawn(&mut app, Falling, frame(jump(), air(0.0, 10.0), false));
            settle(&mut app);
            assert!(app.world().entity(open).contains::<Jumping>());
            assert!(app.world().entity(closed).contains::<Falling>());
        }

        #[test]
        fn ladder_with_vertical_input_climbs() {
            let mut app = app();
            let on_ladder = Surroundings {
                ladder: Some(0.0),
                ..ground(0.0)
            };
            let e = spawn(&mut app, Running, frame(MovementInput { vertical: 1.0, ..default() }, on_ladder, true));
            settle(&mut app);
            assert!(app.world().entity(e).contains::<Climbing>());
        }

        #[test]
        fn leaving_ladder_midair_falls() {
            let mut app = app();
            let e = spawn(&mut app, Climbing, frame(MovementInput::default(), air(0.0, 0.0), false));
            settle(&mut app);
            assert!(app.world().entity(e).contains::<Falling>());
        }

        #[test]
        fn jump_off_ladder() {
            let mut app = app();
            let on_ladder = Surroundings {
                ladder: Some(0.0),
                ..air(0.0, 10.0)
            };
            let e = spawn(&mut app, Climbing, frame(jump(), on_ladder, false));
            settle(&mut app);
            assert!(app.world().entity(e).get::<Jumping>().is_some_and(|j| j.launch));
        }

        #[test]
        fn removed_machine_never_transitions() {
            let mut app = app();
            let e = spawn(&mut app, Running, frame(jump(), air(0.0, -100.0), true));
            app.world_mut().entity_mut(e).remove::<StateMachine>();
            settle(&mut app);
            let body = app.world().entity(e);
            assert!(body.contains::<Running>());
            assert!(!body.contains::<Jumping>());
        }
    }
}
