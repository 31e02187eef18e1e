use crate::combat::AttackInput;
use crate::movement::MovementInput;
use crate::prelude::*;

#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect)]
pub enum Action {
    #[actionlike(Axis)]
    Move,
    #[actionlike(Axis)]
    Climb,
    Jump,
    ShootUp,
    ShootDown,
    ShootLeft,
    ShootRight,
}

pub fn default_input_map() -> InputMap<Action> {
    InputMap::default()
        .with_axis(Action::Move, VirtualAxis::ad())
        .with_axis(Action::Move, GamepadControlAxis::new(GamepadAxis::LeftStickX))
        .with_axis(Action::Climb, VirtualAxis::ws())
        .with_axis(Action::Climb, GamepadControlAxis::new(GamepadAxis::LeftStickY))
        .with(Action::Jump, KeyCode::Space)
        .with(Action::Jump, GamepadButton::South)
        .with(Action::ShootUp, KeyCode::ArrowUp)
        .with(Action::ShootDown, KeyCode::ArrowDown)
        .with(Action::ShootLeft, KeyCode::ArrowLeft)
        .with(Action::ShootRight, KeyCode::ArrowRight)
        .with(Action::ShootUp, GamepadButton::North)
        .with(Action::ShootDown, GamepadButton::RightTrigger)
        .with(Action::ShootLeft, GamepadButton::West)
        .with(Action::ShootRight, GamepadButton::East)
}

const DEADZONE: f32 = 0.5;

fn digital(v: f32) -> f32 {
    if v > DEADZONE {
        1.0
    } else if v < -DEADZONE {
        -1.0
    } else {
        0.0
    }
}

pub fn movement_input(actions: &ActionState<Action>) -> MovementInput {
    MovementInput {
        horizontal: digital(actions.value(&Action::Move)),
        vertical: digital(actions.value(&Action::Climb)),
        jump: actions.just_pressed(&Action::Jump),
    }
}

pub fn attack_input(actions: &ActionState<Action>) -> AttackInput {
    AttackInput {
        up: actions.pressed(&Action::ShootUp),
        down: actions.pressed(&Action::ShootDown),
        left: actions.pressed(&Action::ShootLeft),
        right: actions.pressed(&Action::ShootRight),
    }
}
