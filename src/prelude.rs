pub use avian2d::prelude::*;
pub use bevy::prelude::*;
pub use leafwing_input_manager::prelude::*;
pub use rand::Rng;
