//! Cooldown-gated attack resolution shared by the player and anything else
//! that holds a weapon.

use crate::kinds::EntityKind;
use crate::prelude::*;
use crate::weapons::WeaponDefinition;

pub const BULLET_SPEED: f32 = 450.0;
pub const MIN_COOLDOWN: f32 = 0.01;
/// Horizontal distance from the body centre to the melee hit region.
pub const MELEE_REACH: f32 = 14.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttackInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl AttackInput {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Normalized sum of the pressed directions, y-up. Opposites cancel.
    pub fn aim(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| pos as i8 as f32 - neg as i8 as f32;
        Vec2::new(axis(self.right, self.left), axis(self.up, self.down)).normalize_or_zero()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSpawn {
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub bullet: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttackOutcome {
    Refused,
    Melee { damage: f32 },
    Ranged(ProjectileSpawn),
}

impl AttackOutcome {
    pub fn attacked(&self) -> bool {
        !matches!(self, AttackOutcome::Refused)
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct WeaponSlot {
    definition: Option<WeaponDefinition>,
    cooldown: f32,
}

impl WeaponSlot {
    pub fn new(definition: WeaponDefinition) -> Self {
        Self {
            definition: Some(definition),
            cooldown: 0.0,
        }
    }

    pub fn equipped(&self) -> Option<&WeaponDefinition> {
        self.definition.as_ref()
    }

    /// Swaps the weapon. The running cooldown carries over.
    pub fn equip(&mut self, definition: WeaponDefinition) {
        self.definition = Some(definition);
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    pub fn try_attack(&mut self, input: &AttackInput) -> AttackOutcome {
        if !self.ready() {
            return AttackOutcome::Refused;
        }
        let Some(weapon) = self.definition.as_ref() else {
            log::warn!("attack requested with no weapon equipped");
            return AttackOutcome::Refused;
        };

        let outcome = if weapon.melee {
            if !input.any() {
                return AttackOutcome::Refused;
            }
            AttackOutcome::Melee {
                damage: weapon.damage,
            }
        } else {
            let direction = input.aim();
            if direction == Vec2::ZERO {
                return AttackOutcome::Refused;
            }
            AttackOutcome::Ranged(ProjectileSpawn {
                direction,
                speed: BULLET_SPEED,
                damage: weapon.damage,
                bullet: weapon.bullet.clone(),
            })
        };

        self.cooldown = weapon.fire_rate.max(MIN_COOLDOWN);
        outcome
    }
}

/// Which side fired a projectile.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum Faction {
    Friendly,
    Hostile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEffect {
    /// Keep flying.
    Pass,
    /// Despawn without damage.
    Stop,
    /// Damage the other body, then despawn.
    Damage,
}

pub fn projectile_contact(faction: Faction, other: EntityKind) -> ContactEffect {
    match faction {
        _ if !other.blocks_projectiles() => ContactEffect::Pass,
        Faction::Friendly if other.is_player() => ContactEffect::Pass,
        Faction::Hostile if other.is_enemy() => ContactEffect::Pass,
        // Enemy shots do not break boxes.
        Faction::Friendly if other.is_damageable() => ContactEffect::Damage,
        Faction::Hostile if other.is_player() => ContactEffect::Damage,
        _ => ContactEffect::Stop,
    }
}

/// Offset of the melee hit region from the attacker, on its facing side.
pub fn melee_offset(facing_right: bool) -> Vec2 {
    if facing_right {
        Vec2::new(MELEE_REACH, 0.0)
    } else {
        Vec2::new(-MELEE_REACH, 0.0)
    }
}
