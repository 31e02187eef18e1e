//! Item drops and what picking them up does.

use crate::combat::WeaponSlot;
use crate::health::{Health, Mana};
use crate::prelude::*;
use crate::weapons::WeaponDefinition;

pub const POTION_AMOUNT: f32 = 20.0;
pub const DUPLICATE_WEAPON_MANA: f32 = 50.0;
pub const BOX_HITS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ItemKind {
    Weapon,
    ManaPotion,
    HealPotion,
}

impl ItemKind {
    /// Level data names items by string; anything unknown is rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "weapon" => Some(ItemKind::Weapon),
            "manaPotion" => Some(ItemKind::ManaPotion),
            "healPotion" => Some(ItemKind::HealPotion),
            other => {
                log::error!("unsupported item name {other:?}; nothing spawned");
                None
            }
        }
    }

    pub fn sprite(self) -> &'static str {
        match self {
            ItemKind::Weapon => "sprites/items/weapon.png",
            ItemKind::ManaPotion => "sprites/items/mana_potion.png",
            ItemKind::HealPotion => "sprites/items/heal_potion.png",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DropTable;

impl DropTable {
    /// `roll` is in `0..100`.
    pub fn resolve(roll: u32) -> Option<ItemKind> {
        match roll {
            0..25 => Some(ItemKind::Weapon),
            25..50 => Some(ItemKind::ManaPotion),
            50..75 => Some(ItemKind::HealPotion),
            _ => None,
        }
    }

    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Option<ItemKind> {
        Self::resolve(rng.random_range(0..100))
    }
}

/// What a pickup entity carries.
#[derive(Component, Debug, Clone, PartialEq)]
pub enum Pickup {
    HealPotion,
    ManaPotion,
    Weapon(WeaponDefinition),
}

impl Pickup {
    pub fn kind(&self) -> ItemKind {
        match self {
            Pickup::HealPotion => ItemKind::HealPotion,
            Pickup::ManaPotion => ItemKind::ManaPotion,
            Pickup::Weapon(_) => ItemKind::Weapon,
        }
    }

    pub fn apply(&self, health: &mut Health, mana: &mut Mana, slot: &mut WeaponSlot) {
        match self {
            Pickup::HealPotion => health.heal(POTION_AMOUNT),
            Pickup::ManaPotion => mana.restore(POTION_AMOUNT),
            Pickup::Weapon(def) => {
                if slot.equipped().is_some_and(|w| w.id == def.id) {
                    mana.restore(DUPLICATE_WEAPON_MANA);
                }
                slot.equip(def.clone());
            }
        }
    }
}

/// Vertical bob for idle pickups.
#[derive(Component, Debug, Clone, Copy)]
pub struct Bob {
    pub base_y: f32,
    pub amplitude: f32,
    pub speed: f32,
    pub phase: f32,
}

impl Bob {
    pub fn new(base_y: f32) -> Self {
        Self {
            base_y,
            amplitude: 6.0,
            speed: 2.5,
            phase: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) -> f32 {
        self.phase += dt * self.speed;
        self.base_y + self.phase.sin() * self.amplitude
    }
}

/// Crate that breaks after a few player hits.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakable {
    hits: u32,
}

impl Default for Breakable {
    fn default() -> Self {
        Self { hits: BOX_HITS }
    }
}

impl Breakable {
    /// True exactly once, on the hit that breaks it.
    pub fn hit(&mut self) -> bool {
        if self.hits == 0 {
            return false;
        }
        self.hits -= 1;
        self.hits == 0
    }
}
