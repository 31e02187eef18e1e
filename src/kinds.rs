use crate::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Reflect)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Goblin,
    Skeleton,
    Balrog,
}

impl EnemyKind {
    pub fn key(self) -> &'static str {
        match self {
            EnemyKind::Goblin => "goblin",
            EnemyKind::Skeleton => "skeleton",
            EnemyKind::Balrog => "balrog",
        }
    }
}

/// Tag carried by every collidable so handlers can dispatch without type tests.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum EntityKind {
    Player,
    Enemy(EnemyKind),
    Projectile,
    Prop,
    Terrain,
}

impl EntityKind {
    pub fn is_player(self) -> bool {
        self == EntityKind::Player
    }

    pub fn is_enemy(self) -> bool {
        matches!(self, EntityKind::Enemy(_))
    }

    /// Can be hurt by projectiles and melee swings.
    pub fn is_damageable(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Enemy(_) | EntityKind::Prop)
    }

    /// Stops projectiles on contact.
    pub fn blocks_projectiles(self) -> bool {
        !matches!(self, EntityKind::Projectile)
    }

    /// Opens doors and trips dead zones.
    pub fn is_actor(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Enemy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_table() {
        assert!(EntityKind::Prop.is_damageable());
        assert!(!EntityKind::Terrain.is_damageable());
        assert!(EntityKind::Terrain.blocks_projectiles());
        assert!(!EntityKind::Projectile.blocks_projectiles());
        assert!(EntityKind::Enemy(EnemyKind::Goblin).is_actor());
        assert!(!EntityKind::Prop.is_actor());
        assert!(EntityKind::Enemy(EnemyKind::Balrog).is_enemy());
        assert!(!EntityKind::Player.is_enemy());
    }
}
