use crate::behavior::EnemyProfile;
use crate::kinds::EnemyKind;
use crate::movement::MovementTuning;
use crate::prelude::*;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: f32,
    pub max_mana: f32,
    pub starting_weapon: u32,
    pub movement: MovementTuning,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_mana: 100.0,
            starting_weapon: 0,
            movement: MovementTuning::default(),
        }
    }
}

/// Everything tunable without a rebuild. Missing fields fall back to the
/// built-in values; an enemy entry only overrides the fields it names.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    #[serde(deserialize_with = "overlay_enemy_profiles")]
    pub enemies: HashMap<EnemyKind, EnemyProfile>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            enemies: built_in_profiles(),
        }
    }
}

fn built_in_profiles() -> HashMap<EnemyKind, EnemyProfile> {
    [EnemyKind::Goblin, EnemyKind::Skeleton, EnemyKind::Balrog]
        .into_iter()
        .map(|kind| (kind, EnemyProfile::for_kind(kind)))
        .collect()
}

/// Merges each configured enemy object over that kind's built-in profile.
/// Nested values (`attack`, `patrol`) replace the built-in one as a whole.
fn overlay_enemy_profiles<'de, D>(deserializer: D) -> Result<HashMap<EnemyKind, EnemyProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = HashMap::<EnemyKind, Map<String, Value>>::deserialize(deserializer)?;
    let mut profiles = built_in_profiles();
    for (kind, fields) in overrides {
        let mut merged = serde_json::to_value(EnemyProfile::for_kind(kind)).map_err(D::Error::custom)?;
        if let Value::Object(base) = &mut merged {
            base.extend(fields);
        }
        let profile = serde_json::from_value(merged)
            .map_err(|e| D::Error::custom(format!("enemy {}: {e}", kind.key())))?;
        profiles.insert(kind, profile);
    }
    Ok(profiles)
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn enemy(&self, kind: EnemyKind) -> Option<&EnemyProfile> {
        self.enemies.get(&kind)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config format in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Resource, Clone)]
pub struct ConfigPluginConfig {
    pub path: String,
}

pub struct ConfigPlugin {
    config: ConfigPluginConfig,
}

impl ConfigPlugin {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            config: ConfigPluginConfig { path: path.into() },
        }
    }
}

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .add_systems(PreStartup, load_game_config);
    }
}

fn load_game_config(mut commands: Commands, cfg: Res<ConfigPluginConfig>) {
    let config = GameConfig::load(&cfg.path).unwrap_or_else(|e| {
        warn!("ConfigPlugin: {e}; using built-in defaults");
        GameConfig::default()
    });
    commands.insert_resource(config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{AttackStyle, DeathEffect, Detection, PatrolRoute};

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = GameConfig::parse("{}").unwrap();
        assert_eq!(cfg.player.max_health, 100.0);
        assert_eq!(cfg.player.movement.jump_velocity, 350.0);
        assert_eq!(cfg.enemy(EnemyKind::Skeleton).unwrap().max_health, 5.0);
    }

    #[test]
    fn partial_override() {
        let cfg = GameConfig::parse(
            r#"{
                "player": { "max_mana": 40, "movement": { "speed": 150 } },
                "enemies": { "goblin": { "speed": 60, "patrol": { "mode": "radius", "radius": 30 } } }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.player.max_mana, 40.0);
        assert_eq!(cfg.player.max_health, 100.0);
        assert_eq!(cfg.player.movement.speed, 150.0);
        assert_eq!(cfg.player.movement.gravity, 980.0);

        let goblin = cfg.enemy(EnemyKind::Goblin).unwrap();
        assert_eq!(goblin.speed, 60.0);
        assert_eq!(goblin.patrol, PatrolRoute::Radius { radius: 30.0 });
        assert_eq!(goblin.damage, 15.0);
        // Kinds left out of the map keep their built-in profile.
        assert_eq!(cfg.enemy(EnemyKind::Balrog), Some(&EnemyProfile::balrog()));
    }

    #[test]
    fn partial_enemy_entry_keeps_its_own_kind() {
        let cfg = GameConfig::parse(
            r#"{ "enemies": { "balrog": { "max_health": 60 }, "skeleton": { "damage": 4 } } }"#,
        )
        .unwrap();

        let boss = cfg.enemy(EnemyKind::Balrog).unwrap();
        assert_eq!(boss.max_health, 60.0);
        assert_eq!(boss.death, DeathEffect::ReturnToMenu);
        assert_eq!(boss.detection, Detection::Arena);
        assert_eq!(boss.patrol, PatrolRoute::Home { tolerance: 5.0 });
        assert!(boss.faces_left);

        let skeleton = cfg.enemy(EnemyKind::Skeleton).unwrap();
        assert_eq!(skeleton.damage, 4.0);
        assert!(matches!(skeleton.attack, AttackStyle::Ranged { .. }));
        assert_eq!(skeleton.max_health, 5.0);

        assert_eq!(cfg.enemy(EnemyKind::Goblin), Some(&EnemyProfile::goblin()));
    }

    #[test]
    fn shipped_config_matches_built_ins() {
        let cfg = GameConfig::load("assets/game.json").unwrap();
        for kind in [EnemyKind::Goblin, EnemyKind::Skeleton, EnemyKind::Balrog] {
            assert_eq!(cfg.enemy(kind), Some(&EnemyProfile::for_kind(kind)));
        }
    }

    #[test]
    fn bad_enemy_field_is_rejected() {
        let err = GameConfig::parse(r#"{ "enemies": { "goblin": { "speed": "fast" } } }"#).unwrap_err();
        assert!(err.to_string().contains("goblin"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(GameConfig::parse("{ \"player\": 3 }").is_err());
        let err = GameConfig::load("missing/game.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
