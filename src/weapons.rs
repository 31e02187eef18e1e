//! Weapon definitions read from a comma-separated table.
//!
//! Columns: `id, name, damage, cost, fireRate, description, isMelee, bulletType`.
//! The first non-blank line is the header. Quoted fields may contain commas.

use crate::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const COLUMNS: usize = 8;

#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct WeaponDefinition {
    pub id: u32,
    pub name: String,
    pub damage: f32,
    pub cost: u32,
    pub fire_rate: f32,
    pub description: String,
    pub melee: bool,
    pub bullet: Option<String>,
}

#[derive(Debug, Error)]
pub enum WeaponTableError {
    #[error("failed to read weapon table at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loaded once at startup and never mutated afterwards.
#[derive(Resource, Debug, Clone, Default)]
pub struct WeaponTable {
    weapons: BTreeMap<u32, WeaponDefinition>,
}

impl WeaponTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WeaponTableError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| WeaponTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut weapons = BTreeMap::new();
        let rows = text.lines().filter(|l| !l.trim().is_empty()).skip(1);

        for (n, line) in rows.enumerate() {
            match parse_row(line) {
                Some(def) => {
                    weapons.insert(def.id, def);
                }
                None => log::warn!("weapon table: skipping malformed row {}: {line:?}", n + 2),
            }
        }

        Self { weapons }
    }

    pub fn get(&self, id: u32) -> Option<&WeaponDefinition> {
        self.weapons.get(&id)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Uniform pick over every definition, used by weapon drops.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&WeaponDefinition> {
        if self.weapons.is_empty() {
            return None;
        }
        let i = rng.random_range(0..self.weapons.len());
        self.weapons.values().nth(i)
    }
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn parse_row(line: &str) -> Option<WeaponDefinition> {
    let f = split_fields(line);
    if f.len() < COLUMNS {
        return None;
    }
    let id = f[0].parse::<u32>().ok()?;

    let bullet = match f[7].as_str() {
        "" => None,
        s if s.eq_ignore_ascii_case("null") => None,
        s => Some(s.to_string()),
    };

    Some(WeaponDefinition {
        id,
        name: f[1].clone(),
        damage: f[2].parse().unwrap_or(0.0),
        cost: f[3].parse().unwrap_or(0),
        fire_rate: f[4].parse().unwrap_or(0.0),
        description: f[5].clone(),
        melee: f[6].eq_ignore_ascii_case("true"),
        bullet,
    })
}

#[derive(Resource, Clone)]
pub struct WeaponTablePluginConfig {
    pub path: String,
}

pub struct WeaponTablePlugin {
    config: WeaponTablePluginConfig,
}

impl WeaponTablePlugin {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            config: WeaponTablePluginConfig { path: path.into() },
        }
    }
}

impl Plugin for WeaponTablePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .register_type::<WeaponDefinition>()
            .add_systems(PreStartup, load_weapon_table);
    }
}

fn load_weapon_table(mut commands: Commands, cfg: Res<WeaponTablePluginConfig>) {
    let table = match WeaponTable::load(&cfg.path) {
        Ok(table) => {
            info!("WeaponTablePlugin: loaded {} weapons from {}", table.len(), cfg.path);
            table
        }
        Err(e) => {
            error!("WeaponTablePlugin: {e}; continuing with no weapons");
            WeaponTable::default()
        }
    };
    commands.insert_resource(table);
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,name,damage,cost,fireRate,description,isMelee,bulletType";

    #[test]
    fn parses_bow_row() {
        let table = WeaponTable::parse(&format!("{HEADER}\n3,Bow,10,5,0.8,A simple bow,false,Arrow\n"));
        let bow = table.get(3).unwrap();
        assert_eq!(
            *bow,
            WeaponDefinition {
                id: 3,
                name: "Bow".into(),
                damage: 10.0,
                cost: 5,
                fire_rate: 0.8,
                description: "A simple bow".into(),
                melee: false,
                bullet: Some("Arrow".into()),
            }
        );
    }

    #[test]
    fn quoted_description_keeps_commas() {
        let table = WeaponTable::parse(&format!(
            "{HEADER}\n0,Sword,5,0,0.4,\"Sharp, heavy, old\",TRUE,null\n"
        ));
        let sword = table.get(0).unwrap();
        assert_eq!(sword.description, "Sharp, heavy, old");
        assert!(sword.melee);
        assert_eq!(sword.bullet, None);
    }

    #[test]
    fn short_rows_and_bad_ids_are_skipped() {
        let table = WeaponTable::parse(&format!(
            "{HEADER}\n1,Short,1,1\nxx,Bad,1,1,1,d,false,\n2,Ok,1,1,1,d,false,\n"
        ));
        assert_eq!(table.len(), 1);
        assert!(table.get(2).is_some());
        assert_eq!(table.get(2).unwrap().bullet, None);
    }

    #[test]
    fn bad_numbers_default_to_zero() {
        let table = WeaponTable::parse(&format!("{HEADER}\n4,Odd,abc,-1,fast,d,maybe,Orb\n"));
        let odd = table.get(4).unwrap();
        assert_eq!(odd.damage, 0.0);
        assert_eq!(odd.cost, 0);
        assert_eq!(odd.fire_rate, 0.0);
        assert!(!odd.melee);
    }

    #[test]
    fn duplicate_ids_keep_the_last_row() {
        let table = WeaponTable::parse(&format!(
            "\n\n{HEADER}\n\n5,First,1,1,1,d,false,\n5,Second,2,2,2,d,true,\n"
        ));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(5).unwrap().name, "Second");
    }

    #[test]
    fn missing_file_is_a_typed_error() {
        let err = WeaponTable::load("definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, WeaponTableError::Read { .. }));
    }
}
