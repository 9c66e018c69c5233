//! Registry snapshot: the known entities and areas the checks compare against.
//!
//! The snapshot is produced by a registry-sync collaborator and read here from
//! YAML or JSON:
//!
//! ```yaml
//! entities:
//!   - light.kitchen
//!   - entity_id: lock.front_door
//!     area_id: hallway
//! areas:
//!   - area_id: hallway
//!     name: Hallway
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Known entity IDs, ordered for deterministic iteration.
pub type EntitySet = BTreeSet<String>;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
/// Entity entry: either a bare id or an id with area metadata.
pub enum EntityEntry {
    Id(String),
    Full {
        entity_id: String,
        #[serde(default)]
        area_id: Option<String>,
    },
}

impl EntityEntry {
    pub fn entity_id(&self) -> &str {
        match self {
            EntityEntry::Id(id) => id,
            EntityEntry::Full { entity_id, .. } => entity_id,
        }
    }

    pub fn area_id(&self) -> Option<&str> {
        match self {
            EntityEntry::Id(_) => None,
            EntityEntry::Full { area_id, .. } => area_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
/// A Home Assistant area.
pub struct Area {
    pub area_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Snapshot of the entity and area registries.
pub struct RegistrySnapshot {
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl RegistrySnapshot {
    /// Load a snapshot from `.json`, otherwise parse as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            serde_json::from_str(&raw).map_err(|source| Error::Json {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_yaml::from_str(&raw).map_err(|source| Error::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    pub fn known_entity_ids(&self) -> EntitySet {
        self.entities
            .iter()
            .map(|e| e.entity_id().to_string())
            .collect()
    }

    pub fn area_names(&self) -> Vec<String> {
        self.areas.iter().map(|a| a.name.clone()).collect()
    }

    /// entity_id -> area_id for entities that carry an area.
    pub fn entity_area_map(&self) -> HashMap<String, String> {
        self.entities
            .iter()
            .filter_map(|e| Some((e.entity_id().to_string(), e.area_id()?.to_string())))
            .collect()
    }

    /// area_id -> display name.
    pub fn area_name_map(&self) -> HashMap<String, String> {
        self.areas
            .iter()
            .map(|a| (a.area_id.clone(), a.name.clone()))
            .collect()
    }
}
