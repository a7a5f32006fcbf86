// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Class list persistence.
//!
//! `classes.txt` holds one name per line in registry order and is what other
//! YOLO tooling reads (line N = class N). Because ids can be customized, the
//! full mapping (id, name, color, retired ids) is also kept in `classes.yaml`.

use crate::error::Result;
use crate::models::classes::{ClassDefinition, ClassRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CLASS_LIST_FILE: &str = "classes.txt";
pub const CLASS_MAP_FILE: &str = "classes.yaml";

/// On-disk form of `classes.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassMap {
    pub classes: Vec<ClassDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retired: Vec<u32>,
}

impl ClassMap {
    pub fn from_registry(registry: &ClassRegistry) -> Self {
        Self {
            classes: registry.iter().cloned().collect(),
            retired: registry.retired().collect(),
        }
    }

    pub fn into_registry(self) -> Result<ClassRegistry> {
        ClassRegistry::from_definitions(self.classes, self.retired)
    }
}

/// Read a plain class list.
pub fn read_class_names(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(|l| l.trim().to_string()).collect())
}

/// Write the plain class list in registry order.
pub fn write_class_names(path: &Path, registry: &ClassRegistry) -> Result<()> {
    let mut content = String::new();
    for def in registry.iter() {
        content.push_str(&def.name);
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}

pub fn read_class_map(path: &Path) -> Result<ClassRegistry> {
    let yaml = std::fs::read_to_string(path)?;
    let map: ClassMap = serde_yaml::from_str(&yaml)?;
    map.into_registry()
}

pub fn write_class_map(path: &Path, registry: &ClassRegistry) -> Result<()> {
    let yaml = serde_yaml::to_string(&ClassMap::from_registry(registry))?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Load the registry stored in a directory.
///
/// `classes.yaml` is preferred; `classes.txt` is read with positional ids.
/// Returns `None` if neither file exists.
pub fn load_registry(dir: &Path) -> Result<Option<ClassRegistry>> {
    let map_path = dir.join(CLASS_MAP_FILE);
    if map_path.exists() {
        let registry = read_class_map(&map_path)?;
        log::info!("Loaded {} classes from {}", registry.len(), map_path.display());
        return Ok(Some(registry));
    }

    let list_path = dir.join(CLASS_LIST_FILE);
    if list_path.exists() {
        let registry = ClassRegistry::from_names(&read_class_names(&list_path)?);
        log::info!("Loaded {} classes from {}", registry.len(), list_path.display());
        return Ok(Some(registry));
    }

    Ok(None)
}

/// Write both class files into a directory.
pub fn save_registry(dir: &Path, registry: &ClassRegistry) -> Result<()> {
    write_class_names(&dir.join(CLASS_LIST_FILE), registry)?;
    write_class_map(&dir.join(CLASS_MAP_FILE), registry)?;
    log::info!("Saved {} classes to {}", registry.len(), dir.display());
    Ok(())
}
