// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Class registry.
//!
//! Classes are kept in display order. Each has a unique name, a color and a
//! YOLO class id that the operator may change freely, so a class's position
//! and its id are unrelated once ids have been customized.

use crate::error::{LabelerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Colors handed out to classes that are created without one.
pub const PALETTE: [Rgb; 9] = [
    Rgb::new(0xFF, 0x00, 0x00),
    Rgb::new(0x00, 0xFF, 0x00),
    Rgb::new(0x00, 0x00, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x00),
    Rgb::new(0xFF, 0x00, 0xFF),
    Rgb::new(0x00, 0xFF, 0xFF),
    Rgb::new(0xFF, 0x88, 0x00),
    Rgb::new(0x88, 0x00, 0xFF),
    Rgb::new(0x00, 0xFF, 0x88),
];

/// An RGB color, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(LabelerError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| LabelerError::InvalidColor(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Perceived luminance below the midpoint; used to pick label text color.
    pub fn is_dark(&self) -> bool {
        let luminance =
            0.299 * (self.r as f64) + 0.587 * (self.g as f64) + 0.114 * (self.b as f64);
        luminance < 128.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = LabelerError;

    fn try_from(value: String) -> Result<Self> {
        Rgb::parse(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// A label class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    #[serde(rename = "id")]
    pub class_id: u32,
    pub name: String,
    pub color: Rgb,
}

/// Ordered set of classes with unique names and unique ids.
///
/// Ids that leave the registry (by removal or re-id) are retired and never
/// handed out automatically again, so labels written with a stale id keep
/// reading as unknown instead of silently binding to a newer class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassRegistry {
    classes: Vec<ClassDefinition>,
    retired: BTreeSet<u32>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from persisted definitions, validating uniqueness.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ClassDefinition>,
        retired: impl IntoIterator<Item = u32>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for def in definitions {
            registry.add(&def.name, Some(def.color), Some(def.class_id))?;
        }
        for id in retired {
            if registry.contains(id) {
                log::warn!("Class id {} is both defined and retired; keeping the definition", id);
            } else {
                registry.retired.insert(id);
            }
        }
        Ok(registry)
    }

    /// Build a registry from the lines of a class list: line N is class N.
    ///
    /// Blank lines and repeated names define no class but still occupy
    /// their line number.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut registry = Self::new();
        for (line, name) in names.iter().enumerate() {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if let Err(e) = registry.add(name, None, Some(line as u32)) {
                log::warn!("Skipping class '{}': {}", name, e);
            }
        }
        registry
    }

    /// Add a class. Without an explicit id, the lowest free id is used.
    pub fn add(
        &mut self,
        name: &str,
        color: Option<Rgb>,
        explicit_id: Option<u32>,
    ) -> Result<ClassDefinition> {
        let name = Self::clean_name(name)?;
        if self.find_by_name(&name).is_some() {
            return Err(LabelerError::DuplicateName(name));
        }

        let class_id = match explicit_id {
            Some(id) if self.contains(id) => return Err(LabelerError::DuplicateId(id)),
            Some(id) if self.retired.contains(&id) => return Err(LabelerError::RetiredId(id)),
            Some(id) => id,
            None => self.next_free_id(),
        };

        let color = color.unwrap_or_else(|| self.next_color());
        let def = ClassDefinition {
            class_id,
            name,
            color,
        };
        self.classes.push(def.clone());
        log::info!("Added class [{}] {}", def.class_id, def.name);
        Ok(def)
    }

    /// Remove a class and retire its id.
    pub fn remove(&mut self, class_id: u32) -> Result<ClassDefinition> {
        let index = self
            .position(class_id)
            .ok_or(LabelerError::UnknownClass(class_id))?;
        let def = self.classes.remove(index);
        self.retired.insert(class_id);
        log::info!("Removed class [{}] {}", def.class_id, def.name);
        Ok(def)
    }

    pub fn set_color(&mut self, class_id: u32, color: Rgb) -> Result<()> {
        let def = self.get_mut(class_id)?;
        def.color = color;
        Ok(())
    }

    /// Change a class's id. The old id is retired.
    pub fn set_id(&mut self, class_id: u32, new_id: u32) -> Result<()> {
        if class_id == new_id {
            return self.get(class_id).map(|_| ()).ok_or(LabelerError::UnknownClass(class_id));
        }
        if self.contains(new_id) {
            return Err(LabelerError::DuplicateId(new_id));
        }
        if self.retired.contains(&new_id) {
            return Err(LabelerError::RetiredId(new_id));
        }
        let def = self.get_mut(class_id)?;
        def.class_id = new_id;
        self.retired.insert(class_id);
        log::info!("Class id {} changed to {}", class_id, new_id);
        Ok(())
    }

    pub fn rename(&mut self, class_id: u32, name: &str) -> Result<()> {
        let name = Self::clean_name(name)?;
        if let Some(existing) = self.find_by_name(&name) {
            if existing.class_id != class_id {
                return Err(LabelerError::DuplicateName(name));
            }
        }
        let def = self.get_mut(class_id)?;
        def.name = name;
        Ok(())
    }

    pub fn get(&self, class_id: u32) -> Option<&ClassDefinition> {
        self.classes.iter().find(|c| c.class_id == class_id)
    }

    fn get_mut(&mut self, class_id: u32) -> Result<&mut ClassDefinition> {
        self.classes
            .iter_mut()
            .find(|c| c.class_id == class_id)
            .ok_or(LabelerError::UnknownClass(class_id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Display position of a class.
    pub fn position(&self, class_id: u32) -> Option<usize> {
        self.classes.iter().position(|c| c.class_id == class_id)
    }

    /// Class at a display position.
    pub fn at(&self, index: usize) -> Option<&ClassDefinition> {
        self.classes.get(index)
    }

    pub fn contains(&self, class_id: u32) -> bool {
        self.get(class_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDefinition> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Ids that left the registry and are not reused automatically.
    pub fn retired(&self) -> impl Iterator<Item = u32> + '_ {
        self.retired.iter().copied()
    }

    /// Lowest non-negative id that is neither used nor retired.
    pub fn next_free_id(&self) -> u32 {
        (0..)
            .find(|id| !self.contains(*id) && !self.retired.contains(id))
            .unwrap_or(u32::MAX)
    }

    fn next_color(&self) -> Rgb {
        PALETTE[self.classes.len() % PALETTE.len()]
    }

    fn clean_name(name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LabelerError::EmptyName);
        }
        Ok(name.to_string())
    }
}
