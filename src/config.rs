// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Labeler configuration.
//!
//! Settings are read from a JSON file; every field is optional and falls back
//! to its default, so an empty object or a missing file is a valid config.

use crate::error::Result;
use crate::models::classes::{Rgb, PALETTE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "yolo-labeler.json";

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// A class created when a directory has no class files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultClass {
    pub id: u32,
    pub name: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelerConfig {
    pub log_level: LogLevel,

    /// Handle hit radius in canvas pixels
    pub handle_radius: f64,

    /// Smallest box side in image pixels; shorter drags are treated as clicks
    pub min_box_size: f64,

    /// Decimals written per coordinate (at least 6)
    pub label_precision: usize,

    /// Save the active image after every committed edit
    pub auto_save: bool,

    /// Classes used for directories without class files
    pub default_classes: Vec<DefaultClass>,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            handle_radius: 8.0,
            min_box_size: 2.0,
            label_precision: 6,
            auto_save: false,
            default_classes: ["person", "car", "bicycle"]
                .iter()
                .enumerate()
                .map(|(i, name)| DefaultClass {
                    id: i as u32,
                    name: name.to_string(),
                    color: PALETTE[i],
                })
                .collect(),
        }
    }
}

impl LabelerConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
