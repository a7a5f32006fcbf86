// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for label files, the class registry and session I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the labeler core.
#[derive(Error, Debug)]
pub enum LabelerError {
    /// A label line is not `<int> <float> <float> <float> <float>`
    #[error("{}:{line}: malformed label line: {message}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A normalized coordinate lies outside [0, 1]
    #[error("{}:{line}: coordinate {value} is outside [0, 1]", path.display())]
    Range {
        path: PathBuf,
        line: usize,
        value: f64,
    },

    /// A label references a class id the registry does not know
    #[error("{}:{line}: unknown class id {class_id}", path.display())]
    Referential {
        path: PathBuf,
        line: usize,
        class_id: u32,
    },

    /// Class id already taken by another definition
    #[error("class id {0} is already in use")]
    DuplicateId(u32),

    /// Class id belonged to a removed class and may still appear in label files
    #[error("class id {0} belonged to a removed class and cannot be reused")]
    RetiredId(u32),

    /// Class name already taken by another definition
    #[error("class name '{0}' is already in use")]
    DuplicateName(String),

    /// No class with this id
    #[error("no class with id {0}")]
    UnknownClass(u32),

    #[error("class name must not be empty")]
    EmptyName,

    /// Color string is not `#RRGGBB`
    #[error("invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    /// Box index does not exist in the active image
    #[error("no box at index {0}")]
    NoSuchBox(usize),

    /// No image is active
    #[error("no image is open")]
    NoActiveImage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl LabelerError {
    /// Create a format error for a label line.
    pub fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// True for errors that make a label file unparsable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::Range { .. })
    }
}

pub type Result<T> = std::result::Result<T, LabelerError>;
