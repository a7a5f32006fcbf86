// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! YOLO Labeler
//!
//! A desktop tool for drawing bounding boxes on a directory of images and
//! saving them as YOLO label files.

mod app;
mod config;
mod editor;
mod error;
mod io;
mod models;
mod render;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::LabelerApp;
use config::{LabelerConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Configuration path from the first argument, else the working directory
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = LabelerConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to read config {}", config_path.display()))?;

    // RUST_LOG overrides the configured level
    let level = config.log_level.to_level_filter().to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::debug!("Configuration: {:?}", config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("YOLO Labeler"),
        ..Default::default()
    };

    eframe::run_native(
        "YOLO Labeler",
        options,
        Box::new(move |cc| Ok(Box::new(LabelerApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
