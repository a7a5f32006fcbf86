// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O for images, label files and class lists.

pub mod classes;
pub mod labels;
pub mod layout;
pub mod media;
