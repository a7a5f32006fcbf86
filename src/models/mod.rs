// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data model: boxes, classes, per-image storage and the session.

pub mod annotation;
pub mod classes;
pub mod session;
pub mod store;
