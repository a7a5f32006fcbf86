// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! YOLO label files.
//!
//! One line per box: `<class_id> <x_center> <y_center> <width> <height>`,
//! all coordinates normalized. Reading never clamps: a value outside [0, 1]
//! is reported so on-disk corruption stays visible.

use crate::error::{LabelerError, Result};
use crate::models::annotation::BoundingBox;
use crate::util::geometry::NormalizedRect;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

/// Fewest decimals written per coordinate.
pub const MIN_PRECISION: usize = 6;

/// Boxes read from a label file together with the lines that were rejected.
#[derive(Debug, Default)]
pub struct LabelFile {
    pub boxes: Vec<BoundingBox>,
    /// 1-based source line of each entry in `boxes`
    pub lines: Vec<usize>,
    pub issues: Vec<LabelerError>,
}

impl LabelFile {
    /// True if any line was malformed or out of range.
    pub fn is_unparsable(&self) -> bool {
        self.issues.iter().any(LabelerError::is_corruption)
    }

    /// Report boxes whose class id is not known. The boxes are kept.
    pub fn flag_unknown_classes(&mut self, path: &Path, is_known: impl Fn(u32) -> bool) {
        for (b, &line) in self.boxes.iter().zip(&self.lines) {
            if !is_known(b.class_id) {
                let e = LabelerError::Referential {
                    path: path.to_path_buf(),
                    line,
                    class_id: b.class_id,
                };
                log::warn!("{}", e);
                self.issues.push(e);
            }
        }
    }
}

/// Parse label file content. Blank lines are ignored.
pub fn parse_labels(content: &str, path: &Path) -> LabelFile {
    let mut file = LabelFile::default();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line, path, idx + 1) {
            Ok(b) => {
                file.boxes.push(b);
                file.lines.push(idx + 1);
            }
            Err(e) => {
                log::warn!("{}", e);
                file.issues.push(e);
            }
        }
    }
    file
}

fn parse_line(line: &str, path: &Path, line_num: usize) -> Result<BoundingBox> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(LabelerError::format(
            path,
            line_num,
            format!("expected 5 fields, found {}", fields.len()),
        ));
    }

    let class_id: u32 = fields[0].parse().map_err(|_| {
        LabelerError::format(path, line_num, format!("invalid class id '{}'", fields[0]))
    })?;

    let mut coords = [0.0f64; 4];
    for (slot, field) in coords.iter_mut().zip(&fields[1..]) {
        let v: f64 = field.parse().map_err(|_| {
            LabelerError::format(path, line_num, format!("invalid number '{}'", field))
        })?;
        if !v.is_finite() {
            return Err(LabelerError::format(
                path,
                line_num,
                format!("non-finite number '{}'", field),
            ));
        }
        *slot = v;
    }

    if let Some(&value) = coords.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        return Err(LabelerError::Range {
            path: path.to_path_buf(),
            line: line_num,
            value,
        });
    }

    let [xc, yc, w, h] = coords;
    Ok(BoundingBox::new(class_id, NormalizedRect::new(xc, yc, w, h)))
}

/// Read a label file. A missing file reads as empty.
pub fn read_labels(path: &Path) -> Result<LabelFile> {
    if !path.exists() {
        return Ok(LabelFile::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_labels(&content, path))
}

/// Render boxes as label file content.
pub fn format_labels(boxes: &[BoundingBox], precision: usize) -> String {
    let p = precision.max(MIN_PRECISION);
    let mut out = String::new();
    for b in boxes {
        let _ = writeln!(
            out,
            "{} {:.p$} {:.p$} {:.p$} {:.p$}",
            b.class_id, b.x_center, b.y_center, b.width, b.height
        );
    }
    out
}

/// Write boxes to a label file.
///
/// Content goes to a temporary sibling which then replaces the target. An
/// empty box list removes the label file instead.
pub fn write_labels(path: &Path, boxes: &[BoundingBox], precision: usize) -> Result<()> {
    if boxes.is_empty() {
        if path.exists() {
            std::fs::remove_file(path)?;
            log::info!("Removed empty label file {}", path.display());
        }
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("txt.tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(format_labels(boxes, precision).as_bytes())?;
        file.sync_all()?;
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    log::debug!("Wrote {} boxes to {}", boxes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_line_is_rejected_others_kept() {
        let content = "0 1.5 0.5 0.2 0.2\n1 0.5 0.5 0.2 0.2\n";
        let file = parse_labels(content, Path::new("a.txt"));

        assert_eq!(file.boxes.len(), 1);
        assert_eq!(file.boxes[0].class_id, 1);
        assert!(matches!(
            file.issues[0],
            LabelerError::Range { line: 1, value, .. } if value == 1.5
        ));
        assert!(file.is_unparsable());
    }

    #[test]
    fn test_malformed_lines() {
        let content = "0 0.1 0.2\nx 0.1 0.1 0.1 0.1\n-1 0.1 0.1 0.1 0.1\n0 0.1 abc 0.1 0.1\n0 0.1 0.1 0.1 0.1 0.9\n\n2 0.5 0.5 1 1\n";
        let file = parse_labels(content, Path::new("a.txt"));

        assert_eq!(file.issues.len(), 5);
        assert!(file
            .issues
            .iter()
            .all(|e| matches!(e, LabelerError::Format { .. })));
        assert_eq!(file.boxes.len(), 1);
        assert_eq!(file.boxes[0].class_id, 2);
    }

    #[test]
    fn test_unknown_class_is_flagged_but_kept() {
        let path = Path::new("a.txt");
        let mut file = parse_labels("0 0.5 0.5 0.1 0.1\n\n2 0.5 0.5 0.1 0.1\n", path);
        file.flag_unknown_classes(path, |id| id != 2);

        assert_eq!(file.boxes.len(), 2);
        assert!(matches!(
            file.issues[..],
            [LabelerError::Referential { line: 3, class_id: 2, .. }]
        ));
        assert!(!file.is_unparsable());
    }

    #[test]
    fn test_format_uses_fixed_precision() {
        let b = BoundingBox::new(7, NormalizedRect::new(0.25, 1.0 / 3.0, 0.5, 0.125));
        assert_eq!(format_labels(&[b], 2), "7 0.250000 0.333333 0.500000 0.125000\n");
    }

    #[test]
    fn test_write_then_read_preserves_order_and_values() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("labels").join("img.txt");
        let boxes = vec![
            BoundingBox::new(4, NormalizedRect::new(0.1, 0.2, 0.05, 0.1)),
            BoundingBox::new(0, NormalizedRect::new(0.9, 0.8, 0.2, 0.3)),
            BoundingBox::new(12, NormalizedRect::new(0.5, 0.5, 1.0, 1.0)),
        ];

        write_labels(&path, &boxes, 6).expect("write labels");
        let file = read_labels(&path).expect("read labels");

        assert!(file.issues.is_empty());
        assert_eq!(file.boxes.len(), boxes.len());
        for (a, b) in file.boxes.iter().zip(&boxes) {
            assert_eq!(a.class_id, b.class_id);
            assert!((a.x_center - b.x_center).abs() < 1e-6);
            assert!((a.height - b.height).abs() < 1e-6);
        }
        assert!(!path.with_extension("txt.tmp").exists());
    }

    #[test]
    fn test_empty_write_removes_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("img.txt");
        std::fs::write(&path, "0 0.5 0.5 0.1 0.1\n").expect("seed label file");

        write_labels(&path, &[], 6).expect("write empty");
        assert!(!path.exists());
        assert!(read_labels(&path).expect("read missing").boxes.is_empty());
    }
}
