//! Floors: arc-band collision surfaces, separate from anything drawn.
//!
//! A floor is the region between two radii (`bottom..=top`) and two angles
//! (`left..=right`). The registry is an ordered list and lookup is
//! first-match-wins, so authored order decides which of two overlapping
//! floors supports an entity.
//!
//! Support lookup checks the radial band only unless the caller asks for the
//! angular band as well. Single-ring stages rely on the radial-only search;
//! stages with partial arcs should turn the angular check on.

use serde::Deserialize;
use std::f64::consts::TAU;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Floor {
    pub bottom: f64,
    pub top: f64,
    pub left: f64,
    pub right: f64,
    /// Stored for authoring; the support search does not consult it.
    #[serde(default)]
    pub pass_through: bool,
}

impl Floor {
    pub const fn new(bottom: f64, top: f64, left: f64, right: f64) -> Self {
        Self {
            bottom,
            top,
            left,
            right,
            pass_through: false,
        }
    }

    /// A floor spanning the whole circle.
    pub const fn ring(bottom: f64, top: f64) -> Self {
        Self::new(bottom, top, 0.0, TAU)
    }

    /// Does a body whose feet are at `radius`, extending `height` pixels
    /// outward, overlap this floor's radial band?
    pub fn supports_radius(&self, radius: f64, height: f64) -> bool {
        radius <= self.top && radius + height >= self.bottom
    }

    /// Angular containment for an unnormalized angle.
    pub fn contains_angle(&self, angle: f64) -> bool {
        let span = self.right - self.left;
        if span >= TAU {
            return true;
        }
        (angle - self.left).rem_euclid(TAU) <= span
    }
}

/// Index of a floor within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloorId(pub usize);

#[derive(Debug, Clone, Default)]
pub struct FloorRegistry {
    pub stage_id: String,
    floors: Vec<Floor>,
}

impl FloorRegistry {
    pub fn new(stage_id: impl Into<String>, floors: Vec<Floor>) -> Self {
        Self {
            stage_id: stage_id.into(),
            floors,
        }
    }

    pub fn get(&self, id: FloorId) -> Option<&Floor> {
        self.floors.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FloorId, &Floor)> {
        self.floors.iter().enumerate().map(|(i, f)| (FloorId(i), f))
    }

    pub fn len(&self) -> usize {
        self.floors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    /// First floor whose band supports a body at `(angle, radius)`.
    pub fn find_support(
        &self,
        angle: f64,
        radius: f64,
        height: f64,
        check_angle: bool,
    ) -> Option<FloorId> {
        self.iter()
            .find(|(_, f)| {
                f.supports_radius(radius, height) && (!check_angle || f.contains_angle(angle))
            })
            .map(|(id, _)| id)
    }
}

#[derive(Debug, Deserialize)]
struct StageFile {
    version: String,
    stage_id: String,
    floors: Vec<Floor>,
}

pub fn load_stage_from_path(path: &Path) -> Result<FloorRegistry, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let file: StageFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse stage JSON {}: {e}", path.display()))?;
    validate_stage_file(&file)?;
    Ok(FloorRegistry::new(file.stage_id, file.floors))
}

fn validate_stage_file(file: &StageFile) -> Result<(), String> {
    if file.version != "0.1" {
        return Err(format!(
            "Stage validation failed: unsupported version '{}'",
            file.version
        ));
    }
    if file.floors.is_empty() {
        log::warn!(
            "Stage '{}' has no floors. Every entity will fall through the centre.",
            file.stage_id
        );
    }
    for (i, floor) in file.floors.iter().enumerate() {
        let values = [floor.bottom, floor.top, floor.left, floor.right];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(format!(
                "Stage validation failed: floor {} has a non-finite bound",
                i
            ));
        }
        if floor.bottom < 0.0 || floor.bottom > floor.top {
            return Err(format!(
                "Stage validation failed: floor {} needs 0 <= bottom <= top",
                i
            ));
        }
        if floor.left > floor.right {
            return Err(format!(
                "Stage validation failed: floor {} needs left <= right",
                i
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "orb_stage_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn radial_band_includes_hitbox_reach() {
        let floor = Floor::new(90.0, 95.0, 0.0, 1.0);
        assert!(floor.supports_radius(95.0, 10.0));
        assert!(floor.supports_radius(80.0, 10.0));
        assert!(!floor.supports_radius(95.5, 10.0));
        assert!(!floor.supports_radius(79.9, 10.0));
    }

    #[test]
    fn angular_band_handles_unnormalized_angles() {
        let floor = Floor::new(0.0, 1.0, 1.0, 1.5);
        assert!(floor.contains_angle(1.2));
        assert!(floor.contains_angle(1.2 + 4.0 * PI));
        assert!(floor.contains_angle(1.2 - 2.0 * PI));
        assert!(!floor.contains_angle(2.0));
        assert!(Floor::ring(0.0, 1.0).contains_angle(-123.0));
    }

    #[test]
    fn first_match_wins() {
        let registry = FloorRegistry::new(
            "test",
            vec![Floor::new(100.0, 120.0, 0.0, 1.0), Floor::ring(110.0, 130.0)],
        );
        assert_eq!(registry.find_support(0.5, 115.0, 10.0, false), Some(FloorId(0)));
        assert_eq!(registry.find_support(3.0, 125.0, 10.0, false), Some(FloorId(1)));
        assert_eq!(registry.find_support(3.0, 200.0, 10.0, false), None);
    }

    #[test]
    fn radial_only_search_ignores_angle() {
        let registry = FloorRegistry::new("test", vec![Floor::new(100.0, 120.0, 1.0, 1.5)]);
        assert_eq!(registry.find_support(3.0, 110.0, 10.0, false), Some(FloorId(0)));
        assert_eq!(registry.find_support(3.0, 110.0, 10.0, true), None);
        assert_eq!(registry.find_support(1.25, 110.0, 10.0, true), Some(FloorId(0)));
    }

    #[test]
    fn load_stage_valid_file_parses() {
        let path = temp_file_path("valid");
        fs::write(
            &path,
            r#"{
              "version": "0.1",
              "stage_id": "arena",
              "floors": [
                { "bottom": 100, "top": 120, "left": 0, "right": 6.283185307179586 },
                { "bottom": 180, "top": 200, "left": 1, "right": 1.5, "pass_through": true }
              ]
            }"#,
        )
        .expect("write temp file");

        let registry = load_stage_from_path(&path).expect("valid stage should load");
        assert_eq!(registry.stage_id, "arena");
        assert_eq!(registry.len(), 2);
        assert!(registry.get(FloorId(1)).unwrap().pass_through);
        assert!(!registry.get(FloorId(0)).unwrap().pass_through);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_stage_rejects_inverted_band() {
        let path = temp_file_path("inverted");
        fs::write(
            &path,
            r#"{ "version": "0.1", "stage_id": "bad",
                 "floors": [{ "bottom": 120, "top": 100, "left": 0, "right": 1 }] }"#,
        )
        .expect("write temp file");
        let err = load_stage_from_path(&path).expect_err("inverted band should fail");
        assert!(err.contains("bottom <= top"));
        let _ = fs::remove_file(path);
    }
}
