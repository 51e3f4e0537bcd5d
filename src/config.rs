use crate::gizmo::handles::{DEFAULT_MAX_OWNER_DEPTH, MAX_OWNER_DEPTH_LIMIT};
use crate::gizmo::{GizmoSpace, RotationAxisMap, SnapSettings};
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateConfig {
    #[serde(default = "TranslateConfig::default_base_sensitivity")]
    pub base_sensitivity: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotateConfig {
    #[serde(default = "RotateConfig::default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default)]
    pub axis_map: RotationAxisMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScaleConfig {
    #[serde(default = "ScaleConfig::default_base_sensitivity")]
    pub base_sensitivity: f32,
    #[serde(default = "ScaleConfig::default_floor")]
    pub floor: f32,
}

/// Camera-distance falloff shared by translate and scale sensitivity.
#[derive(Debug, Clone, Deserialize)]
pub struct DistanceScaling {
    #[serde(default = "DistanceScaling::default_reference_distance")]
    pub reference_distance: f32,
    #[serde(default = "DistanceScaling::default_min_multiplier")]
    pub min_multiplier: f32,
    #[serde(default = "DistanceScaling::default_max_multiplier")]
    pub max_multiplier: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GizmoConfig {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub rotate: RotateConfig,
    #[serde(default)]
    pub scale: ScaleConfig,
    #[serde(default)]
    pub distance: DistanceScaling,
    #[serde(default)]
    pub snap: SnapSettings,
    #[serde(default = "GizmoConfig::default_invert_vertical")]
    pub invert_vertical: bool,
    #[serde(default)]
    pub space: GizmoSpace,
    /// Rig size per unit of camera distance, keeping handles roughly constant on screen.
    #[serde(default = "GizmoConfig::default_handle_screen_scale")]
    pub handle_screen_scale: f32,
    #[serde(default = "GizmoConfig::default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "GizmoConfig::default_max_owner_depth")]
    pub max_owner_depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GizmoConfigOverrides {
    pub snap_enabled: Option<bool>,
    pub snap_size: Option<f32>,
    pub history_capacity: Option<usize>,
}

impl TranslateConfig {
    const fn default_base_sensitivity() -> f32 {
        0.015
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self { base_sensitivity: Self::default_base_sensitivity() }
    }
}

impl RotateConfig {
    const fn default_sensitivity() -> f32 {
        0.015
    }
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self { sensitivity: Self::default_sensitivity(), axis_map: RotationAxisMap::default() }
    }
}

impl ScaleConfig {
    const fn default_base_sensitivity() -> f32 {
        0.01
    }

    const fn default_floor() -> f32 {
        0.01
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { base_sensitivity: Self::default_base_sensitivity(), floor: Self::default_floor() }
    }
}

impl DistanceScaling {
    const fn default_reference_distance() -> f32 {
        10.0
    }

    const fn default_min_multiplier() -> f32 {
        0.5
    }

    const fn default_max_multiplier() -> f32 {
        2.0
    }
}

impl Default for DistanceScaling {
    fn default() -> Self {
        Self {
            reference_distance: Self::default_reference_distance(),
            min_multiplier: Self::default_min_multiplier(),
            max_multiplier: Self::default_max_multiplier(),
        }
    }
}

impl GizmoConfig {
    const fn default_invert_vertical() -> bool {
        true
    }

    const fn default_handle_screen_scale() -> f32 {
        0.15
    }

    const fn default_history_capacity() -> usize {
        100
    }

    const fn default_max_owner_depth() -> usize {
        DEFAULT_MAX_OWNER_DEPTH
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read gizmo config {}", path.display()))?;
        let cfg: GizmoConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse gizmo config {}", path.display()))?;
        cfg.validate().with_context(|| format!("Invalid gizmo config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = ?err, "gizmo config load failed, falling back to defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.rotate.axis_map.is_permutation(), "rotate.axis_map must map each handle to a distinct axis");
        ensure!(self.scale.floor > 0.0, "scale.floor must be positive (got {})", self.scale.floor);
        ensure!(self.snap.size > 0.0, "snap.size must be positive (got {})", self.snap.size);
        ensure!(
            self.distance.min_multiplier > 0.0 && self.distance.min_multiplier <= self.distance.max_multiplier,
            "distance multipliers must satisfy 0 < min <= max (got {}..{})",
            self.distance.min_multiplier,
            self.distance.max_multiplier
        );
        ensure!(self.history_capacity > 0, "history_capacity must be at least 1");
        ensure!(
            self.max_owner_depth <= MAX_OWNER_DEPTH_LIMIT,
            "max_owner_depth must be at most {MAX_OWNER_DEPTH_LIMIT} (got {})",
            self.max_owner_depth
        );
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &GizmoConfigOverrides) {
        if let Some(enabled) = overrides.snap_enabled {
            self.snap.enabled = enabled;
        }
        if let Some(size) = overrides.snap_size {
            self.snap.size = size;
        }
        if let Some(capacity) = overrides.history_capacity {
            self.history_capacity = capacity;
        }
    }
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            translate: TranslateConfig::default(),
            rotate: RotateConfig::default(),
            scale: ScaleConfig::default(),
            distance: DistanceScaling::default(),
            snap: SnapSettings::default(),
            invert_vertical: Self::default_invert_vertical(),
            space: GizmoSpace::default(),
            handle_screen_scale: Self::default_handle_screen_scale(),
            history_capacity: Self::default_history_capacity(),
            max_owner_depth: Self::default_max_owner_depth(),
        }
    }
}

impl GizmoConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.snap_enabled.is_none() && self.snap_size.is_none() && self.history_capacity.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.snap_enabled.is_some() {
            fields.push("snap.enabled");
        }
        if self.snap_size.is_some() {
            fields.push("snap.size");
        }
        if self.history_capacity.is_some() {
            fields.push("history_capacity");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gizmo::GizmoAxis;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: GizmoConfig = serde_json::from_str("{}").expect("parse empty config");
        assert_eq!(cfg.translate.base_sensitivity, 0.015);
        assert_eq!(cfg.rotate.axis_map, RotationAxisMap::identity());
        assert_eq!(cfg.history_capacity, 100);
        assert!(!cfg.snap.enabled);
        cfg.validate().expect("defaults validate");
    }

    #[test]
    fn duplicate_axis_map_is_rejected() {
        let cfg: GizmoConfig =
            serde_json::from_str(r#"{ "rotate": { "axis_map": { "x": "x", "y": "x", "z": "z" } } }"#)
                .expect("parse config");
        assert_eq!(cfg.rotate.axis_map.y, GizmoAxis::X);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn owner_depth_is_bounded() {
        let deep: GizmoConfig = serde_json::from_str(r#"{ "max_owner_depth": 100000 }"#).expect("parse config");
        let err = deep.validate().expect_err("unbounded depth rejected");
        assert!(format!("{err}").contains("max_owner_depth"), "{err}");

        let cfg = GizmoConfig { max_owner_depth: MAX_OWNER_DEPTH_LIMIT, ..GizmoConfig::default() };
        cfg.validate().expect("limit itself is allowed");
    }

    #[test]
    fn overrides_apply_in_place() {
        let mut cfg = GizmoConfig::default();
        let overrides = GizmoConfigOverrides { snap_enabled: Some(true), snap_size: Some(0.25), history_capacity: None };
        cfg.apply_overrides(&overrides);
        assert!(cfg.snap.enabled);
        assert_eq!(cfg.snap.size, 0.25);
        assert_eq!(overrides.applied_fields(), vec!["snap.enabled", "snap.size"]);
    }
}
