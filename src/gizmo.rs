use glam::Vec3;
use serde::{Deserialize, Serialize};

pub mod drag;
pub mod handles;
pub mod math;

pub use drag::{DragCoordinator, DragOutcome, DragPhase, GizmoVisual, Selection};
pub use handles::{resolve_handle, GizmoRig, HandleHit, HandleNode, HandleShape, HandleTag, NodeId};
pub use math::{compute_transform, ManipulationContext, TransformDelta};

pub const DEFAULT_TRANSLATE_SNAP_STEP: f32 = 0.5;
pub const DEFAULT_ROTATE_SNAP_STEP_DEGREES: f32 = 15.0;
pub const DEFAULT_SCALE_SNAP_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl GizmoMode {
    pub const ALL: [GizmoMode; 3] = [GizmoMode::Translate, GizmoMode::Rotate, GizmoMode::Scale];

    pub fn label(self) -> &'static str {
        match self {
            GizmoMode::Translate => "Move",
            GizmoMode::Rotate => "Rotate",
            GizmoMode::Scale => "Scale",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GizmoAxis {
    X,
    Y,
    Z,
}

impl GizmoAxis {
    pub const ALL: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

    pub fn vector(self) -> Vec3 {
        match self {
            GizmoAxis::X => Vec3::X,
            GizmoAxis::Y => Vec3::Y,
            GizmoAxis::Z => Vec3::Z,
        }
    }

    pub fn index(self) -> usize {
        match self {
            GizmoAxis::X => 0,
            GizmoAxis::Y => 1,
            GizmoAxis::Z => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GizmoAxis::X => "X axis",
            GizmoAxis::Y => "Y axis",
            GizmoAxis::Z => "Z axis",
        }
    }
}

/// What a drag on a handle manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleTarget {
    Axis(GizmoAxis),
    /// All three components at once; only meaningful for scale.
    Uniform,
}

impl HandleTarget {
    pub fn axis(self) -> Option<GizmoAxis> {
        match self {
            HandleTarget::Axis(axis) => Some(axis),
            HandleTarget::Uniform => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HandleTarget::Axis(axis) => axis.label(),
            HandleTarget::Uniform => "uniform",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Arrow,
    Ring,
    AxisBox,
    CenterBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GizmoSpace {
    #[default]
    World,
    /// Translate handles follow the primary object's orientation.
    Local,
}

/// Maps the handle a rotation drag started on to the world axis it spins around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationAxisMap {
    pub x: GizmoAxis,
    pub y: GizmoAxis,
    pub z: GizmoAxis,
}

impl Default for RotationAxisMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl RotationAxisMap {
    pub const fn identity() -> Self {
        Self { x: GizmoAxis::X, y: GizmoAxis::Y, z: GizmoAxis::Z }
    }

    /// Layout for rigs whose Y ring is drawn where a Z-up renderer expects the Z ring.
    pub const fn swapped_yz() -> Self {
        Self { x: GizmoAxis::X, y: GizmoAxis::Z, z: GizmoAxis::Y }
    }

    pub fn world_axis(&self, handle: GizmoAxis) -> Vec3 {
        match handle {
            GizmoAxis::X => self.x.vector(),
            GizmoAxis::Y => self.y.vector(),
            GizmoAxis::Z => self.z.vector(),
        }
    }

    pub fn is_permutation(&self) -> bool {
        self.x != self.y && self.y != self.z && self.x != self.z
    }
}

/// Snap configuration supplied by the host toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "SnapSettings::default_size")]
    pub size: f32,
    #[serde(default = "SnapSettings::default_rotate_step_degrees")]
    pub rotate_step_degrees: f32,
    #[serde(default = "SnapSettings::default_scale_step")]
    pub scale_step: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            size: Self::default_size(),
            rotate_step_degrees: Self::default_rotate_step_degrees(),
            scale_step: Self::default_scale_step(),
        }
    }
}

impl SnapSettings {
    const fn default_size() -> f32 {
        DEFAULT_TRANSLATE_SNAP_STEP
    }

    const fn default_rotate_step_degrees() -> f32 {
        DEFAULT_ROTATE_SNAP_STEP_DEGREES
    }

    const fn default_scale_step() -> f32 {
        DEFAULT_SCALE_SNAP_STEP
    }

    pub fn grid(size: f32) -> Self {
        Self { enabled: true, size, ..Self::default() }
    }
}

/// Rounds to the nearest multiple of `step`; a non-positive step leaves the value alone.
pub fn snap_to_step(value: f32, step: f32) -> f32 {
    if step > f32::EPSILON && step.is_finite() {
        (value / step).round() * step
    } else {
        value
    }
}

pub fn snap_vec3(value: Vec3, step: f32) -> Vec3 {
    Vec3::new(snap_to_step(value.x, step), snap_to_step(value.y, step), snap_to_step(value.z, step))
}
