//! Pure manipulation math. Every result is computed from the object's start snapshot and the
//! cumulative pointer displacement since pointer-down, never from the live transform, so repeated
//! moves to the same pointer position always land on the same transform.

use super::{snap_to_step, snap_vec3, GizmoMode, HandleTarget, SnapSettings};
use crate::camera3d::CameraContext;
use crate::config::{DistanceScaling, GizmoConfig};
use crate::scene::Transform3D;
use glam::{Quat, Vec2, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct ManipulationContext<'a> {
    pub config: &'a GizmoConfig,
    pub camera: CameraContext,
    /// Orientation the translate handles are drawn in (identity for world space).
    pub gizmo_orientation: Quat,
    /// World position used for the distance-based sensitivity multiplier, usually the primary
    /// object's start position.
    pub focus: Vec3,
    pub snap: SnapSettings,
}

impl<'a> ManipulationContext<'a> {
    pub fn new(config: &'a GizmoConfig, camera: CameraContext, focus: Vec3) -> Self {
        Self { config, camera, gizmo_orientation: Quat::IDENTITY, focus, snap: config.snap }
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.gizmo_orientation = orientation;
        self
    }

    pub fn with_snap(mut self, snap: SnapSettings) -> Self {
        self.snap = snap;
        self
    }

    pub fn distance_multiplier(&self) -> f32 {
        distance_multiplier(&self.config.distance, self.camera.eye, self.focus)
    }
}

/// Collapses a 2D pointer displacement into one signed drag amount. Screen Y grows downward, so
/// the vertical component is negated when `invert_vertical` is set: right and up both push the
/// value positive.
pub fn drag_scalar(delta: Vec2, invert_vertical: bool) -> f32 {
    if invert_vertical {
        delta.x - delta.y
    } else {
        delta.x + delta.y
    }
}

pub fn distance_multiplier(scaling: &DistanceScaling, eye: Vec3, focus: Vec3) -> f32 {
    if !(scaling.reference_distance > f32::EPSILON) {
        return 1.0;
    }
    let ratio = eye.distance(focus) / scaling.reference_distance;
    if !ratio.is_finite() {
        return scaling.max_multiplier;
    }
    ratio.clamp(scaling.min_multiplier, scaling.max_multiplier)
}

/// New transform for one object after dragging `target` in `mode` by `pointer_delta` pixels.
///
/// A zero drag amount returns `start` untouched, snapping included.
pub fn compute_transform(
    mode: GizmoMode,
    target: HandleTarget,
    start: &Transform3D,
    pointer_delta: Vec2,
    ctx: &ManipulationContext<'_>,
) -> Transform3D {
    let amount = drag_scalar(pointer_delta, ctx.config.invert_vertical);
    if amount == 0.0 || !amount.is_finite() {
        return *start;
    }
    let result = match mode {
        GizmoMode::Translate => translate(target, start, amount, ctx),
        GizmoMode::Rotate => rotate(target, start, amount, ctx),
        GizmoMode::Scale => scale(target, start, amount, ctx),
    };
    if is_finite(&result) {
        result
    } else {
        tracing::warn!(?mode, "non-finite manipulation result discarded");
        *start
    }
}

fn translate(target: HandleTarget, start: &Transform3D, amount: f32, ctx: &ManipulationContext<'_>) -> Transform3D {
    let Some(axis) = target.axis() else {
        return *start;
    };
    let direction = (ctx.gizmo_orientation * axis.vector()).normalize_or_zero();
    let distance = amount * ctx.config.translate.base_sensitivity * ctx.distance_multiplier();
    let mut translation = start.translation + direction * distance;
    if ctx.snap.enabled {
        translation = snap_vec3(translation, ctx.snap.size);
    }
    Transform3D { translation, ..*start }
}

fn rotate(target: HandleTarget, start: &Transform3D, amount: f32, ctx: &ManipulationContext<'_>) -> Transform3D {
    let Some(axis) = target.axis() else {
        return *start;
    };
    let mut angle = amount * ctx.config.rotate.sensitivity;
    if ctx.snap.enabled {
        angle = snap_to_step(angle, ctx.snap.rotate_step_degrees.to_radians());
    }
    if angle == 0.0 {
        return *start;
    }
    let world_axis = ctx.config.rotate.axis_map.world_axis(axis);
    let rotation = (Quat::from_axis_angle(world_axis, angle) * start.rotation).normalize();
    Transform3D { rotation, ..*start }
}

fn scale(target: HandleTarget, start: &Transform3D, amount: f32, ctx: &ManipulationContext<'_>) -> Transform3D {
    let mut factor = 1.0 + amount * ctx.config.scale.base_sensitivity * ctx.distance_multiplier();
    if ctx.snap.enabled {
        factor = snap_to_step(factor, ctx.snap.scale_step);
    }
    let mut scale = start.scale;
    match target {
        HandleTarget::Axis(axis) => scale[axis.index()] *= factor,
        HandleTarget::Uniform => scale *= factor,
    }
    Transform3D { scale, ..*start }.with_scale_floor(ctx.config.scale.floor)
}

fn is_finite(transform: &Transform3D) -> bool {
    transform.translation.is_finite() && transform.rotation.is_finite() && transform.scale.is_finite()
}

/// Relative change between two snapshots of the same object, reapplied to the rest of a
/// multi-selection so relative offsets survive the drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDelta {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale_ratio: Vec3,
}

impl Default for TransformDelta {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale_ratio: Vec3::ONE }
    }
}

impl TransformDelta {
    /// Channels that did not change produce an exact identity delta.
    pub fn between(start: &Transform3D, end: &Transform3D) -> Self {
        let translation = end.translation - start.translation;
        let rotation = if end.rotation == start.rotation {
            Quat::IDENTITY
        } else {
            (end.rotation * start.rotation.inverse()).normalize()
        };
        let mut scale_ratio = Vec3::ONE;
        for i in 0..3 {
            if end.scale[i] != start.scale[i] && start.scale[i].abs() > f32::EPSILON {
                scale_ratio[i] = end.scale[i] / start.scale[i];
            }
        }
        Self { translation, rotation, scale_ratio }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, start: &Transform3D, scale_floor: f32) -> Transform3D {
        let mut result = *start;
        if self.translation != Vec3::ZERO {
            result.translation = start.translation + self.translation;
        }
        if self.rotation != Quat::IDENTITY {
            result.rotation = (self.rotation * start.rotation).normalize();
        }
        if self.scale_ratio != Vec3::ONE {
            result.scale = (start.scale * self.scale_ratio).max(Vec3::splat(scale_floor));
        }
        result
    }
}
