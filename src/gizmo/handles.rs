//! Gizmo handle geometry and the axis resolver.
//!
//! Handles live in an arena with explicit parent links. Only some nodes carry a [`HandleTag`];
//! a pickable child (an arrow tip, say) finds its axis by walking up its parents, bounded by
//! `max_depth`.

use super::{GizmoAxis, GizmoMode, HandleKind, HandleTarget};
use crate::picking::{ray_aabb_intersection, ray_ring_intersection, ray_sphere_intersection, Ray};
use glam::{Quat, Vec3};

pub const DEFAULT_MAX_OWNER_DEPTH: usize = 10;
/// Hard ceiling on any owner walk, whatever depth the caller asks for.
pub const MAX_OWNER_DEPTH_LIMIT: usize = 64;

const ARROW_SHAFT_START: f32 = 0.15;
const ARROW_SHAFT_END: f32 = 0.8;
const ARROW_SHAFT_HALF: f32 = 0.04;
const ARROW_TIP_CENTER: f32 = 0.9;
const ARROW_TIP_RADIUS: f32 = 0.1;
const RING_INNER_RADIUS: f32 = 0.9;
const RING_OUTER_RADIUS: f32 = 1.05;
const SCALE_BOX_CENTER: f32 = 0.75;
const SCALE_BOX_HALF: f32 = 0.07;
const SCALE_CENTER_HALF: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Pick geometry in rig-local units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleShape {
    Sphere { center: Vec3, radius: f32 },
    Box { min: Vec3, max: Vec3 },
    Ring { normal: Vec3, inner_radius: f32, outer_radius: f32 },
}

impl HandleShape {
    fn hit(&self, ray: &Ray) -> Option<f32> {
        match *self {
            HandleShape::Sphere { center, radius } => {
                ray_sphere_intersection(ray.origin, ray.direction, center, radius)
            }
            HandleShape::Box { min, max } => {
                ray_aabb_intersection(ray.origin, ray.direction, min, max).map(|(t, _)| t)
            }
            HandleShape::Ring { normal, inner_radius, outer_radius } => {
                ray_ring_intersection(ray.origin, ray.direction, Vec3::ZERO, normal, inner_radius, outer_radius)
            }
        }
    }

    /// A point inside the shape, used to aim at a handle.
    fn anchor(&self) -> Vec3 {
        match *self {
            HandleShape::Sphere { center, .. } => center,
            HandleShape::Box { min, max } => (min + max) * 0.5,
            HandleShape::Ring { normal, inner_radius, outer_radius } => {
                // Off the other two rings' planes so the point is unambiguous.
                let (a, b) = normal.normalize_or_zero().any_orthonormal_pair();
                (a + b).normalize_or_zero() * (inner_radius + outer_radius) * 0.5
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleTag {
    pub target: HandleTarget,
    pub kind: HandleKind,
}

#[derive(Debug, Clone)]
pub struct HandleNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub shape: Option<HandleShape>,
    pub tag: Option<HandleTag>,
}

impl HandleNode {
    pub fn group(name: impl Into<String>, tag: Option<HandleTag>) -> Self {
        Self { name: name.into(), parent: None, shape: None, tag }
    }

    pub fn part(name: impl Into<String>, parent: NodeId, shape: HandleShape) -> Self {
        Self { name: name.into(), parent: Some(parent), shape: Some(shape), tag: None }
    }

    pub fn with_tag(mut self, tag: HandleTag) -> Self {
        self.tag = Some(tag);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleHit {
    pub target: HandleTarget,
    pub kind: HandleKind,
    pub node: NodeId,
    /// World-space distance along the pick ray.
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct GizmoRig {
    nodes: Vec<HandleNode>,
    modes: Vec<GizmoMode>,
    pub origin: Vec3,
    pub orientation: Quat,
    pub size: f32,
}

impl Default for GizmoRig {
    fn default() -> Self {
        Self::new()
    }
}

impl GizmoRig {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), modes: Vec::new(), origin: Vec3::ZERO, orientation: Quat::IDENTITY, size: 1.0 }
    }

    pub fn add_node(&mut self, mode: GizmoMode, node: HandleNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.modes.push(mode);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&HandleNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pickable nodes belonging to `mode`.
    pub fn pickable(&self, mode: GizmoMode) -> impl Iterator<Item = (NodeId, &HandleNode)> + '_ {
        self.nodes
            .iter()
            .zip(self.modes.iter())
            .enumerate()
            .filter(move |(_, (node, node_mode))| **node_mode == mode && node.shape.is_some())
            .map(|(index, (node, _))| (NodeId(index), node))
    }

    pub fn place(&mut self, origin: Vec3, orientation: Quat, size: f32) {
        self.origin = origin;
        self.orientation = orientation;
        self.size = size;
    }

    /// Finds the nearest tag on `id` or its owners, looking at no more than `max_depth` parents.
    pub fn lookup_tag(&self, id: NodeId, max_depth: usize) -> Option<HandleTag> {
        let mut current = self.node(id)?;
        if let Some(tag) = current.tag {
            return Some(tag);
        }
        for _ in 0..max_depth.min(MAX_OWNER_DEPTH_LIMIT) {
            current = self.node(current.parent?)?;
            if let Some(tag) = current.tag {
                return Some(tag);
            }
        }
        None
    }

    /// World-space point on the first pickable node of `mode` that resolves to `target`.
    pub fn handle_point(&self, mode: GizmoMode, target: HandleTarget, max_depth: usize) -> Option<Vec3> {
        let (_, node) = self
            .pickable(mode)
            .find(|(id, _)| self.lookup_tag(*id, max_depth).is_some_and(|tag| tag.target == target))?;
        let local = node.shape?.anchor();
        Some(self.origin + self.orientation * (local * self.size))
    }

    /// Arrows, rings, per-axis scale boxes and a uniform scale box, one unit in radius.
    pub fn standard() -> Self {
        let mut rig = GizmoRig::new();
        for axis in GizmoAxis::ALL {
            let dir = axis.vector();
            let group = rig.add_node(
                GizmoMode::Translate,
                HandleNode::group(
                    format!("translate_{}", axis_suffix(axis)),
                    Some(HandleTag { target: HandleTarget::Axis(axis), kind: HandleKind::Arrow }),
                ),
            );
            let shaft = rig.add_node(
                GizmoMode::Translate,
                HandleNode::part(
                    format!("translate_{}_shaft", axis_suffix(axis)),
                    group,
                    axis_box(axis, ARROW_SHAFT_START, ARROW_SHAFT_END, ARROW_SHAFT_HALF),
                ),
            );
            rig.add_node(
                GizmoMode::Translate,
                HandleNode::part(
                    format!("translate_{}_tip", axis_suffix(axis)),
                    shaft,
                    HandleShape::Sphere { center: dir * ARROW_TIP_CENTER, radius: ARROW_TIP_RADIUS },
                ),
            );
        }

        let rotate_root = rig.add_node(GizmoMode::Rotate, HandleNode::group("rotate", None));
        for axis in GizmoAxis::ALL {
            rig.add_node(
                GizmoMode::Rotate,
                HandleNode::part(
                    format!("rotate_{}", axis_suffix(axis)),
                    rotate_root,
                    HandleShape::Ring {
                        normal: axis.vector(),
                        inner_radius: RING_INNER_RADIUS,
                        outer_radius: RING_OUTER_RADIUS,
                    },
                )
                .with_tag(HandleTag { target: HandleTarget::Axis(axis), kind: HandleKind::Ring }),
            );
        }

        let scale_root = rig.add_node(GizmoMode::Scale, HandleNode::group("scale", None));
        for axis in GizmoAxis::ALL {
            let center = axis.vector() * SCALE_BOX_CENTER;
            rig.add_node(
                GizmoMode::Scale,
                HandleNode::part(
                    format!("scale_{}", axis_suffix(axis)),
                    scale_root,
                    HandleShape::Box {
                        min: center - Vec3::splat(SCALE_BOX_HALF),
                        max: center + Vec3::splat(SCALE_BOX_HALF),
                    },
                )
                .with_tag(HandleTag { target: HandleTarget::Axis(axis), kind: HandleKind::AxisBox }),
            );
        }
        rig.add_node(
            GizmoMode::Scale,
            HandleNode::part(
                "scale_uniform",
                scale_root,
                HandleShape::Box { min: Vec3::splat(-SCALE_CENTER_HALF), max: Vec3::splat(SCALE_CENTER_HALF) },
            )
            .with_tag(HandleTag { target: HandleTarget::Uniform, kind: HandleKind::CenterBox }),
        );
        rig
    }
}

fn axis_suffix(axis: GizmoAxis) -> &'static str {
    match axis {
        GizmoAxis::X => "x",
        GizmoAxis::Y => "y",
        GizmoAxis::Z => "z",
    }
}

fn axis_box(axis: GizmoAxis, from: f32, to: f32, half: f32) -> HandleShape {
    let mut min = Vec3::splat(-half);
    let mut max = Vec3::splat(half);
    min[axis.index()] = from;
    max[axis.index()] = to;
    HandleShape::Box { min, max }
}

/// Picks the handle of `mode` nearest along `ray`. Handles of other modes are ignored even when
/// they overlap. Hits whose node has no tag within `max_depth` owners are dropped.
pub fn resolve_handle(rig: &GizmoRig, ray: &Ray, mode: GizmoMode, max_depth: usize) -> Option<HandleHit> {
    let local = ray.to_local(rig.origin, rig.orientation, rig.size)?;
    let mut best: Option<(NodeId, f32)> = None;
    for (id, node) in rig.pickable(mode) {
        let Some(shape) = node.shape else {
            continue;
        };
        let Some(t) = shape.hit(&local) else {
            continue;
        };
        if best.map_or(true, |(_, best_t)| t < best_t) {
            best = Some((id, t));
        }
    }
    let (node, t) = best?;
    let Some(tag) = rig.lookup_tag(node, max_depth) else {
        tracing::debug!(node = node.0, "picked gizmo node has no axis metadata within owner bound");
        return None;
    };
    Some(HandleHit { target: tag.target, kind: tag.kind, node, distance: t * rig.size })
}
