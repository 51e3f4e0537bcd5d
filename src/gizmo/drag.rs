//! Drag coordination for one manipulation gesture across the whole selection.
//!
//! `Idle -> Armed (pointer down on a handle) -> Dragging (first move) -> Idle` via either
//! [`DragCoordinator::pointer_up`] (commit) or [`DragCoordinator::cancel`] (restore).

use super::handles::{resolve_handle, GizmoRig, HandleHit};
use super::math::{compute_transform, ManipulationContext, TransformDelta};
use super::{GizmoMode, GizmoSpace, HandleKind, HandleTarget, SnapSettings};
use crate::analytics::ManipulationUsage;
use crate::camera3d::{CameraContext, PickRaySource};
use crate::config::GizmoConfig;
use crate::events::{SceneEvent, TransformSource};
use crate::history::{CommandHistory, TransformRecord};
use crate::picking::Ray;
use crate::scene::{SceneWorld, Transform3D};
use bevy_ecs::prelude::Entity;
use glam::{Quat, Vec2, Vec3};
use smallvec::SmallVec;

/// Ordered set of distinct objects, one of them primary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    objects: SmallVec<[Entity; 4]>,
    primary: Option<Entity>,
}

impl Selection {
    /// Duplicates are dropped, first occurrence wins. The first object becomes primary.
    pub fn new(objects: impl IntoIterator<Item = Entity>) -> Self {
        let mut unique: SmallVec<[Entity; 4]> = SmallVec::new();
        for entity in objects {
            if !unique.contains(&entity) {
                unique.push(entity);
            }
        }
        let primary = unique.first().copied();
        Self { objects: unique, primary }
    }

    pub fn single(entity: Entity) -> Self {
        Self::new([entity])
    }

    /// Ignored unless `entity` is part of the selection.
    pub fn with_primary(mut self, entity: Entity) -> Self {
        if self.objects.contains(&entity) {
            self.primary = Some(entity);
        }
        self
    }

    pub fn objects(&self) -> &[Entity] {
        &self.objects
    }

    pub fn primary(&self) -> Option<Entity> {
        self.primary
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.objects.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Armed,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// No session was active.
    Idle,
    Committed { records: usize },
    Cancelled,
}

/// Where the host should draw the gizmo this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoVisual {
    pub position: Vec3,
    pub orientation: Quat,
    pub size: f32,
    pub mode: GizmoMode,
    pub active: Option<HandleTarget>,
}

#[derive(Debug, Clone, Copy)]
struct ObjectSnapshot {
    entity: Entity,
    start: Transform3D,
}

#[derive(Debug, Clone)]
struct DragSession {
    mode: GizmoMode,
    target: HandleTarget,
    kind: HandleKind,
    pointer_start: Vec2,
    primary: usize,
    gizmo_orientation: Quat,
    objects: Vec<ObjectSnapshot>,
    dragging: bool,
}

impl DragSession {
    fn primary_snapshot(&self) -> &ObjectSnapshot {
        &self.objects[self.primary]
    }
}

pub struct DragCoordinator {
    config: GizmoConfig,
    rig: GizmoRig,
    selection: Selection,
    mode: GizmoMode,
    camera: CameraContext,
    snap: SnapSettings,
    session: Option<DragSession>,
    usage: ManipulationUsage,
}

impl DragCoordinator {
    pub fn new(config: GizmoConfig) -> Self {
        let snap = config.snap;
        Self {
            config,
            rig: GizmoRig::standard(),
            selection: Selection::default(),
            mode: GizmoMode::default(),
            camera: CameraContext::default(),
            snap,
            session: None,
            usage: ManipulationUsage::default(),
        }
    }

    pub fn with_rig(mut self, rig: GizmoRig) -> Self {
        self.rig = rig;
        self
    }

    pub fn config(&self) -> &GizmoConfig {
        &self.config
    }

    pub fn rig(&self) -> &GizmoRig {
        &self.rig
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn camera(&self) -> CameraContext {
        self.camera
    }

    pub fn snap(&self) -> SnapSettings {
        self.snap
    }

    pub fn usage(&self) -> ManipulationUsage {
        self.usage
    }

    pub fn phase(&self) -> DragPhase {
        match &self.session {
            None => DragPhase::Idle,
            Some(session) if session.dragging => DragPhase::Dragging,
            Some(_) => DragPhase::Armed,
        }
    }

    /// True while a session is armed or dragging. History navigation writes straight to the
    /// scene, so hosts cancel the session before calling undo, redo or jump.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Handle the live session is dragging, if any.
    pub fn active_target(&self) -> Option<HandleTarget> {
        self.session.as_ref().map(|session| session.target)
    }

    /// Replaces the selection. A live session is cancelled first. Objects that leave the
    /// selection are released from external control; objects that stay keep their lock.
    pub fn set_selected_objects(&mut self, scene: &mut SceneWorld, selection: Selection) {
        if self.session.is_some() {
            self.cancel(scene);
        }
        for &entity in self.selection.objects() {
            if !selection.contains(entity) && scene.release(entity) {
                tracing::trace!(entity = ?entity, "released external control on deselect");
            }
        }
        self.selection = selection;
    }

    /// Takes effect on the next pointer-down; a live session keeps the mode it started with.
    pub fn set_mode(&mut self, mode: GizmoMode) {
        self.mode = mode;
    }

    pub fn set_camera(&mut self, camera: CameraContext) {
        self.camera = camera;
    }

    pub fn set_snap(&mut self, snap: SnapSettings) {
        self.snap = snap;
    }

    /// Cancels any session, releases every lock and empties the selection. Used when the
    /// document is cleared.
    pub fn reset(&mut self, scene: &mut SceneWorld) {
        self.set_selected_objects(scene, Selection::default());
    }

    pub fn pointer_down_at(
        &mut self,
        scene: &mut SceneWorld,
        pointer: Vec2,
        rays: &impl PickRaySource,
    ) -> Option<HandleHit> {
        let ray = rays.screen_point_to_ray(pointer)?;
        self.pointer_down(scene, pointer, &ray)
    }

    /// Arms a session when `ray` hits a handle of the current mode. Every selected object is
    /// snapshotted and placed under external control.
    pub fn pointer_down(&mut self, scene: &mut SceneWorld, pointer: Vec2, ray: &Ray) -> Option<HandleHit> {
        if self.session.is_some() {
            return None;
        }
        let primary = self.selection.primary()?;
        self.sync_visual(scene)?;
        let Some(hit) = resolve_handle(&self.rig, ray, self.mode, self.config.max_owner_depth) else {
            self.usage.missed_presses += 1;
            return None;
        };

        let mode = self.mode;
        let mut objects = Vec::with_capacity(self.selection.len());
        let mut primary_index = None;
        for &entity in self.selection.objects() {
            let Some(start) = scene.transform(entity) else {
                tracing::debug!(entity = ?entity, "selected object missing from scene; skipped");
                continue;
            };
            if entity == primary {
                primary_index = Some(objects.len());
            }
            objects.push(ObjectSnapshot { entity, start });
        }
        let primary_index = primary_index?;
        for snapshot in &objects {
            scene.lock(snapshot.entity);
        }

        let gizmo_orientation = self.gizmo_orientation(mode, &objects[primary_index].start);
        tracing::debug!(mode = ?mode, target = ?hit.target, objects = objects.len(), "gizmo drag armed");
        scene.push_event(SceneEvent::DragStarted { mode, target: hit.target, objects: objects.len() });
        self.session = Some(DragSession {
            mode,
            target: hit.target,
            kind: hit.kind,
            pointer_start: pointer,
            primary: primary_index,
            gizmo_orientation,
            objects,
            dragging: false,
        });
        self.usage.sessions_armed += 1;
        Some(hit)
    }

    /// Recomputes every selected object from its snapshot for the pointer now at `pointer`.
    /// Repeating a call with the same position yields the same transforms.
    pub fn pointer_move(&mut self, scene: &mut SceneWorld, pointer: Vec2) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let delta = pointer - session.pointer_start;
        let primary = *session.primary_snapshot();
        let ctx = ManipulationContext::new(&self.config, self.camera, primary.start.translation)
            .with_orientation(session.gizmo_orientation)
            .with_snap(self.snap);
        let primary_end = compute_transform(session.mode, session.target, &primary.start, delta, &ctx);
        let relative = TransformDelta::between(&primary.start, &primary_end);
        let floor = self.config.scale.floor;

        for (index, snapshot) in session.objects.iter().enumerate() {
            let next = if index == session.primary {
                primary_end
            } else {
                relative.apply_to(&snapshot.start, floor)
            };
            scene.apply_transform(snapshot.entity, next, TransformSource::Drag);
        }
        tracing::trace!(dx = delta.x, dy = delta.y, kind = ?session.kind, "gizmo drag update");
        session.dragging = true;
        self.usage.pointer_moves += 1;
        true
    }

    /// Ends the session, recording one history entry per object whose transform changed.
    /// Locks are kept until the objects are deselected.
    pub fn pointer_up(&mut self, scene: &mut SceneWorld, history: &mut CommandHistory<SceneWorld>) -> DragOutcome {
        let Some(session) = self.session.take() else {
            return DragOutcome::Idle;
        };
        let mut records = 0;
        for snapshot in &session.objects {
            let Some(end) = scene.transform(snapshot.entity) else {
                continue;
            };
            if end.changed_channels(&snapshot.start).is_empty() {
                continue;
            }
            let name = scene.name(snapshot.entity).unwrap_or_default().to_string();
            history.add(Box::new(TransformRecord::from_drag(
                session.mode,
                &name,
                snapshot.entity,
                snapshot.start,
                end,
            )));
            records += 1;
        }
        self.usage.sessions_committed += 1;
        self.usage.records_emitted += records as u64;
        if records == 0 {
            self.usage.empty_commits += 1;
        }
        tracing::debug!(mode = ?session.mode, records, "gizmo drag committed");
        scene.push_event(SceneEvent::DragCommitted { mode: session.mode, records });
        DragOutcome::Committed { records }
    }

    /// Restores every object to its snapshot. Nothing is recorded.
    pub fn cancel(&mut self, scene: &mut SceneWorld) -> DragOutcome {
        let Some(session) = self.session.take() else {
            return DragOutcome::Idle;
        };
        for snapshot in &session.objects {
            scene.apply_transform(snapshot.entity, snapshot.start, TransformSource::Restore);
        }
        self.usage.sessions_cancelled += 1;
        tracing::debug!(mode = ?session.mode, "gizmo drag cancelled");
        scene.push_event(SceneEvent::DragCancelled { mode: session.mode });
        DragOutcome::Cancelled
    }

    /// Places the rig on the primary object and reports where to draw it. Call once per host
    /// tick; the result does not depend on how often it is called.
    pub fn sync_visual(&mut self, scene: &SceneWorld) -> Option<GizmoVisual> {
        let primary = self.selection.primary()?;
        let transform = scene.transform(primary)?;
        let mode = self.session.as_ref().map_or(self.mode, |session| session.mode);
        let orientation = match &self.session {
            Some(session) => session.gizmo_orientation,
            None => self.gizmo_orientation(mode, &transform),
        };
        let distance = self.camera.eye.distance(transform.translation);
        let size = (distance * self.config.handle_screen_scale).max(f32::EPSILON);
        self.rig.place(transform.translation, orientation, size);
        Some(GizmoVisual {
            position: transform.translation,
            orientation,
            size,
            mode,
            active: self.active_target(),
        })
    }

    fn gizmo_orientation(&self, mode: GizmoMode, primary: &Transform3D) -> Quat {
        match (mode, self.config.space) {
            (GizmoMode::Translate, GizmoSpace::Local) => primary.rotation,
            _ => Quat::IDENTITY,
        }
    }
}
