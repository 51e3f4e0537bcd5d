use crate::gizmo::{GizmoMode, HandleTarget};
use crate::scene::Transform3D;
use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

/// Who wrote a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformSource {
    /// Live update from an active drag session.
    Drag,
    /// Snapshot restore after a cancelled drag.
    Restore,
    /// Undo, redo or jump through the command history.
    History,
    /// Another subsystem (physics mirror, scripting) writing through the cooperative lock.
    External,
}

impl TransformSource {
    pub fn label(self) -> &'static str {
        match self {
            TransformSource::Drag => "drag",
            TransformSource::Restore => "restore",
            TransformSource::History => "history",
            TransformSource::External => "external",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SceneEvent {
    ObjectTransformed { entity: Entity, transform: Transform3D, source: TransformSource },
    MirrorFailed { entity: Entity, message: String },
    DragStarted { mode: GizmoMode, target: HandleTarget, objects: usize },
    DragCommitted { mode: GizmoMode, records: usize },
    DragCancelled { mode: GizmoMode },
}

impl SceneEvent {
    /// True for the per-delta notification a drag emits for every object it moves.
    pub fn is_object_change(&self) -> bool {
        matches!(self, SceneEvent::ObjectTransformed { source: TransformSource::Drag, .. })
    }
}

impl fmt::Display for SceneEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneEvent::ObjectTransformed { entity, transform, source } => {
                let t = transform.translation;
                write!(
                    f,
                    "ObjectTransformed entity={} source={} pos=({:.3}, {:.3}, {:.3})",
                    entity.index(),
                    source.label(),
                    t.x,
                    t.y,
                    t.z
                )
            }
            SceneEvent::MirrorFailed { entity, message } => {
                write!(f, "MirrorFailed entity={} error={message}", entity.index())
            }
            SceneEvent::DragStarted { mode, target, objects } => {
                write!(f, "DragStarted mode={} target={} objects={objects}", mode.label(), target.label())
            }
            SceneEvent::DragCommitted { mode, records } => {
                write!(f, "DragCommitted mode={} records={records}", mode.label())
            }
            SceneEvent::DragCancelled { mode } => write!(f, "DragCancelled mode={}", mode.label()),
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<SceneEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
