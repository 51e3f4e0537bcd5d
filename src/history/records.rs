use super::{ActionKind, ActionMeta, ActionRecord};
use crate::events::TransformSource;
use crate::gizmo::GizmoMode;
use crate::scene::{SceneWorld, Transform3D};
use bevy_ecs::prelude::Entity;
use serde_json::json;

/// Whole-transform edit of one scene object.
pub struct TransformRecord {
    meta: ActionMeta,
    entity: Entity,
    before: Transform3D,
    after: Transform3D,
}

impl TransformRecord {
    pub fn new(kind: ActionKind, description: impl Into<String>, entity: Entity, before: Transform3D, after: Transform3D) -> Self {
        let channels = before.changed_channels(&after);
        let payload = json!({
            "entity": entity.to_bits(),
            "channels": channels.bits(),
            "before": before.to_json(),
            "after": after.to_json(),
        });
        Self { meta: ActionMeta::new(kind, description).with_payload(payload), entity, before, after }
    }

    /// Record for a finished gizmo drag, described as e.g. "Move Crate".
    pub fn from_drag(mode: GizmoMode, name: &str, entity: Entity, before: Transform3D, after: Transform3D) -> Self {
        let description = if name.is_empty() {
            format!("{} entity {}", mode.label(), entity.index())
        } else {
            format!("{} {name}", mode.label())
        };
        Self::new(ActionKind::from(mode), description, entity, before, after)
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn before(&self) -> &Transform3D {
        &self.before
    }

    pub fn after(&self) -> &Transform3D {
        &self.after
    }

    fn write(&self, scene: &mut SceneWorld, transform: Transform3D) {
        if !scene.apply_transform(self.entity, transform, TransformSource::History) {
            tracing::debug!(entity = ?self.entity, "history target no longer exists; record skipped");
        }
    }
}

impl ActionRecord<SceneWorld> for TransformRecord {
    fn meta(&self) -> &ActionMeta {
        &self.meta
    }

    fn apply(&mut self, scene: &mut SceneWorld) {
        self.write(scene, self.after);
    }

    fn revert(&mut self, scene: &mut SceneWorld) {
        self.write(scene, self.before);
    }
}

type EditFn<C> = Box<dyn FnMut(&mut C)>;

/// Record backed by a pair of closures, for document edits that are not transforms.
pub struct EditRecord<C> {
    meta: ActionMeta,
    apply: EditFn<C>,
    revert: EditFn<C>,
}

impl<C> EditRecord<C> {
    pub fn new(
        description: impl Into<String>,
        apply: impl FnMut(&mut C) + 'static,
        revert: impl FnMut(&mut C) + 'static,
    ) -> Self {
        Self { meta: ActionMeta::new(ActionKind::Edit, description), apply: Box::new(apply), revert: Box::new(revert) }
    }

    pub fn with_meta(mut self, meta: ActionMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl<C> ActionRecord<C> for EditRecord<C> {
    fn meta(&self) -> &ActionMeta {
        &self.meta
    }

    fn apply(&mut self, ctx: &mut C) {
        (self.apply)(ctx);
    }

    fn revert(&mut self, ctx: &mut C) {
        (self.revert)(ctx);
    }
}
