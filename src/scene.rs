use crate::events::{EventBus, SceneEvent, TransformSource};
use anyhow::Result;
use bevy_ecs::prelude::*;
use bitflags::bitflags;
use glam::{EulerRot, Quat, Vec3};
use serde_json::{json, Value};

bitflags! {
    /// Which parts of a transform differ between two snapshots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransformChannels: u8 {
        const TRANSLATION = 0b001;
        const ROTATION = 0b010;
        const SCALE = 0b100;
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform3D {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::default() }
    }

    pub fn from_euler_degrees(translation: Vec3, euler_degrees: Vec3, scale: Vec3) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            euler_degrees.x.to_radians(),
            euler_degrees.y.to_radians(),
            euler_degrees.z.to_radians(),
        );
        Self { translation, rotation, scale }
    }

    /// Euler angles (XYZ, radians) for display. Always derived from the quaternion so the two
    /// never drift apart.
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    pub fn euler_degrees(&self) -> Vec3 {
        let e = self.euler();
        Vec3::new(e.x.to_degrees(), e.y.to_degrees(), e.z.to_degrees())
    }

    /// Exact component-wise comparison.
    pub fn changed_channels(&self, other: &Transform3D) -> TransformChannels {
        let mut channels = TransformChannels::empty();
        if self.translation != other.translation {
            channels |= TransformChannels::TRANSLATION;
        }
        if self.rotation != other.rotation {
            channels |= TransformChannels::ROTATION;
        }
        if self.scale != other.scale {
            channels |= TransformChannels::SCALE;
        }
        channels
    }

    pub fn with_scale_floor(mut self, floor: f32) -> Self {
        self.scale = self.scale.max(Vec3::splat(floor));
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "translation": self.translation.to_array(),
            "rotation": self.rotation.to_array(),
            "euler_degrees": self.euler_degrees().to_array(),
            "scale": self.scale.to_array(),
        })
    }
}

#[derive(Component, Debug, Clone)]
pub struct SceneObject {
    pub name: String,
}

/// Cooperative lock: while present, only the drag coordinator writes this object's transform.
/// Other writers go through [`SceneWorld::write_external`], which honors it.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ExternallyControlled;

/// Host hook invoked after every edit-path transform write (drag, restore, history), typically
/// used to mirror the value into a physics body.
pub trait TransformMirror {
    fn on_object_transformed(&mut self, entity: Entity, transform: &Transform3D) -> Result<()>;
}

impl<F> TransformMirror for F
where
    F: FnMut(Entity, &Transform3D) -> Result<()>,
{
    fn on_object_transformed(&mut self, entity: Entity, transform: &Transform3D) -> Result<()> {
        self(entity, transform)
    }
}

pub struct SceneWorld {
    pub world: World,
    mirror: Option<Box<dyn TransformMirror>>,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneWorld {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(EventBus::default());
        Self { world, mirror: None }
    }

    pub fn set_mirror(&mut self, mirror: Box<dyn TransformMirror>) {
        self.mirror = Some(mirror);
    }

    pub fn clear_mirror(&mut self) {
        self.mirror = None;
    }

    pub fn spawn_object(&mut self, name: impl Into<String>, transform: Transform3D) -> Entity {
        self.world.spawn((SceneObject { name: name.into() }, transform)).id()
    }

    pub fn despawn_object(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    pub fn objects(&mut self) -> Vec<Entity> {
        let mut query = self.world.query_filtered::<Entity, With<SceneObject>>();
        query.iter(&self.world).collect()
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<SceneObject>(entity).map(|object| object.name.as_str())
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform3D> {
        self.world.get::<Transform3D>(entity).copied()
    }

    /// Edit-path write. The whole transform is replaced in one step, an
    /// [`SceneEvent::ObjectTransformed`] is queued and the mirror hook runs. A failing hook is
    /// logged and reported as [`SceneEvent::MirrorFailed`]; the write itself stands.
    pub fn apply_transform(&mut self, entity: Entity, transform: Transform3D, source: TransformSource) -> bool {
        match self.world.get_mut::<Transform3D>(entity) {
            Some(mut current) => *current = transform,
            None => return false,
        }
        self.emit(SceneEvent::ObjectTransformed { entity, transform, source });
        self.run_mirror(entity, &transform);
        true
    }

    /// Write from a subsystem outside the editor. Refused while the object is externally
    /// controlled.
    pub fn write_external(&mut self, entity: Entity, transform: Transform3D) -> bool {
        if self.is_externally_controlled(entity) {
            tracing::trace!(entity = ?entity, "external write refused while object is under gizmo control");
            return false;
        }
        match self.world.get_mut::<Transform3D>(entity) {
            Some(mut current) => *current = transform,
            None => return false,
        }
        self.emit(SceneEvent::ObjectTransformed { entity, transform, source: TransformSource::External });
        true
    }

    pub fn lock(&mut self, entity: Entity) -> bool {
        if !self.entity_exists(entity) {
            return false;
        }
        self.world.entity_mut(entity).insert(ExternallyControlled);
        true
    }

    pub fn release(&mut self, entity: Entity) -> bool {
        if !self.is_externally_controlled(entity) {
            return false;
        }
        self.world.entity_mut(entity).remove::<ExternallyControlled>();
        true
    }

    pub fn is_externally_controlled(&self, entity: Entity) -> bool {
        self.world.get::<ExternallyControlled>(entity).is_some()
    }

    pub fn push_event(&mut self, event: SceneEvent) {
        self.emit(event);
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    /// Despawns every scene object and drops queued events. The mirror stays installed.
    pub fn clear(&mut self) {
        for entity in self.objects() {
            self.world.despawn(entity);
        }
        self.world.resource_mut::<EventBus>().drain();
    }

    fn emit(&mut self, event: SceneEvent) {
        self.world.resource_mut::<EventBus>().push(event);
    }

    fn run_mirror(&mut self, entity: Entity, transform: &Transform3D) {
        let Some(mirror) = self.mirror.as_mut() else {
            return;
        };
        if let Err(err) = mirror.on_object_transformed(entity, transform) {
            let name = self.world.get::<SceneObject>(entity).map(|o| o.name.clone()).unwrap_or_default();
            tracing::warn!(entity = ?entity, name = %name, error = %err, "transform mirror hook failed");
            self.emit(SceneEvent::MirrorFailed { entity, message: format!("{err:#}") });
        }
    }
}
