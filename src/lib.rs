pub mod analytics;
pub mod camera3d;
pub mod cli;
pub mod config;
pub mod events;
pub mod gizmo;
pub mod history;
pub mod picking;
pub mod scene;

pub use camera3d::{Camera3D, CameraContext, PickRaySource, Viewport, ViewportCamera};
pub use config::{GizmoConfig, GizmoConfigOverrides};
pub use events::{SceneEvent, TransformSource};
pub use gizmo::{DragCoordinator, DragOutcome, DragPhase, GizmoMode, Selection};
pub use history::{ActionRecord, CommandHistory, TransformRecord};
pub use scene::{SceneWorld, Transform3D};
