use anyhow::{anyhow, bail, Context, Result};
use bevy_ecs::prelude::Entity;
use glam::{Vec2, Vec3};
use kestrel_gizmo::camera3d::{Camera3D, Viewport, ViewportCamera};
use kestrel_gizmo::cli::ReplayArgs;
use kestrel_gizmo::config::GizmoConfig;
use kestrel_gizmo::gizmo::{DragCoordinator, DragOutcome, GizmoMode, HandleTarget, Selection};
use kestrel_gizmo::history::CommandHistory;
use kestrel_gizmo::scene::{SceneWorld, Transform3D};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::process;

#[derive(Debug, Deserialize)]
struct ReplayScript {
    #[serde(default = "default_viewport")]
    viewport: Viewport,
    #[serde(default)]
    camera: CameraSetup,
    objects: Vec<ObjectSetup>,
    #[serde(default)]
    selection: Vec<String>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct CameraSetup {
    position: [f32; 3],
    #[serde(default)]
    target: [f32; 3],
    #[serde(default = "default_fov_degrees")]
    fov_degrees: f32,
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self { position: [0.0, 0.0, 10.0], target: [0.0; 3], fov_degrees: default_fov_degrees() }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectSetup {
    name: String,
    #[serde(default)]
    translation: [f32; 3],
    #[serde(default)]
    rotation_degrees: [f32; 3],
    #[serde(default = "default_scale")]
    scale: [f32; 3],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Mode { mode: GizmoMode },
    Select { objects: Vec<String> },
    Press { at: [f32; 2] },
    /// Press on the named handle, wherever it currently projects to.
    PressHandle { handle: HandleTarget },
    /// `to` is an absolute pointer position; `by` is relative to the last press.
    Move {
        #[serde(default)]
        to: Option<[f32; 2]>,
        #[serde(default)]
        by: Option<[f32; 2]>,
    },
    Release,
    Cancel,
    Undo,
    Redo,
    Jump { index: Option<usize> },
    /// Write from outside the editor; refused while the object is under gizmo control.
    External { object: String, translation: [f32; 3] },
}

fn default_viewport() -> Viewport {
    Viewport::new(1280, 720)
}

fn default_fov_degrees() -> f32 {
    60.0
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = ReplayArgs::parse_from_env()?;
    let mut config = match &args.config {
        Some(path) => GizmoConfig::load(path)?,
        None => GizmoConfig::load_or_default(args.config_path()),
    };
    let overrides = args.config_overrides();
    if !overrides.is_empty() {
        config.apply_overrides(&overrides);
        config.validate().context("config overrides produced an invalid config")?;
        tracing::info!(fields = ?overrides.applied_fields(), "applied command-line overrides");
    }

    let bytes = fs::read(&args.script).with_context(|| format!("read replay script {}", args.script.display()))?;
    let script: ReplayScript =
        serde_json::from_slice(&bytes).with_context(|| format!("parse replay script {}", args.script.display()))?;

    let camera = Camera3D::new(
        Vec3::from(script.camera.position),
        Vec3::from(script.camera.target),
        script.camera.fov_degrees.to_radians(),
        0.1,
        1000.0,
    );
    let view = ViewportCamera::new(camera, script.viewport);

    let mut scene = SceneWorld::new();
    let mut names = HashMap::new();
    let mut order = Vec::new();
    for object in &script.objects {
        let transform = Transform3D::from_euler_degrees(
            Vec3::from(object.translation),
            Vec3::from(object.rotation_degrees),
            Vec3::from(object.scale),
        );
        let entity = scene.spawn_object(object.name.clone(), transform);
        if names.insert(object.name.clone(), entity).is_some() {
            bail!("duplicate object name '{}'", object.name);
        }
        order.push(entity);
    }

    let history: CommandHistory<SceneWorld> = CommandHistory::new(config.history_capacity);
    let mut coordinator = DragCoordinator::new(config);
    coordinator.set_camera(view.camera.context());
    coordinator.set_selected_objects(&mut scene, Selection::new(resolve_names(&names, &script.selection)?));

    let mut replay = Replay { scene, coordinator, history, view, names, last_press: None };
    for (index, step) in script.steps.iter().enumerate() {
        replay.run_step(step).with_context(|| format!("step {index} ({step:?})"))?;
    }

    let Replay { mut scene, coordinator, history, .. } = replay;
    let events = scene.drain_events();
    let objects: Vec<_> = order
        .iter()
        .filter_map(|&entity| {
            let transform = scene.transform(entity)?;
            Some(json!({
                "name": scene.name(entity).unwrap_or_default(),
                "transform": transform.to_json(),
                "externally_controlled": scene.is_externally_controlled(entity),
            }))
        })
        .collect();
    let report = json!({
        "objects": objects,
        "history": history.snapshot(),
        "history_usage": history.usage(),
        "manipulation_usage": coordinator.usage(),
        "events": events.len(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

struct Replay {
    scene: SceneWorld,
    coordinator: DragCoordinator,
    history: CommandHistory<SceneWorld>,
    view: ViewportCamera,
    names: HashMap<String, Entity>,
    last_press: Option<Vec2>,
}

impl Replay {
    fn run_step(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Mode { mode } => self.coordinator.set_mode(*mode),
            Step::Select { objects } => {
                let selection = Selection::new(resolve_names(&self.names, objects)?);
                self.coordinator.set_selected_objects(&mut self.scene, selection);
            }
            Step::Press { at } => self.press(Vec2::from(*at)),
            Step::PressHandle { handle } => {
                self.coordinator
                    .sync_visual(&self.scene)
                    .ok_or_else(|| anyhow!("nothing selected to press a handle on"))?;
                let mode = self.coordinator.mode();
                let depth = self.coordinator.config().max_owner_depth;
                let point = self
                    .coordinator
                    .rig()
                    .handle_point(mode, *handle, depth)
                    .ok_or_else(|| anyhow!("no {} handle in {} mode", handle.label(), mode.label()))?;
                let screen = self
                    .view
                    .camera
                    .world_to_screen(point, self.view.viewport)
                    .ok_or_else(|| anyhow!("{} handle is behind the camera", handle.label()))?;
                self.press(screen);
            }
            Step::Move { to, by } => {
                let pointer = match (to, by) {
                    (Some(to), None) => Vec2::from(*to),
                    (None, Some(by)) => {
                        let origin = self.last_press.ok_or_else(|| anyhow!("relative move before any press"))?;
                        origin + Vec2::from(*by)
                    }
                    _ => bail!("move needs exactly one of 'to' or 'by'"),
                };
                self.coordinator.pointer_move(&mut self.scene, pointer);
            }
            Step::Release => {
                let outcome = self.coordinator.pointer_up(&mut self.scene, &mut self.history);
                if let DragOutcome::Committed { records } = outcome {
                    tracing::info!(records, "release");
                }
            }
            Step::Cancel => {
                self.coordinator.cancel(&mut self.scene);
            }
            Step::Undo => {
                self.settle_drag();
                self.history.undo(&mut self.scene);
            }
            Step::Redo => {
                self.settle_drag();
                self.history.redo(&mut self.scene);
            }
            Step::Jump { index } => {
                self.settle_drag();
                if !self.history.jump_to(*index, &mut self.scene) {
                    tracing::warn!(index = ?index, len = self.history.len(), "jump target out of range");
                }
            }
            Step::External { object, translation } => {
                let entity = resolve_name(&self.names, object)?;
                let current =
                    self.scene.transform(entity).ok_or_else(|| anyhow!("object '{object}' has no transform"))?;
                let accepted = self
                    .scene
                    .write_external(entity, Transform3D { translation: Vec3::from(*translation), ..current });
                tracing::info!(object = %object, accepted, "external write");
            }
        }
        Ok(())
    }

    /// History steps never run under a live drag.
    fn settle_drag(&mut self) {
        if self.coordinator.is_active() {
            tracing::info!("cancelling live drag before history navigation");
            self.coordinator.cancel(&mut self.scene);
        }
    }

    fn press(&mut self, screen: Vec2) {
        let hit = self.coordinator.pointer_down_at(&mut self.scene, screen, &self.view);
        tracing::info!(x = screen.x, y = screen.y, hit = ?hit.map(|h| h.target), "press");
        if hit.is_some() {
            self.last_press = Some(screen);
        }
    }
}

fn resolve_names(names: &HashMap<String, Entity>, requested: &[String]) -> Result<Vec<Entity>> {
    requested.iter().map(|name| resolve_name(names, name)).collect()
}

fn resolve_name(names: &HashMap<String, Entity>, name: &str) -> Result<Entity> {
    names.get(name).copied().ok_or_else(|| anyhow!("unknown object '{name}'"))
}
