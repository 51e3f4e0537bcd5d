use crate::picking::Ray;
use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::Deserialize;

const DEFAULT_UP: Vec3 = Vec3::Y;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(self) -> f32 {
        if self.height > 0 {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Perspective camera used for pick rays and sensitivity scaling.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: Viewport) -> Mat4 {
        self.projection_matrix(viewport.aspect()) * self.view_matrix()
    }

    /// Generates a world-space ray originating from the camera through a screen-space position.
    pub fn screen_ray(&self, screen: Vec2, viewport: Viewport) -> Option<Ray> {
        if viewport.is_empty() {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let inv_view_proj = self.view_projection(viewport).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let toward = (world.truncate() / world.w) - self.position;
        Ray::new(self.position, toward)
    }

    /// Projects a world point into pixel coordinates. `None` when the point is behind the camera.
    pub fn world_to_screen(&self, point: Vec3, viewport: Viewport) -> Option<Vec2> {
        if viewport.is_empty() {
            return None;
        }
        let clip = self.view_projection(viewport) * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width as f32,
            (1.0 - ndc.y) * 0.5 * viewport.height as f32,
        ))
    }

    pub fn context(&self) -> CameraContext {
        CameraContext { eye: self.position }
    }
}

/// The `screen point -> ray` half of the picking pipeline.
pub trait PickRaySource {
    fn screen_point_to_ray(&self, screen: Vec2) -> Option<Ray>;
}

/// A camera bound to the viewport it renders into.
#[derive(Debug, Clone)]
pub struct ViewportCamera {
    pub camera: Camera3D,
    pub viewport: Viewport,
}

impl ViewportCamera {
    pub fn new(camera: Camera3D, viewport: Viewport) -> Self {
        Self { camera, viewport }
    }
}

impl PickRaySource for ViewportCamera {
    fn screen_point_to_ray(&self, screen: Vec2) -> Option<Ray> {
        self.camera.screen_ray(screen, self.viewport)
    }
}

/// Camera state the manipulation math needs. Only the eye position matters: it drives the
/// distance-based sensitivity multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraContext {
    pub eye: Vec3,
}

impl Default for CameraContext {
    fn default() -> Self {
        Self { eye: Vec3::new(0.0, 0.0, 10.0) }
    }
}
