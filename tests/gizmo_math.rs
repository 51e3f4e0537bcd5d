use glam::{Quat, Vec2, Vec3};
use kestrel_gizmo::camera3d::CameraContext;
use kestrel_gizmo::config::GizmoConfig;
use kestrel_gizmo::gizmo::math::{distance_multiplier, drag_scalar};
use kestrel_gizmo::gizmo::{
    compute_transform, GizmoAxis, GizmoMode, HandleTarget, ManipulationContext, RotationAxisMap, SnapSettings,
    TransformDelta,
};
use kestrel_gizmo::scene::Transform3D;

fn approx_scalar(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length_squared() <= 1e-8
}

fn approx_quat(a: Quat, b: Quat) -> bool {
    a.dot(b).abs() >= 1.0 - 1e-6
}

fn eye_at(distance: f32) -> CameraContext {
    CameraContext { eye: Vec3::new(0.0, 0.0, distance) }
}

const X: HandleTarget = HandleTarget::Axis(GizmoAxis::X);
const Y: HandleTarget = HandleTarget::Axis(GizmoAxis::Y);

#[test]
fn translate_hundred_pixels_moves_one_and_a_half_units() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    assert!(approx_scalar(ctx.distance_multiplier(), 1.0));

    let start = Transform3D::default();
    let end = compute_transform(GizmoMode::Translate, X, &start, Vec2::new(100.0, 0.0), &ctx);
    assert!(approx_scalar(end.translation.x, 1.5), "x = {}", end.translation.x);
    assert_eq!(end.translation.y, 0.0);
    assert_eq!(end.translation.z, 0.0);
    assert_eq!(end.rotation, start.rotation);
    assert_eq!(end.scale, start.scale);
}

#[test]
fn snapping_rounds_translation_to_grid() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO).with_snap(SnapSettings::grid(0.5));
    let start = Transform3D::default();
    // 1.63 / 0.015 pixels of drag
    let pixels = 1.63 / 0.015;
    let unsnapped = compute_transform(
        GizmoMode::Translate,
        X,
        &start,
        Vec2::new(pixels, 0.0),
        &ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO),
    );
    assert!(approx_scalar(unsnapped.translation.x, 1.63));
    let snapped = compute_transform(GizmoMode::Translate, X, &start, Vec2::new(pixels, 0.0), &ctx);
    assert_eq!(snapped.translation, Vec3::new(1.5, 0.0, 0.0));
}

#[test]
fn zero_movement_returns_start_exactly_even_when_snapping() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO).with_snap(SnapSettings::grid(0.5));
    let start = Transform3D::from_euler_degrees(Vec3::new(0.33, -1.27, 4.01), Vec3::new(10.0, 20.0, 30.0), Vec3::splat(1.3));
    for mode in GizmoMode::ALL {
        for target in [X, Y, HandleTarget::Uniform] {
            let end = compute_transform(mode, target, &start, Vec2::ZERO, &ctx);
            assert_eq!(end, start, "{mode:?} {target:?} must not move on zero drag");
        }
    }
    // Horizontal and vertical cancel out under the inverted vertical convention.
    let diagonal = compute_transform(GizmoMode::Translate, X, &start, Vec2::new(25.0, 25.0), &ctx);
    assert_eq!(diagonal, start);
}

#[test]
fn upward_drag_counts_as_positive() {
    assert_eq!(drag_scalar(Vec2::new(0.0, -40.0), true), 40.0);
    assert_eq!(drag_scalar(Vec2::new(0.0, -40.0), false), -40.0);

    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    let end = compute_transform(GizmoMode::Translate, Y, &Transform3D::default(), Vec2::new(0.0, -100.0), &ctx);
    assert!(approx_vec3(end.translation, Vec3::new(0.0, 1.5, 0.0)));
}

#[test]
fn distance_multiplier_is_clamped() {
    let scaling = GizmoConfig::default().distance;
    assert!(approx_scalar(distance_multiplier(&scaling, Vec3::new(0.0, 0.0, 15.0), Vec3::ZERO), 1.5));
    assert!(approx_scalar(distance_multiplier(&scaling, Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO), 2.0));
    assert!(approx_scalar(distance_multiplier(&scaling, Vec3::new(0.0, 0.0, 0.5), Vec3::ZERO), 0.5));

    let config = GizmoConfig::default();
    let far = ManipulationContext::new(&config, eye_at(100.0), Vec3::ZERO);
    let end = compute_transform(GizmoMode::Translate, X, &Transform3D::default(), Vec2::new(100.0, 0.0), &far);
    assert!(approx_scalar(end.translation.x, 3.0));
}

#[test]
fn local_orientation_redirects_translate_axis() {
    let config = GizmoConfig::default();
    let quarter_turn = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO).with_orientation(quarter_turn);
    let end = compute_transform(GizmoMode::Translate, X, &Transform3D::default(), Vec2::new(100.0, 0.0), &ctx);
    assert!(approx_vec3(end.translation, Vec3::new(0.0, 1.5, 0.0)), "got {:?}", end.translation);
}

#[test]
fn rotate_spins_around_mapped_axis() {
    let mut config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    let start = Transform3D::default();
    let end = compute_transform(GizmoMode::Rotate, Y, &start, Vec2::new(100.0, 0.0), &ctx);
    assert!(approx_quat(end.rotation, Quat::from_rotation_y(1.5)));
    assert_eq!(end.translation, start.translation);

    config.rotate.axis_map = RotationAxisMap::swapped_yz();
    let swapped = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    let end = compute_transform(GizmoMode::Rotate, Y, &start, Vec2::new(100.0, 0.0), &swapped);
    assert!(approx_quat(end.rotation, Quat::from_rotation_z(1.5)));
}

#[test]
fn rotate_snaps_to_angle_step() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO).with_snap(SnapSettings::grid(0.5));
    // 1.5 rad is about 85.9 degrees, nearest 15 degree step is 90.
    let end = compute_transform(GizmoMode::Rotate, X, &Transform3D::default(), Vec2::new(100.0, 0.0), &ctx);
    assert!(approx_quat(end.rotation, Quat::from_rotation_x(90.0_f32.to_radians())));

    let tiny = compute_transform(GizmoMode::Rotate, X, &Transform3D::default(), Vec2::new(2.0, 0.0), &ctx);
    assert_eq!(tiny.rotation, Quat::IDENTITY);
}

#[test]
fn rotation_composes_onto_start_orientation() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    let start = Transform3D::new(Vec3::ZERO, Quat::from_rotation_x(0.4), Vec3::ONE);
    let end = compute_transform(GizmoMode::Rotate, Y, &start, Vec2::new(50.0, 0.0), &ctx);
    assert!(approx_quat(end.rotation, Quat::from_rotation_y(0.75) * Quat::from_rotation_x(0.4)));
    assert!(approx_scalar(end.rotation.length(), 1.0));
}

#[test]
fn scale_never_reaches_zero() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    let start = Transform3D::default();
    for pixels in [-50.0_f32, -100.0, -101.0, -1_000.0, -1.0e7, 1.0e7] {
        for target in [X, Y, HandleTarget::Uniform] {
            let end = compute_transform(GizmoMode::Scale, target, &start, Vec2::new(pixels, 0.0), &ctx);
            assert!(end.scale.min_element() > 0.0, "{target:?} at {pixels}px gave {:?}", end.scale);
            assert!(end.scale.min_element() >= config.scale.floor);
            assert!(end.scale.is_finite());
        }
    }
}

#[test]
fn scale_axis_and_uniform() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    let start = Transform3D::new(Vec3::ZERO, Quat::IDENTITY, Vec3::new(1.0, 2.0, 3.0));
    let axis = compute_transform(GizmoMode::Scale, X, &start, Vec2::new(100.0, 0.0), &ctx);
    assert!(approx_vec3(axis.scale, Vec3::new(2.0, 2.0, 3.0)));
    let uniform = compute_transform(GizmoMode::Scale, HandleTarget::Uniform, &start, Vec2::new(50.0, 0.0), &ctx);
    assert!(approx_vec3(uniform.scale, Vec3::new(1.5, 3.0, 4.5)));
}

#[test]
fn uniform_target_does_not_translate_or_rotate() {
    let config = GizmoConfig::default();
    let ctx = ManipulationContext::new(&config, eye_at(10.0), Vec3::ZERO);
    let start = Transform3D::from_translation(Vec3::new(1.0, 2.0, 3.0));
    for mode in [GizmoMode::Translate, GizmoMode::Rotate] {
        let end = compute_transform(mode, HandleTarget::Uniform, &start, Vec2::new(80.0, 0.0), &ctx);
        assert_eq!(end, start);
    }
}

#[test]
fn delta_keeps_untouched_channels_bit_identical() {
    let start = Transform3D::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.3), Vec3::new(1.0, 2.0, 0.5));
    let moved = Transform3D { translation: Vec3::new(2.5, 2.0, 3.0), ..start };
    let delta = TransformDelta::between(&start, &moved);
    assert_eq!(delta.rotation, Quat::IDENTITY);
    assert_eq!(delta.scale_ratio, Vec3::ONE);
    assert!(!delta.is_identity());

    let other = Transform3D::new(Vec3::new(-4.0, 0.0, 1.0), Quat::from_rotation_x(1.1), Vec3::splat(3.0));
    let follower = delta.apply_to(&other, 0.01);
    assert!(approx_vec3(follower.translation, Vec3::new(-2.5, 0.0, 1.0)));
    assert_eq!(follower.rotation, other.rotation);
    assert_eq!(follower.scale, other.scale);

    assert!(TransformDelta::between(&start, &start).is_identity());
    assert_eq!(TransformDelta::between(&start, &start).apply_to(&other, 0.01), other);
}

#[test]
fn delta_scale_respects_floor() {
    let start = Transform3D::default();
    let shrunk = Transform3D { scale: Vec3::new(0.01, 1.0, 1.0), ..start };
    let delta = TransformDelta::between(&start, &shrunk);
    let small = Transform3D { scale: Vec3::splat(0.5), ..start };
    let follower = delta.apply_to(&small, 0.01);
    assert_eq!(follower.scale.x, 0.01);
    assert_eq!(follower.scale.y, 0.5);
}
