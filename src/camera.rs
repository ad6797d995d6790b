use bevy::{input::mouse::{AccumulatedMouseMotion, MouseScrollUnit, MouseWheel}, prelude::*, window::PrimaryWindow};
use std::{f32::consts::FRAC_PI_2, ops::Range};

use crate::config::LanyardSettings;
use crate::error::{LanyardError, LanyardResult};

/// What the drag projection needs to know about the active camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState
{
  pub position: Vec3,
  /// view space from clip space
  pub projection_inverse: Mat4,
  /// world space from view space, i.e. the camera's world matrix
  pub view_inverse: Mat4,
}

impl CameraState
{
  pub fn from_camera(camera: &Camera, transform: &GlobalTransform) -> Self
  {
    Self
    {
      position: transform.translation(),
      projection_inverse: camera.clip_from_view().inverse(),
      view_inverse: transform.compute_matrix(),
    }
  }

  /// NDC point to world space.
  pub fn unproject(&self, ndc: Vec3) -> Vec3
  {
    let view = self.projection_inverse.project_point3(ndc);
    self.view_inverse.transform_point3(view)
  }

  pub fn forward(&self) -> Vec3
  {
    (-self.view_inverse.z_axis.truncate()).normalize_or(Vec3::NEG_Z)
  }
}

/// Cursor position as normalized device coordinates, `+y` up.
pub fn pointer_ndc(window: &Window) -> Option<Vec2>
{
  let cursor = window.cursor_position()?;
  let size = Vec2::new(window.width(), window.height());
  if size.x <= 0.0 || size.y <= 0.0
  {
    return None;
  }
  Some(Vec2::new(cursor.x / size.x * 2.0 - 1.0, 1.0 - cursor.y / size.y * 2.0))
}

/// Camera and pointer as seen this frame.
pub fn frame_camera(cameras: &Query<(&Camera, &GlobalTransform)>) -> LanyardResult<CameraState>
{
  cameras.iter()
    .find(|(camera, _)| camera.is_active)
    .map(|(camera, transform)| CameraState::from_camera(camera, transform))
    .ok_or(LanyardError::MissingCamera)
}

pub fn frame_pointer(windows: &Query<&Window, With<PrimaryWindow>>) -> LanyardResult<Vec2>
{
  let window = windows.single().map_err(|_| LanyardError::MissingPointer)?;
  pointer_ndc(window).ok_or(LanyardError::MissingPointer)
}

#[derive(Debug, Resource)]
pub struct CameraSettings
{
  pub pitch_speed: f32,
  // Clamp pitch to this range
  pub pitch_range: Range<f32>,
  pub yaw_speed: f32,
  pub zoom_speed: f32,
  pub zoom_range: Range<f32>,
}

impl Default for CameraSettings
{
  fn default() -> Self
  {
    // limiting pitch stops some unexpected rotation past 90 degree up or down
    let pitch_limit = FRAC_PI_2 - 0.01;
    Self
    {
      pitch_speed: 0.003,
      pitch_range: -pitch_limit..pitch_limit,
      yaw_speed: 0.004,
      zoom_speed: 0.5,
      zoom_range: 2.0..40.0,
    }
  }
}

fn spawn_camera(mut commands: Commands, settings: Res<LanyardSettings>)
{
  commands.spawn((
    Camera3d::default(),
    Projection::from(PerspectiveProjection {
      fov: settings.camera_fov_degrees.to_radians(),
      ..default()
    }),
    Transform::from_translation(settings.camera_position).looking_at(Vec3::ZERO, Vec3::Y),
  ));
}

// Right drag orbits around the origin, the wheel moves along the view axis.
// The drag projection keys off the camera's distance to the origin, so orbiting
// keeps the drag depth the same.
fn camera_update(
  mut camera: Single<&mut Transform, With<Camera>>,
  camera_settings: Res<CameraSettings>,
  mouse_buttons: Res<ButtonInput<MouseButton>>,
  mouse_motion: Res<AccumulatedMouseMotion>,
  mut evr_scroll: EventReader<MouseWheel>,
)
{
  let delta = mouse_motion.delta;
  let mut delta_yaw = 0.0;
  let mut delta_pitch = 0.0;
  if mouse_buttons.pressed(MouseButton::Right) && (!mouse_buttons.just_pressed(MouseButton::Right))
  {
    delta_yaw = delta.x * camera_settings.yaw_speed;
    delta_pitch = delta.y * camera_settings.pitch_speed;
  }

  let mut distance = camera.translation.length();
  for ev in evr_scroll.read()
  {
    let lines = match ev.unit
    {
      MouseScrollUnit::Line => ev.y,
      // roughly one line per 16 pixels
      MouseScrollUnit::Pixel => ev.y / 16.0,
    };
    distance -= lines * camera_settings.zoom_speed;
  }
  distance = distance.clamp(camera_settings.zoom_range.start, camera_settings.zoom_range.end);

  let (yaw, pitch, roll) = camera.rotation.to_euler(EulerRot::YXZ);
  let pitch = (pitch-delta_pitch).clamp(
    camera_settings.pitch_range.start,
    camera_settings.pitch_range.end,
  );
  let yaw = yaw-delta_yaw;
  camera.rotation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll);
  camera.translation = -camera.forward() * distance;
}

pub struct CameraPlugin;
impl Plugin for CameraPlugin
{
  fn build(&self, app: &mut App)
  {
    app
      .init_resource::<CameraSettings>()
      .add_systems(Startup, spawn_camera)
      .add_systems(Update, camera_update);
  }
}

#[cfg(test)]
mod tests
{
  use super::*;

  fn assert_vec3_equal(a: Vec3, b: Vec3, epslion: f32)
  {
    assert!((a-b).length() < epslion, "{a} != {b}");
  }

  #[test]
  fn test_unproject_center_of_screen()
  {
    let near = 0.1;
    let camera = CameraState
    {
      position: Vec3::new(0.0, 0.0, 13.0),
      projection_inverse: Mat4::perspective_infinite_reverse_rh(25f32.to_radians(), 1.0, near).inverse(),
      view_inverse: Mat4::from_translation(Vec3::new(0.0, 0.0, 13.0)),
    };
    // reverse-z: ndc depth 0.5 sits at twice the near plane
    assert_vec3_equal(camera.unproject(Vec3::new(0.0, 0.0, 0.5)), Vec3::new(0.0, 0.0, 12.8), 1e-4);
    assert_vec3_equal(camera.forward(), Vec3::NEG_Z, 1e-6);
  }
}
