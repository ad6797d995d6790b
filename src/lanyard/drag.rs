//! Pointer dragging of the card and the yaw settling heuristic.

use bevy::prelude::*;

use crate::camera::CameraState;
use crate::error::{LanyardError, LanyardResult};
use crate::physics::body::{BodyHandle, Rigidbody3DKind};
use crate::physics::rb_system::RigidbodySystem3D;

// keeps the drag target off the camera when the camera sits at the origin
const MIN_DRAG_DISTANCE: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState
{
  #[default]
  Idle,
  /// `grab_offset` is hit point minus card center, fixed for the whole drag.
  Dragging { grab_offset: Vec3 },
}

/// `Idle -> Dragging -> Idle`, driven by pointer down/up on the card.
#[derive(Debug, Clone, Default)]
pub struct DragController
{
  state: DragState,
}

impl DragController
{
  pub fn state(&self) -> DragState
  {
    self.state
  }

  pub fn is_dragging(&self) -> bool
  {
    matches!(self.state, DragState::Dragging { .. })
  }

  pub fn grab_offset(&self) -> Option<Vec3>
  {
    match self.state
    {
      DragState::Dragging { grab_offset } => Some(grab_offset),
      DragState::Idle => None,
    }
  }

  /// Pointer went down on the card at `hit_point`.
  ///
  /// Captures the grab offset and hands the card over to kinematic control.
  pub fn pointer_down(&mut self, system: &mut RigidbodySystem3D, card: BodyHandle, hit_point: Vec3) -> LanyardResult<Vec3>
  {
    let center = system.translation(card).ok_or(LanyardError::UninitializedBody(card))?;
    let grab_offset = hit_point - center;
    system.set_mode(card, Rigidbody3DKind::KinematicPosition)?;
    self.state = DragState::Dragging { grab_offset };
    debug!("drag start, grab offset {grab_offset}");
    Ok(grab_offset)
  }

  /// Pointer released; the solver takes the card back.
  pub fn pointer_up(&mut self, system: &mut RigidbodySystem3D, card: BodyHandle) -> LanyardResult<()>
  {
    if !self.is_dragging()
    {
      return Ok(());
    }
    self.state = DragState::Idle;
    debug!("drag end");
    system.set_mode(card, Rigidbody3DKind::Dynamic)
  }

  /// Aims the card at the pointer while dragging, no-op when idle.
  pub fn update(&self, system: &mut RigidbodySystem3D, card: BodyHandle, camera: LanyardResult<&CameraState>, pointer: LanyardResult<Vec2>, depth: f32) -> LanyardResult<()>
  {
    let DragState::Dragging { grab_offset } = self.state else { return Ok(()); };
    let target = project_pointer(camera?, pointer?, depth)?;
    system.set_kinematic_target(card, target - grab_offset)
  }
}

/// World point the pointer drags toward.
///
/// Unprojects `(ndc.x, ndc.y, depth)`, then walks from that point along the
/// camera ray by the camera's distance to the world origin. This places the
/// target at a plausible depth instead of intersecting the card's plane, and
/// is what gives the drag its feel.
pub fn project_pointer(camera: &CameraState, ndc: Vec2, depth: f32) -> LanyardResult<Vec3>
{
  let point = camera.unproject(ndc.extend(depth));
  if !point.is_finite()
  {
    return Err(LanyardError::DegenerateRay);
  }
  let dir = (point - camera.position).try_normalize().unwrap_or_else(|| camera.forward());
  let distance = camera.position.length().max(MIN_DRAG_DISTANCE);
  Ok(point + dir * distance)
}

/// Pulls the card's yaw back toward facing the camera.
///
/// `ω.y -= q.y * factor` where `q.y` is the y component of the orientation
/// quaternion (about half the yaw angle for small turns). `ω.x` and `ω.z`,
/// the swing the rope gives the card, are left alone.
pub fn apply_settling(system: &mut RigidbodySystem3D, card: BodyHandle, factor: f32) -> LanyardResult<()>
{
  let omega = system.angular_velocity(card).ok_or(LanyardError::UninitializedBody(card))?;
  let q = system.orientation(card).ok_or(LanyardError::UninitializedBody(card))?;
  system.set_angular_velocity(card, Vec3::new(omega.x, omega.y - q.y * factor, omega.z))
}

#[cfg(test)]
mod tests
{
  use super::*;
  use crate::physics::body::Rigidbody3D;
  use crate::physics::force::Damping3D;

  fn assert_vec3_equal(a: Vec3, b: Vec3, epslion: f32)
  {
    assert!((a-b).length() < epslion, "{a} != {b}");
  }

  fn camera() -> CameraState
  {
    let position = Vec3::new(0.0, 0.0, 13.0);
    CameraState
    {
      position,
      projection_inverse: Mat4::perspective_infinite_reverse_rh(25f32.to_radians(), 1.0, 0.1).inverse(),
      view_inverse: Mat4::from_translation(position),
    }
  }

  fn card_system() -> (RigidbodySystem3D, BodyHandle)
  {
    let mut system = RigidbodySystem3D::default();
    system.gravity.g = 0.0;
    let card = system.insert_body(Rigidbody3D::cuboid(Vec3::new(0.2, 0.1, 0.0), 1.0, Vec3::new(1.6, 2.25, 0.02)));
    (system, card)
  }

  #[test]
  fn test_pointer_down_captures_offset_and_goes_kinematic()
  {
    let (mut system, card) = card_system();
    let mut drag = DragController::default();

    let hit = Vec3::new(0.5, 0.6, 0.01);
    let offset = drag.pointer_down(&mut system, card, hit).unwrap();
    assert_eq!(offset, hit - Vec3::new(0.2, 0.1, 0.0));
    assert_eq!(drag.state(), DragState::Dragging { grab_offset: offset });
    assert_eq!(system.mode(card), Some(Rigidbody3DKind::KinematicPosition));

    drag.pointer_up(&mut system, card).unwrap();
    assert_eq!(drag.state(), DragState::Idle);
    assert_eq!(system.mode(card), Some(Rigidbody3DKind::Dynamic));
  }

  #[test]
  fn test_pointer_up_without_drag_keeps_mode()
  {
    let (mut system, card) = card_system();
    let mut drag = DragController::default();
    drag.pointer_up(&mut system, card).unwrap();
    assert_eq!(system.mode(card), Some(Rigidbody3DKind::Dynamic));
  }

  #[test]
  fn test_press_and_release_without_motion_keeps_card_in_place()
  {
    let (mut system, card) = card_system();
    let mut drag = DragController::default();
    let camera = camera();
    let pointer = Vec2::new(0.1, -0.05);

    let start = system.translation(card).unwrap();
    // grab at exactly where the pointer projects, so the target is the card center
    let hit = project_pointer(&camera, pointer, 0.5).unwrap();
    drag.pointer_down(&mut system, card, hit).unwrap();
    drag.update(&mut system, card, Ok(&camera), Ok(pointer), 0.5).unwrap();
    system.step(1.0 / 60.0);
    drag.pointer_up(&mut system, card).unwrap();

    assert_vec3_equal(system.translation(card).unwrap(), start, 1e-5);
  }

  #[test]
  fn test_drag_follows_pointer()
  {
    let (mut system, card) = card_system();
    let mut drag = DragController::default();
    let camera = camera();

    let hit = project_pointer(&camera, Vec2::ZERO, 0.5).unwrap();
    let offset = drag.pointer_down(&mut system, card, hit).unwrap();

    let moved = Vec2::new(0.3, 0.2);
    drag.update(&mut system, card, Ok(&camera), Ok(moved), 0.5).unwrap();
    system.step(1.0 / 60.0);

    let expected = project_pointer(&camera, moved, 0.5).unwrap() - offset;
    assert_vec3_equal(system.translation(card).unwrap(), expected, 1e-4);
  }

  #[test]
  fn test_update_without_pointer_skips()
  {
    let (mut system, card) = card_system();
    let mut drag = DragController::default();
    drag.pointer_down(&mut system, card, Vec3::ZERO).unwrap();
    let camera = camera();
    assert_eq!(
      drag.update(&mut system, card, Ok(&camera), Err(LanyardError::MissingPointer), 0.5),
      Err(LanyardError::MissingPointer)
    );
    assert_eq!(system.body(card).unwrap().kinematic_target, None);
  }

  #[test]
  fn test_projection_pushes_out_by_camera_distance()
  {
    let target = project_pointer(&camera(), Vec2::ZERO, 0.5).unwrap();
    // near point at z = 12.8, then 13 units along -z
    assert_vec3_equal(target, Vec3::new(0.0, 0.0, -0.2), 1e-3);
  }

  #[test]
  fn test_projection_from_origin_is_finite()
  {
    let camera = CameraState
    {
      position: Vec3::ZERO,
      projection_inverse: Mat4::perspective_infinite_reverse_rh(1.0, 1.0, 0.1).inverse(),
      view_inverse: Mat4::IDENTITY,
    };
    let target = project_pointer(&camera, Vec2::new(0.4, 0.4), 0.5).unwrap();
    assert!(target.is_finite());
  }

  #[test]
  fn test_projection_rejects_broken_matrix()
  {
    let camera = CameraState
    {
      position: Vec3::Z,
      projection_inverse: Mat4::ZERO,
      view_inverse: Mat4::IDENTITY,
    };
    assert_eq!(project_pointer(&camera, Vec2::ZERO, 0.5), Err(LanyardError::DegenerateRay));
  }

  #[test]
  fn test_settling_only_touches_yaw_rate()
  {
    let (mut system, card) = card_system();
    let q = Quat::from_rotation_y(0.8);
    system.body_mut(card).unwrap().q = q;
    system.body_mut(card).unwrap().refresh_derived();
    system.set_angular_velocity(card, Vec3::new(0.3, 1.0, -0.2)).unwrap();

    apply_settling(&mut system, card, 0.25).unwrap();
    let omega = system.angular_velocity(card).unwrap();
    assert_eq!(omega.x, 0.3);
    assert_eq!(omega.z, -0.2);
    assert_eq!(omega.y, 1.0 - q.y * 0.25);
  }

  #[test]
  fn test_settling_converges_to_facing_forward()
  {
    let (mut system, card) = card_system();
    system.damping = Damping3D { linear: 0.0, angular: 2.0 };
    system.body_mut(card).unwrap().q = Quat::from_rotation_y(0.5);
    system.body_mut(card).unwrap().refresh_derived();

    for _ in 0..600
    {
      apply_settling(&mut system, card, 0.25).unwrap();
      system.step(1.0 / 60.0);
    }
    let q = system.orientation(card).unwrap();
    assert!(q.y.abs() < 0.01, "yaw left {}", q.y);
    assert!(system.angular_velocity(card).unwrap().y.abs() < 0.05);
  }

  #[test]
  fn test_settling_during_drag_does_not_spin_on_release()
  {
    let (mut system, card) = card_system();
    system.body_mut(card).unwrap().q = Quat::from_rotation_y(0.6);
    system.body_mut(card).unwrap().refresh_derived();
    let mut drag = DragController::default();
    let center = system.translation(card).unwrap();
    drag.pointer_down(&mut system, card, center).unwrap();

    for _ in 0..300
    {
      apply_settling(&mut system, card, 0.25).unwrap();
      system.step(1.0 / 60.0);
    }
    // one more settling write after the last step, as a frame would do
    apply_settling(&mut system, card, 0.25).unwrap();
    drag.pointer_up(&mut system, card).unwrap();

    let omega = system.angular_velocity(card).unwrap();
    assert!(omega.y.abs() < 1e-6, "spinning at {omega}");
    assert_eq!(system.orientation(card), Some(Quat::from_rotation_y(0.6).normalize()));
  }

  #[test]
  fn test_settling_on_missing_card_fails_softly()
  {
    let mut system = RigidbodySystem3D::default();
    assert_eq!(apply_settling(&mut system, BodyHandle(0), 0.25), Err(LanyardError::UninitializedBody(BodyHandle(0))));
  }
}
