use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gravity3D
{
  pub g: f32,
  pub dir: Vec3,
}

impl Gravity3D
{
  pub fn acceleration(&self) -> Vec3
  {
    self.dir.normalize_or_zero() * self.g
  }
}

impl Default for Gravity3D
{
  fn default() -> Self
  {
    Self { g: 9.81, dir: Vec3::NEG_Y }
  }
}

/// Velocity damping applied after every substep as `v *= 1 / (1 + h * k)`.
///
/// This stays stable for small bodies (tiny inertia) where an explicit
/// `-k * omega` torque would blow up the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Damping3D
{
  pub linear: f32,
  pub angular: f32,
}

impl Damping3D
{
  pub fn linear_scale(&self, h: f32) -> f32
  {
    1.0 / (1.0 + h * self.linear.max(0.0))
  }

  pub fn angular_scale(&self, h: f32) -> f32
  {
    1.0 / (1.0 + h * self.angular.max(0.0))
  }
}

impl Default for Damping3D
{
  fn default() -> Self
  {
    Self { linear: 2.0, angular: 2.0 }
  }
}

#[cfg(test)]
mod tests
{
  use super::*;

  #[test]
  fn gravity_direction_is_normalized()
  {
    let gravity = Gravity3D { g: 2.0, dir: Vec3::new(0.0, -5.0, 0.0) };
    assert_eq!(gravity.acceleration(), Vec3::new(0.0, -2.0, 0.0));
  }

  #[test]
  fn damping_scale_never_amplifies()
  {
    let damping = Damping3D { linear: -1.0, angular: 4.0 };
    assert_eq!(damping.linear_scale(0.1), 1.0);
    assert!(damping.angular_scale(0.1) < 1.0);
  }
}
