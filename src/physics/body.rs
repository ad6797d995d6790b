use bevy::prelude::*;
use std::fmt;
use super::helper::*;

/// Stable index of a body inside [`RigidbodySystem3D`](super::rb_system::RigidbodySystem3D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub usize);

impl fmt::Display for BodyHandle
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
  {
    write!(f, "body#{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rigidbody3DKind
{
  Fixed,
  Dynamic,
  /* driven by set_kinematic_target, ignores forces and constraints */
  KinematicPosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rigidbody3DShape
{
  Point,
  Sphere { r: f32 },
  Cuboid { x: f32, y: f32, z: f32 }, /* dimension */
}

/// Where a kinematic body is headed.
///
/// `origin` and `elapsed` track the motion since the target was set, so the
/// body's velocity stays the average over however many steps it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicTarget
{
  pub position: Vec3,
  pub origin: Vec3,
  pub elapsed: f32,
}

impl KinematicTarget
{
  pub fn new(from: Vec3, position: Vec3) -> Self
  {
    Self { position, origin: from, elapsed: 0.0 }
  }

  /// Moves `x` a `1/remaining` share of the way to the target over `h`
  /// seconds and returns the velocity since the target was set.
  pub fn advance(&mut self, x: &mut Vec3, h: f32, remaining: usize) -> Vec3
  {
    *x += (self.position - *x) / remaining.max(1) as f32;
    self.elapsed += h;
    (*x - self.origin) / self.elapsed
  }
}

#[derive(Debug, Clone)]
pub struct Rigidbody3D
{
  pub kind: Rigidbody3DKind,
  pub shape: Rigidbody3DShape,

  // constant quantities
  pub mass: f32,
  pub Ibody: Mat3,
  pub Ibodyinv: Mat3,

  // state variables
  pub x: Vec3, /* position */
  pub q: Quat, /* rotation */
  pub P: Vec3, /* linear momentum */
  pub L: Vec3, /* angular momentum */

  // derived quantities (auxiliary variables)
  pub R: Mat3, /* rotation matrix, derived from q */
  pub Iinv: Mat3, /* inverse of inertia(world) */
  pub v: Vec3, /* linear velocity */
  pub omega: Vec3, /* angular velocity ω(t) */

  // kept until replaced or the mode changes
  pub kinematic_target: Option<KinematicTarget>,
}

impl Rigidbody3D
{
  fn new(kind: Rigidbody3DKind, shape: Rigidbody3DShape, position: Vec3, mass: f32, Ibody: Mat3, Ibodyinv: Mat3) -> Self
  {
    let mut ret = Self
    {
      kind,
      shape,
      mass,
      Ibody,
      Ibodyinv,

      x: position,
      q: Quat::IDENTITY,
      P: Vec3::ZERO,
      L: Vec3::ZERO,

      R: Mat3::IDENTITY,
      Iinv: Mat3::ZERO,
      v: Vec3::ZERO,
      omega: Vec3::ZERO,

      kinematic_target: None,
    };
    ret.refresh_derived();
    return ret;
  }

  pub fn cuboid(position: Vec3, mass: f32, dim: Vec3) -> Self
  {
    Self::new(
      Rigidbody3DKind::Dynamic,
      Rigidbody3DShape::Cuboid { x: dim.x, y: dim.y, z: dim.z },
      position,
      mass,
      inertia_from_cuboid(mass, dim),
      inertiainv_from_cuboid(mass, dim),
    )
  }

  pub fn sphere(position: Vec3, mass: f32, r: f32) -> Self
  {
    Self::new(
      Rigidbody3DKind::Dynamic,
      Rigidbody3DShape::Sphere { r },
      position,
      mass,
      inertia_from_sphere(mass, r),
      inertiainv_from_sphere(mass, r),
    )
  }

  /// Immovable body, infinite mass.
  pub fn fixed(position: Vec3) -> Self
  {
    Self::new(Rigidbody3DKind::Fixed, Rigidbody3DShape::Point, position, f32::INFINITY, Mat3::ZERO, Mat3::ZERO)
  }

  pub fn is_dynamic(&self) -> bool
  {
    self.kind == Rigidbody3DKind::Dynamic
  }

  // inverse mass as seen by the constraint solver
  pub fn effective_inv_mass(&self) -> f32
  {
    if self.is_dynamic() && self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
  }

  pub fn effective_inv_inertia(&self) -> Mat3
  {
    if self.is_dynamic() { world_inertia_inv(self.q, self.Ibodyinv) } else { Mat3::ZERO }
  }

  /// Recompute R, Iinv, v and omega from the state variables.
  pub fn refresh_derived(&mut self)
  {
    self.q = self.q.normalize();
    self.R = Mat3::from_quat(self.q);
    self.Iinv = self.R * (self.Ibodyinv * self.R.transpose());
    if self.mass.is_finite() && self.mass > 0.0
    {
      self.v = self.P * (1.0/self.mass);
      self.omega = self.Iinv * self.L;
    }
  }

  pub fn set_linear_velocity(&mut self, v: Vec3)
  {
    self.v = v;
    if self.mass.is_finite()
    {
      self.P = v * self.mass;
    }
  }

  pub fn set_angular_velocity(&mut self, omega: Vec3)
  {
    self.omega = omega;
    // L = I(t) ω(t), I(t) = R Ibody R^T
    self.L = self.R * (self.Ibody * (self.R.transpose() * omega));
  }

  /// Packs `[x, q, P, L]` for the integrator.
  pub fn state(&self) -> [f32; 13]
  {
    [
      self.x.x, self.x.y, self.x.z,
      self.q.x, self.q.y, self.q.z, self.q.w,
      self.P.x, self.P.y, self.P.z,
      self.L.x, self.L.y, self.L.z,
    ]
  }

  pub fn state_set(&mut self, X: &[f32; 13])
  {
    self.x = Vec3::new(X[0], X[1], X[2]);
    self.q = Quat::from_xyzw(X[3], X[4], X[5], X[6]);
    self.P = Vec3::new(X[7], X[8], X[9]);
    self.L = Vec3::new(X[10], X[11], X[12]);
    self.refresh_derived();
  }
}
