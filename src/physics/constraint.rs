use bevy::prelude::*;
use super::body::*;

// below this separation the constraint direction is undefined
const MIN_SEPARATION: f32 = 1e-6;

/// One-sided distance constraint: the anchors may come closer than
/// `max_distance` but never drift further apart.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RopeConstraint3D
{
  pub body_a: BodyHandle,
  pub body_b: BodyHandle,
  // position relative to the body's center of mass (in body space)
  pub point_a: Vec3,
  pub point_b: Vec3,
  pub max_distance: f32,
}

/// Pins two body-space anchors together, rotation stays free.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphericalConstraint3D
{
  pub body_a: BodyHandle,
  pub body_b: BodyHandle,
  // position relative to the body's center of mass (in body space)
  pub point_a: Vec3,
  pub point_b: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Constraint3D
{
  Rope(RopeConstraint3D),
  Spherical(SphericalConstraint3D),
}

impl Constraint3D
{
  pub fn bodies(&self) -> (BodyHandle, BodyHandle)
  {
    match self
    {
      Constraint3D::Rope(c) => (c.body_a, c.body_b),
      Constraint3D::Spherical(c) => (c.body_a, c.body_b),
    }
  }

  pub fn local_points(&self) -> (Vec3, Vec3)
  {
    match self
    {
      Constraint3D::Rope(c) => (c.point_a, c.point_b),
      Constraint3D::Spherical(c) => (c.point_a, c.point_b),
    }
  }

  /// Anchor points in world space, `None` when a handle is dangling.
  pub fn world_anchors(&self, bodies: &[Rigidbody3D]) -> Option<(Vec3, Vec3)>
  {
    let (a, b) = self.bodies();
    let (point_a, point_b) = self.local_points();
    let rb_a = bodies.get(a.0)?;
    let rb_b = bodies.get(b.0)?;
    Some((rb_a.x + rb_a.q.mul_vec3(point_a), rb_b.x + rb_b.q.mul_vec3(point_b)))
  }

  /// How far the constraint is from being satisfied (0 when satisfied).
  pub fn violation(&self, bodies: &[Rigidbody3D]) -> Option<f32>
  {
    let (pos_a, pos_b) = self.world_anchors(bodies)?;
    let d = pos_a.distance(pos_b);
    match self
    {
      Constraint3D::Rope(c) => Some((d - c.max_distance).max(0.0)),
      Constraint3D::Spherical(_) => Some(d),
    }
  }

  /// One positional projection step.
  ///
  /// The correction is split between the bodies by their generalized inverse
  /// mass `1/m + (r × n) · I⁻¹ (r × n)`, so off-center anchors also rotate
  /// the body. Fixed and kinematic bodies report zero and never move.
  pub fn solve(&self, bodies: &mut [Rigidbody3D])
  {
    let Some((pos_a, pos_b)) = self.world_anchors(bodies) else { return; };
    let delta = pos_b - pos_a;
    let d = delta.length();
    if d < MIN_SEPARATION
    {
      return;
    }

    let C = match self
    {
      Constraint3D::Rope(c) => d - c.max_distance,
      Constraint3D::Spherical(_) => d,
    };
    if C <= 0.0
    {
      return;
    }

    let n = delta / d;
    let (a, b) = self.bodies();

    let (r_a, inv_m_a, Iinv_a) =
    {
      let rb = &bodies[a.0];
      (pos_a - rb.x, rb.effective_inv_mass(), rb.effective_inv_inertia())
    };
    let (r_b, inv_m_b, Iinv_b) =
    {
      let rb = &bodies[b.0];
      (pos_b - rb.x, rb.effective_inv_mass(), rb.effective_inv_inertia())
    };

    let rn_a = r_a.cross(n);
    let rn_b = r_b.cross(n);
    let w = inv_m_a + rn_a.dot(Iinv_a * rn_a) + inv_m_b + rn_b.dot(Iinv_b * rn_b);
    if w <= 0.0
    {
      return;
    }

    // a is pulled toward b, b toward a
    let p = n * (C / w);
    apply_correction(&mut bodies[a.0], p, r_a, inv_m_a, Iinv_a);
    apply_correction(&mut bodies[b.0], -p, r_b, inv_m_b, Iinv_b);
  }
}

fn apply_correction(rb: &mut Rigidbody3D, p: Vec3, r: Vec3, inv_m: f32, Iinv: Mat3)
{
  if inv_m == 0.0
  {
    return;
  }
  rb.x += p * inv_m;

  // q <- q + 1/2 [Iinv (r × p), 0] q
  let dtheta = Iinv * r.cross(p);
  let dq = Quat::from_xyzw(dtheta.x, dtheta.y, dtheta.z, 0.0) * rb.q;
  rb.q = (rb.q + dq * 0.5).normalize();
}

/// Gauss-Seidel sweeps over every constraint, then a final rope-limit pass.
pub fn solve_constraints(bodies: &mut [Rigidbody3D], constraints: &[Constraint3D], iterations: usize)
{
  for _ in 0..iterations
  {
    for c in constraints.iter()
    {
      c.solve(bodies);
    }
  }
  enforce_rope_limits(bodies, constraints);
}

/// Walks the ropes in declaration order and clamps the free end back onto
/// the max-distance sphere.
///
/// Ropes are declared anchor outward, so each clamp only moves a body whose
/// parent has already been settled and the whole chain ends up within its
/// rest lengths.
pub fn enforce_rope_limits(bodies: &mut [Rigidbody3D], constraints: &[Constraint3D])
{
  for c in constraints.iter()
  {
    let Constraint3D::Rope(rope) = c else { continue; };
    let Some((pos_a, pos_b)) = c.world_anchors(bodies) else { continue; };
    let delta = pos_b - pos_a;
    let d = delta.length();
    if d <= rope.max_distance || d < MIN_SEPARATION
    {
      continue;
    }

    let excess = (delta / d) * (d - rope.max_distance);
    if bodies[rope.body_b.0].is_dynamic()
    {
      bodies[rope.body_b.0].x -= excess;
    }
    else if bodies[rope.body_a.0].is_dynamic()
    {
      bodies[rope.body_a.0].x += excess;
    }
  }
}
