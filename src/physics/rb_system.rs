use bevy::prelude::*;
use super::body::*;
use super::constraint::*;
use super::force::*;
use super::helper::*;
use super::ode::*;
use crate::error::{LanyardError, LanyardResult};

#[derive(Resource)]
pub struct RigidbodySystem3D
{
  pub bodies: Vec<Rigidbody3D>,
  // static after setup
  pub constraints: Vec<Constraint3D>,

  // global forces
  pub gravity: Gravity3D,
  pub damping: Damping3D,

  pub integrator: Integrator,
  pub solver_iterations: usize,
  pub substeps: usize,

  // pre-solve (x, q, ω) of every body, reused across steps
  predicted: Vec<(Vec3, Quat, Vec3)>,
}

impl Default for RigidbodySystem3D
{
  fn default() -> Self
  {
    Self
    {
      bodies: Vec::new(),
      constraints: Vec::new(),
      gravity: Gravity3D::default(),
      damping: Damping3D::default(),
      integrator: Integrator::Rk4,
      solver_iterations: 8,
      substeps: 4,
      predicted: Vec::new(),
    }
  }
}

impl RigidbodySystem3D
{
  pub fn insert_body(&mut self, body: Rigidbody3D) -> BodyHandle
  {
    self.bodies.push(body);
    BodyHandle(self.bodies.len() - 1)
  }

  pub fn add_constraint(&mut self, constraint: Constraint3D)
  {
    self.constraints.push(constraint);
  }

  pub fn constraints(&self) -> &[Constraint3D]
  {
    &self.constraints
  }

  pub fn body(&self, handle: BodyHandle) -> Option<&Rigidbody3D>
  {
    self.bodies.get(handle.0)
  }

  pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Rigidbody3D>
  {
    self.bodies.get_mut(handle.0)
  }

  fn try_body_mut(&mut self, handle: BodyHandle) -> LanyardResult<&mut Rigidbody3D>
  {
    self.bodies.get_mut(handle.0).ok_or(LanyardError::UninitializedBody(handle))
  }

  pub fn translation(&self, handle: BodyHandle) -> Option<Vec3>
  {
    self.body(handle).map(|rb| rb.x)
  }

  pub fn orientation(&self, handle: BodyHandle) -> Option<Quat>
  {
    self.body(handle).map(|rb| rb.q)
  }

  pub fn mode(&self, handle: BodyHandle) -> Option<Rigidbody3DKind>
  {
    self.body(handle).map(|rb| rb.kind)
  }

  pub fn angular_velocity(&self, handle: BodyHandle) -> Option<Vec3>
  {
    self.body(handle).map(|rb| rb.omega)
  }

  pub fn set_angular_velocity(&mut self, handle: BodyHandle, omega: Vec3) -> LanyardResult<()>
  {
    self.try_body_mut(handle)?.set_angular_velocity(omega);
    Ok(())
  }

  /// Switches between dynamic and kinematic-position mode.
  ///
  /// Linear velocity carries over, so a body released from a drag keeps the
  /// motion the drag gave it. Angular velocity leaves kinematic mode at zero.
  pub fn set_mode(&mut self, handle: BodyHandle, kind: Rigidbody3DKind) -> LanyardResult<()>
  {
    let rb = self.try_body_mut(handle)?;
    if rb.kind == kind
    {
      return Ok(());
    }
    let was = rb.kind;
    rb.kind = kind;
    rb.kinematic_target = None;
    if kind == Rigidbody3DKind::Dynamic
    {
      let v = rb.v;
      // a kinematic body holds its orientation, whatever omega was written meanwhile
      let omega = if was == Rigidbody3DKind::KinematicPosition { Vec3::ZERO } else { rb.omega };
      rb.set_linear_velocity(v);
      rb.set_angular_velocity(omega);
    }
    Ok(())
  }

  /// Position a kinematic body reaches at the end of the next step and then
  /// holds until a new target is set or the mode changes.
  pub fn set_kinematic_target(&mut self, handle: BodyHandle, position: Vec3) -> LanyardResult<()>
  {
    let rb = self.try_body_mut(handle)?;
    rb.kinematic_target = Some(KinematicTarget::new(rb.x, position));
    Ok(())
  }

  pub fn step(&mut self, delta_secs: f32)
  {
    if !(delta_secs.is_finite() && delta_secs > 0.0)
    {
      return;
    }

    let substeps = self.substeps.max(1);
    let h = delta_secs / substeps as f32;
    for k in 0..substeps
    {
      self.substep(h, substeps - k);
    }
  }

  fn substep(&mut self, h: f32, remaining: usize)
  {
    let gravity = self.gravity.acceleration();
    let damping = self.damping;
    let integrator = self.integrator;

    /////////////////////////////////////////////////////////////////////////////////////
    //~ predict

    self.predicted.clear();
    for rb in self.bodies.iter_mut()
    {
      match rb.kind
      {
        Rigidbody3DKind::Dynamic =>
        {
          let mass = rb.mass;
          let Ibodyinv = rb.Ibodyinv;
          let state_next = integrator.integrate(&rb.state(), h, |X: &[f32; 13]| {
            RigidbodySystem3D::dxdt(X, mass, Ibodyinv, gravity)
          });
          rb.state_set(&state_next);

          rb.P *= damping.linear_scale(h);
          rb.L *= damping.angular_scale(h);
          rb.refresh_derived();
        }
        Rigidbody3DKind::KinematicPosition =>
        {
          // cover the remaining distance evenly over the remaining substeps
          let v = match rb.kinematic_target.as_mut()
          {
            Some(target) => target.advance(&mut rb.x, h, remaining),
            None => Vec3::ZERO,
          };
          rb.set_linear_velocity(v);
          rb.set_angular_velocity(Vec3::ZERO);
        }
        Rigidbody3DKind::Fixed => {}
      }
      self.predicted.push((rb.x, rb.q, rb.omega));
    }

    /////////////////////////////////////////////////////////////////////////////////////
    //~ project constraints

    solve_constraints(&mut self.bodies, &self.constraints, self.solver_iterations);

    /////////////////////////////////////////////////////////////////////////////////////
    //~ fold positional corrections back into momentum

    for (rb, (x_pred, q_pred, omega_pred)) in self.bodies.iter_mut().zip(self.predicted.iter())
    {
      if !rb.is_dynamic()
      {
        continue;
      }

      let v = rb.v + (rb.x - *x_pred) / h;

      let mut omega = *omega_pred;
      if rb.q != *q_pred
      {
        let mut dq = rb.q * q_pred.inverse();
        if dq.w < 0.0
        {
          dq = -dq;
        }
        omega += Vec3::new(dq.x, dq.y, dq.z) * (2.0 / h);
      }

      rb.refresh_derived();
      rb.set_linear_velocity(v);
      rb.set_angular_velocity(omega);
    }
  }

  // d/dt [x, q, P, L] = [v, 1/2 ω q, F, τ]
  fn dxdt(X: &[f32; 13], mass: f32, Ibodyinv: Mat3, gravity: Vec3) -> [f32; 13]
  {
    let q = Quat::from_xyzw(X[3], X[4], X[5], X[6]).normalize();
    let P = Vec3::new(X[7], X[8], X[9]);
    let L = Vec3::new(X[10], X[11], X[12]);

    let v = P * (1.0/mass);
    let omega = world_inertia_inv(q, Ibodyinv) * L;
    let qdot = Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0) * q * 0.5;
    let F = gravity * mass;

    [
      v.x, v.y, v.z,
      qdot.x, qdot.y, qdot.z, qdot.w,
      F.x, F.y, F.z,
      0.0, 0.0, 0.0,
    ]
  }

  /// Largest amount any rope is stretched beyond its rest length.
  pub fn max_rope_stretch(&self) -> f32
  {
    self.constraints.iter()
      .filter(|c| matches!(c, Constraint3D::Rope(_)))
      .filter_map(|c| c.violation(&self.bodies))
      .fold(0.0, f32::max)
  }
}
