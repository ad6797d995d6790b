use bevy::prelude::*;

use crate::config::LanyardSettings;
use crate::error::{LanyardError, LanyardResult};
use crate::physics::body::{BodyHandle, Rigidbody3D};
use crate::physics::constraint::{Constraint3D, RopeConstraint3D, SphericalConstraint3D};
use crate::physics::rb_system::RigidbodySystem3D;

/// The five bodies of the lanyard, anchor first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain
{
  pub anchor: BodyHandle,
  pub link1: BodyHandle,
  pub link2: BodyHandle,
  pub link3: BodyHandle,
  pub card: BodyHandle,
}

impl Chain
{
  /// Inserts the bodies and declares the joints between them.
  ///
  /// anchor -rope- link1 -rope- link2 -rope- link3 -spherical- card
  pub fn build(system: &mut RigidbodySystem3D, settings: &LanyardSettings) -> Self
  {
    let anchor = system.insert_body(Rigidbody3D::fixed(settings.anchor));
    let [p1, p2, p3] = settings.links;
    let link1 = system.insert_body(Rigidbody3D::sphere(p1, settings.link_mass, settings.link_radius));
    let link2 = system.insert_body(Rigidbody3D::sphere(p2, settings.link_mass, settings.link_radius));
    let link3 = system.insert_body(Rigidbody3D::sphere(p3, settings.link_mass, settings.link_radius));
    let card = system.insert_body(Rigidbody3D::cuboid(settings.card, settings.card_mass, settings.card_half_extents * 2.0));

    let chain = Self { anchor, link1, link2, link3, card };
    chain.declare_joints(system, settings.rope_length, settings.card_joint_offset);
    return chain;
  }

  // ropes go anchor outward, the rope-limit pass relies on that order
  fn declare_joints(&self, system: &mut RigidbodySystem3D, rope_length: f32, card_joint_offset: Vec3)
  {
    for (body_a, body_b) in [(self.anchor, self.link1), (self.link1, self.link2), (self.link2, self.link3)]
    {
      system.add_constraint(Constraint3D::Rope(RopeConstraint3D {
        body_a,
        body_b,
        point_a: Vec3::ZERO,
        point_b: Vec3::ZERO,
        max_distance: rope_length,
      }));
    }

    system.add_constraint(Constraint3D::Spherical(SphericalConstraint3D {
      body_a: self.link3,
      body_b: self.card,
      point_a: Vec3::ZERO,
      point_b: card_joint_offset,
    }));
  }

  /// Band control points, card end first: link3, link2, link1, anchor.
  pub fn key_positions(&self, system: &RigidbodySystem3D) -> LanyardResult<[Vec3; 4]>
  {
    let position = |handle: BodyHandle| system.translation(handle).ok_or(LanyardError::UninitializedBody(handle));
    Ok([
      position(self.link3)?,
      position(self.link2)?,
      position(self.link1)?,
      position(self.anchor)?,
    ])
  }

  /// Worst overstretch among this chain's ropes.
  pub fn max_rope_stretch(&self, system: &RigidbodySystem3D) -> f32
  {
    let links = [self.anchor, self.link1, self.link2, self.link3];
    system.constraints().iter()
      .filter(|c| matches!(c, Constraint3D::Rope(r) if links.contains(&r.body_a) && links.contains(&r.body_b)))
      .filter_map(|c| c.violation(&system.bodies))
      .fold(0.0, f32::max)
  }
}
