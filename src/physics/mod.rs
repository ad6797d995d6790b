use bevy::prelude::*;

pub mod body;
pub mod constraint;
pub mod force;
pub mod helper;
pub mod ode;
pub mod rb_system;

use body::BodyHandle;
use rb_system::RigidbodySystem3D;

/// Ties a rendered entity to the simulated body it mirrors.
#[derive(Component, Debug, Clone, Copy)]
pub struct BodyLink(pub BodyHandle);

pub struct PhysicsPlugin;
impl Plugin for PhysicsPlugin
{
  fn build(&self, app: &mut App)
  {
    app
      .init_resource::<RigidbodySystem3D>()
      .add_systems(FixedUpdate, step);
  }
}

fn step(fixed_time: Res<Time<Fixed>>, mut system: ResMut<RigidbodySystem3D>)
{
  system.step(fixed_time.delta_secs());
}

/// Copies body translation and rotation onto the linked transforms.
pub fn sync_transforms(system: Res<RigidbodySystem3D>, mut query: Query<(&BodyLink, &mut Transform)>)
{
  for (link, mut transform) in query.iter_mut()
  {
    match system.body(link.0)
    {
      Some(rb) =>
      {
        transform.translation = rb.x;
        transform.rotation = rb.q;
      }
      None => debug!("{} has no body, transform left as is", link.0),
    }
  }
}
