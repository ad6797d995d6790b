use bevy::prelude::*;

pub fn inertia_from_cuboid(M: f32, dim: Vec3) -> Mat3
{
  let Vec3 {x: x0, y: y0, z: z0} = dim;
  return Mat3::from_diagonal(Vec3::new(
    (y0*y0+z0*z0) * (M/12.0),
    (x0*x0+z0*z0) * (M/12.0),
    (x0*x0+y0*y0) * (M/12.0),
  ));
}

pub fn inertiainv_from_cuboid(M: f32, dim: Vec3) -> Mat3
{
  let Vec3 {x: x0, y: y0, z: z0} = dim;
  return Mat3::from_diagonal(Vec3::new(
    12.0 / ((y0*y0+z0*z0)*M),
    12.0 / ((x0*x0+z0*z0)*M),
    12.0 / ((x0*x0+y0*y0)*M),
  ));
}

// solid sphere: I = 2/5 * M * r^2 on every axis
pub fn inertia_from_sphere(M: f32, r: f32) -> Mat3
{
  return Mat3::from_diagonal(Vec3::splat(0.4 * M * r * r));
}

pub fn inertiainv_from_sphere(M: f32, r: f32) -> Mat3
{
  return Mat3::from_diagonal(Vec3::splat(1.0 / (0.4 * M * r * r)));
}

/// World-space inverse inertia `R * Ibody^-1 * R^T` for orientation `q`.
pub fn world_inertia_inv(q: Quat, Ibodyinv: Mat3) -> Mat3
{
  let R = Mat3::from_quat(q);
  return R * (Ibodyinv * R.transpose());
}

#[cfg(test)]
mod tests
{
  use super::*;

  fn assert_f32_equal(a: f32, b: f32, epslion: f32)
  {
    assert!((a-b).abs() < epslion, "{a} != {b}");
  }

  #[test]
  fn test_inertia_cuboid()
  {
    let mass: f32 = 1.0;
    let dim: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    let inertia = inertia_from_cuboid(mass, dim);
    assert_f32_equal(inertia.row(0)[0], 0.1667, 0.001);
    assert_f32_equal(inertia.row(1)[1], 0.1667, 0.001);
    assert_f32_equal(inertia.row(2)[2], 0.1667, 0.001);

    let inertia_inv = inertiainv_from_cuboid(mass, dim);
    assert_f32_equal(inertia_inv.row(0)[0], 6.0, 0.001);
    assert_f32_equal(inertia_inv.row(1)[1], 6.0, 0.001);
    assert_f32_equal(inertia_inv.row(2)[2], 6.0, 0.001);
  }

  #[test]
  fn test_inertia_sphere()
  {
    let inertia = inertia_from_sphere(2.0, 0.5);
    let inertia_inv = inertiainv_from_sphere(2.0, 0.5);
    assert_f32_equal(inertia.row(1)[1], 0.2, 0.0001);

    let identity = inertia * inertia_inv;
    for i in 0..3
    {
      assert_f32_equal(identity.row(i)[i], 1.0, 0.0001);
    }
  }

  #[test]
  fn test_world_inertia_inv_sphere_is_rotation_invariant()
  {
    let Ibodyinv = inertiainv_from_sphere(1.0, 0.1);
    let q = Quat::from_rotation_z(0.7) * Quat::from_rotation_x(-1.2);
    let Iinv = world_inertia_inv(q, Ibodyinv);
    for i in 0..3
    {
      assert_f32_equal(Iinv.row(i)[i], Ibodyinv.row(i)[i], 0.01);
    }
  }
}
