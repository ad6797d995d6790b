//! Catmull-Rom band curve and its fixed-size polyline.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::LanyardResult;
use crate::lanyard::chain::Chain;
use crate::physics::rb_system::RigidbodySystem3D;

// intervals shorter than this fall back to their neighbour's length
const MIN_INTERVAL: f32 = 1e-4;

/// Knot parametrization of the spline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CurveType
{
  /// alpha = 0.5, no cusps or self-intersections within a segment
  #[default]
  Centripetal,
  /// alpha = 1
  Chordal,
  /// uniform knots, tangent scaled by `tension`
  CatmullRom { tension: f32 },
}

/// Interpolating spline through exactly four control points.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve3
{
  pub points: [Vec3; 4],
  pub curve_type: CurveType,
}

impl CatmullRomCurve3
{
  pub fn new(points: [Vec3; 4], curve_type: CurveType) -> Self
  {
    Self { points, curve_type }
  }

  /// Point at `t` in `[0, 1]`, passing through every control point.
  pub fn point_at(&self, t: f32) -> Vec3
  {
    debug_assert!(t.is_finite(), "curve parameter {t}");
    let points = &self.points;
    let l = points.len();

    let p = (l - 1) as f32 * t.clamp(0.0, 1.0);
    let mut int_point = p.floor() as usize;
    let mut weight = p - int_point as f32;
    if int_point >= l - 1
    {
      int_point = l - 2;
      weight = 1.0;
    }

    // exact at the knots
    if weight == 0.0
    {
      return points[int_point];
    }
    if weight == 1.0
    {
      return points[int_point + 1];
    }

    let p1 = points[int_point];
    let p2 = points[int_point + 1];
    // open curve: mirror the neighbour past the ends
    let p0 = if int_point > 0 { points[int_point - 1] } else { p1 * 2.0 - p2 };
    let p3 = if int_point + 2 < l { points[int_point + 2] } else { p2 * 2.0 - p1 };

    let poly = match self.curve_type
    {
      CurveType::Centripetal => CubicPoly::nonuniform(p0, p1, p2, p3, 0.25),
      CurveType::Chordal => CubicPoly::nonuniform(p0, p1, p2, p3, 0.5),
      CurveType::CatmullRom { tension } => CubicPoly::uniform(p0, p1, p2, p3, tension),
    };
    poly.eval(weight)
  }
}

// c0 + c1 w + c2 w^2 + c3 w^3, one per axis
struct CubicPoly
{
  c0: Vec3,
  c1: Vec3,
  c2: Vec3,
  c3: Vec3,
}

impl CubicPoly
{
  // Hermite form from endpoints x0, x1 and tangents t0, t1
  fn hermite(x0: Vec3, x1: Vec3, t0: Vec3, t1: Vec3) -> Self
  {
    Self
    {
      c0: x0,
      c1: t0,
      c2: x0 * -3.0 + x1 * 3.0 - t0 * 2.0 - t1,
      c3: x0 * 2.0 - x1 * 2.0 + t0 + t1,
    }
  }

  fn uniform(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, tension: f32) -> Self
  {
    Self::hermite(p1, p2, (p2 - p0) * tension, (p3 - p1) * tension)
  }

  // `pow` is applied to squared distances, 0.25 -> centripetal, 0.5 -> chordal
  fn nonuniform(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, pow: f32) -> Self
  {
    let mut dt0 = p0.distance_squared(p1).powf(pow);
    let mut dt1 = p1.distance_squared(p2).powf(pow);
    let mut dt2 = p2.distance_squared(p3).powf(pow);

    if dt1 < MIN_INTERVAL { dt1 = 1.0; }
    if dt0 < MIN_INTERVAL { dt0 = dt1; }
    if dt2 < MIN_INTERVAL { dt2 = dt1; }

    // tangents on [0, dt1], rescaled to [0, 1]
    let t1 = (p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1;
    let t2 = (p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2;
    Self::hermite(p1, p2, t1 * dt1, t2 * dt1)
  }

  fn eval(&self, w: f32) -> Vec3
  {
    let w2 = w * w;
    let w3 = w2 * w;
    self.c0 + self.c1 * w + self.c2 * w2 + self.c3 * w3
  }
}

/// Owns the band curve and the polyline handed to the renderer.
///
/// The polyline is sized once; every resample overwrites it in place.
#[derive(Debug, Clone)]
pub struct BandSampler
{
  curve: CatmullRomCurve3,
  polyline: Vec<Vec3>,
}

impl BandSampler
{
  pub fn new(point_count: usize, curve_type: CurveType) -> Self
  {
    // a polyline needs both ends
    let point_count = point_count.max(2);
    Self
    {
      curve: CatmullRomCurve3::new([Vec3::ZERO; 4], curve_type),
      polyline: vec![Vec3::ZERO; point_count],
    }
  }

  pub fn polyline(&self) -> &[Vec3]
  {
    &self.polyline
  }

  pub fn set_curve_type(&mut self, curve_type: CurveType)
  {
    self.curve.curve_type = curve_type;
  }

  /// Rebuilds the curve from `points` and evaluates it at `t = i / (n - 1)`.
  pub fn resample(&mut self, points: [Vec3; 4])
  {
    self.curve.points = points;
    let last = (self.polyline.len() - 1) as f32;
    for (i, out) in self.polyline.iter_mut().enumerate()
    {
      *out = self.curve.point_at(i as f32 / last);
    }
  }

  /// Resamples from the chain's current body positions.
  ///
  /// On error the previous polyline stays untouched.
  pub fn sample_chain(&mut self, system: &RigidbodySystem3D, chain: &Chain) -> LanyardResult<()>
  {
    let points = chain.key_positions(system)?;
    self.resample(points);
    Ok(())
  }
}

#[cfg(test)]
mod tests
{
  use super::*;
  use proptest::prelude::*;

  fn assert_vec3_equal(a: Vec3, b: Vec3, epslion: f32)
  {
    assert!((a-b).length() < epslion, "{a} != {b}");
  }

  fn vec3() -> impl Strategy<Value = Vec3>
  {
    (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
  }

  #[test]
  fn test_curve_passes_through_control_points()
  {
    let points = [
      Vec3::new(1.5, 0.0, 0.0),
      Vec3::new(1.0, 0.3, 0.0),
      Vec3::new(0.5, -0.2, 0.1),
      Vec3::ZERO,
    ];
    for curve_type in [CurveType::Centripetal, CurveType::Chordal, CurveType::CatmullRom { tension: 0.5 }]
    {
      let curve = CatmullRomCurve3::new(points, curve_type);
      assert_eq!(curve.point_at(0.0), points[0]);
      assert_eq!(curve.point_at(1.0), points[3]);
    }
  }

  #[test]
  fn test_parameter_is_clamped()
  {
    let points = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
    let curve = CatmullRomCurve3::new(points, CurveType::Centripetal);
    assert_eq!(curve.point_at(-3.0), points[0]);
    assert_eq!(curve.point_at(7.5), points[3]);
  }

  #[test]
  #[cfg(debug_assertions)]
  #[should_panic(expected = "curve parameter")]
  fn test_nan_parameter_is_rejected()
  {
    let curve = CatmullRomCurve3::new([Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z], CurveType::Centripetal);
    curve.point_at(f32::NAN);
  }

  #[test]
  fn test_straight_line_stays_straight()
  {
    let points = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::X * 3.0];
    let curve = CatmullRomCurve3::new(points, CurveType::Centripetal);
    for i in 0..=30
    {
      let t = i as f32 / 30.0;
      assert_vec3_equal(curve.point_at(t), Vec3::X * (3.0 * t), 1e-4);
    }
  }

  #[test]
  fn test_coincident_points_do_not_blow_up()
  {
    let p = Vec3::new(2.0, -1.0, 0.5);
    let mut sampler = BandSampler::new(32, CurveType::Centripetal);
    sampler.resample([p; 4]);
    for out in sampler.polyline()
    {
      assert_vec3_equal(*out, p, 1e-5);
    }
  }

  #[test]
  fn test_resample_reuses_buffer()
  {
    let mut sampler = BandSampler::new(32, CurveType::Centripetal);
    let before = sampler.polyline().as_ptr();
    sampler.resample([Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z]);
    sampler.resample([Vec3::Z, Vec3::Y, Vec3::X, Vec3::ZERO]);
    assert_eq!(sampler.polyline().as_ptr(), before);
    assert_eq!(sampler.polyline().len(), 32);
  }

  proptest!
  {
    #[test]
    fn polyline_always_has_configured_length(a in vec3(), b in vec3(), c in vec3(), d in vec3())
    {
      let mut sampler = BandSampler::new(32, CurveType::Centripetal);
      sampler.resample([a, b, c, d]);
      prop_assert_eq!(sampler.polyline().len(), 32);
      prop_assert!(sampler.polyline().iter().all(|p| p.is_finite()));
      prop_assert_eq!(sampler.polyline()[0], a);
      prop_assert_eq!(sampler.polyline()[31], d);
    }

    #[test]
    fn resampling_is_idempotent(a in vec3(), b in vec3(), c in vec3(), d in vec3())
    {
      let mut sampler = BandSampler::new(32, CurveType::Centripetal);
      sampler.resample([a, b, c, d]);
      let first: Vec<[u32; 3]> = sampler.polyline().iter().map(|p| p.to_array().map(f32::to_bits)).collect();
      sampler.resample([a, b, c, d]);
      let second: Vec<[u32; 3]> = sampler.polyline().iter().map(|p| p.to_array().map(f32::to_bits)).collect();
      prop_assert_eq!(first, second);
    }

    #[test]
    fn collinear_input_is_finite(a in vec3(), dir in vec3(), s in 0.0f32..2.0)
    {
      let mut sampler = BandSampler::new(32, CurveType::Centripetal);
      sampler.resample([a, a + dir * s, a + dir * (2.0 * s), a + dir * (3.0 * s)]);
      prop_assert!(sampler.polyline().iter().all(|p| p.is_finite()));
    }
  }
}
