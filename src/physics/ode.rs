use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Integrator
{
  Euler,
  #[default]
  Rk4,
}

impl Integrator
{
  pub fn integrate<const N: usize, F: FnMut(&[f32; N]) -> [f32; N]>(&self, X: &[f32; N], delta_secs: f32, dxdt: F) -> [f32; N]
  {
    match self
    {
      Integrator::Euler => ode_euler(X, delta_secs, dxdt),
      Integrator::Rk4 => ode_rk4(X, delta_secs, dxdt),
    }
  }
}

// X + a * K
fn axpy<const N: usize>(X: &[f32; N], a: f32, K: &[f32; N]) -> [f32; N]
{
  let mut ret = *X;
  for (x, k) in ret.iter_mut().zip(K.iter())
  {
    *x += a * k;
  }
  return ret;
}

pub fn ode_euler<const N: usize, F: FnMut(&[f32; N]) -> [f32; N]>(X: &[f32; N], delta_secs: f32, mut dxdt: F) -> [f32; N]
{
  let Xdot = dxdt(X);
  return axpy(X, delta_secs, &Xdot);
}

pub fn ode_rk4<const N: usize, F: FnMut(&[f32; N]) -> [f32; N]>(X: &[f32; N], delta_secs: f32, mut dxdt: F) -> [f32; N]
{
  let h = delta_secs;

  // k1 = dX/dt(X)
  let k1 = dxdt(X);
  // k2 = dX/dt(X + h/2 * k1)
  let k2 = dxdt(&axpy(X, 0.5 * h, &k1));
  // k3 = dX/dt(X + h/2 * k2)
  let k3 = dxdt(&axpy(X, 0.5 * h, &k2));
  // k4 = dX/dt(X + h * k3)
  let k4 = dxdt(&axpy(X, h, &k3));

  // X(t + h) = X(t) + h * (k1 + 2*k2 + 2*k3 + k4)/6
  let mut ret = *X;
  for i in 0..N
  {
    ret[i] += h * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]) / 6.0;
  }
  return ret;
}
