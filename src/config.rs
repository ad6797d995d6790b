//! Tunables for the lanyard scene.
//!
//! Defaults reproduce the badge scene. A JSON file can override any subset of
//! fields; everything not named keeps its default.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::lanyard::curve::CurveType;
use crate::physics::force::{Damping3D, Gravity3D};
use crate::physics::ode::Integrator;

pub const DEFAULT_CONFIG_PATH: &str = "lanyard.json";
pub const CONFIG_PATH_ENV: &str = "LANYARD_CONFIG";

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanyardSettings
{
  // chain layout, world space
  pub anchor: Vec3,
  pub links: [Vec3; 3],
  pub card: Vec3,

  pub rope_length: f32,
  /// Where the lanyard clips onto the card, in card space.
  pub card_joint_offset: Vec3,
  pub link_radius: f32,
  pub link_mass: f32,
  pub card_half_extents: Vec3,
  pub card_mass: f32,

  // band
  pub band_points: usize,
  pub curve_type: CurveType,

  // drag
  pub settling_factor: f32,
  /// NDC depth used when unprojecting the pointer.
  pub unproject_depth: f32,

  // physics
  pub gravity: Gravity3D,
  pub damping: Damping3D,
  pub integrator: Integrator,
  pub solver_iterations: usize,
  pub substeps: usize,
  pub fixed_hz: f64,

  // camera
  pub camera_position: Vec3,
  pub camera_fov_degrees: f32,

  pub debug_draw: bool,
}

impl Default for LanyardSettings
{
  fn default() -> Self
  {
    Self
    {
      anchor: Vec3::new(0.0, 4.0, 0.0),
      links: [
        Vec3::new(0.5, 4.0, 0.0),
        Vec3::new(1.0, 4.0, 0.0),
        Vec3::new(1.5, 4.0, 0.0),
      ],
      card: Vec3::new(2.0, 4.0, 0.0),

      rope_length: 1.0,
      card_joint_offset: Vec3::new(0.0, 1.45, 0.0),
      link_radius: 0.1,
      link_mass: 0.1,
      card_half_extents: Vec3::new(0.8, 1.125, 0.01),
      card_mass: 1.0,

      band_points: 32,
      curve_type: CurveType::Centripetal,

      settling_factor: 0.25,
      unproject_depth: 0.5,

      gravity: Gravity3D { g: 40.0, dir: Vec3::NEG_Y },
      damping: Damping3D { linear: 2.0, angular: 2.0 },
      integrator: Integrator::Rk4,
      solver_iterations: 8,
      substeps: 4,
      fixed_hz: 60.0,

      camera_position: Vec3::new(0.0, 0.0, 13.0),
      camera_fov_degrees: 25.0,

      debug_draw: false,
    }
  }
}

impl LanyardSettings
{
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError>
  {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    Self::from_json(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
  }

  pub fn from_json(text: &str) -> Result<Self, serde_json::Error>
  {
    serde_json::from_str(text)
  }

  /// `$LANYARD_CONFIG` if set, otherwise `lanyard.json` in the working directory.
  pub fn config_path() -> PathBuf
  {
    std::env::var_os(CONFIG_PATH_ENV)
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
  }
}

/// Replaces the default settings with the config file, if there is a usable one.
pub fn load_settings(mut settings: ResMut<LanyardSettings>)
{
  let path = LanyardSettings::config_path();
  match LanyardSettings::load(&path)
  {
    Ok(loaded) =>
    {
      info!("loaded lanyard settings from {}", path.display());
      *settings = loaded;
    }
    Err(e) if e.is_not_found() => debug!("no {}, using default settings", path.display()),
    Err(e) => warn!("{e}; using default settings"),
  }
}
