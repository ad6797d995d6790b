//! Error types for the lanyard frame loop and its configuration.
//!
//! None of these are fatal: a frame that hits one of them skips the affected
//! subsystem and the next frame recomputes from the current body state.

use std::path::PathBuf;
use thiserror::Error;

use crate::physics::body::BodyHandle;

/// Result type alias for per-frame operations.
pub type LanyardResult<T> = Result<T, LanyardError>;

/// Reasons a per-frame update is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LanyardError
{
  /// A handle does not resolve to a body (yet).
  #[error("{0} is not initialized")]
  UninitializedBody(BodyHandle),

  /// The chain has not been spawned.
  #[error("chain has not been built")]
  ChainNotBuilt,

  /// No active camera this frame.
  #[error("no active camera")]
  MissingCamera,

  /// Cursor is outside the window or there is no window.
  #[error("no pointer position")]
  MissingPointer,

  /// Unprojection produced a non-finite point.
  #[error("degenerate pointer ray")]
  DegenerateRay,
}

/// Errors raised while loading [`LanyardSettings`](crate::config::LanyardSettings).
#[derive(Debug, Error)]
pub enum ConfigError
{
  #[error("failed to read {path}: {source}")]
  Io
  {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse
  {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

impl ConfigError
{
  /// The file simply isn't there, callers fall back to defaults quietly.
  pub fn is_not_found(&self) -> bool
  {
    matches!(self, ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
  }
}
