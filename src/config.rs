//! Engine configuration handed to every process manager.

use std::{
  fmt,
  path::{Path, PathBuf},
  sync::Arc,
};

use crate::{
  paths,
  soft_kill::{SoftKill, SoftKillStrategy},
  ui::UserInterfaceManager,
};

/// Where the engine lives and how runs are displayed and stopped.
///
/// Cheap to clone; managers keep their own copy, so two managers can run
/// with different configurations side by side.
///
/// ```rust
/// use ffmpeg_shepherd::{config::EngineConfig, soft_kill::SoftKillStrategy};
///
/// let config = EngineConfig::default()
///   .with_ffmpeg_path("/opt/ffmpeg/bin/ffmpeg")
///   .with_soft_kill(SoftKillStrategy::QuitKey);
/// assert!(config.user_interface().is_none());
/// ```
#[derive(Clone)]
pub struct EngineConfig {
  ffmpeg_path: PathBuf,
  avs2yuv_path: PathBuf,
  user_interface: Option<Arc<dyn UserInterfaceManager>>,
  soft_kill: Arc<dyn SoftKill>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      ffmpeg_path: paths::ffmpeg_path(),
      avs2yuv_path: paths::avs2yuv_path(),
      user_interface: None,
      soft_kill: Arc::new(SoftKillStrategy::default()),
    }
  }
}

impl fmt::Debug for EngineConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EngineConfig")
      .field("ffmpeg_path", &self.ffmpeg_path)
      .field("avs2yuv_path", &self.avs2yuv_path)
      .field("user_interface", &self.user_interface.is_some())
      .finish_non_exhaustive()
  }
}

impl EngineConfig {
  pub fn with_ffmpeg_path<P: AsRef<Path>>(mut self, path: P) -> Self {
    self.ffmpeg_path = path.as_ref().to_path_buf();
    self
  }

  pub fn with_avs2yuv_path<P: AsRef<Path>>(mut self, path: P) -> Self {
    self.avs2yuv_path = path.as_ref().to_path_buf();
    self
  }

  pub fn with_user_interface(mut self, ui: Arc<dyn UserInterfaceManager>) -> Self {
    self.user_interface = Some(ui);
    self
  }

  pub fn with_soft_kill<K: SoftKill + 'static>(mut self, soft_kill: K) -> Self {
    self.soft_kill = Arc::new(soft_kill);
    self
  }

  /// Path of the FFmpeg executable.
  pub fn ffmpeg_path(&self) -> &Path {
    &self.ffmpeg_path
  }

  /// Path of the `avs2yuv` companion tool.
  pub fn avs2yuv_path(&self) -> &Path {
    &self.avs2yuv_path
  }

  pub fn user_interface(&self) -> Option<&Arc<dyn UserInterfaceManager>> {
    self.user_interface.as_ref()
  }

  pub fn soft_kill(&self) -> &dyn SoftKill {
    self.soft_kill.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builder() {
    let config = EngineConfig::default()
      .with_ffmpeg_path("/opt/ffmpeg/bin/ffmpeg")
      .with_avs2yuv_path("avs2yuv64")
      .with_soft_kill(SoftKillStrategy::QuitKey);
    assert_eq!(config.ffmpeg_path(), Path::new("/opt/ffmpeg/bin/ffmpeg"));
    assert_eq!(config.avs2yuv_path(), Path::new("avs2yuv64"));
    assert!(config.soft_kill().needs_stdin());
    assert!(config.user_interface().is_none());
  }

  #[test]
  fn test_clones_are_independent() {
    let base = EngineConfig::default();
    let other = base.clone().with_ffmpeg_path("ffmpeg6");
    assert_ne!(base.ffmpeg_path(), other.ffmpeg_path());
    assert!(!base.soft_kill().needs_stdin());
  }
}
