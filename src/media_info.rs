//! One-shot FFmpeg invocations that inspect rather than encode.

use std::path::Path;

use crate::{
  config::EngineConfig,
  error::{Error, Result},
  event::{CompletionStatus, FileInfo},
  ffmpeg_manager::FfmpegProcessManager,
  log_parser::try_parse_version,
  options::OutputStream,
  process_manager::ProcessManager,
  util::quote,
};

#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";

/// Alias for `ffmpeg -version`, parsing the version number and returning it.
pub fn version(config: &EngineConfig) -> Result<String> {
  let mut manager = ProcessManager::new(config.clone());
  // not stderr when calling `-version`
  manager.set_output_stream(OutputStream::Output);
  let status = manager.run(config.ffmpeg_path(), "-version")?;
  if status != CompletionStatus::Success {
    return Err(Error::msg("ffmpeg -version exited with non-zero status"));
  }
  manager
    .output()
    .lines()
    .find_map(try_parse_version)
    .ok_or_else(|| Error::msg("Failed to parse ffmpeg version"))
}

/// Streams and duration of a media file, from `ffmpeg -i <source>`.
///
/// FFmpeg exits with an error since no output is given; the header it prints
/// first is all that's needed.
pub fn file_info<P: AsRef<Path>>(config: &EngineConfig, source: P) -> Result<FileInfo> {
  let source = require_source(source.as_ref())?;
  let manager = FfmpegProcessManager::new(config.clone());
  manager.run_ffmpeg(&format!("-i {}", quote(&source)))?;
  manager
    .file_info()
    .ok_or_else(|| Error::msg(format!("No stream information for {source}")))
}

/// Exact number of frames of a media file, found by decoding all of it.
///
/// Slow for long files; [`FileInfo::frame_count`] is an estimate that costs
/// nothing.
pub fn frame_count<P: AsRef<Path>>(config: &EngineConfig, source: P) -> Result<i64> {
  let source = require_source(source.as_ref())?;
  let manager = FfmpegProcessManager::new(config.clone());
  let status = manager.run_ffmpeg(&format!("-i {} -f null {NULL_DEVICE}", quote(&source)))?;
  if status != CompletionStatus::Success {
    return Err(Error::msg(format!("Decoding {source} did not complete: {status:?}")));
  }
  Ok(manager.last_status_received().map_or(0, |s| s.frame))
}

fn require_source(source: &Path) -> Result<String> {
  if source.as_os_str().is_empty() {
    return Err(Error::argument("source cannot be empty"));
  }
  Ok(source.to_string_lossy().into_owned())
}
