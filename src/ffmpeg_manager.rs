//! A process manager that understands FFmpeg's log.

use std::{
  path::Path,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use crate::{
  config::EngineConfig,
  error::{Error, Result},
  event::{CompletionStatus, FfmpegStatus, FileInfo, Stream},
  handlers::EventHandlers,
  log_parser::{parse_ffmpeg_progress, parse_file_info, OUTPUT_PREFIX, PROGRESS_PREFIX, START_BANNER},
  options::ProcessOptions,
  paths::resolve_executable,
  process_manager::{OutputContext, OutputInterpreter, ProcessManager},
  util::quote,
};

#[derive(Debug, Default)]
struct ParseState {
  configured_frame_count: i64,
  started: bool,
  streams: Option<Vec<Stream>>,
  duration: Duration,
  frame_count: i64,
  last_status: Option<FfmpegStatus>,
}

impl ParseState {
  fn file_info(&self) -> Option<FileInfo> {
    self.streams.as_ref().map(|streams| FileInfo {
      streams: streams.clone(),
      duration: self.duration,
      frame_count: self.frame_count,
    })
  }
}

/// Reads FFmpeg's stderr: the input description, the start banner and the
/// progress lines.
///
/// The header is parsed as soon as the `Output #0` section or the start banner
/// shows up, which raises the info-updated event once per run. After the
/// banner (or the first progress line) every `frame=` line becomes a
/// [`FfmpegStatus`] and raises the status-updated event. If the run never gets
/// that far, as with `ffmpeg -i file`, the header is parsed when the output
/// ends.
#[derive(Debug, Default)]
pub struct FfmpegOutputInterpreter {
  state: Mutex<ParseState>,
}

impl FfmpegOutputInterpreter {
  fn state(&self) -> MutexGuard<'_, ParseState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn capture_file_info(&self, ctx: &OutputContext<'_>) {
    let (streams, duration) = parse_file_info(&ctx.output());
    let info = {
      let mut state = self.state();
      state.frame_count = if state.configured_frame_count > 0 {
        state.configured_frame_count
      } else {
        estimate_frame_count(&streams, duration)
      };
      state.duration = duration;
      state.streams = Some(streams);
      state.file_info()
    };
    if let Some(info) = info {
      ctx.events().info_updated(&info);
    }
  }
}

/// Frames implied by the duration and the frame rate of the first video stream.
fn estimate_frame_count(streams: &[Stream], duration: Duration) -> i64 {
  streams
    .iter()
    .find_map(Stream::video_data)
    .map(|video| (duration.as_secs_f64() * video.frame_rate) as i64)
    .unwrap_or(0)
}

impl OutputInterpreter for FfmpegOutputInterpreter {
  fn run_started(&self, host: &ProcessManager) {
    *self.state() = ParseState {
      configured_frame_count: host.options().frame_count,
      ..Default::default()
    };
  }

  fn line_received(&self, ctx: &OutputContext<'_>, line: &str) {
    let header_done = line.starts_with(OUTPUT_PREFIX) || line.starts_with(START_BANNER);
    if header_done && self.state().streams.is_none() {
      self.capture_file_info(ctx);
    }

    let status = {
      let mut state = self.state();
      if line.starts_with(START_BANNER) || line.starts_with(PROGRESS_PREFIX) {
        state.started = true;
      }
      if state.started && line.starts_with(PROGRESS_PREFIX) {
        let status = parse_ffmpeg_progress(line);
        state.last_status = Some(status.clone());
        Some(status)
      } else {
        None
      }
    };
    if let Some(status) = status {
      ctx.events().status_updated(&status);
    }
  }

  fn output_ended(&self, ctx: &OutputContext<'_>) {
    let fallback = {
      let state = self.state();
      !state.started && state.streams.is_none()
    };
    if fallback {
      self.capture_file_info(ctx);
    }
  }
}

/// Runs FFmpeg and tracks what it reports about the input and the encode.
///
/// ```rust,no_run
/// use ffmpeg_shepherd::{config::EngineConfig, ffmpeg_manager::FfmpegProcessManager};
///
/// let manager = FfmpegProcessManager::new(EngineConfig::default());
/// manager.events().on_status_updated(|status| {
///   eprintln!("frame {} at {:.1} fps", status.frame, status.fps);
/// });
/// manager.run_ffmpeg("-i input.mkv -c:v libx264 -y output.mp4").unwrap();
/// println!("{} frames", manager.frame_count());
/// ```
pub struct FfmpegProcessManager {
  inner: ProcessManager,
  interpreter: Arc<FfmpegOutputInterpreter>,
}

impl FfmpegProcessManager {
  pub fn new(config: EngineConfig) -> Self {
    Self::with_options(config, ProcessOptions::default())
  }

  pub fn with_options(config: EngineConfig, options: ProcessOptions) -> Self {
    let interpreter = Arc::new(FfmpegOutputInterpreter::default());
    let mut inner = ProcessManager::with_options(config, options);
    inner.set_interpreter(interpreter.clone());
    Self { inner, interpreter }
  }

  /// Run the configured FFmpeg executable with an argument string.
  pub fn run_ffmpeg(&self, arguments: &str) -> Result<CompletionStatus> {
    self.inner.run(self.inner.config().ffmpeg_path(), arguments)
  }

  /// Decode an Avisynth script with `avs2yuv` and pipe the raw frames into
  /// FFmpeg. `arguments` are FFmpeg's, and should read from `-`.
  pub fn run_avisynth_to_encoder<P: AsRef<Path>>(&self, source: P, arguments: &str) -> Result<CompletionStatus> {
    let source = source.as_ref();
    if source.as_os_str().is_empty() {
      return Err(Error::argument("source cannot be empty"));
    }
    let config = self.inner.config();
    let avs2yuv = resolve_executable(config.avs2yuv_path())?;
    let command = format!(
      "{} {} -o - | {} {}",
      quote(&avs2yuv.to_string_lossy()),
      quote(&source.to_string_lossy()),
      quote(&config.ffmpeg_path().to_string_lossy()),
      arguments
    );
    self.inner.run_as_command(command.trim_end())
  }

  /// Same as [`ProcessManager::run`], with FFmpeg output parsing.
  pub fn run<P: AsRef<Path>>(&self, file_name: P, arguments: &str) -> Result<CompletionStatus> {
    self.inner.run(file_name, arguments)
  }

  pub fn run_as_command(&self, command_line: &str) -> Result<CompletionStatus> {
    self.inner.run_as_command(command_line)
  }

  pub fn cancel(&self) {
    self.inner.cancel()
  }

  pub fn events(&self) -> &EventHandlers {
    self.inner.events()
  }

  pub fn output(&self) -> String {
    self.inner.output()
  }

  pub fn options(&self) -> &ProcessOptions {
    self.inner.options()
  }

  /// Duration of the input, zero until the header is parsed.
  pub fn file_duration(&self) -> Duration {
    self.interpreter.state().duration
  }

  /// The configured frame count if positive, otherwise the frame count
  /// estimated from the input's duration and frame rate, otherwise 0.
  pub fn frame_count(&self) -> i64 {
    self.interpreter.state().frame_count
  }

  /// Streams of the input, `None` until the header is parsed.
  pub fn file_streams(&self) -> Option<Vec<Stream>> {
    self.interpreter.state().streams.clone()
  }

  pub fn file_info(&self) -> Option<FileInfo> {
    self.interpreter.state().file_info()
  }

  pub fn last_status_received(&self) -> Option<FfmpegStatus> {
    self.interpreter.state().last_status.clone()
  }

  /// First video stream of the input.
  pub fn video_stream(&self) -> Option<Stream> {
    self.interpreter.state().streams.as_ref()?.iter().find(|s| s.is_video()).cloned()
  }

  /// First audio stream of the input.
  pub fn audio_stream(&self) -> Option<Stream> {
    self.interpreter.state().streams.as_ref()?.iter().find(|s| s.is_audio()).cloned()
  }

  /// Escape hatch to the generic manager.
  pub fn as_inner(&self) -> &ProcessManager {
    &self.inner
  }

  pub fn as_inner_mut(&mut self) -> &mut ProcessManager {
    &mut self.inner
  }
}
