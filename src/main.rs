use std::{
  io::Write,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ffmpeg_shepherd::{
  config::EngineConfig,
  event::{CompletionStatus, FileInfo},
  ffmpeg_manager::FfmpegProcessManager,
  media_info,
  options::{DisplayMode, ProcessOptions},
  process_manager::ProcessManager,
  time_left::{TimeLeftCalculator, DEFAULT_HISTORY_LENGTH},
  ui::{UserInterface, UserInterfaceManager},
  util,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Path of the FFmpeg executable
  #[arg(long, global = true)]
  ffmpeg: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run FFmpeg with the given arguments, showing progress and time left
  Run {
    /// Stop FFmpeg after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Frames to expect, when FFmpeg can't tell from the input
    #[arg(long, default_value_t = 0)]
    frame_count: i64,

    /// Frames already encoded by earlier runs of the same job
    #[arg(long, default_value_t = 0)]
    resume_pos: i64,

    /// Frames of the whole job, when it spans several runs
    #[arg(long, default_value_t = 0)]
    total_frames: i64,

    /// Progress updates averaged by the time-left estimate
    #[arg(long, default_value_t = DEFAULT_HISTORY_LENGTH)]
    history: usize,

    /// Arguments passed to FFmpeg
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    args: Vec<String>,
  },

  /// Print the FFmpeg version
  Version,

  /// Print the streams and duration of a media file
  Info { input: PathBuf },

  /// Count the frames of a media file by decoding it
  Frames { input: PathBuf },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  let args = Args::parse();
  let mut config = EngineConfig::default().with_user_interface(Arc::new(ConsoleInterface));
  if let Some(path) = args.ffmpeg {
    config = config.with_ffmpeg_path(path);
  }
  debug!(?config, "engine configuration");

  match args.command {
    Commands::Run {
      timeout,
      frame_count,
      resume_pos,
      total_frames,
      history,
      args,
    } => {
      let options = ProcessOptions::new(DisplayMode::ErrorOnly)
        .timeout(Duration::from_secs(timeout.unwrap_or(0)))
        .frame_count(frame_count)
        .resume_pos(resume_pos)
        .total_frame_count(total_frames);
      run(config, options, history, &args)
    }
    Commands::Version => {
      println!("{}", media_info::version(&config)?);
      Ok(())
    }
    Commands::Info { input } => {
      let info = media_info::file_info(&config, &input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
      print_file_info(&info);
      Ok(())
    }
    Commands::Frames { input } => {
      let frames = media_info::frame_count(&config, &input)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
      println!("{frames}");
      Ok(())
    }
  }
}

fn run(config: EngineConfig, options: ProcessOptions, history: usize, args: &[String]) -> Result<()> {
  let eta = Arc::new(Mutex::new(TimeLeftCalculator::with_history(options.job_frame_count(), history)?));
  let manager = FfmpegProcessManager::with_options(config, options.clone());

  let (calculator, job) = (eta.clone(), options.clone());
  manager.events().on_info_updated(move |info| {
    info!(streams = info.streams.len(), duration = ?info.duration, frames = info.frame_count, "input");
    if let Ok(mut eta) = calculator.lock() {
      let _ = eta.set_frame_count(job.job_frame_count_for(info.frame_count));
    }
  });

  let (calculator, job) = (eta.clone(), options);
  manager.events().on_status_updated(move |status| {
    let Ok(mut eta) = calculator.lock() else {
      return;
    };
    let position = job.job_position(status.frame);
    eta.calculate(position);
    let total = match eta.frame_count() {
      0 => "?".to_string(),
      n => n.to_string(),
    };
    eprint!(
      "\rframe {}/{} {:>7.1} fps  {:>5}x  {} left   ",
      position,
      total,
      eta.result_fps(),
      status.speed,
      format_duration(eta.result_time_left())
    );
    let _ = std::io::stderr().flush();
  });

  let status = manager.run_ffmpeg(&util::join_args(args))?;
  eprintln!();
  match status {
    CompletionStatus::Success => Ok(()),
    status => bail!("ffmpeg {status:?}"),
  }
}

/// Prints the output of failed runs.
struct ConsoleInterface;

/// Stands in for a progress window; the progress line is printed by the
/// status handler instead.
struct ConsoleWindow;

impl UserInterface for ConsoleWindow {
  fn display_task(&self, _host: &ProcessManager) {}

  fn stop(&self) {}
}

impl UserInterfaceManager for ConsoleInterface {
  fn create_ui(&self, _title: &str, _auto_close: bool) -> Arc<dyn UserInterface> {
    Arc::new(ConsoleWindow)
  }

  fn display_error(&self, host: &ProcessManager) {
    eprintln!();
    eprintln!("{}", host.command_with_args());
    eprint!("{}", host.output());
  }
}

fn print_file_info(info: &FileInfo) {
  println!("duration: {}", format_duration(info.duration));
  println!("frames:   {} (estimated)", info.frame_count);
  for stream in &info.streams {
    match (stream.video_data(), stream.audio_data()) {
      (Some(video), _) => println!(
        "#{} video {} {}x{} {} fps, {} kb/s",
        stream.index, stream.format, video.width, video.height, video.frame_rate, video.bitrate
      ),
      (_, Some(audio)) => println!(
        "#{} audio {} {} Hz {}, {} kb/s",
        stream.index, stream.format, audio.sample_rate, audio.channels, audio.bitrate
      ),
      _ => println!("#{} {}", stream.index, stream.format),
    }
  }
}

fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
