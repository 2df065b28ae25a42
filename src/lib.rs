//! Run a standalone FFmpeg binary as a supervised child process, with parsed
//! progress, cancellation, timeouts and a time-left estimate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ffmpeg_shepherd::{
//!   config::EngineConfig, error::Result, ffmpeg_manager::FfmpegProcessManager,
//!   time_left::TimeLeftCalculator,
//! };
//! use std::sync::Mutex;
//!
//! fn main() -> Result<()> {
//!   let manager = FfmpegProcessManager::new(EngineConfig::default()); // <- ffmpeg next to the exe or on PATH
//!   let eta = Mutex::new(TimeLeftCalculator::new(0)?);
//!   manager.events().on_info_updated(|info| {
//!     eprintln!("{} streams, {:?}", info.streams.len(), info.duration); // <- parsed input header
//!   });
//!   manager.events().on_status_updated(move |status| {
//!     let mut eta = eta.lock().unwrap();
//!     eta.calculate(status.frame); // <- smoothed over the last 20 updates
//!     eprintln!("frame {} ({:.1} fps, {:?} left)", status.frame, eta.result_fps(), eta.result_time_left());
//!   });
//!   let status = manager.run_ffmpeg("-i input.mkv -c:v libx264 -y output.mp4")?; // <- blocks until exit
//!   println!("{status:?}");
//!   Ok(())
//! }
//! ```


pub mod comma_iter;
pub mod config;
pub mod error;
pub mod event;
pub mod ffmpeg_manager;
pub mod handlers;
pub mod log_parser;
pub mod media_info;
pub mod options;
pub mod paths;
pub mod process_manager;
pub mod read_until_any;
pub mod soft_kill;
pub mod time_left;
pub mod ui;
pub mod util;
