//! Per-run options for the process managers.

use std::{process::Child, time::Duration};

/// How the output of a run is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
  /// Output is captured and events fire, but nothing is displayed.
  #[default]
  None,
  /// The child inherits the console. Output is not captured and no output
  /// events fire.
  Native,
  /// The configured [`UserInterfaceManager`](crate::ui::UserInterfaceManager)
  /// displays the run.
  Interface,
  /// Like `None`, but the user interface shows the captured output when the
  /// run fails or times out.
  ErrorOnly,
}

/// Which of the child's streams is read line by line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStream {
  None,
  Output,
  /// FFmpeg writes its log and progress to stderr.
  #[default]
  Error,
}

/// Scheduling priority of the child process, applied right after spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessPriority {
  Idle,
  BelowNormal,
  /// Leave the inherited priority untouched.
  #[default]
  Normal,
  AboveNormal,
  High,
  RealTime,
}

impl ProcessPriority {
  /// Niceness passed to `setpriority`.
  #[cfg(unix)]
  fn niceness(self) -> libc::c_int {
    match self {
      ProcessPriority::Idle => 19,
      ProcessPriority::BelowNormal => 10,
      ProcessPriority::Normal => 0,
      ProcessPriority::AboveNormal => -5,
      ProcessPriority::High => -10,
      ProcessPriority::RealTime => -20,
    }
  }

  /// Apply this priority to a spawned child. Raising the priority usually
  /// needs elevated rights, so callers treat failure as non-fatal.
  #[cfg(unix)]
  pub(crate) fn apply(self, child: &Child) -> std::io::Result<()> {
    if self == ProcessPriority::Normal {
      return Ok(());
    }
    // SAFETY: plain syscall on a pid we own; no pointers involved.
    let ret = unsafe {
      libc::setpriority(
        libc::PRIO_PROCESS,
        child.id() as libc::id_t,
        self.niceness(),
      )
    };
    if ret == -1 {
      return Err(std::io::Error::last_os_error());
    }
    Ok(())
  }

  #[cfg(windows)]
  pub(crate) fn apply(self, child: &Child) -> std::io::Result<()> {
    use std::os::windows::io::AsRawHandle;
    use winapi::um::{processthreadsapi::SetPriorityClass, winbase};

    let class = match self {
      ProcessPriority::Idle => winbase::IDLE_PRIORITY_CLASS,
      ProcessPriority::BelowNormal => winbase::BELOW_NORMAL_PRIORITY_CLASS,
      ProcessPriority::Normal => return Ok(()),
      ProcessPriority::AboveNormal => winbase::ABOVE_NORMAL_PRIORITY_CLASS,
      ProcessPriority::High => winbase::HIGH_PRIORITY_CLASS,
      ProcessPriority::RealTime => winbase::REALTIME_PRIORITY_CLASS,
    };
    // SAFETY: the handle is owned by `child` and stays valid for this call.
    let ok = unsafe { SetPriorityClass(child.as_raw_handle() as _, class) };
    if ok == 0 {
      return Err(std::io::Error::last_os_error());
    }
    Ok(())
  }
}

/// Options controlling one run of a process manager.
///
/// ```rust
/// use ffmpeg_shepherd::options::{DisplayMode, ProcessOptions};
/// use std::time::Duration;
///
/// let options = ProcessOptions::new(DisplayMode::ErrorOnly)
///   .title("Encoding trailer")
///   .timeout(Duration::from_secs(600))
///   .frame_count(7163);
/// assert!(options.is_main_task);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
  pub display_mode: DisplayMode,
  /// Title shown by the user interface.
  pub title: Option<String>,
  /// Links several runs to the same user interface.
  pub job_id: Option<String>,
  /// When several runs share an interface, whether this one is the main task.
  pub is_main_task: bool,
  pub priority: ProcessPriority,
  /// Zero disables the timeout.
  pub timeout: Duration,
  /// Frames to expect when FFmpeg can't tell from the input. Zero means
  /// estimate from the input duration.
  pub frame_count: i64,
  /// Frames of the whole job when several runs make up one job. Zero means
  /// `frame_count + resume_pos`.
  pub total_frame_count: i64,
  /// Frames done by earlier runs when resuming a job.
  pub resume_pos: i64,
}

impl Default for ProcessOptions {
  fn default() -> Self {
    Self {
      display_mode: DisplayMode::None,
      title: None,
      job_id: None,
      is_main_task: true,
      priority: ProcessPriority::Normal,
      timeout: Duration::ZERO,
      frame_count: 0,
      total_frame_count: 0,
      resume_pos: 0,
    }
  }
}

impl ProcessOptions {
  pub fn new(display_mode: DisplayMode) -> Self {
    Self {
      display_mode,
      ..Default::default()
    }
  }

  /// Options for one task of a job whose runs share a single interface.
  pub fn for_job<S: AsRef<str>, T: AsRef<str>>(job_id: S, title: T, is_main_task: bool) -> Self {
    Self {
      display_mode: DisplayMode::Interface,
      job_id: Some(job_id.as_ref().to_string()),
      title: Some(title.as_ref().to_string()),
      is_main_task,
      ..Default::default()
    }
  }

  pub fn title<S: AsRef<str>>(mut self, title: S) -> Self {
    self.title = Some(title.as_ref().to_string());
    self
  }

  pub fn priority(mut self, priority: ProcessPriority) -> Self {
    self.priority = priority;
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn frame_count(mut self, frame_count: i64) -> Self {
    self.frame_count = frame_count;
    self
  }

  pub fn resume_pos(mut self, resume_pos: i64) -> Self {
    self.resume_pos = resume_pos;
    self
  }

  pub fn total_frame_count(mut self, total_frame_count: i64) -> Self {
    self.total_frame_count = total_frame_count;
    self
  }

  /// Frame count of the whole job.
  pub fn job_frame_count(&self) -> i64 {
    self.job_frame_count_for(self.frame_count)
  }

  /// Frame count of the whole job once this run's own count is known, as
  /// from [`FileInfo::frame_count`](crate::event::FileInfo::frame_count).
  pub fn job_frame_count_for(&self, run_frame_count: i64) -> i64 {
    if self.total_frame_count > 0 {
      self.total_frame_count
    } else {
      run_frame_count + self.resume_pos
    }
  }

  /// Position within the whole job of a frame reported by this run.
  pub fn job_position(&self, frame: i64) -> i64 {
    frame + self.resume_pos
  }

  pub(crate) fn has_timeout(&self) -> bool {
    !self.timeout.is_zero()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let options = ProcessOptions::default();
    assert_eq!(options.display_mode, DisplayMode::None);
    assert!(options.is_main_task);
    assert!(!options.has_timeout());
    assert_eq!(options.priority, ProcessPriority::Normal);
  }

  #[test]
  fn test_job_options() {
    let options = ProcessOptions::for_job("job-1", "Muxing", false);
    assert_eq!(options.display_mode, DisplayMode::Interface);
    assert_eq!(options.job_id.as_deref(), Some("job-1"));
    assert_eq!(options.title.as_deref(), Some("Muxing"));
    assert!(!options.is_main_task);
  }

  #[test]
  fn test_job_frame_count() {
    let options = ProcessOptions::default().frame_count(100).resume_pos(40);
    assert_eq!(options.job_frame_count(), 140);
    let options = ProcessOptions {
      total_frame_count: 500,
      ..options
    };
    assert_eq!(options.job_frame_count(), 500);
    assert_eq!(options.job_frame_count_for(7163), 500);
  }

  #[test]
  fn test_resumed_run_positions() {
    let options = ProcessOptions::default().resume_pos(1000);
    assert_eq!(options.job_frame_count(), 1000);
    assert_eq!(options.job_frame_count_for(7163), 8163);
    assert_eq!(options.job_position(0), 1000);
    assert_eq!(options.job_position(163), 1163);

    let options = options.total_frame_count(9000);
    assert_eq!(options.job_frame_count_for(7163), 9000);
    assert_eq!(options.job_position(163), 1163);
  }
}
