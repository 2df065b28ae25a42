//! Running one external process at a time and reporting on it.
//!
//! A [`ProcessManager`] spawns the child, streams one of its outputs line by
//! line to the registered [`EventHandlers`], enforces the timeout, honours
//! [`cancel`](ProcessManager::cancel) with a soft kill, and finally classifies
//! the outcome as a [`CompletionStatus`].

use std::{
  ffi::OsStr,
  io::{BufRead, BufReader, Read},
  path::Path,
  process::{Child, Command, Stdio},
  sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
  thread::{self, JoinHandle},
  time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
  config::EngineConfig,
  error::{Error, Result},
  event::CompletionStatus,
  handlers::EventHandlers,
  options::{DisplayMode, OutputStream, ProcessOptions},
  paths::resolve_executable,
  read_until_any::LogLines,
};

/// How often the wait loop checks for exit, timeout and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Turns the raw lines of a run into higher level events.
///
/// `run_started` is called on the caller's thread before the process-started
/// event; the other two on the output reader thread.
pub trait OutputInterpreter: Send + Sync {
  fn run_started(&self, _host: &ProcessManager) {}

  /// Called after the line was appended to the output and the data-received
  /// event was raised.
  fn line_received(&self, ctx: &OutputContext<'_>, line: &str);

  /// Called once the output stream is closed.
  fn output_ended(&self, _ctx: &OutputContext<'_>) {}
}

/// What an [`OutputInterpreter`] can see while the output is being read.
pub struct OutputContext<'a> {
  shared: &'a Shared,
}

impl OutputContext<'_> {
  /// Copy of everything captured so far in this run.
  pub fn output(&self) -> String {
    self.shared.output().clone()
  }

  pub fn events(&self) -> &EventHandlers {
    &self.shared.events
  }
}

/// State the reader thread shares with the manager.
#[derive(Default)]
struct Shared {
  output: Mutex<String>,
  events: EventHandlers,
}

impl Shared {
  fn output(&self) -> MutexGuard<'_, String> {
    self.output.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[derive(Default)]
struct RunState {
  busy: bool,
  command_with_args: String,
  last_status: CompletionStatus,
  process_id: Option<u32>,
}

/// A cancellation flag the wait loop can sleep on.
#[derive(Default)]
struct CancelSignal {
  requested: Mutex<bool>,
  wake: Condvar,
}

impl CancelSignal {
  fn flag(&self) -> MutexGuard<'_, bool> {
    self.requested.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn request(&self) {
    *self.flag() = true;
    self.wake.notify_all();
  }

  fn reset(&self) {
    *self.flag() = false;
  }

  fn is_requested(&self) -> bool {
    *self.flag()
  }

  /// Sleep for `timeout`, waking early if cancellation is requested.
  fn sleep(&self, timeout: Duration) {
    let flag = self.flag();
    if *flag {
      drop(flag);
      thread::sleep(timeout);
    } else {
      let _ = self.wake.wait_timeout(flag, timeout);
    }
  }
}

/// Clears the busy flag when a run ends, whichever way it ends.
struct BusyGuard<'a>(&'a Mutex<RunState>);

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) {
    let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
    state.busy = false;
    state.process_id = None;
  }
}

/// Runs external processes, one at a time.
///
/// Runs are synchronous: [`run`](Self::run) blocks until the child exits.
/// Every other method may be called from other threads meanwhile, which is
/// how [`cancel`](Self::cancel) is meant to be used.
///
/// ```rust,no_run
/// use ffmpeg_shepherd::{config::EngineConfig, process_manager::ProcessManager};
///
/// let manager = ProcessManager::new(EngineConfig::default());
/// manager.events().on_data_received(|line| println!("{line}"));
/// let status = manager.run("ffmpeg", "-hide_banner -version").unwrap();
/// println!("{status:?}");
/// ```
pub struct ProcessManager {
  config: EngineConfig,
  options: ProcessOptions,
  output_stream: OutputStream,
  interpreter: Option<Arc<dyn OutputInterpreter>>,
  shared: Arc<Shared>,
  state: Mutex<RunState>,
  cancel: CancelSignal,
}

impl ProcessManager {
  pub fn new(config: EngineConfig) -> Self {
    Self::with_options(config, ProcessOptions::default())
  }

  pub fn with_options(config: EngineConfig, options: ProcessOptions) -> Self {
    Self {
      config,
      options,
      output_stream: OutputStream::default(),
      interpreter: None,
      shared: Arc::default(),
      state: Mutex::default(),
      cancel: CancelSignal::default(),
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn options(&self) -> &ProcessOptions {
    &self.options
  }

  pub fn options_mut(&mut self) -> &mut ProcessOptions {
    &mut self.options
  }

  /// Which of the child's outputs is captured. Defaults to stderr, where
  /// FFmpeg writes its log.
  pub fn output_stream(&self) -> OutputStream {
    self.output_stream
  }

  pub fn set_output_stream(&mut self, stream: OutputStream) {
    self.output_stream = stream;
  }

  pub(crate) fn set_interpreter(&mut self, interpreter: Arc<dyn OutputInterpreter>) {
    self.interpreter = Some(interpreter);
  }

  pub fn events(&self) -> &EventHandlers {
    &self.shared.events
  }

  /// Everything captured from the selected stream during the last (or
  /// current) run, one line per captured line.
  pub fn output(&self) -> String {
    self.shared.output().clone()
  }

  /// The command line of the last (or current) run, for display.
  pub fn command_with_args(&self) -> String {
    self.state().command_with_args.clone()
  }

  /// [`CompletionStatus::None`] until a run completes.
  pub fn last_completion_status(&self) -> CompletionStatus {
    self.state().last_status
  }

  /// OS id of the running child.
  pub fn process_id(&self) -> Option<u32> {
    self.state().process_id
  }

  pub fn is_busy(&self) -> bool {
    self.state().busy
  }

  /// Ask the current run to stop. The child is soft-killed and the run
  /// completes as [`CompletionStatus::Cancelled`] once it has exited. Has no
  /// effect when idle.
  pub fn cancel(&self) {
    if self.is_busy() {
      debug!("cancellation requested");
      self.cancel.request();
    }
  }

  /// Run `file_name` with a command-line argument string and wait for it to
  /// exit.
  ///
  /// Fails before anything is spawned or any event is raised when the
  /// executable is missing ([`ErrorKind::NotFound`](crate::error::ErrorKind::NotFound)),
  /// the name is empty ([`ErrorKind::Argument`](crate::error::ErrorKind::Argument)),
  /// or a run is already in progress ([`ErrorKind::InvalidState`](crate::error::ErrorKind::InvalidState)).
  pub fn run<P: AsRef<Path>>(&self, file_name: P, arguments: &str) -> Result<CompletionStatus> {
    let file_name = file_name.as_ref();
    self.execute(file_name.as_os_str(), arguments, |command| {
      set_args(command, arguments);
    })
  }

  /// Run a command line through the system shell (`sh -c` / `cmd /c`), which
  /// allows pipes between several programs.
  pub fn run_as_command(&self, command_line: &str) -> Result<CompletionStatus> {
    if command_line.trim().is_empty() {
      return Err(Error::argument("command cannot be empty"));
    }
    #[cfg(windows)]
    {
      let arguments = format!("/c \" {command_line} \"");
      self.execute(OsStr::new("cmd"), &arguments, |command| {
        set_args(command, &arguments);
      })
    }
    #[cfg(not(windows))]
    {
      let arguments = format!("-c {}", crate::util::quote(command_line));
      self.execute(OsStr::new("sh"), &arguments, |command| {
        command.arg("-c").arg(command_line);
      })
    }
  }

  fn execute<F>(&self, file_name: &OsStr, arguments: &str, add_args: F) -> Result<CompletionStatus>
  where
    F: FnOnce(&mut Command),
  {
    if file_name.is_empty() {
      return Err(Error::argument("file name cannot be empty"));
    }
    let program = resolve_executable(file_name)?;
    let _busy = self.begin(file_name, arguments)?;

    let mode = self.options.display_mode;
    let capture = mode != DisplayMode::Native && self.output_stream != OutputStream::None;

    if mode == DisplayMode::Interface {
      if let Some(ui) = self.config.user_interface() {
        ui.display(self);
      }
    }
    if let Some(interpreter) = &self.interpreter {
      interpreter.run_started(self);
    }
    self.shared.events.process_started(self);

    let mut command = Command::new(&program);
    add_args(&mut command);
    self.configure_stdio(&mut command, capture);

    // A soft kill signals the whole group, so every process of a pipeline
    // gets it.
    #[cfg(unix)]
    if mode != DisplayMode::Native {
      use std::os::unix::process::CommandExt;
      command.process_group(0);
    }

    debug!(command = %self.command_with_args(), "spawning process");
    let mut child = command.spawn()?;
    self.state().process_id = Some(child.id());

    if let Err(e) = self.options.priority.apply(&child) {
      warn!(pid = child.id(), priority = ?self.options.priority, "could not set priority: {e}");
    }

    let reader = if capture {
      self.spawn_reader(&mut child)
    } else {
      None
    };

    let outcome = self.wait(&mut child);
    if let Some(reader) = reader {
      if reader.join().is_err() {
        warn!("output reader thread panicked");
      }
    }
    let (timed_out, success) = outcome?;

    let status = if timed_out {
      CompletionStatus::Timeout
    } else if self.cancel.is_requested() {
      CompletionStatus::Cancelled
    } else if success {
      CompletionStatus::Success
    } else {
      CompletionStatus::Failed
    };
    info!(?status, "process completed");

    self.state().last_status = status;
    self.shared.events.process_completed(status);

    if status.is_error() && mode == DisplayMode::ErrorOnly {
      if let Some(ui) = self.config.user_interface() {
        ui.display_error(self);
      }
    }
    Ok(status)
  }

  /// Claim the manager for a new run and reset the per-run state.
  fn begin(&self, file_name: &OsStr, arguments: &str) -> Result<BusyGuard<'_>> {
    {
      let mut state = self.state();
      if state.busy {
        return Err(Error::invalid_state("a process is already running"));
      }
      state.busy = true;
      state.command_with_args = format!("\"{}\" {}", file_name.to_string_lossy(), arguments)
        .trim_end()
        .to_string();
    }
    self.shared.output().clear();
    self.cancel.reset();
    Ok(BusyGuard(&self.state))
  }

  fn configure_stdio(&self, command: &mut Command, capture: bool) {
    let needs_stdin = self.config.soft_kill().needs_stdin();
    if !capture {
      if needs_stdin {
        command.stdin(Stdio::piped());
      }
      return;
    }

    command.stdin(if needs_stdin { Stdio::piped() } else { Stdio::null() });
    match self.output_stream {
      OutputStream::Output => {
        command.stdout(Stdio::piped()).stderr(Stdio::null());
      }
      _ => {
        command.stdout(Stdio::null()).stderr(Stdio::piped());
      }
    }

    #[cfg(windows)]
    {
      use std::os::windows::process::CommandExt;
      command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);
    }
  }

  fn spawn_reader(&self, child: &mut Child) -> Option<JoinHandle<()>> {
    let shared = self.shared.clone();
    let interpreter = self.interpreter.clone();
    match self.output_stream {
      OutputStream::Output => child
        .stdout
        .take()
        .map(|out| spawn_reader(out, shared, interpreter)),
      _ => child
        .stderr
        .take()
        .map(|err| spawn_reader(err, shared, interpreter)),
    }
  }

  /// Poll until the child exits. Returns whether the run timed out and
  /// whether the child exited successfully.
  fn wait(&self, child: &mut Child) -> Result<(bool, bool)> {
    let start = Instant::now();
    let mut timed_out = false;
    let mut cancel_sent = false;

    loop {
      if let Some(exit) = child.try_wait()? {
        debug!(pid = child.id(), %exit, "process exited");
        return Ok((timed_out, exit.success()));
      }

      if !timed_out && self.options.has_timeout() && start.elapsed() >= self.options.timeout {
        info!(pid = child.id(), timeout = ?self.options.timeout, "timeout reached, stopping process");
        timed_out = true;
        self.config.soft_kill().soft_kill(child);
      } else if !cancel_sent && self.cancel.is_requested() {
        info!(pid = child.id(), "stopping process");
        cancel_sent = true;
        self.config.soft_kill().soft_kill(child);
      }

      self.cancel.sleep(POLL_INTERVAL);
    }
  }

  /// Feed a captured log through the interpreter as if a run had produced it.
  #[cfg(test)]
  pub(crate) fn replay_output(&self, log: &str) {
    self.shared.output().clear();
    if let Some(interpreter) = &self.interpreter {
      interpreter.run_started(self);
    }
    read_output(log.as_bytes(), &self.shared, self.interpreter.as_deref());
  }

  fn state(&self) -> MutexGuard<'_, RunState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn spawn_reader<R>(stream: R, shared: Arc<Shared>, interpreter: Option<Arc<dyn OutputInterpreter>>) -> JoinHandle<()>
where
  R: Read + Send + 'static,
{
  thread::spawn(move || read_output(BufReader::new(stream), &shared, interpreter.as_deref()))
}

fn read_output<R: BufRead>(reader: R, shared: &Shared, interpreter: Option<&dyn OutputInterpreter>) {
  let ctx = OutputContext { shared };
  for line in LogLines::new(reader) {
    let line = match line {
      Ok(line) => line,
      Err(e) => {
        warn!("error reading process output: {e}");
        break;
      }
    };
    {
      let mut output = shared.output();
      output.push_str(&line);
      output.push('\n');
    }
    shared.events.data_received(&line);
    if let Some(interpreter) = interpreter {
      interpreter.line_received(&ctx, &line);
    }
  }
  if let Some(interpreter) = interpreter {
    interpreter.output_ended(&ctx);
  }
}

#[cfg(not(windows))]
fn set_args(command: &mut Command, arguments: &str) {
  command.args(crate::util::split_args(arguments));
}

/// Windows programs parse their own command line, so pass it through as-is.
#[cfg(windows)]
fn set_args(command: &mut Command, arguments: &str) {
  use std::os::windows::process::CommandExt;
  command.raw_arg(arguments);
}
