//! Hooks for a presentation layer (progress windows, error dialogs, a
//! terminal) to follow the runs of a process manager.
//!
//! Nothing here draws anything: an application implements
//! [`UserInterfaceManager`] and [`UserInterface`] for its toolkit, and usually
//! wraps its manager in an [`InterfaceRegistry`] so several runs belonging to
//! one job share a single interface.

use std::sync::{Arc, Mutex, PoisonError};

use crate::process_manager::ProcessManager;

/// Title used when a run has none.
pub const DEFAULT_TITLE: &str = "FFmpeg Work in Progress";

/// One interface instance, e.g. a progress window.
pub trait UserInterface: Send + Sync {
  /// Follow a run. Called before the process is spawned, so implementations
  /// can register event handlers on `host`.
  ///
  /// A job's interface sees every task of the job; `host.options()` tells
  /// which one is the main task (`is_main_task`) and where it starts within
  /// the job (`resume_pos`).
  fn display_task(&self, host: &ProcessManager);

  /// Close the interface.
  fn stop(&self);
}

/// Creates interfaces and reports failed runs.
pub trait UserInterfaceManager: Send + Sync {
  /// Create a new interface. With `auto_close` the interface closes itself
  /// once the task it displays completes.
  fn create_ui(&self, title: &str, auto_close: bool) -> Arc<dyn UserInterface>;

  /// Show the output of a run that failed or timed out.
  fn display_error(&self, host: &ProcessManager);

  /// Display a run starting in [`DisplayMode::Interface`](crate::options::DisplayMode::Interface).
  fn display(&self, host: &ProcessManager) {
    self
      .create_ui(title_of(host), true)
      .display_task(host);
  }
}

fn title_of(host: &ProcessManager) -> &str {
  host
    .options()
    .title
    .as_deref()
    .filter(|t| !t.is_empty())
    .unwrap_or(DEFAULT_TITLE)
}

/// Keeps one shared interface per job id.
///
/// Runs whose options carry a `job_id` that was [`start`](Self::start)ed are
/// routed to that job's interface; every other run gets its own auto-closing
/// interface.
pub struct InterfaceRegistry<M: UserInterfaceManager> {
  inner: M,
  jobs: Mutex<Vec<(String, Arc<dyn UserInterface>)>>,
}

impl<M: UserInterfaceManager> InterfaceRegistry<M> {
  pub fn new(inner: M) -> Self {
    Self {
      inner,
      jobs: Mutex::new(Vec::new()),
    }
  }

  pub fn inner(&self) -> &M {
    &self.inner
  }

  /// Open the interface for a job, unless it's already open.
  pub fn start<S: AsRef<str>>(&self, job_id: S, title: &str) {
    let job_id = job_id.as_ref();
    let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
    if !jobs.iter().any(|(id, _)| id == job_id) {
      let ui = self.inner.create_ui(title, false);
      jobs.push((job_id.to_string(), ui));
    }
  }

  /// Close the interface of a job.
  pub fn stop<S: AsRef<str>>(&self, job_id: S) {
    let job_id = job_id.as_ref();
    let removed: Vec<Arc<dyn UserInterface>> = {
      let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
      let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *jobs)
        .into_iter()
        .partition(|(id, _)| id == job_id);
      *jobs = kept;
      removed.into_iter().map(|(_, ui)| ui).collect()
    };
    for ui in removed {
      ui.stop();
    }
  }

  fn job_ui(&self, job_id: &str) -> Option<Arc<dyn UserInterface>> {
    self
      .jobs
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .find(|(id, _)| id == job_id)
      .map(|(_, ui)| ui.clone())
  }
}

impl<M: UserInterfaceManager> UserInterfaceManager for InterfaceRegistry<M> {
  fn create_ui(&self, title: &str, auto_close: bool) -> Arc<dyn UserInterface> {
    self.inner.create_ui(title, auto_close)
  }

  fn display_error(&self, host: &ProcessManager) {
    self.inner.display_error(host)
  }

  fn display(&self, host: &ProcessManager) {
    let job_ui = host
      .options()
      .job_id
      .as_deref()
      .and_then(|id| self.job_ui(id));
    match job_ui {
      Some(ui) => ui.display_task(host),
      None => self.create_ui(title_of(host), true).display_task(host),
    }
  }
}
