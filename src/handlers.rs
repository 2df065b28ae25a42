//! Observer registration for the events of a run.
//!
//! Handlers run synchronously on the thread that raises the event: the
//! caller's thread for `process_started` and `process_completed`, the output
//! reader thread for the others. A slow handler stalls the child's output
//! pipe, so hand heavy work off to another thread.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
  event::{CompletionStatus, FfmpegStatus, FileInfo},
  process_manager::ProcessManager,
};

pub type ProcessStartedHandler = Arc<dyn Fn(&ProcessManager) + Send + Sync>;
pub type DataReceivedHandler = Arc<dyn Fn(&str) + Send + Sync>;
pub type InfoUpdatedHandler = Arc<dyn Fn(&FileInfo) + Send + Sync>;
pub type StatusUpdatedHandler = Arc<dyn Fn(&FfmpegStatus) + Send + Sync>;
pub type ProcessCompletedHandler = Arc<dyn Fn(CompletionStatus) + Send + Sync>;

/// The handler lists of one process manager.
#[derive(Default)]
pub struct EventHandlers {
  process_started: Mutex<Vec<ProcessStartedHandler>>,
  data_received: Mutex<Vec<DataReceivedHandler>>,
  info_updated: Mutex<Vec<InfoUpdatedHandler>>,
  status_updated: Mutex<Vec<StatusUpdatedHandler>>,
  process_completed: Mutex<Vec<ProcessCompletedHandler>>,
}

/// Copy the list out so handlers may register more handlers without deadlocking.
fn snapshot<T: Clone>(list: &Mutex<Vec<T>>) -> Vec<T> {
  list.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn push<T>(list: &Mutex<Vec<T>>, handler: T) {
  list
    .lock()
    .unwrap_or_else(PoisonError::into_inner)
    .push(handler);
}

fn clear<T>(list: &Mutex<Vec<T>>) {
  list.lock().unwrap_or_else(PoisonError::into_inner).clear();
}

impl EventHandlers {
  /// Raised right before the process is spawned.
  pub fn on_process_started<F>(&self, f: F)
  where
    F: Fn(&ProcessManager) + Send + Sync + 'static,
  {
    let handler: ProcessStartedHandler = Arc::new(f);
    push(&self.process_started, handler);
  }

  /// Raised for every line of the selected output stream, in order.
  pub fn on_data_received<F>(&self, f: F)
  where
    F: Fn(&str) + Send + Sync + 'static,
  {
    let handler: DataReceivedHandler = Arc::new(f);
    push(&self.data_received, handler);
  }

  /// Raised once per run when the input streams and duration are known.
  pub fn on_info_updated<F>(&self, f: F)
  where
    F: Fn(&FileInfo) + Send + Sync + 'static,
  {
    let handler: InfoUpdatedHandler = Arc::new(f);
    push(&self.info_updated, handler);
  }

  /// Raised for every progress line.
  pub fn on_status_updated<F>(&self, f: F)
  where
    F: Fn(&FfmpegStatus) + Send + Sync + 'static,
  {
    let handler: StatusUpdatedHandler = Arc::new(f);
    push(&self.status_updated, handler);
  }

  /// Raised last, with the outcome of the run.
  pub fn on_process_completed<F>(&self, f: F)
  where
    F: Fn(CompletionStatus) + Send + Sync + 'static,
  {
    let handler: ProcessCompletedHandler = Arc::new(f);
    push(&self.process_completed, handler);
  }

  /// Remove every registered handler.
  pub fn clear(&self) {
    clear(&self.process_started);
    clear(&self.data_received);
    clear(&self.info_updated);
    clear(&self.status_updated);
    clear(&self.process_completed);
  }

  pub(crate) fn process_started(&self, host: &ProcessManager) {
    for handler in snapshot(&self.process_started) {
      handler(host);
    }
  }

  pub(crate) fn data_received(&self, line: &str) {
    for handler in snapshot(&self.data_received) {
      handler(line);
    }
  }

  pub(crate) fn info_updated(&self, info: &FileInfo) {
    for handler in snapshot(&self.info_updated) {
      handler(info);
    }
  }

  pub(crate) fn status_updated(&self, status: &FfmpegStatus) {
    for handler in snapshot(&self.status_updated) {
      handler(status);
    }
  }

  pub(crate) fn process_completed(&self, status: CompletionStatus) {
    for handler in snapshot(&self.process_completed) {
      handler(status);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn test_handlers_run_in_registration_order() {
    let handlers = EventHandlers::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b"] {
      let seen = seen.clone();
      handlers.on_data_received(move |line| seen.lock().unwrap().push(format!("{tag}:{line}")));
    }
    handlers.data_received("x");
    assert_eq!(*seen.lock().unwrap(), vec!["a:x", "b:x"]);
  }

  #[test]
  fn test_handler_may_register_another() {
    let handlers = Arc::new(EventHandlers::default());
    let count = Arc::new(AtomicUsize::new(0));
    let inner = (handlers.clone(), count.clone());
    handlers.on_status_updated(move |_| {
      let count = inner.1.clone();
      inner.0.on_status_updated(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
      });
    });
    handlers.status_updated(&FfmpegStatus::default());
    handlers.status_updated(&FfmpegStatus::default());
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_clear() {
    let handlers = EventHandlers::default();
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    handlers.on_process_completed(move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    });
    handlers.clear();
    handlers.process_completed(CompletionStatus::Success);
    assert_eq!(count.load(Ordering::SeqCst), 0);
  }
}
