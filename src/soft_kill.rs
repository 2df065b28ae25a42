//! Asking a running child process to stop.
//!
//! FFmpeg finalizes its output (trailer, index) when it's interrupted, so a
//! cancelled encode usually leaves a playable file behind. Hard-killing it
//! doesn't.

use std::{
  io::Write,
  process::Child,
  time::{Duration, Instant},
};

/// Attempt to terminate a process gracefully.
///
/// Implementations may signal, write to stdin, or kill outright. The process
/// managers keep polling until the OS reports the child has exited, so a
/// strategy that does nothing only delays completion until the child exits
/// on its own.
pub trait SoftKill: Send + Sync {
  /// Returns whether the child has exited afterwards.
  fn soft_kill(&self, child: &mut Child) -> bool;

  /// Whether the child's stdin must be piped for this strategy to work.
  fn needs_stdin(&self) -> bool {
    false
  }
}

/// Stock strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftKillStrategy {
  /// `SIGINT` on Unix, a console Ctrl+C event on Windows.
  #[default]
  Interrupt,
  /// `Child::kill`: `SIGKILL` / `TerminateProcess`.
  ForceKill,
  /// Write `q` to FFmpeg's stdin, its interactive quit key.
  QuitKey,
  /// Don't touch the process.
  NoOp,
}

impl SoftKill for SoftKillStrategy {
  fn soft_kill(&self, child: &mut Child) -> bool {
    let result = match self {
      SoftKillStrategy::Interrupt => interrupt(child),
      SoftKillStrategy::ForceKill => force_kill(child),
      SoftKillStrategy::QuitKey => match child.stdin.as_mut() {
        Some(stdin) => stdin.write_all(b"q\n").and_then(|_| stdin.flush()),
        None => Err(std::io::Error::other("stdin is not piped")),
      },
      SoftKillStrategy::NoOp => Ok(()),
    };
    if let Err(e) = result {
      tracing::warn!(pid = child.id(), strategy = ?self, "soft kill failed: {e}");
    }
    has_exited(child)
  }

  fn needs_stdin(&self) -> bool {
    *self == SoftKillStrategy::QuitKey
  }
}

fn has_exited(child: &mut Child) -> bool {
  matches!(child.try_wait(), Ok(Some(_)))
}

/// Signal the child's process group, which the managers give every captured
/// child, so shell pipelines stop as a whole. A child that leads no group
/// gets the signal alone.
#[cfg(unix)]
fn signal_group(child: &Child, signal: nix::sys::signal::Signal) -> std::io::Result<()> {
  use nix::{
    sys::signal::{kill, killpg},
    unistd::Pid,
  };

  let pid = Pid::from_raw(child.id() as i32);
  killpg(pid, signal)
    .or_else(|_| kill(pid, signal))
    .map_err(std::io::Error::from)
}

#[cfg(unix)]
fn interrupt(child: &mut Child) -> std::io::Result<()> {
  signal_group(child, nix::sys::signal::Signal::SIGINT)
}

#[cfg(unix)]
fn force_kill(child: &mut Child) -> std::io::Result<()> {
  signal_group(child, nix::sys::signal::Signal::SIGKILL).or_else(|_| child.kill())
}

#[cfg(windows)]
fn force_kill(child: &mut Child) -> std::io::Result<()> {
  child.kill()
}

/// Send Ctrl+C to the child's console. Our own process ignores Ctrl+C until
/// the child exits or a grace period ends, since the event reaches every
/// process attached to that console.
#[cfg(windows)]
fn interrupt(child: &mut Child) -> std::io::Result<()> {
  use winapi::um::{
    consoleapi::SetConsoleCtrlHandler,
    wincon::{AttachConsole, FreeConsole, GenerateConsoleCtrlEvent, CTRL_C_EVENT},
  };

  const GRACE_PERIOD: Duration = Duration::from_secs(5);

  // SAFETY: console API calls with no pointer arguments besides the null
  // handler routine, which the API documents as "ignore Ctrl+C".
  unsafe {
    let attached = AttachConsole(child.id()) != 0;
    SetConsoleCtrlHandler(None, 1);
    let sent = GenerateConsoleCtrlEvent(CTRL_C_EVENT, 0) != 0;
    let error = std::io::Error::last_os_error();
    if sent {
      wait_for_exit(child, GRACE_PERIOD);
    }
    if attached {
      FreeConsole();
    }
    SetConsoleCtrlHandler(None, 0);
    if !sent {
      return Err(error);
    }
  }
  Ok(())
}

#[cfg_attr(not(windows), allow(dead_code))]
fn wait_for_exit(child: &mut Child, limit: Duration) {
  let start = Instant::now();
  while start.elapsed() < limit && !has_exited(child) {
    std::thread::sleep(Duration::from_millis(50));
  }
}
