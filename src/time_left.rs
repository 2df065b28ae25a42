//! Smoothed processing rate and time-left estimation.
//!
//! ## Example
//!
//! ```rust
//! use ffmpeg_shepherd::time_left::TimeLeftCalculator;
//!
//! let mut calc = TimeLeftCalculator::new(7163).unwrap();
//! calc.calculate(0);
//! // ... later, on every progress line:
//! calc.calculate(250);
//! println!("{:.1} fps, {:?} left", calc.result_fps(), calc.result_time_left());
//! ```

use std::{
  fmt,
  sync::Arc,
  time::{Duration, Instant},
};

use crate::error::{Error, Result};

/// Number of samples kept when no history length is given.
pub const DEFAULT_HISTORY_LENGTH: usize = 20;

/// Source of wall-clock timestamps for [`TimeLeftCalculator`].
pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// Estimates the processing rate and remaining time of a job from periodic
/// position samples, averaged over a sliding window of the last
/// `history_length` samples.
///
/// Not synchronized: wrap it in a `Mutex` to share it between threads.
pub struct TimeLeftCalculator {
  clock: Arc<dyn Clock>,
  samples: Vec<Option<(Instant, i64)>>,
  cursor: usize,
  wrapped: bool,
  frame_count: i64,
  result_fps: f64,
  result_time_left: Duration,
}

impl fmt::Debug for TimeLeftCalculator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TimeLeftCalculator")
      .field("frame_count", &self.frame_count)
      .field("history_length", &self.samples.len())
      .field("result_fps", &self.result_fps)
      .field("result_time_left", &self.result_time_left)
      .finish()
  }
}

impl TimeLeftCalculator {
  /// A calculator over [`DEFAULT_HISTORY_LENGTH`] samples using the system clock.
  pub fn new(frame_count: i64) -> Result<Self> {
    Self::with_clock(Arc::new(SystemClock), frame_count, DEFAULT_HISTORY_LENGTH)
  }

  pub fn with_history(frame_count: i64, history_length: usize) -> Result<Self> {
    Self::with_clock(Arc::new(SystemClock), frame_count, history_length)
  }

  /// Fails with [`ErrorKind::OutOfRange`](crate::error::ErrorKind::OutOfRange)
  /// if `frame_count` is negative or `history_length` is zero.
  pub fn with_clock(clock: Arc<dyn Clock>, frame_count: i64, history_length: usize) -> Result<Self> {
    if history_length < 1 {
      return Err(Error::out_of_range("history length must be at least 1"));
    }
    let mut calc = Self {
      clock,
      samples: vec![None; history_length],
      cursor: 0,
      wrapped: false,
      frame_count: 0,
      result_fps: 0.0,
      result_time_left: Duration::ZERO,
    };
    calc.set_frame_count(frame_count)?;
    Ok(calc)
  }

  /// Total number of frames the job will process.
  pub fn frame_count(&self) -> i64 {
    self.frame_count
  }

  pub fn set_frame_count(&mut self, frame_count: i64) -> Result<()> {
    if frame_count < 0 {
      return Err(Error::out_of_range(format!(
        "frame count must not be negative, got {frame_count}"
      )));
    }
    self.frame_count = frame_count;
    Ok(())
  }

  pub fn history_length(&self) -> usize {
    self.samples.len()
  }

  /// Frames per second over the sample window, as of the last [`calculate`](Self::calculate).
  pub fn result_fps(&self) -> f64 {
    self.result_fps
  }

  /// Estimated time left, as of the last [`calculate`](Self::calculate).
  pub fn result_time_left(&self) -> Duration {
    self.result_time_left
  }

  /// Record the current position and update the rate and time left.
  ///
  /// Negative positions are ignored. A window in which the position went
  /// backwards, or no time elapsed, leaves the previous results in place.
  pub fn calculate(&mut self, pos: i64) {
    if pos < 0 {
      return;
    }

    let now = self.clock.now();
    self.samples[self.cursor] = Some((now, pos));

    let first = if self.wrapped {
      Some((self.cursor + 1) % self.samples.len())
    } else if self.cursor > 0 {
      Some(0)
    } else {
      None
    };

    if let Some((first_time, first_pos)) = first.and_then(|i| self.samples[i]) {
      let elapsed = now.saturating_duration_since(first_time).as_secs_f64();
      // Both positions are non-negative, so this can't overflow.
      let delta = pos - first_pos;
      if delta < 0 {
        tracing::trace!(pos, first_pos, "decreasing frame position");
      }
      if elapsed > 0.0 && delta >= 0 {
        self.result_fps = delta as f64 / elapsed;
        let work_left = self.frame_count - pos;
        if work_left > 0 && self.result_fps > 0.0 {
          self.result_time_left =
            Duration::try_from_secs_f64(work_left as f64 / self.result_fps).unwrap_or(Duration::MAX);
        }
      }
    }

    // Both are non-negative, so this can't overflow.
    if self.frame_count - pos <= 0 {
      self.result_time_left = Duration::ZERO;
    }

    self.cursor = (self.cursor + 1) % self.samples.len();
    if self.cursor == 0 {
      self.wrapped = true;
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use std::sync::Mutex;

  /// A clock that only moves when told to.
  pub struct FakeClock {
    now: Mutex<Instant>,
  }

  impl FakeClock {
    pub fn new() -> Arc<Self> {
      Arc::new(Self {
        now: Mutex::new(Instant::now()),
      })
    }

    pub fn advance(&self, secs: u64) {
      *self.now.lock().unwrap() += Duration::from_secs(secs);
    }
  }

  impl Clock for FakeClock {
    fn now(&self) -> Instant {
      *self.now.lock().unwrap()
    }
  }

  const FRAME_COUNT: i64 = 200;
  const HISTORY_LENGTH: usize = 4;

  fn setup() -> (Arc<FakeClock>, TimeLeftCalculator) {
    let clock = FakeClock::new();
    let calc = TimeLeftCalculator::with_clock(clock.clone(), FRAME_COUNT, HISTORY_LENGTH).unwrap();
    (clock, calc)
  }

  /// Advance the clock, feed a position and check the results stay valid.
  fn calc_validate(clock: &FakeClock, calc: &mut TimeLeftCalculator, frame: i64, secs: u64) {
    clock.advance(secs);
    calc.calculate(frame);
    assert!(calc.result_fps() >= 0.0);
    assert!(calc.result_fps().is_finite());
  }

  #[test]
  fn test_defaults() {
    let (_, calc) = setup();
    assert_eq!(calc.frame_count(), FRAME_COUNT);
    assert_eq!(calc.history_length(), HISTORY_LENGTH);
    assert_eq!(calc.result_fps(), 0.0);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
    assert_eq!(
      TimeLeftCalculator::new(FRAME_COUNT).unwrap().history_length(),
      DEFAULT_HISTORY_LENGTH
    );
  }

  #[test]
  fn test_min_values() {
    let mut calc = TimeLeftCalculator::with_history(0, 1).unwrap();
    calc.calculate(0);
    calc.calculate(0);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
  }

  #[test]
  fn test_invalid_values() {
    for (frame_count, history_length) in [(-100, 30), (100, 0)] {
      let err = TimeLeftCalculator::with_history(frame_count, history_length).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }
    let (_, mut calc) = setup();
    assert!(calc.set_frame_count(-1).is_err());
    assert_eq!(calc.frame_count(), FRAME_COUNT);
  }

  #[test]
  fn test_run_simulation() {
    let (clock, mut calc) = setup();
    let mut frame = 0;

    // 5 fps
    for i in 1..=10 {
      frame += 5;
      calc_validate(&clock, &mut calc, frame, 1);
      if i > 1 {
        assert_eq!(calc.result_fps(), 5.0);
        assert_eq!(calc.result_time_left().as_secs_f64(), (40 - i) as f64);
      } else {
        assert_eq!(calc.result_fps(), 0.0);
        assert_eq!(calc.result_time_left(), Duration::ZERO);
      }
    }

    // 10 frames per 2 seconds is still 5 fps
    for i in 1..=5 {
      frame += 10;
      calc_validate(&clock, &mut calc, frame, 2);
      assert_eq!(calc.result_fps(), 5.0);
      assert_eq!(calc.result_time_left().as_secs_f64(), (30 - i * 2) as f64);
    }

    // 10 fps
    for _ in 0..10 {
      frame += 10;
      calc_validate(&clock, &mut calc, frame, 1);
      assert!((5.0..=10.0).contains(&calc.result_fps()));
      assert!(calc.result_time_left() <= Duration::from_secs(15));
    }

    assert_eq!(calc.result_fps(), 10.0);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
  }

  #[test]
  fn test_negative_position_is_ignored() {
    let (clock, mut calc) = setup();
    calc_validate(&clock, &mut calc, -10, 0);
    calc_validate(&clock, &mut calc, 10, 1);
    calc_validate(&clock, &mut calc, -5, 1);
    calc_validate(&clock, &mut calc, 20, 1);
    // The negative sample took no slot: 10 frames over 2 seconds.
    assert_eq!(calc.result_fps(), 5.0);
  }

  #[test]
  fn test_max_position() {
    let (clock, mut calc) = setup();
    calc_validate(&clock, &mut calc, i64::MAX - 2, 1);
    calc_validate(&clock, &mut calc, i64::MAX - 1, 1);
    calc_validate(&clock, &mut calc, i64::MAX, 1);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
  }

  #[test]
  fn test_done_with_stalled_clock() {
    let clock = FakeClock::new();
    let mut calc = TimeLeftCalculator::with_clock(clock.clone(), FRAME_COUNT, 2).unwrap();
    calc_validate(&clock, &mut calc, 100, 1);
    calc_validate(&clock, &mut calc, 150, 1);
    calc_validate(&clock, &mut calc, 160, 1);
    assert_eq!(calc.result_time_left(), Duration::from_secs(4));

    calc_validate(&clock, &mut calc, FRAME_COUNT, 0);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
    calc_validate(&clock, &mut calc, 500, 0);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
  }

  #[test]
  fn test_done_after_decreasing_position() {
    let (clock, mut calc) = setup();
    calc_validate(&clock, &mut calc, 150, 1);
    calc_validate(&clock, &mut calc, 160, 1);
    calc_validate(&clock, &mut calc, 100, 1);
    assert!(calc.result_time_left() > Duration::ZERO);
    calc_validate(&clock, &mut calc, FRAME_COUNT + 10, 0);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
  }

  #[test]
  fn test_huge_frame_count_saturates() {
    let clock = FakeClock::new();
    let mut calc = TimeLeftCalculator::with_clock(clock.clone(), i64::MAX, 2).unwrap();
    calc_validate(&clock, &mut calc, 0, 0);
    calc_validate(&clock, &mut calc, 1, 1000);
    assert_eq!(calc.result_time_left(), Duration::MAX);
  }

  #[test]
  fn test_descending_positions() {
    let (clock, mut calc) = setup();
    let steps = [
      (10, 1),
      (15, 1),
      (10, 1),
      (5, 1),
      (15, 1),
      (15, 1),
      (15, 0),
      (15, 0),
      (15, 0),
    ];
    for (frame, secs) in steps {
      calc_validate(&clock, &mut calc, frame, secs);
    }
  }

  #[test]
  fn test_reaching_frame_count_clears_time_left() {
    let (clock, mut calc) = setup();
    calc_validate(&clock, &mut calc, 100, 1);
    calc_validate(&clock, &mut calc, 150, 1);
    assert!(calc.result_time_left() > Duration::ZERO);
    calc_validate(&clock, &mut calc, FRAME_COUNT, 1);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
    calc_validate(&clock, &mut calc, FRAME_COUNT + 50, 1);
    assert_eq!(calc.result_time_left(), Duration::ZERO);
  }
}
