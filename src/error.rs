use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::io;
use std::result::Result as StdResult;

/// Shorthand alias for `Result<T, Error>` using the `ffmpeg_shepherd` error type.
pub type Result<T> = StdResult<T, Error>;

/// Broad category of an [`Error`], used by callers to tell configuration
/// mistakes apart from misuse of a busy manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// An argument was empty or malformed.
  Argument,
  /// The executable or companion tool could not be located.
  NotFound,
  /// The manager is already running a process.
  InvalidState,
  /// A numeric setting was outside its accepted range.
  OutOfRange,
  /// Spawning or waiting on the child process failed at the OS level.
  Io,
  Other,
}

/// A generic error type for the `ffmpeg-shepherd` crate.
#[derive(Debug)]
pub struct Error {
  pub kind: ErrorKind,
  pub message: String,
  pub source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)
  }
}

impl StdError for Error {
  fn source(&self) -> Option<&(dyn StdError + 'static)> {
    self
      .source
      .as_deref()
      .map(|e| e as &(dyn StdError + 'static))
  }
}

impl Error {
  /// Wrap any standard Error into a library Error.
  pub fn from_std<E>(kind: ErrorKind, e: E) -> Self
  where
    E: StdError + Send + Sync + 'static,
  {
    Error {
      kind,
      message: e.to_string(),
      source: Some(Box::new(e)),
    }
  }

  /// Create an error of the given kind from a message.
  pub fn new<S: AsRef<str>>(kind: ErrorKind, message: S) -> Self {
    Error {
      kind,
      message: message.as_ref().to_string(),
      source: None,
    }
  }

  /// Create an uncategorized error message from a string.
  pub fn msg<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::Other, message)
  }

  pub fn argument<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::Argument, message)
  }

  pub fn not_found<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::NotFound, message)
  }

  pub fn invalid_state<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::InvalidState, message)
  }

  pub fn out_of_range<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::OutOfRange, message)
  }

  pub fn kind(&self) -> ErrorKind {
    self.kind
  }
}

impl From<io::Error> for Error {
  fn from(e: io::Error) -> Self {
    match e.kind() {
      io::ErrorKind::NotFound => Error::from_std(ErrorKind::NotFound, e),
      _ => Error::from_std(ErrorKind::Io, e),
    }
  }
}

impl From<&str> for Error {
  fn from(e: &str) -> Self {
    Error::msg(e)
  }
}

impl From<String> for Error {
  fn from(e: String) -> Self {
    Error::msg(e)
  }
}
