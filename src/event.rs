use std::time::Duration;

/// Final outcome of one run of a process manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionStatus {
  /// No run has completed yet.
  #[default]
  None,
  Success,
  /// The process exited with a non-zero code.
  Failed,
  Cancelled,
  Timeout,
}

impl CompletionStatus {
  /// Whether this outcome should be surfaced to an error display.
  pub fn is_error(&self) -> bool {
    matches!(self, CompletionStatus::Failed | CompletionStatus::Timeout)
  }
}

/// Discriminant of a [`Stream`], fixed when the stream is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
  None,
  Video,
  Audio,
}

/// One input stream reported by FFmpeg, e.g.
/// `    Stream #0:0[0x1e0]: Video: mpeg1video, yuv420p(tv), 352x288 ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
  /// Corresponds to the codec name, e.g. `h264` or `mp2`
  pub format: String,
  /// The index of the stream within its input
  pub index: u32,
  /// The line this stream was parsed from, trailing whitespace removed
  pub raw_log_message: String,
  pub type_specific_data: StreamTypeSpecificData,
}

/// The kind-specific half of a [`Stream`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamTypeSpecificData {
  Video(VideoStream),
  Audio(AudioStream),
  /// Subtitle, data, attachment... only the raw text is kept.
  Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoStream {
  /// Pixel format, e.g. `yuv420p`
  pub color_space: String,
  /// `tv` or `pc` when reported
  pub color_range: String,
  /// e.g. `bt709` or `bt470bg/unknown/unknown`
  pub color_matrix: String,
  pub width: u32,
  pub height: u32,
  pub sar: (u32, u32),
  pub dar: (u32, u32),
  /// `sar.0 / sar.1` rounded to 3 decimals
  pub pixel_aspect_ratio: f64,
  /// `dar.0 / dar.1` rounded to 3 decimals
  pub display_aspect_ratio: f64,
  pub frame_rate: f64,
  pub bit_depth: u32,
  /// Bitrate in kb/s, 0 when not reported
  pub bitrate: u32,
}

impl Default for VideoStream {
  fn default() -> Self {
    Self {
      color_space: String::new(),
      color_range: String::new(),
      color_matrix: String::new(),
      width: 0,
      height: 0,
      sar: (1, 1),
      dar: (1, 1),
      pixel_aspect_ratio: 1.0,
      display_aspect_ratio: 1.0,
      frame_rate: 0.0,
      bit_depth: 8,
      bitrate: 0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioStream {
  pub sample_rate: u32,
  /// Channel layout, e.g. `stereo` or `5.1(side)`
  pub channels: String,
  /// Sample format, e.g. `s16p` or `fltp`
  pub bit_depth: String,
  /// Bitrate in kb/s, 0 when not reported
  pub bitrate: u32,
}

impl Stream {
  pub fn stream_type(&self) -> StreamType {
    match self.type_specific_data {
      StreamTypeSpecificData::Video(_) => StreamType::Video,
      StreamTypeSpecificData::Audio(_) => StreamType::Audio,
      StreamTypeSpecificData::Other => StreamType::None,
    }
  }

  pub fn is_video(&self) -> bool {
    self.stream_type() == StreamType::Video
  }

  pub fn is_audio(&self) -> bool {
    self.stream_type() == StreamType::Audio
  }

  pub fn video_data(&self) -> Option<&VideoStream> {
    match &self.type_specific_data {
      StreamTypeSpecificData::Video(data) => Some(data),
      _ => None,
    }
  }

  pub fn audio_data(&self) -> Option<&AudioStream> {
    match &self.type_specific_data {
      StreamTypeSpecificData::Audio(data) => Some(data),
      _ => None,
    }
  }
}

/// Input description gathered from FFmpeg's startup log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileInfo {
  /// Streams in the order they were printed.
  pub streams: Vec<Stream>,
  /// Zero when FFmpeg reported `N/A` or the value could not be parsed.
  pub duration: Duration,
  /// Expected number of frames to process (configured or estimated).
  pub frame_count: i64,
}

impl FileInfo {
  /// The first video stream, if any.
  pub fn video_stream(&self) -> Option<&Stream> {
    self.streams.iter().find(|s| s.is_video())
  }

  /// The first audio stream, if any.
  pub fn audio_stream(&self) -> Option<&Stream> {
    self.streams.iter().find(|s| s.is_audio())
  }
}

/// One parsed progress line. Fields that could not be parsed keep their
/// default value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FfmpegStatus {
  /// index of the current output frame
  pub frame: i64,

  /// frames per second
  pub fps: f32,

  /// Quality factor (may be negative)
  pub quantizer: f32,

  /// Current output size as printed, e.g. `68483kB`
  pub size: String,

  /// Media time processed so far
  pub time: Duration,

  /// Bitrate as printed, e.g. `15162.6kbits/s`
  pub bitrate: String,

  /// Processing speed as a ratio of the input duration
  ///
  /// - 1x is realtime
  /// - 2x means 2 seconds of input are processed in 1 second of wall clock time
  pub speed: f32,
}
