//! Methods for parsing FFmpeg CLI log output.
//!
//! Everything here is tolerant of malformed input: a line FFmpeg prints is
//! log noise first and data second, so failures degrade to default values or
//! `None` and never abort a running job.

use std::time::Duration;

use crate::{
  comma_iter::CommaIter,
  event::{AudioStream, FfmpegStatus, Stream, StreamTypeSpecificData, VideoStream},
};

/// Prefix of the input duration line.
pub const DURATION_PREFIX: &str = "  Duration: ";
/// Prefix of every input stream description line.
pub const STREAM_PREFIX: &str = "    Stream #0:";
/// Start of the output section header.
pub const OUTPUT_PREFIX: &str = "Output ";
/// Banner printed once encoding actually starts.
pub const START_BANNER: &str = "Press [q] to stop";
/// Start of every progress line.
pub const PROGRESS_PREFIX: &str = "frame=";

/// Byte offset of the stream index in a stream line, right after [`STREAM_PREFIX`].
const STREAM_INDEX_OFFSET: usize = 14;

/// Returns the value following `key=`, skipping leading spaces and stopping
/// at the next space or end of line.
///
/// ## Examples
///
/// ```rust
/// use ffmpeg_shepherd::log_parser::parse_attribute;
/// assert_eq!(parse_attribute("mode=1 key=MyKey key=value2 ", "key"), Some("MyKey"));
/// assert_eq!(parse_attribute("size=   68483kB time=00:00:37.00", "size"), Some("68483kB"));
/// assert_eq!(parse_attribute("mode=1 key2=MyKey", "key"), None);
/// ```
pub fn parse_attribute<'a>(text: &'a str, key: &str) -> Option<&'a str> {
  if text.is_empty() || key.is_empty() {
    return None;
  }
  let pos = text.find(&format!("{key}="))?;
  let value = text[pos + key.len() + 1..].trim_start_matches(' ');
  let end = value.find(' ').unwrap_or(value.len());
  Some(&value[..end])
}

/// Parses FFmpeg's startup log into the list of input streams and the input
/// duration.
///
/// The duration comes from the first line starting with `"  Duration: "`;
/// `N/A` or an unparsable value leaves it at zero. Streams are collected
/// from the lines after it until the output section starts. Lines that do not
/// parse are skipped.
pub fn parse_file_info(output: &str) -> (Vec<Stream>, Duration) {
  let mut duration = Duration::ZERO;
  let mut streams = Vec::new();
  if output.is_empty() {
    return (streams, duration);
  }

  let lines: Vec<&str> = output.lines().collect();
  let duration_index = lines
    .iter()
    .position(|line| line.starts_with(DURATION_PREFIX));

  if let Some(i) = duration_index {
    let token = lines[i]
      .trim()
      .split(", ")
      .next()
      .and_then(|s| s.split(' ').nth(1));
    if let Some(d) = token.and_then(parse_duration_str) {
      duration = d;
    }
  }

  let first = duration_index.map_or(0, |i| i + 1);
  for line in &lines[first..] {
    if line.starts_with(STREAM_PREFIX) {
      if let Some(stream) = parse_stream_info(line) {
        streams.push(stream);
      }
    } else if line.starts_with(OUTPUT_PREFIX) {
      break;
    }
  }

  (streams, duration)
}

/// Parses one stream description line, e.g.
/// `    Stream #0:0[0x1e0]: Video: mpeg1video, yuv420p(tv), 352x288 [SAR 178:163 DAR 1958:1467], 1150 kb/s, 25 fps`
///
/// Returns `None` when the stream index or the type header can't be found.
/// Once the type is known, field errors stop parsing and return what was
/// read so far. Types other than audio and video only keep the raw line.
///
/// ## Examples
///
/// ```rust
/// use ffmpeg_shepherd::log_parser::parse_stream_info;
/// let line = "    Stream #0:1[0x1c0]: Audio: mp2, 44100 Hz, stereo, s16p, 224 kb/s";
/// let stream = parse_stream_info(line).unwrap();
/// assert_eq!(stream.index, 1);
/// assert_eq!(stream.format, "mp2");
/// assert_eq!(stream.audio_data().unwrap().bitrate, 224);
/// ```
pub fn parse_stream_info(line: &str) -> Option<Stream> {
  let text = line.trim_end();
  let after_prefix = text.get(STREAM_INDEX_OFFSET..)?;

  let digits = after_prefix
    .find(|c: char| !c.is_ascii_digit())
    .map(|end| &after_prefix[..end])?;
  let index = digits.parse::<u32>().ok()?;

  // `0[0x1e0](und): Video: mpeg1video, ...`
  let type_start = after_prefix.find(": ")? + 2;
  let type_len = after_prefix[type_start..].find(": ")?;
  let stream_type = &after_prefix[type_start..type_start + type_len];
  let fields: Vec<&str> = CommaIter::new(&after_prefix[type_start + type_len + 2..]).collect();

  let format = fields
    .first()
    .and_then(|f| f.split(' ').next())
    .unwrap_or_default()
    .to_string();

  let type_specific_data = match stream_type {
    "Video" => {
      let mut video = VideoStream::default();
      let _ = parse_video_fields(&mut video, &fields);
      StreamTypeSpecificData::Video(video)
    }
    "Audio" => {
      let mut audio = AudioStream::default();
      let _ = parse_audio_fields(&mut audio, &fields);
      StreamTypeSpecificData::Audio(audio)
    }
    _ => StreamTypeSpecificData::Other,
  };

  Some(Stream {
    format,
    index,
    raw_log_message: text.to_string(),
    type_specific_data,
  })
}

/// Fills `video` field by field, stopping at the first one that fails.
fn parse_video_fields(video: &mut VideoStream, fields: &[&str]) -> Option<()> {
  // `yuvj420p(pc, bt470bg/unknown/unknown)`
  let mut color = fields.get(1)?.split(['(', ')']);
  video.color_space = color.next().unwrap_or_default().to_string();
  if let Some(inner) = color.next() {
    let parts: Vec<&str> = inner
      .split([',', ';'])
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .collect();
    if parts.contains(&"tv") {
      video.color_range = "tv".to_string();
    } else if parts.contains(&"pc") {
      video.color_range = "pc".to_string();
    }
    if let Some(matrix) = parts.iter().find(|p| p.starts_with("bt")) {
      video.color_matrix = matrix.to_string();
    }
  }

  // `352x288 [SAR 178:163 DAR 1958:1467]`
  let size: Vec<&str> = fields
    .get(2)?
    .split(['x', '[', ']', ':', ' '])
    .filter(|s| !s.is_empty())
    .collect();
  video.width = size.first()?.parse().ok()?;
  video.height = size.get(1)?.parse().ok()?;
  if size.get(2) == Some(&"SAR") {
    video.sar = (size.get(3)?.parse().ok()?, size.get(4)?.parse().ok()?);
    if let Some(ratio) = aspect_ratio(video.sar) {
      video.pixel_aspect_ratio = ratio;
    }
    video.dar = (size.get(6)?.parse().ok()?, size.get(7)?.parse().ok()?);
    if let Some(ratio) = aspect_ratio(video.dar) {
      video.display_aspect_ratio = ratio;
    }
  }

  // FPS does not have to be at a fixed position, so search for it.
  if let Some(fps) = fields.iter().find(|f| f.ends_with("fps") && f.len() > 4) {
    let fps = fps.get(..fps.len() - 4)?;
    // FFmpeg occasionally reports a bogus `1k fps`
    if fps != "1k" {
      video.frame_rate = fps.parse().ok()?;
    }
  }

  if let Some(bitrate) = fields.iter().find(|f| f.ends_with("kb/s") && f.len() > 5) {
    video.bitrate = bitrate.get(..bitrate.len() - 5)?.parse().ok()?;
  }

  Some(())
}

/// `44100 Hz, stereo, s16p, 224 kb/s`
fn parse_audio_fields(audio: &mut AudioStream, fields: &[&str]) -> Option<()> {
  audio.sample_rate = fields.get(1)?.split(' ').next()?.parse().ok()?;
  audio.channels = fields.get(2)?.to_string();
  audio.bit_depth = fields.get(3)?.to_string();
  if let Some(bitrate) = fields.get(4).filter(|f| f.contains(" kb/s")) {
    audio.bitrate = bitrate.split(' ').next()?.parse().ok()?;
  }
  Some(())
}

fn aspect_ratio((num, den): (u32, u32)) -> Option<f64> {
  if num == 0 || den == 0 {
    return None;
  }
  Some((num as f64 / den as f64 * 1000.0).round() / 1000.0)
}

/// Parse a progress update line from FFmpeg.
///
/// Each field is parsed on its own; a field that is missing or malformed
/// keeps its default value.
///
/// ## Example
/// ```rust
/// use ffmpeg_shepherd::log_parser::parse_ffmpeg_progress;
/// use std::time::Duration;
/// let line = "frame= 1996 fps=1984 q=-1.0 Lsize=     372kB time=00:01:19.72 bitrate=  38.2kbits/s speed=79.2x";
/// let status = parse_ffmpeg_progress(line);
/// assert_eq!(status.frame, 1996);
/// assert_eq!(status.fps, 1984.0);
/// assert_eq!(status.quantizer, -1.0);
/// assert_eq!(status.size, "372kB");
/// assert_eq!(status.time, Duration::from_millis(79_720));
/// assert_eq!(status.bitrate, "38.2kbits/s");
/// assert_eq!(status.speed, 79.2);
/// ```
pub fn parse_ffmpeg_progress(line: &str) -> FfmpegStatus {
  let attr = |key: &str| parse_attribute(line, key);
  FfmpegStatus {
    frame: attr("frame").and_then(|s| s.parse().ok()).unwrap_or_default(),
    fps: attr("fps").and_then(|s| s.parse().ok()).unwrap_or_default(),
    quantizer: attr("q").and_then(|s| s.parse().ok()).unwrap_or_default(),
    // captures "Lsize=" AND "size="
    size: attr("size").unwrap_or_default().to_string(),
    time: attr("time").and_then(parse_duration_str).unwrap_or_default(),
    bitrate: attr("bitrate").unwrap_or_default().to_string(),
    speed: attr("speed")
      .filter(|s| *s != "N/A")
      .and_then(|s| s.trim_end_matches('x').parse().ok())
      .unwrap_or_default(),
  }
}

/// Parse a progress line printed by a standalone x264 encoder:
/// `     1   0.10  10985.28    0:00:10    22.35 KB  `
///
/// The format is fixed-width; any line that is not exactly 48 characters
/// gives an empty status. Columns are read left to right and reading stops
/// at the first one that fails.
pub fn parse_x264_progress(line: &str) -> FfmpegStatus {
  let mut status = FfmpegStatus::default();
  let chars: Vec<char> = line.chars().collect();
  if chars.len() != 48 {
    return status;
  }
  let column = |start: usize, len: usize| -> String {
    chars[start..start + len]
      .iter()
      .collect::<String>()
      .trim()
      .to_string()
  };

  let mut fill = || -> Option<()> {
    status.frame = column(0, 6).parse().ok()?;
    status.fps = column(6, 7).parse().ok()?;
    status.bitrate = column(13, 10);
    status.size = column(34, 12);
    Some(())
  };
  let _ = fill();
  status
}

/// Parses the version number out of the first line of `ffmpeg -version`.
///
/// ## Example:
///
/// ```rust
/// use ffmpeg_shepherd::log_parser::try_parse_version;
/// let line = "ffmpeg version 2023-01-18-git-ba36e6ed52-full_build-www.gyan.dev Copyright (c) 2000-2023 the FFmpeg developers\n";
/// let version = try_parse_version(line).unwrap();
/// assert_eq!(version, "2023-01-18-git-ba36e6ed52-full_build-www.gyan.dev");
/// ```
pub fn try_parse_version(string: &str) -> Option<String> {
  string
    .trim()
    .strip_prefix("ffmpeg version ")?
    .split_whitespace()
    .next()
    .map(|s| s.to_string())
}

/// Parse a time string in the format `HOURS:MM:SS.MILLISECONDS` into a number of seconds.
///
/// Negative times, which FFmpeg prints before the first frame is muxed, are
/// rejected along with `N/A`.
///
/// ## Examples
///
/// ```rust
/// use ffmpeg_shepherd::log_parser::parse_time_str;
/// assert!(parse_time_str("00:00:00.00") == Some(0.0));
/// assert!(parse_time_str("5") == Some(5.0));
/// assert!(parse_time_str("1:01.0") == Some(61.0));
/// assert!(parse_time_str("1:01:01.123") == Some(3661.123));
/// assert!(parse_time_str("-00:00:00.02") == None);
/// assert!(parse_time_str("N/A") == None);
/// ```
pub fn parse_time_str(str: &str) -> Option<f64> {
  let str = str.trim();
  if str.starts_with('-') {
    return None;
  }

  let mut seconds = 0.0;
  let mut smh = str.split(':').rev();
  if let Some(sec) = smh.next() {
    seconds += sec.parse::<f64>().ok()?;
  }

  if let Some(min) = smh.next() {
    seconds += min.parse::<f64>().ok()? * 60.0;
  }

  if let Some(hrs) = smh.next() {
    seconds += hrs.parse::<f64>().ok()? * 60.0 * 60.0;
  }

  if smh.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
    return None;
  }
  Some(seconds)
}

/// [`parse_time_str`] as a `Duration`, with microsecond precision.
pub fn parse_duration_str(str: &str) -> Option<Duration> {
  parse_time_str(str).map(|secs| Duration::from_micros((secs * 1_000_000.0).round() as u64))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::StreamType;

  #[test]
  fn test_parse_attribute() {
    assert_eq!(parse_attribute("", ""), None);
    assert_eq!(parse_attribute(" ", "     "), None);
    assert_eq!(parse_attribute("   =   ", " "), Some(""));
    assert_eq!(parse_attribute("mode=1 key=MyKey key=value2 ", "key"), Some("MyKey"));
    assert_eq!(parse_attribute("mode=1 key2=MyKey key=value2", "key"), Some("value2"));
    assert_eq!(parse_attribute("mode=1 key2=MyKey key=value2   ", "key"), Some("value2"));
    assert_eq!(parse_attribute("mode=1 key2=MyKey key3=value2", "key"), None);
    assert_eq!(parse_attribute("text", ""), None);
  }

  #[test]
  fn test_file_info_without_streams() {
    let (streams, duration) = parse_file_info("");
    assert!(streams.is_empty());
    assert_eq!(duration, Duration::ZERO);

    let (streams, _) = parse_file_info("This is some invalid data: Stream #0");
    assert!(streams.is_empty());
  }

  #[test]
  fn test_file_info_skips_misindented_streams() {
    let output = "  Duration: 00:04:46.52, start: 0.000000, bitrate: 1411 kb/s
    Stream #0:0[0x1e0]: Video: mpeg1video, yuv420p(tv), 352x288 [SAR 178:163 DAR 1958:1467], 1150 kb/s, 25 fps, 25 tbr, 90k tbn, 25 tbc
   aStream #0:1[0x1c0]: Audio: mp2, 44100 Hz, stereo, s16p, 224 kb/s";
    let (streams, duration) = parse_file_info(output);
    assert_eq!(streams.len(), 1);
    assert_eq!(duration, Duration::from_millis(286_520));
    assert!(streams[0].is_video());
  }

  #[test]
  fn test_file_info_duration_not_available() {
    let output = "  Duration: N/A, start: 0.000000, bitrate: N/A
    Stream #0:0: Audio: mp3, 44100 Hz, stereo, s16p, 192 kb/s";
    let (streams, duration) = parse_file_info(output);
    assert_eq!(streams.len(), 1);
    assert_eq!(duration, Duration::ZERO);
  }

  #[test]
  fn test_file_info_stops_at_output_section() {
    let output = "  Duration: 00:00:10.00, start: 0.000000, bitrate: 1411 kb/s
    Stream #0:0: Audio: mp3, 44100 Hz, stereo, s16p, 192 kb/s
Output #0, mp4, to 'out.mp4':
    Stream #0:0: Audio: aac (LC), 44100 Hz, stereo, fltp, 128 kb/s";
    let (streams, _) = parse_file_info(output);
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].format, "mp3");
  }

  #[test]
  fn test_parse_audio_streams() {
    let cases = [
      ("    Stream #0:1[0x1c0]: Audio: mp2, 44100 Hz, stereo, s16p, 224 kb/s", 1, "mp2", 44100, "stereo", "s16p", 224),
      ("    Stream #0:0: Audio: mp3, 44100 Hz, stereo, s16p, 192 kb/s", 0, "mp3", 44100, "stereo", "s16p", 192),
      ("    Stream #0:1(und): Audio: aac (LC) (mp4a / 0x6134706D), 44100 Hz, stereo, fltp, 132 kb/s (default)", 1, "aac", 44100, "stereo", "fltp", 132),
    ];
    for (line, index, format, sample_rate, channels, bit_depth, bitrate) in cases {
      let stream = parse_stream_info(line).unwrap();
      assert_eq!(stream.stream_type(), StreamType::Audio);
      assert_eq!(stream.raw_log_message, line);
      assert_eq!(stream.index, index);
      assert_eq!(stream.format, format);
      let audio = stream.audio_data().unwrap();
      assert_eq!(audio.sample_rate, sample_rate);
      assert_eq!(audio.channels, channels);
      assert_eq!(audio.bit_depth, bit_depth);
      assert_eq!(audio.bitrate, bitrate);
    }
  }

  #[test]
  fn test_parse_stream_bad_index() {
    assert!(parse_stream_info("").is_none());
    assert!(parse_stream_info("   Stream #0:0: Audio: mp3, 44100 Hz, stereo, s16p, 192 kb/s").is_none());
    assert!(parse_stream_info("    Stream #0:").is_none());
  }

  #[test]
  fn test_parse_invalid_video_stream_keeps_defaults() {
    let stream = parse_stream_info("    Stream #0:1: Video: this, , , is; invalid data").unwrap();
    assert_eq!(stream.index, 1);
    assert_eq!(stream.format, "this");
    let video = stream.video_data().unwrap();
    assert_eq!(video.color_space, "");
    assert_eq!(video.color_range, "");
    assert_eq!(video.color_matrix, "");
    assert_eq!((video.width, video.height), (0, 0));
    assert_eq!(video.sar, (1, 1));
    assert_eq!(video.dar, (1, 1));
    assert_eq!(video.frame_rate, 0.0);
    assert_eq!(video.bit_depth, 8);
    assert_eq!(video.bitrate, 0);
  }

  #[test]
  fn test_parse_video_stream_aspect_ratio() {
    let line = "    Stream #0:0[0x1e0]: Video: mpeg1video, yuv420p(tv), 352x288 [SAR 178:163 DAR 1958:1467], 1150 kb/s, 25 fps, 25 tbr, 90k tbn, 25 tbc";
    let stream = parse_stream_info(line).unwrap();
    assert_eq!(stream.index, 0);
    assert_eq!(stream.format, "mpeg1video");
    let video = stream.video_data().unwrap();
    assert_eq!(video.color_space, "yuv420p");
    assert_eq!(video.color_range, "tv");
    assert_eq!(video.color_matrix, "");
    assert_eq!((video.width, video.height), (352, 288));
    assert_eq!(video.sar, (178, 163));
    assert_eq!(video.dar, (1958, 1467));
    assert_eq!(video.pixel_aspect_ratio, 1.092);
    assert_eq!(video.display_aspect_ratio, 1.335);
    assert_eq!(video.frame_rate, 25.0);
    assert_eq!(video.bitrate, 1150);
  }

  #[test]
  fn test_parse_video_stream_color_matrix() {
    let line = "    Stream #0:1: Video: mjpeg, yuvj420p(pc, bt470bg/unknown/unknown), 1000x1000 [SAR 1:1 DAR 1:1], 90k tbr, 90k tbn, 90k tbc";
    let video = parse_stream_info(line).unwrap().video_data().cloned().unwrap();
    assert_eq!(video.color_space, "yuvj420p");
    assert_eq!(video.color_range, "pc");
    assert_eq!(video.color_matrix, "bt470bg/unknown/unknown");
    assert_eq!((video.width, video.height), (1000, 1000));
    assert_eq!(video.pixel_aspect_ratio, 1.0);
    assert_eq!(video.frame_rate, 0.0);
    assert_eq!(video.bitrate, 0);
  }

  #[test]
  fn test_parse_video_stream_with_profile() {
    let line = "    Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 352x288 [SAR 178:163 DAR 1958:1467], 228 kb/s, 25 fps, 25 tbr, 12800 tbn, 50 tbc (default)";
    let stream = parse_stream_info(line).unwrap();
    assert_eq!(stream.format, "h264");
    let video = stream.video_data().unwrap();
    assert_eq!(video.color_space, "yuv420p");
    assert_eq!(video.color_range, "");
    assert_eq!(video.frame_rate, 25.0);
    assert_eq!(video.bitrate, 228);
  }

  #[test]
  fn test_parse_video_stream_without_aspect_ratio() {
    let line = "    Stream #0:0: Video: rawvideo (I420 / 0x30323449), yuv420p, 640x480, 23.98 fps, 23.98 tbr";
    let video = parse_stream_info(line).unwrap().video_data().cloned().unwrap();
    assert_eq!((video.width, video.height), (640, 480));
    assert_eq!(video.pixel_aspect_ratio, 1.0);
    assert_eq!(video.display_aspect_ratio, 1.0);
    assert_eq!(video.frame_rate, 23.98);
  }

  #[test]
  fn test_parse_other_stream_keeps_raw_text() {
    let line = "    Stream #0:2(eng): Subtitle: subrip";
    let stream = parse_stream_info(line).unwrap();
    assert_eq!(stream.stream_type(), StreamType::None);
    assert_eq!(stream.index, 2);
    assert_eq!(stream.format, "subrip");
    assert_eq!(stream.raw_log_message, line);
  }

  #[test]
  fn test_parse_ffmpeg_progress() {
    let line = "frame=  929 fps=0.0 q=-0.0 size=   68483kB time=00:00:37.00 bitrate=15162.6kbits/s speed=  74x    ";
    let status = parse_ffmpeg_progress(line);
    assert_eq!(status.frame, 929);
    assert_eq!(status.fps, 0.0);
    assert_eq!(status.quantizer, 0.0);
    assert_eq!(status.size, "68483kB");
    assert_eq!(status.time, Duration::from_secs(37));
    assert_eq!(status.bitrate, "15162.6kbits/s");
    assert_eq!(status.speed, 74.0);
  }

  #[test]
  fn test_parse_ffmpeg_progress_invalid() {
    assert_eq!(parse_ffmpeg_progress(""), FfmpegStatus::default());
    assert_eq!(parse_ffmpeg_progress("This is invalid data."), FfmpegStatus::default());
  }

  /// First progress message on Unix has `bitrate=N/A` and `speed=N/A`, and
  /// the time may be negative before the first packet is written.
  #[test]
  fn test_parse_ffmpeg_progress_partial() {
    let line = "frame=    0 fps=0.0 q=0.0 size=       0kB time=-00:00:00.04 bitrate=N/A speed=N/A";
    let status = parse_ffmpeg_progress(line);
    assert_eq!(status.frame, 0);
    assert_eq!(status.size, "0kB");
    assert_eq!(status.time, Duration::ZERO);
    assert_eq!(status.bitrate, "N/A");
    assert_eq!(status.speed, 0.0);

    let status = parse_ffmpeg_progress("frame=abc fps=12.5 q=28.0");
    assert_eq!(status.frame, 0);
    assert_eq!(status.fps, 12.5);
    assert_eq!(status.quantizer, 28.0);
  }

  #[test]
  fn test_parse_x264_progress() {
    assert_eq!(parse_x264_progress(""), FfmpegStatus::default());

    let status = parse_x264_progress("     1   0.10  10985.28    0:00:10    22.35 KB  ");
    assert_eq!(status.frame, 1);
    assert_eq!(status.fps, 0.1);
    assert_eq!(status.bitrate, "10985.28");
    assert_eq!(status.size, "22.35 KB");

    let status = parse_x264_progress("     12345 Invalid Dataaaaaaaaaaaaaaaaaaaa      ");
    assert_eq!(status.frame, 1);
    assert_eq!(status.fps, 0.0);
    assert_eq!(status.bitrate, "");
    assert_eq!(status.size, "");
  }

  #[test]
  fn test_parse_version() {
    assert_eq!(
      try_parse_version("ffmpeg version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers"),
      Some("6.1.1".to_string())
    );
    assert_eq!(try_parse_version("  configuration: --enable-gpl"), None);
  }

  #[test]
  fn test_parse_time_str_rejects_garbage() {
    assert_eq!(parse_time_str("1:2:3:4"), None);
    assert_eq!(parse_time_str("NaN"), None);
    assert_eq!(parse_time_str(""), None);
  }
}
