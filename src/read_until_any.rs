//! Internal utility; `BufRead::read_until` with multiple delimiters, and a
//! line iterator built on it for FFmpeg's `\r`-terminated progress lines.

use std::io::{BufRead, ErrorKind, Result};

const LINE_DELIMS: &[u8] = b"\r\n";

fn is_delim(delims: &[u8], b: u8) -> bool {
  delims.contains(&b)
}

/// Reads from the provided buffer until any of the delimiter bytes match.
/// The output buffer will include the ending delimiter. Delimiters at the very
/// start of a read are swallowed into the same chunk, so `\r\n` never yields an
/// empty line. Returns `Ok(0)` at end of stream.
/// See [`BufRead::read_until`](https://doc.rust-lang.org/std/io/trait.BufRead.html#method.read_until).
pub fn read_until_any<R: BufRead + ?Sized>(
  r: &mut R,
  delims: &[u8],
  buf: &mut Vec<u8>,
) -> Result<usize> {
  let mut read = 0;
  loop {
    let (done, used) = {
      let available = match r.fill_buf() {
        Ok(n) => n,
        Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
        Err(e) => return Err(e),
      };

      let skip = if read == 0 {
        available.iter().take_while(|&&b| is_delim(delims, b)).count()
      } else {
        0
      };

      match available[skip..].iter().position(|&b| is_delim(delims, b)) {
        Some(i) => {
          let end = skip + i + 1;
          buf.extend_from_slice(&available[..end]);
          (true, end)
        }
        None => {
          buf.extend_from_slice(available);
          (false, available.len())
        }
      }
    };
    r.consume(used);
    read += used;

    if done {
      return Ok(read);
    }

    if used == 0 {
      // Only delimiters left before EOF: nothing worth reporting.
      if buf.iter().all(|&b| is_delim(delims, b)) {
        return Ok(0);
      }
      return Ok(read);
    }
  }
}

/// Iterator over the lines of a child process stream, split on `\r` or `\n`.
///
/// Line terminators are stripped but leading spaces are kept, since FFmpeg's
/// log sections are recognised by their indentation. Invalid UTF-8 (e.g. file
/// names in a legacy code page) is replaced rather than treated as an error.
pub struct LogLines<R: BufRead> {
  reader: R,
}

impl<R: BufRead> LogLines<R> {
  pub fn new(reader: R) -> Self {
    Self { reader }
  }
}

impl<R: BufRead> Iterator for LogLines<R> {
  type Item = Result<String>;

  fn next(&mut self) -> Option<Self::Item> {
    let mut buf = Vec::new();
    match read_until_any(&mut self.reader, LINE_DELIMS, &mut buf) {
      Ok(0) => None,
      Ok(_) => {
        let line = String::from_utf8_lossy(&buf);
        Some(Ok(
          line
            .trim_matches(|c| c == '\r' || c == '\n')
            .to_string(),
        ))
      }
      Err(e) => Some(Err(e)),
    }
  }
}
