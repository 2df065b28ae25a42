//! An internal utility used to split the `", "`-separated fields of FFmpeg stream lines.

/// An iterator over `", "`-separated fields, **ignoring separators inside parentheses**.
///
/// Empty fields are yielded as empty strings, so `"a, , b"` has three fields.
///
/// ## Examples
///
/// ```rust
/// use ffmpeg_shepherd::comma_iter::CommaIter;
///
/// let string = "yuvj420p(pc, bt470bg/unknown/unknown), 1000x1000";
/// let mut iter = CommaIter::new(string);
///
/// assert_eq!(iter.next(), Some("yuvj420p(pc, bt470bg/unknown/unknown)"));
/// assert_eq!(iter.next(), Some("1000x1000"));
/// assert_eq!(iter.next(), None);
/// ```
#[derive(Clone)]
pub struct CommaIter<'a> {
  rest: Option<&'a str>,
}

impl<'a> CommaIter<'a> {
  pub fn new(string: &'a str) -> Self {
    Self { rest: Some(string) }
  }
}

impl<'a> Iterator for CommaIter<'a> {
  type Item = &'a str;

  /// Return the next field, not including the separator.
  fn next(&mut self) -> Option<Self::Item> {
    let string = self.rest?;
    let bytes = string.as_bytes();
    let mut depth = 0usize;

    for (i, &byte) in bytes.iter().enumerate() {
      match byte {
        b'(' => depth += 1,
        b')' => depth = depth.saturating_sub(1),
        b',' if depth == 0 && bytes.get(i + 1) == Some(&b' ') => {
          self.rest = Some(&string[i + 2..]);
          return Some(&string[..i]);
        }
        _ => {}
      }
    }

    self.rest = None;
    Some(string)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_keeps_empty_fields() {
    let fields: Vec<&str> = CommaIter::new("this, , , is; invalid data").collect();
    assert_eq!(fields, vec!["this", "", "", "is; invalid data"]);
  }

  #[test]
  fn test_nested_parentheses() {
    let fields: Vec<&str> =
      CommaIter::new("h264 (High) (avc1 / 0x31637661), yuv420p(tv, bt709, progressive), 25 fps")
        .collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1], "yuv420p(tv, bt709, progressive)");
  }

  #[test]
  fn test_comma_without_space_is_not_a_separator() {
    let fields: Vec<&str> = CommaIter::new("a,b, c").collect();
    assert_eq!(fields, vec!["a,b", "c"]);
  }
}
