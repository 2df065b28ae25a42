/// Split a command-line argument string into individual arguments, the way a
/// POSIX shell would for plain words and quotes.
///
/// Whitespace separates arguments unless quoted. Double quotes group words
/// and allow `\"` and `\\` escapes; single quotes group words literally.
/// Outside quotes a backslash escapes the next character. An unterminated
/// quote runs to the end of the string.
///
/// ## Examples
///
/// ```rust
/// use ffmpeg_shepherd::util::split_args;
/// let args = split_args(r#"-i "my movie.mkv" -vf 'scale=640:-2' -y out.mp4"#);
/// assert_eq!(args, ["-i", "my movie.mkv", "-vf", "scale=640:-2", "-y", "out.mp4"]);
/// ```
pub fn split_args(line: &str) -> Vec<String> {
  let mut args = Vec::new();
  let mut current = String::new();
  let mut in_word = false;
  let mut chars = line.chars();

  while let Some(c) = chars.next() {
    match c {
      '"' => {
        in_word = true;
        while let Some(q) = chars.next() {
          match q {
            '"' => break,
            '\\' => match chars.next() {
              Some(e @ ('"' | '\\')) => current.push(e),
              Some(e) => {
                current.push('\\');
                current.push(e);
              }
              None => current.push('\\'),
            },
            _ => current.push(q),
          }
        }
      }
      '\'' => {
        in_word = true;
        for q in chars.by_ref() {
          if q == '\'' {
            break;
          }
          current.push(q);
        }
      }
      '\\' => {
        in_word = true;
        current.push(chars.next().unwrap_or('\\'));
      }
      c if c.is_whitespace() => {
        if in_word {
          args.push(std::mem::take(&mut current));
          in_word = false;
        }
      }
      _ => {
        in_word = true;
        current.push(c);
      }
    }
  }

  if in_word {
    args.push(current);
  }
  args
}

/// Quote one argument so the shell (or [`split_args`]) reads it back
/// unchanged. Single quotes on Unix, where nothing inside them is expanded.
#[cfg(not(windows))]
pub fn quote(arg: &str) -> String {
  format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Quote one argument for the Windows command-line parser.
#[cfg(windows)]
pub fn quote(arg: &str) -> String {
  format!("\"{}\"", arg.replace('"', "\\\""))
}

/// Join arguments into one argument string, quoting only those that need it.
///
/// ## Examples
///
/// ```rust
/// use ffmpeg_shepherd::util::{join_args, split_args};
/// let args = ["-i", "my movie.mkv", "-metadata", "title=it's \"here\"", "out.mp4"];
/// # #[cfg(not(windows))]
/// assert_eq!(split_args(&join_args(args)), args);
/// ```
pub fn join_args<I, S>(args: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  args
    .into_iter()
    .map(|arg| {
      let arg = arg.as_ref();
      if needs_quoting(arg) {
        quote(arg)
      } else {
        arg.to_string()
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

fn needs_quoting(arg: &str) -> bool {
  arg.is_empty()
    || !arg
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%^".contains(c))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_plain_words() {
    assert_eq!(split_args("  -hide_banner   -i in.mkv\t-f null - "), ["-hide_banner", "-i", "in.mkv", "-f", "null", "-"]);
    assert!(split_args("").is_empty());
    assert!(split_args("   ").is_empty());
  }

  #[test]
  fn test_quotes() {
    assert_eq!(split_args(r#""a b" 'c d' e"f g"h"#), ["a b", "c d", "ef gh"]);
    assert_eq!(split_args(r#""" ''"#), ["", ""]);
    assert_eq!(split_args(r#""say \"hi\"" 'it\s'"#), [r#"say "hi""#, r"it\s"]);
  }

  #[test]
  fn test_backslash_outside_quotes() {
    assert_eq!(split_args(r"my\ file.mkv"), ["my file.mkv"]);
    assert_eq!(split_args("trailing\\"), ["trailing\\"]);
  }

  #[cfg(not(windows))]
  #[test]
  fn test_quote_is_literal() {
    assert_eq!(quote("$(rm -rf x).avs"), "'$(rm -rf x).avs'");
    assert_eq!(quote("it's"), r"'it'\''s'");
    for arg in ["it's", "$(x) `y` $HOME", r#"say "hi" \n"#, "", "a  b"] {
      assert_eq!(split_args(&quote(arg)), [arg]);
    }
  }

  #[cfg(not(windows))]
  #[test]
  fn test_join_args() {
    assert_eq!(join_args(["-i", "in.mkv", "-vf", "scale=640:-2"]), "-i in.mkv -vf scale=640:-2");
    let args = ["-i", "my movie.mkv", "", r#"a"b\c"#, "$x"];
    assert_eq!(join_args(args), r#"-i 'my movie.mkv' '' 'a"b\c' '$x'"#);
    assert_eq!(split_args(&join_args(args)), args);
  }

  #[test]
  fn test_unterminated_quote() {
    assert_eq!(split_args(r#"-i "unterminated value"#), ["-i", "unterminated value"]);
  }
}
