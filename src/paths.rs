use crate::error::{Error, Result};
use std::{
  env::{current_exe, split_paths, var_os},
  path::{Path, PathBuf},
};

/// Returns the default path of the FFmpeg executable. It first looks for an
/// FFmpeg binary adjacent to the Rust executable, then falls back to a bare
/// `ffmpeg` expected on the system path.
pub fn ffmpeg_path() -> PathBuf {
  sidecar_or_default("ffmpeg")
}

/// Same discovery rule as [`ffmpeg_path`], for the `avs2yuv` tool that pipes
/// raw frames out of an Avisynth script.
pub fn avs2yuv_path() -> PathBuf {
  sidecar_or_default("avs2yuv")
}

fn sidecar_or_default(name: &str) -> PathBuf {
  match sidecar_path(name) {
    Ok(path) if path.exists() => path,
    _ => PathBuf::from(name),
  }
}

/// The (expected) path to a binary adjacent to the Rust binary.
///
/// The extension differs between platforms, with Windows using `.exe`, while
/// Mac and Linux have no extension.
pub fn sidecar_path(name: &str) -> Result<PathBuf> {
  let mut path = current_exe()?
    .parent()
    .ok_or("Can't get parent of current_exe")?
    .join(name);
  if cfg!(windows) {
    path.set_extension("exe");
  }
  Ok(path)
}

/// Locate an executable the way a shell would: paths containing a directory
/// component are checked as-is, bare names are searched on `PATH`.
pub fn resolve_executable<P: AsRef<Path>>(program: P) -> Result<PathBuf> {
  let program = program.as_ref();
  if program.as_os_str().is_empty() {
    return Err(Error::argument("executable path cannot be empty"));
  }

  let not_found = || Error::not_found(format!("File \"{}\" is not found.", program.display()));

  if program.components().count() > 1 || program.is_absolute() {
    return candidates(program)
      .into_iter()
      .find(|p| p.is_file())
      .ok_or_else(not_found);
  }

  let search_path = var_os("PATH").ok_or_else(not_found)?;
  split_paths(&search_path)
    .flat_map(|dir| candidates(&dir.join(program)))
    .find(|p| p.is_file())
    .ok_or_else(not_found)
}

/// On Windows `ffmpeg` also matches `ffmpeg.exe`.
fn candidates(path: &Path) -> Vec<PathBuf> {
  let mut list = vec![path.to_path_buf()];
  if cfg!(windows) && path.extension().is_none() {
    list.push(path.with_extension("exe"));
  }
  list
}
