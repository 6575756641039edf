//! ffmpeg concat demuxer 清單
//!
//! 每行一筆 `file '<path>'`，以換行分隔。路徑中的單引號寫成 `'\''`。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const LINE_PREFIX: &str = "file '";
const ESCAPED_QUOTE: &str = r"'\''";

#[must_use]
pub fn manifest_line(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', ESCAPED_QUOTE);
    format!("{LINE_PREFIX}{escaped}'")
}

#[must_use]
pub fn render_manifest<P: AsRef<Path>>(entries: &[P]) -> String {
    entries
        .iter()
        .map(|entry| manifest_line(entry.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 寫入清單，必要時建立上層目錄
pub fn write_manifest<P: AsRef<Path>>(manifest_path: &Path, entries: &[P]) -> io::Result<()> {
    if let Some(parent) = manifest_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(manifest_path, render_manifest(entries))
}

#[must_use]
pub fn parse_manifest_line(line: &str) -> Option<PathBuf> {
    let quoted = line.trim_end_matches('\r').strip_prefix(LINE_PREFIX)?;
    let body = quoted.strip_suffix('\'')?;
    Some(PathBuf::from(body.replace(ESCAPED_QUOTE, "'")))
}

pub fn read_manifest(manifest_path: &Path) -> io::Result<Vec<PathBuf>> {
    let content = fs::read_to_string(manifest_path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            parse_manifest_line(line).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("無效的清單行: {line}"),
                )
            })
        })
        .collect()
}
