use crate::config::TimelapseConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 列出根目錄下的第一層子資料夾，依名稱排序
pub fn list_source_folders(root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("無法讀取來源資料夾: {}", root.display()))?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.path())
        .collect();

    folders.sort();
    Ok(folders)
}

/// 遞迴掃描資料夾內符合副檔名的影像，順序固定（依檔名）
#[must_use]
pub fn scan_image_files(directory: &Path, config: &TimelapseConfig) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| config.is_image_file(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}
