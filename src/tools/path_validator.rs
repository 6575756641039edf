use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("無法建立資料夾: {}", path.display()))?;
    }
    Ok(())
}

/// 轉成絕對路徑，讓清單內容不受 ffmpeg 讀取清單的位置影響
pub fn to_absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("無法取得絕對路徑: {}", path.display()))
}
