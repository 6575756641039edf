use std::path::PathBuf;
use thiserror::Error;

/// 單一影像檔案的處理失敗，只影響該檔案
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("無法讀取檔案 '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("無法取得 EXIF 時間 '{path}': {reason}")]
    MetadataUnavailable { path: PathBuf, reason: String },

    #[error("無法解析拍攝時間 '{path}': {raw:?}")]
    TimestampUnparseable { path: PathBuf, raw: String },
}

impl FrameError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. }
            | Self::MetadataUnavailable { path, .. }
            | Self::TimestampUnparseable { path, .. } => path,
        }
    }
}

/// 單一資料夾的清單寫入失敗，不影響其他資料夾
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("無法寫入清單 '{path}': {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
