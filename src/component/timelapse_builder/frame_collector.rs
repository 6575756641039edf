//! 單一資料夾的影像掃描
//!
//! 讀取每張影像的 EXIF 拍攝時間並排除夜間照片

use crate::config::TimelapseConfig;
use crate::error::FrameError;
use crate::tools::{
    Ephemeris, MetadataReader, SolarWindow, capture_time_text, parse_exif_timestamp,
    scan_image_files,
};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// 通過日夜過濾的照片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
}

enum FrameOutcome {
    Kept(Frame),
    Night,
    Failed(FrameError),
}

/// 資料夾掃描結果，`frames` 維持檔案的掃描順序
#[derive(Debug, Default)]
pub struct FolderScan {
    pub folder: PathBuf,
    pub scanned: usize,
    pub frames: Vec<Frame>,
    pub night_frames: usize,
    pub failures: Vec<FrameError>,
}

pub struct FrameCollector<'a, M: MetadataReader, E: Ephemeris> {
    config: &'a TimelapseConfig,
    reader: &'a M,
    window: &'a SolarWindow<E>,
    shutdown_signal: &'a AtomicBool,
}

impl<'a, M: MetadataReader, E: Ephemeris> FrameCollector<'a, M, E> {
    pub const fn new(
        config: &'a TimelapseConfig,
        reader: &'a M,
        window: &'a SolarWindow<E>,
        shutdown_signal: &'a AtomicBool,
    ) -> Self {
        Self {
            config,
            reader,
            window,
            shutdown_signal,
        }
    }

    pub fn collect(&self, folder: &Path) -> FolderScan {
        let files = scan_image_files(folder, self.config);
        debug!("{}: 找到 {} 張影像", folder.display(), files.len());

        let outcomes: Vec<FrameOutcome> = files
            .par_iter()
            .filter_map(|path| {
                if self.shutdown_signal.load(Ordering::SeqCst) {
                    return None;
                }
                Some(self.process_file(path))
            })
            .collect();

        let mut scan = FolderScan {
            folder: folder.to_path_buf(),
            scanned: files.len(),
            ..FolderScan::default()
        };
        for outcome in outcomes {
            match outcome {
                FrameOutcome::Kept(frame) => scan.frames.push(frame),
                FrameOutcome::Night => scan.night_frames += 1,
                FrameOutcome::Failed(e) => {
                    warn!("略過影像: {e}");
                    scan.failures.push(e);
                }
            }
        }

        info!(
            "{}: 讀取 {} 張，保留 {} 張，夜間 {} 張，失敗 {} 張",
            folder.display(),
            scan.scanned,
            scan.frames.len(),
            scan.night_frames,
            scan.failures.len()
        );
        scan
    }

    fn process_file(&self, path: &Path) -> FrameOutcome {
        match read_frame(self.reader, path) {
            Ok(frame) if self.window.is_night(frame.timestamp) => FrameOutcome::Night,
            Ok(frame) => FrameOutcome::Kept(frame),
            Err(e) => FrameOutcome::Failed(e),
        }
    }
}

/// 讀取單一影像的拍攝時間
pub fn read_frame<M: MetadataReader>(reader: &M, path: &Path) -> Result<Frame, FrameError> {
    let bytes = fs::read(path).map_err(|source| FrameError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let tags = reader
        .read_tags(&bytes)
        .map_err(|reason| FrameError::MetadataUnavailable {
            path: path.to_path_buf(),
            reason,
        })?;

    let raw = capture_time_text(&tags).ok_or_else(|| FrameError::MetadataUnavailable {
        path: path.to_path_buf(),
        reason: "缺少拍攝時間標籤".to_string(),
    })?;

    let timestamp = parse_exif_timestamp(raw).ok_or_else(|| FrameError::TimestampUnparseable {
        path: path.to_path_buf(),
        raw: raw.to_string(),
    })?;

    Ok(Frame {
        path: path.to_path_buf(),
        timestamp,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Location;
    use crate::tools::solar_window::tests::FixedEphemeris;
    use crate::tools::{CAPTURE_TIME_TAG, MetadataTags, TagValue};
    use chrono::{TimeDelta, Timelike};
    use tempfile::TempDir;

    /// 將檔案內容直接當作 DateTime 標籤的讀取器；內容為 `broken` 時視為讀取失敗
    pub(crate) struct TextMetadataReader;

    impl MetadataReader for TextMetadataReader {
        fn read_tags(&self, bytes: &[u8]) -> Result<MetadataTags, String> {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if text == "broken" {
                return Err("corrupt header".to_string());
            }
            let mut tags = MetadataTags::new();
            if !text.is_empty() {
                tags.insert(CAPTURE_TIME_TAG.to_string(), TagValue::List(vec![text]));
            }
            Ok(tags)
        }
    }

    fn window() -> SolarWindow<FixedEphemeris> {
        SolarWindow::new(FixedEphemeris, Location::default(), TimeDelta::hours(1))
    }

    fn collect(folder: &Path) -> FolderScan {
        let config = TimelapseConfig::default();
        let window = window();
        let shutdown = AtomicBool::new(false);
        FrameCollector::new(&config, &TextMetadataReader, &window, &shutdown).collect(folder)
    }

    #[test]
    fn test_only_daytime_frame_survives() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.jpg"), "2024:05:01 12:00:00").unwrap();
        fs::write(temp_dir.path().join("b.jpg"), "2024:05:01 23:30:00").unwrap();
        fs::write(temp_dir.path().join("c.jpg"), "2024:05:01 04:00:00").unwrap();

        let scan = collect(temp_dir.path());
        assert_eq!(scan.scanned, 3);
        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.frames[0].path, temp_dir.path().join("a.jpg"));
        assert_eq!(scan.frames[0].timestamp.hour(), 12);
        assert_eq!(scan.night_frames, 2);
        assert!(scan.failures.is_empty());
    }

    #[test]
    fn test_failed_file_does_not_affect_others() {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in [
            ("1.jpg", "2024:05:01 09:00:00"),
            ("2.jpg", "2024:05:01 11:00:00"),
            ("3.jpg", "broken"),
            ("4.jpg", "2024:05:01 10:00:00"),
            ("5.jpg", "2024:05:01 08:00:00"),
        ] {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }

        let scan = collect(temp_dir.path());
        assert_eq!(scan.frames.len(), 4);
        assert_eq!(scan.failures.len(), 1);
        assert!(matches!(
            scan.failures[0],
            FrameError::MetadataUnavailable { .. }
        ));
        assert_eq!(scan.failures[0].path(), &temp_dir.path().join("3.jpg"));
    }

    #[test]
    fn test_missing_tag_and_bad_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("empty.jpg");
        let garbled = temp_dir.path().join("garbled.jpg");
        fs::write(&empty, "").unwrap();
        fs::write(&garbled, "2024:05:01").unwrap();

        assert!(matches!(
            read_frame(&TextMetadataReader, &empty),
            Err(FrameError::MetadataUnavailable { .. })
        ));
        assert!(matches!(
            read_frame(&TextMetadataReader, &garbled),
            Err(FrameError::TimestampUnparseable { .. })
        ));
        assert!(matches!(
            read_frame(&TextMetadataReader, &temp_dir.path().join("missing.jpg")),
            Err(FrameError::Read { .. })
        ));
    }

    #[test]
    fn test_empty_folder_yields_empty_scan() {
        let temp_dir = TempDir::new().unwrap();
        let scan = collect(temp_dir.path());
        assert_eq!(scan.scanned, 0);
        assert!(scan.frames.is_empty());
    }

    #[test]
    fn test_shutdown_skips_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.jpg"), "2024:05:01 12:00:00").unwrap();

        let config = TimelapseConfig::default();
        let window = window();
        let shutdown = AtomicBool::new(true);
        let scan = FrameCollector::new(&config, &TextMetadataReader, &window, &shutdown)
            .collect(temp_dir.path());
        assert!(scan.frames.is_empty());
    }
}
