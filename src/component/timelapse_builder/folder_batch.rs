use super::frame_collector::Frame;
use crate::config::{FROM_PLACEHOLDER, TO_PLACEHOLDER};
use crate::error::BatchError;
use crate::tools::{FfmpegCommand, write_manifest};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 單一資料夾排序後的影格與對應清單
#[derive(Debug, Clone)]
pub struct FolderBatch {
    pub folder: PathBuf,
    pub frames: Vec<Frame>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub manifest_path: PathBuf,
}

impl FolderBatch {
    /// 依拍攝時間排序（穩定排序，相同時間維持掃描順序）；沒有影格時回傳 `None`
    #[must_use]
    pub fn build(
        folder: &Path,
        mut frames: Vec<Frame>,
        template: &str,
        output_dir: &Path,
    ) -> Option<Self> {
        frames.sort_by_key(|frame| frame.timestamp);

        let start_date = frames.first()?.timestamp.date();
        let end_date = frames.last()?.timestamp.date();
        let manifest_path = output_dir.join(render_template(template, start_date, end_date));

        Some(Self {
            folder: folder.to_path_buf(),
            frames,
            start_date,
            end_date,
            manifest_path,
        })
    }

    #[must_use]
    pub fn segment_path(&self) -> PathBuf {
        FfmpegCommand::generate_segment_path(&self.manifest_path)
    }

    pub fn write_manifest(&self) -> Result<&Path, BatchError> {
        let entries: Vec<&Path> = self.frames.iter().map(|frame| frame.path.as_path()).collect();

        write_manifest(&self.manifest_path, &entries).map_err(|source| BatchError::ManifestWrite {
            path: self.manifest_path.clone(),
            source,
        })?;

        info!(
            "已寫入 {} ({} 張影格)",
            self.manifest_path.display(),
            self.frames.len()
        );
        Ok(&self.manifest_path)
    }
}

/// 日期格式為 `YYYY-M-D`，月份從 1 開始且不補零
#[must_use]
pub fn format_template_date(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

#[must_use]
pub fn render_template(template: &str, start_date: NaiveDate, end_date: NaiveDate) -> String {
    template
        .replace(FROM_PLACEHOLDER, &format_template_date(start_date))
        .replace(TO_PLACEHOLDER, &format_template_date(end_date))
}

/// 多個資料夾產生相同清單名稱時，依資料夾順序在後者加上 `-2`、`-3` 後綴
pub fn disambiguate_manifest_paths(batches: &mut [FolderBatch]) {
    let mut used: HashSet<PathBuf> = HashSet::new();

    for batch in batches.iter_mut() {
        let original = batch.manifest_path.clone();
        let mut candidate = original.clone();
        let mut suffix = 1;
        while !used.insert(candidate.clone()) {
            suffix += 1;
            candidate = with_suffix(&original, suffix);
        }

        if candidate != original {
            warn!(
                "清單名稱重複，{} 改用 {}",
                batch.folder.display(),
                candidate.display()
            );
            batch.manifest_path = candidate;
        }
    }
}

fn with_suffix(path: &Path, suffix: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}-{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{suffix}"),
    };
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::read_manifest;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    const TEMPLATE: &str = "{{from}}-{{to}}.txt";

    fn frame(name: &str, ts: &str) -> Frame {
        Frame {
            path: PathBuf::from(format!("/photos/{name}")),
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
        }
    }

    #[test]
    fn test_empty_frames_produce_no_batch() {
        assert!(FolderBatch::build(Path::new("/photos"), Vec::new(), TEMPLATE, Path::new("/out")).is_none());
    }

    #[test]
    fn test_frames_sorted_and_none_dropped() {
        let frames = vec![
            frame("c.jpg", "2024-01-07 12:00:00"),
            frame("a.jpg", "2024-01-05 09:00:00"),
            frame("d.jpg", "2024-01-05 16:00:00"),
            frame("b.jpg", "2024-01-06 10:30:00"),
        ];
        let batch = FolderBatch::build(Path::new("/photos"), frames, TEMPLATE, Path::new("/out")).unwrap();

        assert_eq!(batch.frames.len(), 4);
        assert!(batch.frames.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(batch.start_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(batch.end_date, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(batch.manifest_path, Path::new("/out/2024-1-5-2024-1-7.txt"));
        assert_eq!(batch.segment_path(), Path::new("/out/2024-1-5-2024-1-7.mp4"));
    }

    #[test]
    fn test_equal_timestamps_keep_discovery_order() {
        let frames = vec![
            frame("first.jpg", "2024-01-05 12:00:00"),
            frame("second.jpg", "2024-01-05 12:00:00"),
            frame("early.jpg", "2024-01-05 08:00:00"),
        ];
        let batch = FolderBatch::build(Path::new("/photos"), frames, TEMPLATE, Path::new("/out")).unwrap();
        let names: Vec<_> = batch.frames.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("/photos/early.jpg"),
                PathBuf::from("/photos/first.jpg"),
                PathBuf::from("/photos/second.jpg"),
            ]
        );
    }

    #[test]
    fn test_template_date_is_one_based_and_unpadded() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 3).unwrap();
        assert_eq!(format_template_date(date), "2024-10-3");
        let january = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            render_template("run_{{from}}_to_{{to}}.txt", january, date),
            "run_2025-1-1_to_2024-10-3.txt"
        );
    }

    #[test]
    fn test_write_manifest_lists_sorted_frames() {
        let temp_dir = TempDir::new().unwrap();
        let frames = vec![
            frame("b.jpg", "2024-01-05 13:00:00"),
            frame("a.jpg", "2024-01-05 09:00:00"),
        ];
        let batch = FolderBatch::build(Path::new("/photos"), frames, TEMPLATE, temp_dir.path()).unwrap();

        let written = batch.write_manifest().unwrap();
        assert_eq!(
            read_manifest(written).unwrap(),
            vec![PathBuf::from("/photos/a.jpg"), PathBuf::from("/photos/b.jpg")]
        );
    }

    #[test]
    fn test_write_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "file, not dir").unwrap();

        let frames = vec![frame("a.jpg", "2024-01-05 09:00:00")];
        let batch = FolderBatch::build(Path::new("/photos"), frames, TEMPLATE, &blocker).unwrap();
        assert!(matches!(
            batch.write_manifest(),
            Err(BatchError::ManifestWrite { .. })
        ));
    }

    #[test]
    fn test_disambiguate_duplicate_names() {
        let make = |folder: &str| {
            FolderBatch::build(
                Path::new(folder),
                vec![frame("a.jpg", "2024-01-05 09:00:00")],
                TEMPLATE,
                Path::new("/out"),
            )
            .unwrap()
        };
        let mut batches = vec![make("/photos/a"), make("/photos/b"), make("/photos/c")];
        disambiguate_manifest_paths(&mut batches);

        assert_eq!(batches[0].manifest_path, Path::new("/out/2024-1-5-2024-1-5.txt"));
        assert_eq!(batches[1].manifest_path, Path::new("/out/2024-1-5-2024-1-5-2.txt"));
        assert_eq!(batches[2].manifest_path, Path::new("/out/2024-1-5-2024-1-5-3.txt"));
    }
}
