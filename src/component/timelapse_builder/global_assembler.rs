use crate::config::EncoderSettings;
use crate::tools::{FfmpegCommand, write_manifest};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use log::info;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// 成功編碼的片段與其起始日期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub path: PathBuf,
    pub start_date: NaiveDate,
}

/// 依起始日期排序，同日期再依路徑排序
pub fn order_segments(segments: &mut [Segment]) {
    segments.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// 將所有片段以 stream copy 串接成最終影片
pub struct GlobalAssembler<'a> {
    settings: &'a EncoderSettings,
    manifest_path: PathBuf,
    output_path: PathBuf,
}

impl<'a> GlobalAssembler<'a> {
    #[must_use]
    pub fn new(settings: &'a EncoderSettings, manifest_path: &Path, output_path: &Path) -> Self {
        Self {
            settings,
            manifest_path: manifest_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
        }
    }

    /// 排序並寫入總清單，回傳排序後的片段
    pub fn write_manifest(&self, mut segments: Vec<Segment>) -> Result<Vec<Segment>> {
        order_segments(&mut segments);
        let entries: Vec<&Path> = segments.iter().map(|s| s.path.as_path()).collect();

        write_manifest(&self.manifest_path, &entries).with_context(|| {
            format!("無法寫入總清單: {}", self.manifest_path.display())
        })?;
        info!(
            "已寫入總清單 {} ({} 個片段)",
            self.manifest_path.display(),
            segments.len()
        );
        Ok(segments)
    }

    /// 必須在所有片段編碼結束後才呼叫
    pub fn assemble(&self, segments: Vec<Segment>) -> Result<PathBuf> {
        if segments.is_empty() {
            bail!("沒有任何成功編碼的片段，無法合併");
        }

        self.write_manifest(segments)?;

        info!("合併片段中 -> {}", self.output_path.display());
        let output = FfmpegCommand::concat(&self.manifest_path, &self.output_path)
            .build_concat_command(self.settings)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("無法執行 {}", self.settings.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("合併片段失敗 ({}): {}", output.status, stderr.trim());
        }

        info!("合併完成: {}", self.output_path.display());
        Ok(self.output_path.clone())
    }
}
