use crate::config::EncoderSettings;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const SEGMENT_EXTENSION: &str = "mp4";

/// 以 concat demuxer 讀取清單的 ffmpeg 命令
pub struct FfmpegCommand {
    manifest_path: PathBuf,
    destination_path: PathBuf,
}

impl FfmpegCommand {
    /// 逐張影像編碼成片段，輸出路徑為清單同名、副檔名改為 mp4
    #[must_use]
    pub fn segment(manifest_path: &Path) -> Self {
        Self {
            manifest_path: manifest_path.to_path_buf(),
            destination_path: Self::generate_segment_path(manifest_path),
        }
    }

    /// 以 stream copy 串接片段
    #[must_use]
    pub fn concat(manifest_path: &Path, destination_path: &Path) -> Self {
        Self {
            manifest_path: manifest_path.to_path_buf(),
            destination_path: destination_path.to_path_buf(),
        }
    }

    #[must_use]
    pub fn generate_segment_path(manifest_path: &Path) -> PathBuf {
        manifest_path.with_extension(SEGMENT_EXTENSION)
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    fn base_command(&self, settings: &EncoderSettings) -> Command {
        let mut cmd = Command::new(&settings.program);
        cmd.args([
            "-y",
            "-hide_banner",
            "-nostdin",
            "-loglevel", "error",
            "-f", "concat",
            "-safe", "0",
            "-i",
        ]);
        cmd.arg(&self.manifest_path);
        cmd
    }

    #[must_use]
    pub fn build_segment_command(&self, settings: &EncoderSettings) -> Command {
        let mut cmd = self.base_command(settings);
        cmd.args(["-c:v", &settings.video_codec]);
        cmd.args(["-r", &settings.frame_rate.to_string()]);
        cmd.args(["-s:v", &settings.resolution]);
        cmd.args(["-crf", &settings.crf.to_string()]);
        cmd.args(["-pix_fmt", "yuv420p"]);
        cmd.arg(&self.destination_path);
        cmd
    }

    #[must_use]
    pub fn build_concat_command(&self, settings: &EncoderSettings) -> Command {
        let mut cmd = self.base_command(settings);
        cmd.args(["-c", "copy"]);
        cmd.arg(&self.destination_path);
        cmd
    }
}
