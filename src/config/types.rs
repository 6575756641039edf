use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FROM_PLACEHOLDER: &str = "{{from}}";
pub const TO_PLACEHOLDER: &str = "{{to}}";

/// 拍攝地點（十進位度數）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// 緯度須在 [-90, 90]、經度須在 [-180, 180]，NaN 一律無效
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// 外部編碼器（ffmpeg）的固定參數
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// 編碼器執行檔名稱或路徑
    pub program: String,
    pub video_codec: String,
    pub frame_rate: u32,
    /// ffmpeg `-s:v` 格式，例如 `1920:1080`
    pub resolution: String,
    pub crf: u8,
    /// CPU 使用率低於此值才啟動新的編碼任務
    pub cpu_usage_threshold: f32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            video_codec: "libx264".to_string(),
            frame_rate: 30,
            resolution: "1920:1080".to_string(),
            crf: 0,
            cpu_usage_threshold: 95.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelapseConfig {
    /// 要掃描的根目錄，每個子資料夾產生一段影片
    pub source_root: PathBuf,
    /// 清單檔名樣板，包含 `{{from}}` 與 `{{to}}`，放在 `output_dir` 底下
    pub output_template: String,
    pub location: Location,
    /// 拍攝地相對 UTC 的偏移（分鐘），未設定時使用本機時區
    pub utc_offset_minutes: Option<i32>,
    /// 日出後與日落前排除的緩衝時間（分鐘）
    pub night_buffer_minutes: i64,
    pub output_dir: PathBuf,
    pub output_file_name: String,
    pub chunks_manifest_name: String,
    /// 不含點的副檔名，不分大小寫
    pub image_extensions: Vec<String>,
    pub encoder: EncoderSettings,
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::new(),
            output_template: format!("{FROM_PLACEHOLDER}-{TO_PLACEHOLDER}.txt"),
            location: Location::default(),
            utc_offset_minutes: None,
            night_buffer_minutes: 60,
            output_dir: PathBuf::from("timelapse"),
            output_file_name: "output.mp4".to_string(),
            chunks_manifest_name: "chunks.txt".to_string(),
            image_extensions: vec!["jpg".to_string()],
            encoder: EncoderSettings::default(),
        }
    }
}

impl TimelapseConfig {
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }

    #[must_use]
    pub fn chunks_manifest_path(&self) -> PathBuf {
        self.output_dir.join(&self.chunks_manifest_name)
    }

    /// 偏移超出 ±24 小時時回傳 `None`
    #[must_use]
    pub fn utc_offset(&self) -> Option<chrono::FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| chrono::FixedOffset::east_opt(minutes.checked_mul(60)?))
    }

    #[must_use]
    pub fn night_buffer(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::minutes(self.night_buffer_minutes)
    }

    #[must_use]
    pub fn is_image_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}
