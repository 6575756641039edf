use crate::config::types::{FROM_PLACEHOLDER, TO_PLACEHOLDER, TimelapseConfig};
use crate::tools::SEGMENT_EXTENSION;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "timelapse.json";

impl TimelapseConfig {
    /// 從工作目錄的 `timelapse.json` 載入，不存在時使用預設值
    pub fn new() -> Result<Self> {
        let path = Path::new(CONFIG_FILE_NAME);
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        for placeholder in [FROM_PLACEHOLDER, TO_PLACEHOLDER] {
            if !self.output_template.contains(placeholder) {
                bail!(
                    "檔名樣板缺少 {placeholder}: {}",
                    self.output_template
                );
            }
        }
        let template_extension = Path::new(&self.output_template)
            .extension()
            .and_then(|ext| ext.to_str());
        if template_extension.is_some_and(|ext| ext.eq_ignore_ascii_case(SEGMENT_EXTENSION)) {
            bail!(
                "檔名樣板的副檔名不可為 {SEGMENT_EXTENSION}，否則清單會被片段覆寫: {}",
                self.output_template
            );
        }
        if !self.location.is_valid() {
            bail!(
                "拍攝地點座標超出範圍: 緯度 {}, 經度 {}",
                self.location.latitude,
                self.location.longitude
            );
        }
        if self.utc_offset_minutes.is_some() && self.utc_offset().is_none() {
            bail!("UTC 偏移超出範圍: {:?} 分鐘", self.utc_offset_minutes);
        }
        if self.night_buffer_minutes < 0 {
            bail!("夜間緩衝時間不可為負數: {}", self.night_buffer_minutes);
        }
        if self.encoder.frame_rate == 0 {
            bail!("影格率必須大於 0");
        }
        if self.image_extensions.is_empty() {
            bail!("至少需要一個影像副檔名");
        }
        Ok(())
    }
}
