use std::collections::HashMap;
use std::io::Cursor;

/// 拍攝時間所在的 EXIF 標籤
pub const CAPTURE_TIME_TAG: &str = "DateTime";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    List(Vec<String>),
}

impl TagValue {
    /// 字串本身，或序列的第一個元素
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::List(items) => items.first().map(String::as_str),
        }
    }
}

pub type MetadataTags = HashMap<String, TagValue>;

/// 從影像原始位元組讀出標籤名稱與值
pub trait MetadataReader: Send + Sync {
    fn read_tags(&self, bytes: &[u8]) -> Result<MetadataTags, String>;
}

/// 以 `kamadak-exif` 讀取主影像 IFD 的標籤
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataReader;

impl MetadataReader for ExifMetadataReader {
    fn read_tags(&self, bytes: &[u8]) -> Result<MetadataTags, String> {
        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .map_err(|e| e.to_string())?;

        let tags = exif
            .fields()
            .filter(|field| field.ifd_num == exif::In::PRIMARY)
            .map(|field| {
                let value = match &field.value {
                    exif::Value::Ascii(items) => TagValue::List(
                        items
                            .iter()
                            .map(|item| String::from_utf8_lossy(item).into_owned())
                            .collect(),
                    ),
                    _ => TagValue::Text(field.display_value().to_string()),
                };
                (field.tag.to_string(), value)
            })
            .collect();

        Ok(tags)
    }
}

/// 取得拍攝時間字串
#[must_use]
pub fn capture_time_text(tags: &MetadataTags) -> Option<&str> {
    tags.get(CAPTURE_TIME_TAG).and_then(TagValue::first_text)
}
