use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static FIELD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[: ]").expect("Invalid regex"));

/// 解析 EXIF 日期字串 `YYYY:MM:DD HH:MM:SS`
///
/// 欄位以冒號或空白分隔，必須剛好六個整數欄位。
/// 不處理時區，結果視為拍攝當地的牆上時間。
#[must_use]
pub fn parse_exif_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let fields: Vec<&str> = FIELD_SEPARATOR
        .split(raw.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
        .collect();
    if fields.len() != 6 {
        return None;
    }

    let mut values = [0u32; 6];
    for (value, field) in values.iter_mut().zip(&fields) {
        *value = field.parse().ok()?;
    }
    let [year, month, day, hour, minute, second] = values;

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?
        .and_hms_opt(hour, minute, second)
}
