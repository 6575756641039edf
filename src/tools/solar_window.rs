//! 日夜判斷
//!
//! 以日出/日落時間加上緩衝區間判斷照片是否在白天拍攝

use crate::config::Location;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};

/// 某一天的日出與日落時間（牆上時間）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

/// 天文曆計算
pub trait Ephemeris: Send + Sync {
    fn sun_times(&self, date: NaiveDate, location: Location) -> Option<SunTimes>;
}

/// 以 `sunrise` crate 計算，結果換算為拍攝地的牆上時間
///
/// 未設定 UTC 偏移時使用本機時區。座標無效或當天沒有日出日落（極晝、極夜）時回傳 `None`。
#[derive(Debug, Clone, Copy, Default)]
pub struct SunriseEphemeris {
    utc_offset: Option<FixedOffset>,
}

impl SunriseEphemeris {
    #[must_use]
    pub const fn new(utc_offset: Option<FixedOffset>) -> Self {
        Self { utc_offset }
    }

    fn to_wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self.utc_offset {
            Some(offset) => instant.with_timezone(&offset).naive_local(),
            None => instant.with_timezone(&Local).naive_local(),
        }
    }
}

/// 事件時間偏離要求日期超過一天，代表當天不存在該事件
fn event_on(solar_day: &SolarDay, event: SolarEvent, date: NaiveDate) -> Option<DateTime<Utc>> {
    let time = solar_day.event_time(event);
    ((time.date_naive() - date).num_days().abs() <= 1).then_some(time)
}

impl Ephemeris for SunriseEphemeris {
    fn sun_times(&self, date: NaiveDate, location: Location) -> Option<SunTimes> {
        if !location.is_valid() {
            return None;
        }
        let coordinates = Coordinates::new(location.latitude, location.longitude)?;
        let solar_day = SolarDay::new(coordinates, date);

        let sunrise = event_on(&solar_day, SolarEvent::Sunrise, date)?;
        let sunset = event_on(&solar_day, SolarEvent::Sunset, date)?;
        Some(SunTimes {
            sunrise: self.to_wall_clock(sunrise),
            sunset: self.to_wall_clock(sunset),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Day,
    Night,
}

pub struct SolarWindow<E: Ephemeris> {
    ephemeris: E,
    location: Location,
    buffer: TimeDelta,
}

impl<E: Ephemeris> SolarWindow<E> {
    pub const fn new(ephemeris: E, location: Location, buffer: TimeDelta) -> Self {
        Self {
            ephemeris,
            location,
            buffer,
        }
    }

    /// 早於「日出 + 緩衝」或晚於「日落 - 緩衝」即為夜間，邊界本身算白天
    ///
    /// 高緯度地區緩衝後的白天區間可能為空或反轉，此時一律判定為夜間。
    /// 無法取得日出日落時間時同樣判定為夜間。
    #[must_use]
    pub fn classify(&self, instant: NaiveDateTime) -> DayPhase {
        let Some(times) = self.ephemeris.sun_times(instant.date(), self.location) else {
            return DayPhase::Night;
        };

        if instant < times.sunrise + self.buffer || instant > times.sunset - self.buffer {
            DayPhase::Night
        } else {
            DayPhase::Day
        }
    }

    #[must_use]
    pub fn is_night(&self, instant: NaiveDateTime) -> bool {
        self.classify(instant) == DayPhase::Night
    }
}
