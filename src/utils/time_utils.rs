use chrono::{DateTime, Days, NaiveDate, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_MIN * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_MIN * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_MIN * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_4_H: i64 = Self::MS_IN_H * 4;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const STANDARD_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Shorthand for a grid width in milliseconds (e.g. `30m`, `1h`).
    pub fn interval_ms_to_string(interval_ms: i64) -> &'static str {
        match interval_ms {
            Self::MS_IN_S => "1s",
            Self::MS_IN_MIN => "1m",
            Self::MS_IN_5_MIN => "5m",
            Self::MS_IN_15_MIN => "15m",
            Self::MS_IN_30_MIN => "30m",
            Self::MS_IN_H => "1h",
            Self::MS_IN_4_H => "4h",
            Self::MS_IN_D => "1d",
            _ => "custom",
        }
    }
}

pub fn epoch_ms_to_datetime(epoch_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(epoch_ms)
}

/// Display helper. Out-of-range timestamps render as their raw millisecond value.
pub fn epoch_ms_to_utc(epoch_ms: i64) -> String {
    match epoch_ms_to_datetime(epoch_ms) {
        Some(dt) => dt.format(TimeUtils::STANDARD_DATETIME_FORMAT).to_string(),
        None => format!("{}ms", epoch_ms),
    }
}

pub fn start_of_day_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(i64::MIN)
}

/// Last whole second of `date` (23:59:59 UTC), so a whole-date range is inclusive of that day.
pub fn end_of_day_ms(date: NaiveDate) -> i64 {
    match date.checked_add_days(Days::new(1)) {
        Some(next) => start_of_day_ms(next) - TimeUtils::MS_IN_S,
        None => i64::MAX,
    }
}

/// Inclusive `[start 00:00:00, end 23:59:59]` millisecond window for a pair of calendar dates.
pub fn date_window_ms(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    (start_of_day_ms(start), end_of_day_ms(end))
}

pub fn utc_date_of(epoch_ms: i64) -> Option<NaiveDate> {
    epoch_ms_to_datetime(epoch_ms).map(|dt| dt.date_naive())
}

pub fn now_as_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn how_many_seconds_ago(past_timestamp_ms: i64) -> i64 {
    (now_as_timestamp_ms() - past_timestamp_ms) / 1000
}
