//! 时间工具函数 - 业务时区转换
//!
//! Sessions are stored as local date + wall-clock times of the business
//! timezone; the clock speaks UTC. Conversions happen here.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; None when neither parses
pub fn parse_date_lenient(value: &str, tz: Tz) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&tz).date_naive())
}

/// UTC instant → 业务时区本地时间
pub fn to_local(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now.with_timezone(&tz).naive_local()
}

/// 业务时区当天日期
pub fn local_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// 本地时间 → UTC
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Last day (Sunday) of the ISO week following `today`
///
/// The matcher looks at sessions from today through this date.
pub fn end_of_next_week(today: NaiveDate) -> NaiveDate {
    let to_sunday = 6 - i64::from(today.weekday().num_days_from_monday());
    today + Duration::days(to_sunday + 7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn hcm() -> Tz {
        "Asia/Ho_Chi_Minh".parse().unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-03-02").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
        assert!(parse_date("02/03/2026").is_err());
    }

    #[test]
    fn test_parse_date_lenient() {
        let tz = hcm();
        assert_eq!(
            parse_date_lenient("2026-03-02", tz),
            NaiveDate::from_ymd_opt(2026, 3, 2)
        );
        // 20:00 UTC is already the next morning in UTC+7
        assert_eq!(
            parse_date_lenient("2026-03-02T20:00:00Z", tz),
            NaiveDate::from_ymd_opt(2026, 3, 3)
        );
        assert_eq!(parse_date_lenient("not a date", tz), None);
        assert_eq!(parse_date_lenient("", tz), None);
    }

    #[test]
    fn test_local_conversions() {
        let tz = hcm();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 1, 30, 0).unwrap();
        assert_eq!(to_local(now, tz).to_string(), "2026-03-02 08:30:00");
        assert_eq!(local_to_utc(to_local(now, tz), tz), now);
        assert_eq!(local_today(now, tz), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_end_of_next_week() {
        // Monday → Sunday of the following week
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(monday.weekday(), Weekday::Mon);
        assert_eq!(
            end_of_next_week(monday),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
        );

        // Sunday → the very next Sunday
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        assert_eq!(
            end_of_next_week(sunday),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
        );
    }
}
