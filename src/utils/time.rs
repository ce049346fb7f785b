//! 时间计算工具（均以 UTC 为准）

use chrono::{DateTime, NaiveDate, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// 自动评分记录使用的日期格式
pub const RUN_DATE_FORMAT: &str = "%Y-%m-%d";

/// UTC 自然日
pub fn utc_date(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

pub fn format_run_date(date: NaiveDate) -> String {
    date.format(RUN_DATE_FORMAT).to_string()
}

/// 向上取整的天数差（`to - from`）
pub fn ceil_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let secs = (to - from).num_seconds();
    -(-secs).div_euclid(SECONDS_PER_DAY)
}

/// 向下取整的天数差（`to - from`）
pub fn floor_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn test_ceil_days() {
        let due = at(12);
        assert_eq!(ceil_days_between(due, due + Duration::hours(1)), 1);
        assert_eq!(ceil_days_between(due, due + Duration::hours(24)), 1);
        assert_eq!(ceil_days_between(due, due + Duration::hours(25)), 2);
        assert_eq!(ceil_days_between(due, due), 0);
        assert_eq!(ceil_days_between(due, due - Duration::hours(1)), 0);
    }

    #[test]
    fn test_floor_days() {
        let due = at(12);
        assert_eq!(floor_days_between(due, due + Duration::hours(23)), 0);
        assert_eq!(floor_days_between(due, due + Duration::hours(49)), 2);
    }

    #[test]
    fn test_run_date_format() {
        assert_eq!(format_run_date(utc_date(at(23))), "2025-03-10");
    }
}
