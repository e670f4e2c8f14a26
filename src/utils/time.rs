use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// 解析外部服务返回的时间戳，支持多种格式：
/// - RFC3339：2024-01-05T10:00:00Z / 2024-01-05T10:00:00.123+05:30
/// - 无时区：2024-01-05 10:00:00（按 UTC 处理）
/// - 纯日期：2024-01-05（当天零点 UTC）
pub fn parse_timestamp(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt);
    }

    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(naive.and_utc().with_timezone(&utc));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().with_timezone(&utc))
}

/// 同上，统一转换为 UTC
pub fn parse_timestamp_utc(input: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(input).map(|dt| dt.with_timezone(&Utc))
}
