use chrono::NaiveDate;

/// 两个日期之间的自然天数
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

/// 两个日期之间的年数（按365天计算）
pub fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    days_between(start, end) as f64 / 365.0
}

/// 解析 YYYY-MM-DD 格式的日期字符串
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("无效日期 {}: {}", s, e))
}
