use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    // month first, like pandas
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses the date formats seen in scraped review exports.
pub fn parse_review_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.date_naive());
    }

    DATETIME_FORMATS.iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|date_time| date_time.date())
        .or_else(|| DATE_FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(value, format).ok()))
}

pub fn normalize_review_date(value: &str) -> Option<String> {
    parse_review_date(value).map(|date| date.format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize_review_date;

    #[test]
    fn parses_common_formats() {
        assert_eq!(normalize_review_date("June 13, 2025").as_deref(), Some("2025-06-13"));
        assert_eq!(normalize_review_date("Jun 13, 2025").as_deref(), Some("2025-06-13"));
        assert_eq!(normalize_review_date("2025-06-13 08:15:02").as_deref(), Some("2025-06-13"));
        assert_eq!(normalize_review_date("2025-06-13T08:15:02+03:00").as_deref(), Some("2025-06-13"));
        assert_eq!(normalize_review_date("13 June 2025").as_deref(), Some("2025-06-13"));
        assert_eq!(normalize_review_date("2025/06/13").as_deref(), Some("2025-06-13"));
    }

    #[test]
    fn slashed_dates_prefer_month_first() {
        assert_eq!(normalize_review_date("06/07/2025").as_deref(), Some("2025-06-07"));
        assert_eq!(normalize_review_date("13/06/2025").as_deref(), Some("2025-06-13"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_review_date("yesterday"), None);
        assert_eq!(normalize_review_date("2025-13-45"), None);
    }
}
