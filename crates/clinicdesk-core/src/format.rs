//! Display formatting for dates, times and slots.

use chrono::{NaiveDate, NaiveTime};

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(d) = NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d") {
        d.format("%b %d, %Y").to_string()
    } else {
        date.to_string()
    }
}

/// Format a 24-hour time (`14:30` or `14:30:00`) as `2:30 PM`
pub fn format_time(time: &str) -> String {
    match parse_time(time) {
        Some(t) => t.format("%-I:%M %p").to_string(),
        None => time.to_string(),
    }
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()
}

/// One-line slot description, e.g. `Mar 07, 2025 · 9:00 AM - 9:30 AM`
pub fn format_slot(date: &str, start: &str, end: &str) -> String {
    format!("{} · {} - {}", format_date(date), format_time(start), format_time(end))
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-03-07"), "Mar 07, 2025");
        assert_eq!(format_date("2025-03-07T10:15:00Z"), "Mar 07, 2025");
        assert_eq!(format_date("2025-03-07T10:15:00.000Z"), "Mar 07, 2025");
        assert_eq!(format_date("tomorrow"), "tomorrow");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time("14:30"), "2:30 PM");
        assert_eq!(format_time("09:05:00"), "9:05 AM");
        assert_eq!(format_time("00:00"), "12:00 AM");
        assert_eq!(format_time("noon"), "noon");
    }

    #[test]
    fn test_format_slot() {
        assert_eq!(
            format_slot("2025-03-07", "09:00", "09:30"),
            "Mar 07, 2025 · 9:00 AM - 9:30 AM"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Cardiología", 8), "Cardi...");
    }
}
