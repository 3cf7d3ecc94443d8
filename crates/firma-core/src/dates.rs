//! Date formatting for auto-filled date fields.

use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Formats offered in settings: (label, pattern)
pub const DATE_FORMATS: [(&str, &str); 5] = [
    ("MM/DD/YYYY", "MM/DD/YYYY"),
    ("DD/MM/YYYY", "DD/MM/YYYY"),
    ("YYYY-MM-DD", "YYYY-MM-DD"),
    ("Month DD, YYYY", "MMMM DD, YYYY"),
    ("DD Month YYYY", "DD MMMM YYYY"),
];

/// Replace `YYYY`, `MMMM`, `MM` and `DD` (first occurrence each, in that order).
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let month = date.month() as usize;

    let mut result = pattern.replacen("YYYY", &date.year().to_string(), 1);
    if result.contains("MMMM") {
        result = result.replacen("MMMM", MONTH_NAMES[month - 1], 1);
    }
    result = result.replacen("MM", &format!("{:02}", month), 1);
    result.replacen("DD", &format!("{:02}", date.day()), 1)
}
