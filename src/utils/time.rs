use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Format used for dates in the config file, the environment and the report.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// This is the standard way of converting a date to a string in rtbot34.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Returns the UTC midnight at the start of the day.
pub fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
