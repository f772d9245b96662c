// Day/month/year dates as written by the exports.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Reads a "DD/MM/YYYY" date, optionally followed by a "HH:MM[:SS]" time.
///
/// Returns None for empty or unreadable text. Callers order None before any
/// real date, so that undated entries sort as the earliest.
pub fn parse_day_month_year(text: &str) -> Option<NaiveDateTime> {
    let mut parts = text.split_whitespace();
    let date_part = parts.next()?;
    let mut dmy = date_part.split('/');
    let day: u32 = dmy.next()?.trim().parse().ok()?;
    let month: u32 = dmy.next()?.trim().parse().ok()?;
    let year: i32 = dmy.next()?.trim().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = match parts.next() {
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
            .ok()?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time))
}

/// The "MM/YY" label of a date, used to name a cycle on a time axis.
pub fn short_period_label(text: &str) -> Option<String> {
    let date_part = text.split_whitespace().next()?;
    let pieces: Vec<&str> = date_part.split('/').collect();
    match pieces.as_slice() {
        [_, month, year] => {
            let short_year: String = year.chars().skip(2).collect();
            Some(format!("{}/{}", month, short_year))
        }
        _ => None,
    }
}
