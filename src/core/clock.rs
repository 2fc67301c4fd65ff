// src/core/clock.rs

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Minutes from local midnight of `date` to `now`.
///
/// Not wrapped at 1440: a capture taken after midnight for yesterday's file
/// keeps counting (1440, 1441, ...). A `date` still in the future counts from
/// `now`'s own midnight, so the stamp is never negative.
pub fn minutes_since_midnight(date: NaiveDate, now: NaiveDateTime) -> i64 {
    let day = if now.date() >= date { date } else { now.date() };
    (now - day.and_time(NaiveTime::MIN)).num_minutes()
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `HH:MM` label for a minute stamp; stamps past 1440 wrap for display only.
pub fn minute_label(minute: i64) -> String {
    let m = minute.max(0) % (24 * 60);
    format!("{:02}:{:02}", m / 60, m % 60)
}
