use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

/// Canonical `YYYY-MM-DD` key under which a day's artifacts are stored.
static DT_PREFIX_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn dt_prefix(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

pub fn parse_dt_prefix(s: &str) -> Option<Date> {
    Date::parse(s, DT_PREFIX_FORMAT).ok()
}

/// Returns a past discussion thread's date from N days ago, relative to
/// `from`. Threads are created at `create_hour` UTC; a reference time before
/// that hour still belongs to the previous day's thread, so one extra day is
/// subtracted to avoid the straddle off-by-one.
pub fn target_dt_date(daysago: i64, from: OffsetDateTime, create_hour: u8) -> Date {
    let extra = if from.hour() < create_hour { 1 } else { 0 };
    from.date() - Duration::days(daysago + extra)
}

/// N consecutive thread days ending at `date_from`, newest first.
/// `daysago == 0` yields just `date_from`.
pub fn dt_dates_ending_at(daysago: i64, date_from: Date) -> Vec<Date> {
    if daysago <= 0 {
        return vec![date_from];
    }
    (0..daysago).map(|i| date_from - Duration::days(i)).collect()
}
