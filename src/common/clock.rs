use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const COMPACT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");
const JOB_SUFFIX: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]-[hour]-[minute]-[second]-[subsecond digits:3]");
const DAY: &[BorrowedFormatItem<'static>] = format_description!("[year][month][day]");

fn utc(ts: OffsetDateTime, format: &[BorrowedFormatItem<'_>]) -> String {
    // only years past 9999 fail to format
    ts.to_offset(UtcOffset::UTC).format(format).unwrap_or_default()
}

/// `YYYYMMDDTHHMMSSZ`, the stamp used for message groups, output prefixes and tag dates.
pub fn compact_utc(ts: OffsetDateTime) -> String {
    utc(ts, COMPACT)
}

/// `YYYY-MM-DD-HH-MM-SS-mmm`, appended to base job names to make them unique.
pub fn job_suffix(ts: OffsetDateTime) -> String {
    utc(ts, JOB_SUFFIX)
}

/// `YYYYMMDD`, used in log file names.
pub fn day_stamp(ts: OffsetDateTime) -> String {
    utc(ts, DAY)
}
