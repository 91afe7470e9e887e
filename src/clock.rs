//! Timestamp helpers shared by persistence and notification code.

use time::{
    OffsetDateTime, format_description::BorrowedFormatItem, format_description::well_known::Rfc3339,
    macros::format_description,
};

/// Filename stamp for backups, local time to one-second resolution.
const BACKUP_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour][minute][second]");

/// Filename stamp for audit event files (colon-free for Windows paths).
const EVENT_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour][minute][second]");

/// Human-readable stamp embedded in archive headers.
const ARCHIVE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month]/[day] [hour]:[minute]");

/// Current UTC time in RFC 3339.
pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Current local time, falling back to UTC when the local offset cannot be
/// determined (common once extra threads are running).
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Local timestamp used to name backup files.
pub fn backup_stamp() -> String {
    local_now().format(BACKUP_STAMP).unwrap_or_default()
}

/// Local timestamp used to name audit event files.
pub fn event_stamp() -> String {
    local_now().format(EVENT_STAMP).unwrap_or_default()
}

/// Local timestamp embedded in Discord archive headers.
pub fn archive_stamp() -> String {
    local_now().format(ARCHIVE_STAMP).unwrap_or_default()
}
