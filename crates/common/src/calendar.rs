//! Membership calendar.
//!
//! The society's membership year runs from April to the end of March,
//! while sales for the following year open on the 1st of October.
//! All calendar boundaries are anchored to the Europe/London timezone.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::{Europe::London, Tz};

/// Timezone all membership boundaries are expressed in.
pub const TIMEZONE: Tz = London;

/// Month in which sales for the next membership year open.
const SALES_OPEN_MONTH: u32 = 10;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freeze the clock at the provided London wall-clock time.
    ///
    /// Panics on a time that does not exist in London, so keep this to tests and fixtures.
    pub fn london(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Self(
            TIMEZONE
                .with_ymd_and_hms(year, month, day, hour, min, sec)
                .single()
                .expect("ambiguous or non-existent London time")
                .with_timezone(&Utc),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Membership year that a sale made at `now` pays for.
pub fn membership_year(now: DateTime<Utc>) -> i32 {
    let local = now.with_timezone(&TIMEZONE);

    if local.month() < SALES_OPEN_MONTH {
        local.year()
    } else {
        local.year() + 1
    }
}

/// End date written to member records on payment for `year`.
///
/// Members are recorded as paid up to the last microsecond of the calendar year.
pub fn membership_end(year: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59)
        .single()
        .map(|end| end + Duration::microseconds(999_999))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Last instant of membership year `year`, 31 March in London.
pub fn entitlement_deadline(year: i32) -> DateTime<Utc> {
    let next_midnight = match TIMEZONE.with_ymd_and_hms(year, 4, 1, 0, 0, 0) {
        LocalResult::Single(time) | LocalResult::Ambiguous(time, _) => time,
        LocalResult::None => return DateTime::<Utc>::MAX_UTC,
    };

    next_midnight.with_timezone(&Utc) - Duration::nanoseconds(1)
}

/// Whether a member whose membership ends at `end` is paid up for `year`.
pub fn is_entitled(end: DateTime<Utc>, year: i32) -> bool {
    end >= entitlement_deadline(year)
}

/// Current London calendar date.
pub fn london_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&TIMEZONE).date_naive()
}
