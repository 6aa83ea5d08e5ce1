use crate::service::budget_warning::BudgetWarningError;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Closed interval `[start, end]` of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

/// The calendar month containing `now`, as seen from `timezone`.
///
/// `end` is the last representable instant of the month: one microsecond before the
/// next month starts, which is the resolution of Postgres timestamps.
pub fn month_window(now: DateTime<Utc>, timezone: &Tz) -> Result<DateRange, BudgetWarningError> {
    let local = now.with_timezone(timezone);

    let first_day = NaiveDate::from_ymd_opt(local.year(), local.month(), 1)
        .ok_or_else(|| BudgetWarningError::InvalidReferenceTime(format!("no first day of month for {}", now)))?;
    let next_first_day = first_day
        .checked_add_months(Months::new(1))
        .ok_or_else(|| BudgetWarningError::InvalidReferenceTime(format!("month after {} is out of range", first_day)))?;

    let start = start_of_day(first_day, timezone)?;
    let next_start = start_of_day(next_first_day, timezone)?;

    Ok(DateRange {
        start,
        end: next_start - Duration::microseconds(1),
    })
}

/// First valid local instant of `date`. Zones that skip midnight on a DST change start
/// the day at the end of the gap instead.
fn start_of_day(date: NaiveDate, timezone: &Tz) -> Result<DateTime<Utc>, BudgetWarningError> {
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| BudgetWarningError::InvalidReferenceTime(format!("no midnight on {}", date)))?;

    (0..=2)
        .filter_map(|hours| timezone.from_local_datetime(&(midnight + Duration::hours(hours))).earliest())
        .next()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| BudgetWarningError::InvalidReferenceTime(format!("no valid local start of {} in {}", date, timezone)))
}
