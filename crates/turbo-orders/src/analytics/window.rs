//! Reporting windows.

use crate::error::CommerceError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

/// Upper bound on daily buckets in one report.
pub const MAX_HISTORY_DAYS: usize = 366;

/// An inclusive `[start, end]` time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Create a window. `start` must not be after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CommerceError> {
        if start > end {
            return Err(CommerceError::Validation(format!(
                "window start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending at `end`.
    pub fn trailing_days(end: DateTime<Utc>, days: u32) -> Result<Self, CommerceError> {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// The window of equal length ending 1ms before this one starts.
    ///
    /// Fails when that window falls outside the representable date range.
    pub fn previous(&self) -> Result<Self, CommerceError> {
        let end = self
            .start
            .checked_sub_signed(Duration::milliseconds(1))
            .ok_or_else(out_of_range)?;
        let start = end
            .checked_sub_signed(self.length())
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    /// Bounds as epoch milliseconds, the form timestamps are stored in.
    pub fn millis(&self) -> (i64, i64) {
        (self.start.timestamp_millis(), self.end.timestamp_millis())
    }

    /// UTC calendar days touched by this window, oldest first, capped at
    /// [`MAX_HISTORY_DAYS`].
    pub fn days(&self) -> Vec<NaiveDate> {
        let last = self.end.date_naive();
        let mut days = Vec::new();
        let mut day = self.start.date_naive();
        while day <= last && days.len() < MAX_HISTORY_DAYS {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

/// A current window and the equal-length window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub current: DateWindow,
    pub previous: DateWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

impl ReportWindow {
    /// Resolve optional caller-supplied bounds into a report window.
    ///
    /// A missing end is `now`; a missing start is `default_days` before the
    /// end. Bounds accept RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` read
    /// as UTC, or a bare `YYYY-MM-DD`; a bare end date covers the whole day.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
        default_days: u32,
    ) -> Result<Self, CommerceError> {
        let end = match end {
            Some(raw) => parse_bound(raw, Bound::End)?,
            None => now,
        };
        let current = match start {
            Some(raw) => DateWindow::new(parse_bound(raw, Bound::Start)?, end)?,
            None => DateWindow::trailing_days(end, default_days)?,
        };

        Ok(Self {
            current,
            previous: current.previous()?,
        })
    }
}

fn out_of_range() -> CommerceError {
    CommerceError::Validation("window out of range".to_string())
}

fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>, CommerceError> {
    let raw = raw.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let naive = match bound {
            Bound::Start => date.and_hms_milli_opt(0, 0, 0, 0),
            Bound::End => date.and_hms_milli_opt(23, 59, 59, 999),
        };
        if let Some(naive) = naive {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    let which = match bound {
        Bound::Start => "start",
        Bound::End => "end",
    };
    Err(CommerceError::Validation(format!(
        "invalid {} date '{}': expected RFC 3339 or YYYY-MM-DD",
        which, raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_defaults_to_trailing_thirty_days() {
        let now = at("2024-03-31T12:00:00Z");
        let window = ReportWindow::resolve(None, None, now, 30).unwrap();
        assert_eq!(window.current.end, now);
        assert_eq!(window.current.start, at("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn test_only_end_given() {
        let now = at("2024-06-01T00:00:00Z");
        let window = ReportWindow::resolve(None, Some("2024-03-31T00:00:00Z"), now, 30).unwrap();
        assert_eq!(window.current.start, at("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn test_only_start_given_ends_now() {
        let now = at("2024-06-01T08:00:00Z");
        let window = ReportWindow::resolve(Some("2024-05-01"), None, now, 30).unwrap();
        assert_eq!(window.current.start, at("2024-05-01T00:00:00Z"));
        assert_eq!(window.current.end, now);
    }

    #[test]
    fn test_bare_end_date_covers_whole_day() {
        let now = at("2024-06-01T00:00:00Z");
        let window =
            ReportWindow::resolve(Some("2024-05-01"), Some("2024-05-31"), now, 30).unwrap();
        assert_eq!(window.current.end, at("2024-05-31T23:59:59.999Z"));
    }

    #[test]
    fn test_naive_datetime_read_as_utc() {
        let now = at("2024-06-01T00:00:00Z");
        let window =
            ReportWindow::resolve(Some("2024-05-01T10:30:00"), Some("2024-05-02T10:30:00.250"), now, 30)
                .unwrap();
        assert_eq!(window.current.start, at("2024-05-01T10:30:00Z"));
        assert_eq!(window.current.end, at("2024-05-02T10:30:00.250Z"));
    }

    #[test]
    fn test_rfc3339_offset_converted() {
        let now = at("2024-06-01T00:00:00Z");
        let window = ReportWindow::resolve(Some("2024-05-01T05:00:00+05:00"), None, now, 30).unwrap();
        assert_eq!(window.current.start, at("2024-05-01T00:00:00Z"));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let now = Utc::now();
        let err = ReportWindow::resolve(Some("last tuesday"), None, now, 30).unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
        assert!(err.to_string().contains("start"));
    }

    #[test]
    fn test_start_after_end_rejected() {
        let now = Utc::now();
        let err = ReportWindow::resolve(Some("2024-05-02"), Some("2024-05-01T00:00:00Z"), now, 30)
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[test]
    fn test_previous_window_is_adjacent_and_equal_length() {
        let current = DateWindow::new(at("2024-05-11T00:00:00Z"), at("2024-05-20T00:00:00Z")).unwrap();
        let previous = current.previous().unwrap();
        assert_eq!(previous.end, at("2024-05-10T23:59:59.999Z"));
        assert_eq!(previous.length(), current.length());
    }

    #[test]
    fn test_extreme_dates_rejected_not_panicking() {
        let now = Utc::now();
        let err = ReportWindow::resolve(Some("-262000-01-01"), Some("+262000-01-01"), now, 30)
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_default_start_before_min_date_rejected() {
        let end = DateTime::<Utc>::MIN_UTC;
        let err = ReportWindow::resolve(None, None, end, 30).unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[test]
    fn test_days_zero_filled_range() {
        let window = DateWindow::new(at("2024-02-27T15:00:00Z"), at("2024-03-01T01:00:00Z")).unwrap();
        let days = window.days();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 27).unwrap());
        assert_eq!(days[3], NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_days_capped() {
        let window = DateWindow::new(at("2020-01-01T00:00:00Z"), at("2024-01-01T00:00:00Z")).unwrap();
        assert_eq!(window.days().len(), MAX_HISTORY_DAYS);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let window = DateWindow::new(at("2024-05-01T00:00:00Z"), at("2024-05-02T00:00:00Z")).unwrap();
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(at("2024-05-02T00:00:00.001Z")));
    }
}
