//! Business-hours gate: which fetches are worthwhile right now.
//!
//! Minute data only means something while the market is live or to backfill
//! a session that just closed; the day settlement value is fetched
//! opportunistically at any hour. The gate maps the current instant plus
//! the staleness of both stored series onto the set of required actions.

use time::{Date, Duration, PrimitiveDateTime, Time};

use crate::ValidationError;

/// Set of fetches the gate asks the orchestrator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncActions {
    pub fetch_day: bool,
    pub fetch_minute: bool,
}

impl SyncActions {
    pub const fn none() -> Self {
        Self {
            fetch_day: false,
            fetch_minute: false,
        }
    }

    pub const fn is_empty(self) -> bool {
        !self.fetch_day && !self.fetch_minute
    }
}

/// Fixed daily trading window in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    open: Time,
    close: Time,
}

impl Default for MarketHours {
    /// Regular US equity session, truncated to whole minutes: 09:30–15:59.
    fn default() -> Self {
        Self {
            open: Time::from_hms(9, 30, 0).expect("09:30 is a valid time"),
            close: Time::from_hms(15, 59, 0).expect("15:59 is a valid time"),
        }
    }
}

impl MarketHours {
    pub fn new(open: Time, close: Time) -> Result<Self, ValidationError> {
        if open >= close {
            return Err(ValidationError::InvalidMarketWindow);
        }
        Ok(Self { open, close })
    }

    pub const fn open(&self) -> Time {
        self.open
    }

    pub const fn close(&self) -> Time {
        self.close
    }

    /// Decide which granularities need fetching at `now`, given the stamp of
    /// the newest stored minute point and the date of the newest stored day
    /// point.
    pub fn required_actions(
        &self,
        now: PrimitiveDateTime,
        last_minute: Option<PrimitiveDateTime>,
        last_day: Option<Date>,
    ) -> SyncActions {
        let today = now.date();

        if now.time() < self.open {
            // Pre-open: only the day settlement is fetchable. It is wanted
            // when even yesterday's point is missing.
            return SyncActions {
                fetch_day: day_is_stale(last_day, today, Duration::days(1)),
                fetch_minute: false,
            };
        }

        if now.time() > self.close {
            // Post-close: backfill the session if its minute series stops
            // short of the close, and grab today's settlement if missing.
            let minute_incomplete = match last_minute {
                Some(stamp) => stamp.date() < today || stamp.time() < self.close,
                None => true,
            };
            return SyncActions {
                fetch_day: day_is_stale(last_day, today, Duration::ZERO),
                fetch_minute: minute_incomplete,
            };
        }

        // Live session: follow the minute tape, and catch up the day series
        // only once it is more than one calendar day behind.
        let minute_behind = match last_minute {
            Some(stamp) => stamp.date() < today || now - stamp >= Duration::minutes(1),
            None => true,
        };
        SyncActions {
            fetch_day: day_is_stale(last_day, today, Duration::days(1)),
            fetch_minute: minute_behind,
        }
    }
}

fn day_is_stale(last_day: Option<Date>, today: Date, allowance: Duration) -> bool {
    match last_day {
        Some(last) => today - last > allowance,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    fn gate() -> MarketHours {
        MarketHours::default()
    }

    #[test]
    fn rejects_window_that_closes_before_it_opens() {
        let err = MarketHours::new(
            Time::from_hms(16, 0, 0).expect("valid"),
            Time::from_hms(9, 30, 0).expect("valid"),
        )
        .expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidMarketWindow);
    }

    #[test]
    fn before_open_never_requests_minutes() {
        let actions = gate().required_actions(datetime!(2026-03-02 08:00), None, None);
        assert!(actions.fetch_day);
        assert!(!actions.fetch_minute);
    }

    #[test]
    fn before_open_with_yesterdays_day_point_requests_nothing() {
        let actions = gate().required_actions(
            datetime!(2026-03-02 08:00),
            None,
            Some(date!(2026-03-01)),
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn before_open_with_older_day_point_requests_day_only() {
        let actions = gate().required_actions(
            datetime!(2026-03-02 08:00),
            Some(datetime!(2026-02-27 15:59)),
            Some(date!(2026-02-27)),
        );
        assert!(actions.fetch_day);
        assert!(!actions.fetch_minute);
    }

    #[test]
    fn live_session_with_minutes_one_behind_requests_minutes_only() {
        // 12:00 inside the window, minute series ends 11:59, day point
        // from yesterday is only one day stale.
        let actions = gate().required_actions(
            datetime!(2026-03-02 12:00),
            Some(datetime!(2026-03-02 11:59)),
            Some(date!(2026-03-01)),
        );
        assert!(!actions.fetch_day);
        assert!(actions.fetch_minute);
    }

    #[test]
    fn live_session_with_fresh_minutes_requests_nothing() {
        let actions = gate().required_actions(
            datetime!(2026-03-02 12:00:30),
            Some(datetime!(2026-03-02 12:00)),
            Some(date!(2026-03-01)),
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn live_session_without_todays_minutes_requests_minutes() {
        let actions = gate().required_actions(
            datetime!(2026-03-02 09:30),
            Some(datetime!(2026-03-01 15:59)),
            Some(date!(2026-03-01)),
        );
        assert!(actions.fetch_minute);
    }

    #[test]
    fn live_session_with_day_series_two_days_behind_requests_day() {
        let actions = gate().required_actions(
            datetime!(2026-03-02 12:00),
            Some(datetime!(2026-03-02 11:59)),
            Some(date!(2026-02-28)),
        );
        assert!(actions.fetch_day);
    }

    #[test]
    fn after_close_with_complete_session_requests_day_only() {
        // 18:00, minute series already runs through the close, today's
        // settlement missing.
        let actions = gate().required_actions(
            datetime!(2026-03-02 18:00),
            Some(datetime!(2026-03-02 15:59)),
            Some(date!(2026-03-01)),
        );
        assert!(actions.fetch_day);
        assert!(!actions.fetch_minute);
    }

    #[test]
    fn after_close_with_short_session_requests_both() {
        let actions = gate().required_actions(
            datetime!(2026-03-02 18:00),
            Some(datetime!(2026-03-02 14:10)),
            None,
        );
        assert!(actions.fetch_day);
        assert!(actions.fetch_minute);
    }

    #[test]
    fn after_close_with_todays_day_point_skips_day() {
        let actions = gate().required_actions(
            datetime!(2026-03-02 18:00),
            Some(datetime!(2026-03-02 15:59)),
            Some(date!(2026-03-02)),
        );
        assert!(actions.is_empty());
    }
}
