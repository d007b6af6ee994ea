// dsm_notifier - Precipitation alerts from NWS daily summary bulletins
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::error::Error;
use crate::notify::{Notification, Notifier};
use crate::pipeline::{Detection, Detector};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::error;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    StartAfterEnd(NaiveTime, NaiveTime),
    ZeroInterval,
    NonexistentLocalTime(NaiveDate, NaiveTime, Tz),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartAfterEnd(start, end) => write!(f, "window start {} is after end {}", start, end),
            Self::ZeroInterval => write!(f, "poll interval must be greater than zero"),
            Self::NonexistentLocalTime(date, time, tz) => write!(f, "{} {} does not exist in {}", date, time, tz),
        }
    }
}

impl error::Error for WindowError {}

/// Local time-of-day range to poll within and how often to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    start: NaiveTime,
    end: NaiveTime,
    interval: Duration,
}

impl PollWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, interval: Duration) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::StartAfterEnd(start, end));
        }

        if interval.is_zero() {
            return Err(WindowError::ZeroInterval);
        }

        Ok(PollWindow { start, end, interval })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Resolve the window to concrete instants on `date` in the time zone `tz`.
    ///
    /// Times repeated by a DST transition resolve to the earlier instant.
    pub fn on(&self, date: NaiveDate, tz: Tz) -> Result<(DateTime<Tz>, DateTime<Tz>), WindowError> {
        let resolve = |time: NaiveTime| {
            tz.from_local_datetime(&date.and_time(time))
                .earliest()
                .ok_or(WindowError::NonexistentLocalTime(date, time, tz))
        };

        Ok((resolve(self.start)?, resolve(self.end)?))
    }
}

/// Source of the current time and a way to wait for time to pass.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock time, waiting with `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// What to do when fetching the index or a bulletin fails during a poll.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// End the run with the error.
    #[default]
    Abort,
    /// Log the error and try again at the next interval. Validation errors still abort.
    SkipTransport,
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found {
        detection: Detection,
        attempts: u32,
        at: DateTime<Tz>,
    },
    Expired {
        attempts: u32,
    },
}

/// Runs a `Detector` repeatedly within a `PollWindow`, notifying once on the first
/// qualifying reading.
#[derive(Debug, Clone)]
pub struct PollingScheduler {
    window: PollWindow,
    tz: Tz,
    pil: String,
    policy: ErrorPolicy,
}

impl PollingScheduler {
    pub fn new<S: Into<String>>(window: PollWindow, tz: Tz, pil: S, policy: ErrorPolicy) -> Self {
        PollingScheduler {
            window,
            tz,
            pil: pil.into(),
            policy,
        }
    }

    pub async fn run<D, N, C>(&self, detector: &D, notifier: &N, clock: &C) -> Result<Outcome, Error>
    where
        D: Detector + ?Sized,
        N: Notifier + ?Sized,
        C: Clock + ?Sized,
    {
        let now = clock.now().with_timezone(&self.tz);
        let today = now.date_naive();
        let (start, end) = self.window.on(today, self.tz)?;

        if now < start {
            let wait = (start - now).to_std().unwrap_or_default();
            tracing::info!(message = "waiting for poll window to open", seconds = wait.as_secs(), start = %start);
            clock.sleep(wait).await;
        }

        let end = end.with_timezone(&Utc);
        let mut attempts = 0;
        while clock.now() <= end {
            attempts += 1;
            tracing::debug!(message = "checking for precipitation", attempt = attempts, date = %today);

            match detector.check(today).await {
                Ok(Some(detection)) => {
                    let at = clock.now().with_timezone(&self.tz);
                    let notification = Notification::new(&self.pil, &detection, at);
                    notifier.send(&notification).await?;

                    tracing::info!(
                        message = "precipitation found, notification sent",
                        product_id = %detection.product_id,
                        reading = %detection.reading,
                        attempts = attempts,
                    );
                    return Ok(Outcome::Found {
                        detection,
                        attempts,
                        at,
                    });
                }
                Ok(None) => {}
                Err(Error::Transport(e)) if self.policy == ErrorPolicy::SkipTransport => {
                    tracing::warn!(message = "failed to fetch bulletin, will retry", error = %e, attempt = attempts);
                }
                Err(e) => return Err(e),
            }

            tracing::debug!(message = "retrying after interval", seconds = self.window.interval.as_secs());
            clock.sleep(self.window.interval).await;
        }

        tracing::info!(message = "poll window ended without measurable precipitation", attempts = attempts);
        Ok(Outcome::Expired { attempts })
    }
}

#[cfg(test)]
mod test {
    use super::{PollWindow, WindowError};
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::America::New_York;
    use std::time::Duration;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_window_start_after_end() {
        assert_eq!(
            Err(WindowError::StartAfterEnd(hm(16, 20), hm(16, 14))),
            PollWindow::new(hm(16, 20), hm(16, 14), Duration::from_secs(15))
        );
    }

    #[test]
    fn test_window_zero_interval() {
        assert_eq!(
            Err(WindowError::ZeroInterval),
            PollWindow::new(hm(16, 14), hm(16, 20), Duration::ZERO)
        );
    }

    #[test]
    fn test_window_single_instant() {
        assert!(PollWindow::new(hm(16, 14), hm(16, 14), Duration::from_secs(15)).is_ok());
    }

    #[test]
    fn test_window_on_date() {
        let window = PollWindow::new(hm(16, 14), hm(16, 20), Duration::from_secs(15)).unwrap();
        let (start, end) = window.on(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(), New_York).unwrap();

        assert_eq!(New_York.with_ymd_and_hms(2025, 3, 5, 16, 14, 0).unwrap(), start);
        assert_eq!(New_York.with_ymd_and_hms(2025, 3, 5, 16, 20, 0).unwrap(), end);
    }

    #[test]
    fn test_window_nonexistent_local_time() {
        // Clocks in New York jump from 02:00 to 03:00 on this date
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let window = PollWindow::new(hm(2, 10), hm(2, 20), Duration::from_secs(15)).unwrap();

        assert_eq!(
            Err(WindowError::NonexistentLocalTime(date, hm(2, 10), New_York)),
            window.on(date, New_York)
        );
    }
}
