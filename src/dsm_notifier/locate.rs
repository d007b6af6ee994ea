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

use crate::client::{BulletinSource, ClientError, ProductEntry};
use chrono::{NaiveDate, NaiveTime};

const ENTERED_TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Finds the product ID of the bulletin published inside a UTC time-of-day range.
///
/// The daily summary for a station may be issued several times a day (preliminary
/// reports, corrections) so only entries whose `entered` time falls within the range
/// are considered. When more than one does, the last one in index order wins.
#[derive(Debug, Clone)]
pub struct BulletinLocator {
    pil: String,
    start: NaiveTime,
    end: NaiveTime,
}

impl BulletinLocator {
    pub fn new<S: Into<String>>(pil: S, start: NaiveTime, end: NaiveTime) -> Self {
        BulletinLocator {
            pil: pil.into(),
            start,
            end,
        }
    }

    pub fn pil(&self) -> &str {
        &self.pil
    }

    /// Fetch the product index for `date` and select the matching product ID, if any.
    pub async fn locate<S>(&self, source: &S, date: NaiveDate) -> Result<Option<String>, ClientError>
    where
        S: BulletinSource + ?Sized,
    {
        let list = source.product_list(&self.pil, date).await?;
        tracing::debug!(message = "fetched product index", pil = %self.pil, date = %date, entries = list.data.len());
        self.select(&list.data)
    }

    /// Select the last entry whose time-of-day is within `[start, end]` inclusive.
    ///
    /// An entry without a `T` separator means the index isn't in the expected format and
    /// fails the whole selection. An entry whose time can't be parsed can't be in range and
    /// is skipped.
    pub fn select(&self, entries: &[ProductEntry]) -> Result<Option<String>, ClientError> {
        let mut selected = None;

        for entry in entries {
            let entered = match entered_time(&entry.entered)? {
                Some(t) => t,
                None => {
                    tracing::debug!(message = "skipping entry with unparseable time", entered = %entry.entered, product_id = %entry.product_id);
                    continue;
                }
            };

            if self.start <= entered && entered <= self.end {
                selected = Some(entry.product_id.clone());
            }
        }

        Ok(selected)
    }
}

/// Parse the time-of-day portion of an `entered` timestamp like `2025-03-05T20:24:00Z`.
fn entered_time(entered: &str) -> Result<Option<NaiveTime>, ClientError> {
    let (_, time) = entered
        .split_once('T')
        .ok_or_else(|| ClientError::MalformedIndex(format!("entered time without 'T' separator: {}", entered)))?;
    let time = time.strip_suffix('Z').unwrap_or(time);

    Ok(ENTERED_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(time, f).ok()))
}

#[cfg(test)]
mod test {
    use super::{entered_time, BulletinLocator};
    use crate::client::{ClientError, ProductEntry};
    use chrono::{NaiveTime, Timelike};

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn entry(entered: &str, product_id: &str) -> ProductEntry {
        ProductEntry {
            entered: entered.to_owned(),
            product_id: product_id.to_owned(),
        }
    }

    fn locator() -> BulletinLocator {
        BulletinLocator::new("DSMNYC", hms(20, 0, 0), hms(21, 0, 0))
    }

    #[test]
    fn test_select_last_match_wins() {
        let entries = vec![
            entry("2025-03-05T06:10:00Z", "early"),
            entry("2025-03-05T20:24:00Z", "first"),
            entry("2025-03-05T20:41:00Z", "correction"),
            entry("2025-03-05T22:05:00Z", "late"),
        ];

        assert_eq!(Some("correction".to_owned()), locator().select(&entries).unwrap());
    }

    #[test]
    fn test_select_inclusive_boundaries() {
        let start = vec![entry("2025-03-05T20:00:00Z", "at-start")];
        let end = vec![entry("2025-03-05T21:00:00Z", "at-end")];
        let after = vec![entry("2025-03-05T21:00:01Z", "after-end")];

        assert_eq!(Some("at-start".to_owned()), locator().select(&start).unwrap());
        assert_eq!(Some("at-end".to_owned()), locator().select(&end).unwrap());
        assert_eq!(None, locator().select(&after).unwrap());
    }

    #[test]
    fn test_select_no_entries() {
        assert_eq!(None, locator().select(&[]).unwrap());
    }

    #[test]
    fn test_select_none_in_window() {
        let entries = vec![
            entry("2025-03-05T05:59:00Z", "morning"),
            entry("2025-03-05T19:59:59Z", "just-before"),
        ];

        assert_eq!(None, locator().select(&entries).unwrap());
    }

    #[test]
    fn test_select_missing_separator_fails() {
        let entries = vec![
            entry("2025-03-05T20:24:00Z", "valid"),
            entry("2025-03-05 06:10", "no-separator"),
        ];
        assert!(matches!(locator().select(&entries), Err(ClientError::MalformedIndex(_))));
    }

    #[test]
    fn test_select_skips_unparseable_time() {
        let entries = vec![
            entry("2025-03-05Tlater", "garbage"),
            entry("2025-03-05T20:24:00Z", "valid"),
            entry("2025-03-05T25:99:00Z", "out-of-range"),
        ];
        assert_eq!(Some("valid".to_owned()), locator().select(&entries).unwrap());
    }

    #[test]
    fn test_entered_time_formats() {
        assert_eq!(Some(hms(20, 24, 0)), entered_time("2025-03-05T20:24:00Z").unwrap());
        assert_eq!(Some(hms(20, 24, 0)), entered_time("2025-03-05T20:24:00").unwrap());
        assert_eq!(Some(hms(20, 24, 0)), entered_time("2025-03-05T20:24Z").unwrap());
        assert_eq!(
            Some(hms(20, 24, 13)),
            entered_time("2025-03-05T20:24:13.250Z").unwrap().and_then(|t| t.with_nanosecond(0))
        );
        assert_eq!(None, entered_time("2025-03-05Tlater").unwrap());
    }
}
