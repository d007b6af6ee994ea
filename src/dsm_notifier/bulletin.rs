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

//! Positional parsing of NWS daily summary (DSM) bulletins.
//!
//! A DSM has no self-describing schema, only a fixed line layout. For example:
//!
//! ```text
//! 000
//! CDUS41 KOKX 052124
//! DSMNYC
//! KNYC DS 1600 05/03 451453/ 361228// 45/ 34//0001002/0012/00/NN/
//! ```
//!
//! The second line carries the issuing office (`KOKX`) as its second token. The fourth
//! line is the summary itself: its fourth token is the day/month the summary covers and
//! the third `//` delimited group holds the precipitation total as its second `/`
//! delimited field.

use crate::client::BulletinSource;
use crate::error::{Error, ValidationError};

const STATION_LINE: usize = 1;
const STATION_TOKEN: usize = 1;
const SUMMARY_LINE: usize = 3;
const DATE_TOKEN: usize = 3;
const GROUP_DELIMITER: &str = "//";
const PRECIP_GROUP: usize = 2;
const FIELD_DELIMITER: char = '/';
const PRECIP_FIELD: usize = 1;

/// Fetch the bulletin `product_id` and extract its raw precipitation field.
///
/// Returns `Ok(None)` without making any request when there is no product to fetch.
pub async fn extract_precipitation<S>(
    source: &S,
    product_id: Option<&str>,
    expected_date_dm: &str,
    expected_station: &str,
) -> Result<Option<String>, Error>
where
    S: BulletinSource + ?Sized,
{
    let product_id = match product_id {
        Some(id) => id,
        None => return Ok(None),
    };

    let text = source.product_text(product_id).await?;
    let field = precipitation_field(&text, expected_date_dm, expected_station)?;
    tracing::debug!(message = "extracted precipitation field", product_id = %product_id, field = %field);

    Ok(Some(field.to_owned()))
}

/// Validate the station and date of a bulletin and return the raw precipitation field.
pub fn precipitation_field<'a>(
    text: &'a str,
    expected_date_dm: &str,
    expected_station: &str,
) -> Result<&'a str, ValidationError> {
    let lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();

    let station_line = line(&lines, STATION_LINE)?;
    let station = token(station_line, STATION_TOKEN, "station")?;
    if station != expected_station {
        return Err(ValidationError::WrongStation {
            expected: expected_station.to_owned(),
            found: station.to_owned(),
        });
    }

    let summary = line(&lines, SUMMARY_LINE)?;
    let date = token(summary, DATE_TOKEN, "date")?;
    if date != expected_date_dm {
        return Err(ValidationError::WrongDate {
            expected: expected_date_dm.to_owned(),
            found: date.to_owned(),
        });
    }

    let group = summary.split(GROUP_DELIMITER).nth(PRECIP_GROUP).ok_or_else(|| {
        ValidationError::MalformedBulletin(format!("summary has fewer than {} groups: {:?}", PRECIP_GROUP + 1, summary))
    })?;

    group.split(FIELD_DELIMITER).nth(PRECIP_FIELD).ok_or_else(|| {
        ValidationError::MalformedBulletin(format!("precipitation group has no field {}: {:?}", PRECIP_FIELD, group))
    })
}

fn line<'a>(lines: &[&'a str], index: usize) -> Result<&'a str, ValidationError> {
    lines.get(index).copied().ok_or_else(|| {
        ValidationError::MalformedBulletin(format!("expected at least {} lines, got {}", index + 1, lines.len()))
    })
}

fn token<'a>(line: &'a str, index: usize, name: &str) -> Result<&'a str, ValidationError> {
    line.split(' ')
        .nth(index)
        .ok_or_else(|| ValidationError::MalformedBulletin(format!("no {} token in line {:?}", name, line)))
}
