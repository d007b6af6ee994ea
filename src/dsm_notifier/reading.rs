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

use crate::error::ValidationError;
use std::fmt;

/// Marker used by NWS summaries for precipitation too small to measure.
pub const TRACE_MARKER: &str = "T";

/// Precipitation total reported by a daily summary.
///
/// Trace amounts are kept distinct from numeric readings: a trace is precipitation
/// that fell but was below the measurable threshold, which is not the same as zero.
#[derive(Debug, Clone, PartialEq)]
pub enum PrecipitationReading {
    Trace,
    Measured { raw: String, value: f64 },
}

impl PrecipitationReading {
    /// Interpret a raw precipitation field as either a trace or a number.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw == TRACE_MARKER {
            return Ok(Self::Trace);
        }

        raw.trim()
            .parse::<f64>()
            .ok()
            .map(|value| Self::Measured {
                raw: raw.to_owned(),
                value,
            })
            .ok_or_else(|| ValidationError::InvalidReading(raw.to_owned()))
    }

    /// True if the reading is a trace or any amount greater than zero.
    pub fn is_qualifying(&self) -> bool {
        match self {
            Self::Trace => true,
            Self::Measured { value, .. } => *value > 0.0,
        }
    }

    /// The field exactly as it appeared in the bulletin.
    pub fn raw(&self) -> &str {
        match self {
            Self::Trace => TRACE_MARKER,
            Self::Measured { raw, .. } => raw,
        }
    }
}

impl fmt::Display for PrecipitationReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

#[cfg(test)]
mod test {
    use super::PrecipitationReading;
    use crate::error::ValidationError;

    #[test]
    fn test_trace_qualifies() {
        let reading = PrecipitationReading::parse("T").unwrap();
        assert_eq!(PrecipitationReading::Trace, reading);
        assert!(reading.is_qualifying());
    }

    #[test]
    fn test_zero_does_not_qualify() {
        assert!(!PrecipitationReading::parse("0").unwrap().is_qualifying());
        assert!(!PrecipitationReading::parse("0000").unwrap().is_qualifying());
    }

    #[test]
    fn test_positive_qualifies() {
        let reading = PrecipitationReading::parse("12").unwrap();
        assert!(reading.is_qualifying());
        assert_eq!("12", reading.raw());

        let reading = PrecipitationReading::parse("0012").unwrap();
        assert!(reading.is_qualifying());
        assert_eq!("0012", reading.to_string());
    }

    #[test]
    fn test_non_numeric_fails() {
        assert_eq!(
            Err(ValidationError::InvalidReading("M".to_owned())),
            PrecipitationReading::parse("M")
        );
        assert_eq!(
            Err(ValidationError::InvalidReading("".to_owned())),
            PrecipitationReading::parse("")
        );
    }

    #[test]
    fn test_non_finite_compared_numerically() {
        assert!(PrecipitationReading::parse("inf").unwrap().is_qualifying());
        assert!(!PrecipitationReading::parse("NaN").unwrap().is_qualifying());
        assert!(!PrecipitationReading::parse("-inf").unwrap().is_qualifying());
    }

    #[test]
    fn test_trace_is_case_sensitive() {
        assert!(PrecipitationReading::parse("t").is_err());
    }
}
