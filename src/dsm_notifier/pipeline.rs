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

use crate::bulletin;
use crate::client::BulletinSource;
use crate::error::Error;
use crate::locate::BulletinLocator;
use crate::reading::PrecipitationReading;
use async_trait::async_trait;
use chrono::NaiveDate;

/// A qualifying reading and the product it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub product_id: String,
    pub reading: PrecipitationReading,
}

/// Something that can check, right now, whether precipitation has been reported for a day.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Return a detection if a qualifying reading exists for `today`, `None` otherwise.
    async fn check(&self, today: NaiveDate) -> Result<Option<Detection>, Error>;
}

/// Locate today's bulletin, then fetch, validate, and interpret its precipitation field.
#[derive(Debug)]
pub struct DetectionPipeline<S> {
    source: S,
    locator: BulletinLocator,
    station: String,
}

impl<S> DetectionPipeline<S>
where
    S: BulletinSource,
{
    pub fn new<T: Into<String>>(source: S, locator: BulletinLocator, station: T) -> Self {
        DetectionPipeline {
            source,
            locator,
            station: station.into(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S> Detector for DetectionPipeline<S>
where
    S: BulletinSource,
{
    async fn check(&self, today: NaiveDate) -> Result<Option<Detection>, Error> {
        let date_dm = today.format("%d/%m").to_string();

        let product_id = self.locator.locate(&self.source, today).await?;
        let raw = bulletin::extract_precipitation(&self.source, product_id.as_deref(), &date_dm, &self.station).await?;

        let (product_id, raw) = match (product_id, raw) {
            (Some(id), Some(raw)) => (id, raw),
            _ => {
                tracing::info!(message = "no bulletin published in window yet", pil = %self.locator.pil(), date = %today);
                return Ok(None);
            }
        };

        let reading = PrecipitationReading::parse(&raw)?;
        if reading.is_qualifying() {
            Ok(Some(Detection { product_id, reading }))
        } else {
            tracing::info!(message = "no measurable precipitation reported", product_id = %product_id, reading = %reading);
            Ok(None)
        }
    }
}
