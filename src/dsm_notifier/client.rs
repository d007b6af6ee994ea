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

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    InvalidUrl(String),
    Unexpected(StatusCode, Url),
    MalformedIndex(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::InvalidUrl(u) => write!(f, "invalid API URL {}", u),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
            Self::MalformedIndex(s) => write!(f, "malformed product index: {}", s),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

/// Source of text products and the per-day index used to find them.
///
/// Implemented by `IemClient` for the Iowa Environmental Mesonet API. Tests substitute
/// their own implementations to count fetches and serve canned bulletins.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    /// Fetch the index of products with the given PIL (e.g. `DSMNYC`) entered on `date`.
    async fn product_list(&self, pil: &str, date: NaiveDate) -> Result<ProductList, ClientError>;

    /// Fetch the raw text of a single product.
    async fn product_text(&self, product_id: &str) -> Result<String, ClientError>;
}

#[derive(Debug)]
pub struct IemClient {
    client: Client,
    base_url: Url,
}

impl IemClient {
    const USER_AGENT: &'static str = concat!("dsm_notifier/", env!("CARGO_PKG_VERSION"));
    const JSON_RESPONSE: &'static str = "application/json";
    const TEXT_RESPONSE: &'static str = "text/plain";

    pub fn new(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_owned()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(IemClient { client, base_url })
    }

    async fn make_request(&self, url: Url, accept: &str) -> Result<Response, ClientError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else {
            Err(ClientError::Unexpected(status, url))
        }
    }

    fn product_list_url(&self, pil: &str, date: NaiveDate) -> Url {
        let mut url = self.api_url(&["nws", "afos", "list.json"]);
        url.query_pairs_mut()
            .append_pair("pil", pil)
            .append_pair("date", &date.format("%Y-%m-%d").to_string());
        url
    }

    fn product_text_url(&self, product_id: &str) -> Url {
        let mut url = self.api_url(&["nwstext", product_id]);
        url.query_pairs_mut().append_pair("nolimit", "false");
        url
    }

    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked to be a valid base in the constructor so this always succeeds.
        if let Ok(mut p) = url.path_segments_mut() {
            p.pop_if_empty().push("api").push("1").extend(segments);
        }

        url
    }
}

#[async_trait]
impl BulletinSource for IemClient {
    async fn product_list(&self, pil: &str, date: NaiveDate) -> Result<ProductList, ClientError> {
        let request_url = self.product_list_url(pil, date);
        tracing::debug!(message = "making product list request", url = %request_url);

        let res = self.make_request(request_url, Self::JSON_RESPONSE).await?;
        res.json::<ProductList>().await.map_err(ClientError::Internal)
    }

    async fn product_text(&self, product_id: &str) -> Result<String, ClientError> {
        let request_url = self.product_text_url(product_id);
        tracing::debug!(message = "making product text request", url = %request_url);

        let res = self.make_request(request_url, Self::TEXT_RESPONSE).await?;
        res.text().await.map_err(ClientError::Internal)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ProductList {
    #[serde(alias = "data")]
    pub data: Vec<ProductEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProductEntry {
    #[serde(alias = "entered")]
    pub entered: String,
    #[serde(alias = "product_id")]
    pub product_id: String,
}
