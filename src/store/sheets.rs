//! Google Sheets v4 values API.
//!
//! Only two endpoints are used: `values.get` for range reads and
//! `values.update` with `valueInputOption=RAW` for cell writes. Access tokens
//! come either straight from configuration or from an OAuth refresh token,
//! cached until shortly before they expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use url::Url;

use super::{CellAddress, Result, RowRange, RowStore, StoreError};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub enum SheetsCredentials {
    /// A bearer token used as-is.
    AccessToken(String),
    /// Exchanged for short-lived access tokens on demand.
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

struct CachedToken {
    value: String,
    expires_at: Option<Instant>,
}

pub struct SheetsStore {
    client: reqwest::Client,
    spreadsheet_id: String,
    credentials: SheetsCredentials,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

impl SheetsStore {
    pub fn new(
        client: reqwest::Client,
        spreadsheet_id: impl Into<String>,
        credentials: SheetsCredentials,
    ) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            credentials,
            token: Mutex::new(None),
        }
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }

    async fn access_token(&self) -> Result<String> {
        let (client_id, client_secret, refresh_token) = match &self.credentials {
            SheetsCredentials::AccessToken(token) => return Ok(token.clone()),
            SheetsCredentials::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
            } => (client_id, client_secret, refresh_token),
        };

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at.map_or(true, |at| Instant::now() < at) {
                return Ok(token.value.clone());
            }
        }

        debug!("Refreshing spreadsheet access token");
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token refresh failed with {status}: {body}");
            return Err(StoreError::Token(format!("{status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = token
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs).saturating_sub(TOKEN_EXPIRY_MARGIN));
        info!("Obtained spreadsheet access token");

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at,
        });
        Ok(value)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RowStore for SheetsStore {
    async fn get_rows(&self, range: &RowRange) -> Result<Vec<Vec<String>>> {
        let a1 = range.to_string();
        let token = self.access_token().await?;

        let response = self
            .client
            .get(self.values_url(&a1)?)
            .bearer_auth(token)
            .send()
            .await
            .inspect_err(|e| error!("Get values failed for {a1}: {e}"))?;

        let body: ValueRange = Self::check(response)
            .await
            .inspect_err(|e| error!("Get values failed for {a1}: {e}"))?
            .json()
            .await?;

        debug!("Fetched {} rows from {a1}", body.values.len());
        Ok(body.values)
    }

    async fn update_cells(&self, start: &CellAddress, values: Vec<String>) -> Result<()> {
        let a1 = start.span(values.len());
        let token = self.access_token().await?;

        let mut url = self.values_url(&a1)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&ValueUpdate {
                range: &a1,
                major_dimension: "ROWS",
                values: vec![values],
            })
            .send()
            .await
            .inspect_err(|e| error!("Update values failed for {a1}: {e}"))?;

        Self::check(response)
            .await
            .inspect_err(|e| error!("Update values failed for {a1}: {e}"))?;

        info!("Updated {a1}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SheetsStore {
        SheetsStore::new(
            reqwest::Client::new(),
            "sheet-id",
            SheetsCredentials::AccessToken("token".to_string()),
        )
    }

    #[test]
    fn values_url_encodes_range_as_one_segment() {
        let url = store()
            .values_url(&RowRange::records("תלמידים - כפר עזה", 20).to_string())
            .unwrap();

        assert!(url.as_str().starts_with(
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/"
        ));
        assert_eq!(url.path_segments().unwrap().count(), 5);
        assert!(!url.path().contains(' '));
    }

    #[tokio::test]
    async fn static_tokens_skip_refresh() {
        assert_eq!(store().access_token().await.unwrap(), "token");
    }

    #[test]
    fn update_payload_is_row_major() {
        let payload = ValueUpdate {
            range: "'מורים'!AA5",
            major_dimension: "ROWS",
            values: vec![vec!["שרה לוי".to_string()]],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["majorDimension"], "ROWS");
        assert_eq!(json["values"][0][0], "שרה לוי");
    }
}
