//! Google Sheets v4 REST client implementing [`GridStore`]

use async_trait::async_trait;
use quire::{Grid, GridStore, Row};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};
use url::Url;

use crate::config::SheetsConfig;
use crate::error::{SheetsError, SheetsResult};

/// Sheets API client
///
/// # Example
///
/// ```ignore
/// use quire_sheets::{SheetsClient, SheetsConfig};
///
/// let config = SheetsConfig::from_env();
/// let client = SheetsClient::new(config)?;
/// let grid = client.get_values("Users").await?;
/// ```
#[derive(Clone)]
pub struct SheetsClient {
    inner: Arc<SheetsClientInner>,
}

struct SheetsClientInner {
    client: reqwest::Client,
    config: SheetsConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Row],
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Grid,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl SheetsClient {
    /// Create a client. The configuration is validated first.
    pub fn new(config: SheetsConfig) -> SheetsResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            inner: Arc::new(SheetsClientInner { client, config }),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.inner.config.spreadsheet_id
    }

    /// `{base}/{spreadsheet_id}` followed by `segments`, each percent-encoded.
    fn url(&self, segments: &[&str]) -> SheetsResult<Url> {
        let mut url = Url::parse(&self.inner.config.base_url)?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SheetsError::InvalidUrl(self.inner.config.base_url.clone()))?;
            path.pop_if_empty();
            path.push(&self.inner.config.spreadsheet_id);
            path.extend(segments);
        }
        Ok(url)
    }

    /// Same as [`Self::url`] with a `:method` suffix on the last segment.
    fn method_url(&self, segments: &[&str], method: &str) -> SheetsResult<Url> {
        match segments.split_last() {
            Some((last, rest)) => {
                let mut all: Vec<&str> = rest.to_vec();
                let last = format!("{}:{}", last, method);
                all.push(&last);
                self.url(&all)
            }
            None => {
                let mut url = self.url(&[])?;
                let path = format!("{}:{}", url.path(), method);
                url.set_path(&path);
                Ok(url)
            }
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> SheetsResult<reqwest::Response> {
        let start = Instant::now();
        let response = request
            .bearer_auth(&self.inner.config.access_token)
            .send()
            .await?;
        let status = response.status();
        debug!(
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "sheets response"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> SheetsResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SheetsError::Json(e.to_string()))
    }

    /// `GET values/{range}`
    #[instrument(skip(self))]
    pub async fn get_values(&self, range: &str) -> SheetsResult<Grid> {
        let url = self.url(&["values", range])?;
        let request = self
            .inner
            .client
            .get(url)
            .query(&[("valueRenderOption", "UNFORMATTED_VALUE")]);
        let body: ValueRangeResponse = Self::json(self.send(request).await?).await?;
        debug!(rows = body.values.len(), "read values");
        Ok(body.values)
    }

    /// `PUT values/{range}?valueInputOption=RAW`
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn update_values(&self, range: &str, rows: &[Row]) -> SheetsResult<()> {
        let url = self.url(&["values", range])?;
        let body = ValueRange {
            range,
            major_dimension: "ROWS",
            values: rows,
        };
        let request = self
            .inner
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    /// `POST values/{range}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS`
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn append_values(&self, range: &str, rows: &[Row]) -> SheetsResult<()> {
        let url = self.method_url(&["values", range], "append")?;
        let body = ValueRange {
            range,
            major_dimension: "ROWS",
            values: rows,
        };
        let request = self
            .inner
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    /// Numeric ID of the sheet titled `title`.
    #[instrument(skip(self))]
    pub async fn sheet_id(&self, title: &str) -> SheetsResult<i64> {
        let url = self.url(&[])?;
        let request = self
            .inner
            .client
            .get(url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let body: SpreadsheetResponse = Self::json(self.send(request).await?).await?;
        body.sheets
            .into_iter()
            .find(|s| s.properties.title == title)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| SheetsError::SheetNotFound(title.to_string()))
    }

    /// Deletes rows by 0-based index with one `deleteDimension` request per
    /// index, applied by the API in the order given.
    #[instrument(skip(self))]
    pub async fn delete_dimension_rows(&self, title: &str, indices: &[usize]) -> SheetsResult<()> {
        if indices.is_empty() {
            return Ok(());
        }

        let sheet_id = self.sheet_id(title).await?;
        let requests: Vec<_> = indices
            .iter()
            .map(|&index| {
                json!({
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": index,
                            "endIndex": index + 1,
                        }
                    }
                })
            })
            .collect();

        let url = self.method_url(&[], "batchUpdate")?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&json!({ "requests": requests }));
        self.send(request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

#[async_trait]
impl GridStore for SheetsClient {
    async fn read(&self, range: &str) -> quire::Result<Grid> {
        Ok(self.get_values(range).await?)
    }

    async fn write(&self, range: &str, rows: Vec<Row>) -> quire::Result<()> {
        Ok(self.update_values(range, &rows).await?)
    }

    async fn append(&self, range: &str, rows: Vec<Row>) -> quire::Result<()> {
        Ok(self.append_values(range, &rows).await?)
    }

    async fn delete_rows(&self, table: &str, indices: &[usize]) -> quire::Result<()> {
        Ok(self.delete_dimension_rows(table, indices).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SheetsClient {
        SheetsClient::new(
            SheetsConfig::new()
                .spreadsheet_id("sheet-1")
                .access_token("tok")
                .base_url(base),
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates_config() {
        let err = SheetsClient::new(SheetsConfig::new()).unwrap_err();
        assert!(matches!(err, SheetsError::Config(_)));
    }

    #[test]
    fn test_values_url_encodes_range() {
        let c = client("https://example.com/v4/spreadsheets");
        let url = c.url(&["values", "My Users!A2:C2"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/v4/spreadsheets/sheet-1/values/My%20Users!A2:C2"
        );
    }

    #[test]
    fn test_method_urls() {
        let c = client("https://example.com/v4/spreadsheets/");
        assert_eq!(
            c.method_url(&["values", "Users!A1"], "append").unwrap().as_str(),
            "https://example.com/v4/spreadsheets/sheet-1/values/Users!A1:append"
        );
        assert_eq!(
            c.method_url(&[], "batchUpdate").unwrap().as_str(),
            "https://example.com/v4/spreadsheets/sheet-1:batchUpdate"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let c = client("https://example.com");
        assert!(!format!("{:?}", c).contains("tok\""));
    }
}
