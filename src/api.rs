use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Level;

use crate::error::{AcmapError, Result};
use crate::models::AccountRecord;

const LOOKUP_ENDPOINT: &str = "getBy_GstNo";
const INSERT_ENDPOINT: &str = "insert-accountmaster";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The backend operations the mapping screen depends on.
pub trait AccountApi: Send + Sync {
    /// Account master records registered under a GST number.
    fn fetch_by_gst_no(&self, gst_no: &str) -> Result<Vec<AccountRecord>>;

    /// Create a local account master from an external record.
    /// Succeeds only on `201 Created`.
    fn insert_account_master(&self, record: &AccountRecord) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "accountMasterData")]
    account_master_data: Option<Value>,
}

#[derive(Debug, Serialize)]
struct InsertRequest<'a> {
    master_data: &'a AccountRecord,
    contact_data: Vec<Value>,
}

#[derive(Clone)]
pub struct HttpAccountApi {
    base_url: url::Url,
    client: Client,
}

impl HttpAccountApi {
    pub fn new(api_url: &str) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with '/'.
        let normalized = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };
        let base_url = url::Url::parse(&normalized)
            .map_err(|e| AcmapError::InvalidUrl(format!("{api_url}: {e}")))?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base_url, client })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.base_url
            .join(path)
            .map_err(|e| AcmapError::InvalidUrl(format!("{path}: {e}")))
    }
}

impl AccountApi for HttpAccountApi {
    fn fetch_by_gst_no(&self, gst_no: &str) -> Result<Vec<AccountRecord>> {
        let mut url = self.endpoint(LOOKUP_ENDPOINT)?;
        url.query_pairs_mut().append_pair("gst_no", gst_no);
        tracing::debug!(gst_no, "looking up account master records");

        let resp = self.client.get(url).send().map_err(|e| {
            tracing::error!(gst_no, "account lookup request failed: {e}");
            AcmapError::Http(e)
        })?;
        let status = resp.status();
        let body = resp.bytes()?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body).to_string();
            tracing::error!(gst_no, %status, "account lookup rejected");
            return Err(AcmapError::Status(status, text));
        }

        parse_lookup(&body).inspect(|records| {
            tracing::info!(gst_no, count = records.len(), "account lookup complete");
        })
    }

    fn insert_account_master(&self, record: &AccountRecord) -> Result<()> {
        let url = self.endpoint(INSERT_ENDPOINT)?;
        let code = record.code();
        let request = InsertRequest {
            master_data: record,
            contact_data: Vec::new(),
        };
        if tracing::event_enabled!(Level::TRACE) {
            tracing::trace!(
                code = code.as_str(),
                body = %serde_json::to_string(&request).unwrap_or_default(),
                "posting account master"
            );
        }

        let resp = self.client.post(url).json(&request).send().map_err(|e| {
            tracing::error!(code = code.as_str(), "account insert request failed: {e}");
            AcmapError::Http(e)
        })?;
        let status = resp.status();
        // The status alone decides the outcome; the body only feeds the error.
        let text = resp.text().unwrap_or_else(|e| {
            tracing::warn!(code = code.as_str(), %status, "could not read insert response: {e}");
            String::new()
        });

        if status == StatusCode::CREATED {
            tracing::info!(code = code.as_str(), "account master inserted");
            Ok(())
        } else {
            tracing::error!(code = code.as_str(), %status, body = %text, "account insert rejected");
            Err(AcmapError::InsertRejected(status, text))
        }
    }
}

fn parse_lookup(body: &[u8]) -> Result<Vec<AccountRecord>> {
    let parsed: LookupResponse = serde_json::from_slice(body)
        .map_err(|e| AcmapError::MalformedResponse(format!("lookup body: {e}")))?;
    match parsed.account_master_data {
        Some(data @ Value::Array(_)) => serde_json::from_value(data)
            .map_err(|e| AcmapError::MalformedResponse(format!("accountMasterData: {e}"))),
        Some(_) => Err(AcmapError::MalformedResponse(
            "accountMasterData is not an array".into(),
        )),
        None => Err(AcmapError::MalformedResponse(
            "accountMasterData is missing".into(),
        )),
    }
}
