use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::fetch::{HttpClient, send_get};
use crate::journey::RawJourneyRecord;
use crate::parser::parse_journeys;

/// What one request for one station name produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Records(Vec<RawJourneyRecord>),
    /// The API answered, but had nothing for this name: an empty array, 404
    /// or 410.
    Empty,
    /// Transport error, any other non-2xx status (429 and 403 included), or
    /// a body that is not a JSON array.
    Failed(String),
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    /// Maps a response status and body onto an outcome.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return FetchOutcome::Empty;
        }
        if !status.is_success() {
            return FetchOutcome::Failed(format!("HTTP {status}"));
        }

        match parse_journeys(body) {
            Ok(records) if records.is_empty() => FetchOutcome::Empty,
            Ok(records) => FetchOutcome::Records(records),
            Err(e) => FetchOutcome::Failed(format!("malformed response: {e}")),
        }
    }
}

/// Where journey records for a station name come from.
#[async_trait]
pub trait JourneySource: Send + Sync {
    /// Fetches journeys reported for `name`. Never fails: problems are
    /// folded into [`FetchOutcome::Failed`].
    async fn fetch_station(&self, name: &str) -> FetchOutcome;
}

/// `GET {base_url}{url-encoded name}` against the delay API.
pub struct HttpJourneySource<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> HttpJourneySource<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Request URL for a station name. The base is used verbatim, so it carries
/// its own trailing `/` or `?station=`.
pub fn station_url(base_url: &str, name: &str) -> String {
    format!("{}{}", base_url, urlencoding::encode(name))
}

#[async_trait]
impl<C: HttpClient> JourneySource for HttpJourneySource<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch_station(&self, name: &str) -> FetchOutcome {
        let url = station_url(&self.base_url, name);

        let response = match send_get(&self.client, &url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Station request failed");
                return FetchOutcome::Failed(e.to_string());
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%status, error = %e, "Failed to read response body");
                return FetchOutcome::Failed(e.to_string());
            }
        };

        let outcome = FetchOutcome::from_response(status, &body);
        match &outcome {
            FetchOutcome::Records(records) => debug!(%status, records = records.len(), "Journeys received"),
            FetchOutcome::Empty => debug!(%status, "No journeys for name"),
            FetchOutcome::Failed(reason) => warn!(%status, reason = %reason, "Unusable response"),
        }
        outcome
    }
}
