//! HTTP access to the delay API.
//!
//! [`HttpClient`] is the transport seam; [`JourneySource`] is what the poller
//! talks to.

mod basic;
mod client;
mod header;
mod source;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use header::HeaderClient;
pub use source::{FetchOutcome, HttpJourneySource, JourneySource, station_url};

use anyhow::Result;

/// Issues a GET through `client`. The status is left for the caller to judge.
pub async fn send_get<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<reqwest::Response> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    Ok(client.execute(req).await?)
}
