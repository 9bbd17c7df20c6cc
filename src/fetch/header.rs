use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that sets a fixed header on every request.
///
/// Entur's APIs ask callers to identify themselves with
/// `ET-Client-Name: <company>-<application>`; [`HeaderClient::client_name`]
/// builds exactly that.
pub struct HeaderClient<C> {
    inner: C,
    name: HeaderName,
    value: HeaderValue,
}

impl<C> HeaderClient<C> {
    /// Validates the header up front so requests never fail on it later.
    pub fn new(inner: C, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name {name:?}"))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for header {name}"))?;
        Ok(Self { inner, name, value })
    }

    pub fn client_name(inner: C, client_name: &str) -> Result<Self> {
        Self::new(inner, "ET-Client-Name", client_name)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for HeaderClient<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(self.name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
