use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests. Wrappers such as [`super::HeaderClient`] layer
/// behaviour on top of an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
