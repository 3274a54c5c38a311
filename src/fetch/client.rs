use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests for the CSV fetcher.
///
/// Wrappers such as [`ApiKey`](super::auth::ApiKey) decorate a request
/// before handing it to the inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
