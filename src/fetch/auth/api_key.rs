use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that sends an API key in an HTTP header on
/// every request to the data API.
///
/// Header name and value are validated once at construction.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut value = HeaderValue::from_str(key)?;
        value.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// Uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> Result<Self> {
        Self::new(inner, "Authorization", &format!("Bearer {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fetch_bytes;
    use crate::fetch::testing::CannedClient;

    #[tokio::test]
    async fn test_bearer_header_is_sent() {
        let client = ApiKey::bearer(CannedClient::new(200, ""), "s3cret").unwrap();
        fetch_bytes(&client, "http://example.test/waste.csv").await.unwrap();

        let headers = client.inner.seen_headers.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get("authorization").unwrap(), "Bearer s3cret");
    }

    #[tokio::test]
    async fn test_custom_header_is_sent() {
        let client = ApiKey::new(CannedClient::new(200, ""), "X-Api-Key", "abc").unwrap();
        fetch_bytes(&client, "http://example.test/waste.csv").await.unwrap();

        let headers = client.inner.seen_headers.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "abc");
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        assert!(ApiKey::new(CannedClient::new(200, ""), "bad header", "abc").is_err());
    }
}
