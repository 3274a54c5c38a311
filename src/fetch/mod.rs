mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use tracing::debug;

use crate::error::ImportError;

/// GETs `url` and returns the body, failing on any non-success status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ImportError::HttpStatus(status).into());
    }

    let bytes = resp.bytes().await?;
    debug!(url, bytes = bytes.len(), "Fetched response body");
    Ok(bytes.to_vec())
}

/// Like [`fetch_bytes`], decoding the body as UTF-8 text.
pub async fn fetch_text<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<String> {
    let bytes = fetch_bytes(client, url).await?;
    Ok(String::from_utf8(bytes)?)
}
