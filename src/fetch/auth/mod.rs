//! Credential-injecting [`HttpClient`](super::HttpClient) wrappers.

mod api_key;

pub use api_key::ApiKey;
