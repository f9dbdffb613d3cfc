use std::future::Future;
use std::pin::Pin;

use nextrip_transit::{DataFetcher, Result, TransitError};
use reqwest::header::ACCEPT;

/// [`DataFetcher`] backed by a shared `reqwest` client
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataFetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| TransitError::Fetch(e.to_string()))?;

            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransitError::Fetch(e.to_string()))?;

            Ok(bytes.to_vec())
        })
    }
}
