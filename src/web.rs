use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::PaperfetchError;

/// Generic URL retrieval for datasets published as plain files.
pub trait UrlFetcher: Send + Sync {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), PaperfetchError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, PaperfetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("paperfetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PaperfetchError::UrlHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|err| PaperfetchError::UrlHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl UrlFetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), PaperfetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| PaperfetchError::UrlHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "url request failed".to_string());
            return Err(PaperfetchError::UrlStatus { status, message });
        }

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        }
        let mut file =
            File::create(destination).map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
