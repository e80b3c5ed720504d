use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::PaperfetchError;
use crate::fs_util;

const KAGGLE_API_BASE: &str = "https://www.kaggle.com/api/v1";

/// Kaggle dataset retrieval: download the bundle zip and unpack it.
pub trait KaggleClient: Send + Sync {
    fn download_dataset(&self, identifier: &str, destination: &Path) -> Result<(), PaperfetchError>;
    /// `false` when the API credentials are not configured.
    fn credentialed(&self) -> bool;
}

#[derive(Clone)]
pub struct KaggleHttpClient {
    client: Client,
    credentials: Option<(String, String)>,
}

impl KaggleHttpClient {
    pub fn new() -> Result<Self, PaperfetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("paperfetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PaperfetchError::KaggleHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|err| PaperfetchError::KaggleHttp(err.to_string()))?;

        let credentials = match (
            std::env::var("KAGGLE_USERNAME"),
            std::env::var("KAGGLE_KEY"),
        ) {
            (Ok(username), Ok(key)) => Some((username, key)),
            _ => None,
        };

        Ok(Self {
            client,
            credentials,
        })
    }
}

impl KaggleClient for KaggleHttpClient {
    fn download_dataset(&self, identifier: &str, destination: &Path) -> Result<(), PaperfetchError> {
        let (username, key) = self.credentials.as_ref().ok_or_else(|| {
            PaperfetchError::MissingCredentials(
                "KAGGLE_USERNAME / KAGGLE_KEY are not set".to_string(),
            )
        })?;

        std::fs::create_dir_all(destination)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;

        let url = format!("{KAGGLE_API_BASE}/datasets/download/{identifier}");
        let mut response = self
            .client
            .get(&url)
            .basic_auth(username, Some(key))
            .send()
            .map_err(|err| PaperfetchError::KaggleHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "kaggle request failed".to_string());
            return Err(PaperfetchError::KaggleStatus { status, message });
        }

        // Bundle goes to a temp file inside the destination; dropped on
        // failure, extracted then dropped on success.
        let bundle = tempfile::Builder::new()
            .prefix("paperfetch-kaggle")
            .suffix(".zip")
            .tempfile_in(destination)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        let mut file = bundle
            .as_file()
            .try_clone()
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;

        fs_util::validate_zip(bundle.path())?;
        fs_util::extract_zip(bundle.path(), destination)?;
        Ok(())
    }

    fn credentialed(&self) -> bool {
        self.credentials.is_some()
    }
}
