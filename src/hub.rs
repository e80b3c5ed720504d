use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::PaperfetchError;

const HUB_BASE: &str = "https://huggingface.co";
const DATASETS_SERVER_BASE: &str = "https://datasets-server.huggingface.co";

/// Hugging Face dataset retrieval. `snapshot_download` mirrors the hub's
/// repository snapshot; `export_download` pulls the auto-generated parquet
/// export instead, which works for datasets whose raw files are loading
/// scripts rather than data.
pub trait HubClient: Send + Sync {
    fn snapshot_download(&self, dataset_id: &str, destination: &Path) -> Result<(), PaperfetchError>;
    fn export_download(&self, dataset_id: &str, destination: &Path) -> Result<(), PaperfetchError>;
}

#[derive(Clone)]
pub struct HubHttpClient {
    client: Client,
    token: Option<String>,
}

impl HubHttpClient {
    pub fn new() -> Result<Self, PaperfetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("paperfetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PaperfetchError::HubHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|err| PaperfetchError::HubHttp(err.to_string()))?;
        Ok(Self {
            client,
            token: std::env::var("HF_TOKEN").ok(),
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, PaperfetchError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .map_err(|err| PaperfetchError::HubHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "hub request failed".to_string());
            return Err(PaperfetchError::HubStatus { status, message });
        }
        Ok(response)
    }

    fn download_to(&self, url: &str, destination: &Path) -> Result<(), PaperfetchError> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        }
        let mut response = self.get(url)?;
        let mut file =
            File::create(destination).map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

impl HubClient for HubHttpClient {
    fn snapshot_download(&self, dataset_id: &str, destination: &Path) -> Result<(), PaperfetchError> {
        let info_url = format!("{HUB_BASE}/api/datasets/{dataset_id}");
        let info: Value = self
            .get(&info_url)?
            .json()
            .map_err(|err| PaperfetchError::HubHttp(err.to_string()))?;

        let siblings = info
            .get("siblings")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PaperfetchError::HubHttp(format!("no file listing for dataset {dataset_id}"))
            })?;

        let mut downloaded = 0usize;
        for sibling in siblings {
            let Some(rfilename) = sibling.get("rfilename").and_then(Value::as_str) else {
                continue;
            };
            let file_url = format!("{HUB_BASE}/datasets/{dataset_id}/resolve/main/{rfilename}");
            tracing::debug!("hub file {rfilename}");
            self.download_to(&file_url, &destination.join(rfilename))?;
            downloaded += 1;
        }

        if downloaded == 0 {
            return Err(PaperfetchError::HubHttp(format!(
                "dataset {dataset_id} has no downloadable files"
            )));
        }
        tracing::info!("snapshot of {dataset_id}: {downloaded} files");
        Ok(())
    }

    fn export_download(&self, dataset_id: &str, destination: &Path) -> Result<(), PaperfetchError> {
        let listing_url = format!("{DATASETS_SERVER_BASE}/parquet?dataset={dataset_id}");
        let listing: Value = self
            .get(&listing_url)?
            .json()
            .map_err(|err| PaperfetchError::HubHttp(err.to_string()))?;

        let files = listing
            .get("parquet_files")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PaperfetchError::HubHttp(format!("no parquet export for dataset {dataset_id}"))
            })?;

        let mut downloaded = 0usize;
        for entry in files {
            let (Some(url), Some(filename)) = (
                entry.get("url").and_then(Value::as_str),
                entry.get("filename").and_then(Value::as_str),
            ) else {
                continue;
            };
            let split = entry.get("split").and_then(Value::as_str).unwrap_or("data");
            self.download_to(url, &destination.join(split).join(filename))?;
            downloaded += 1;
        }

        if downloaded == 0 {
            return Err(PaperfetchError::HubHttp(format!(
                "parquet export of {dataset_id} is empty"
            )));
        }
        tracing::info!("parquet export of {dataset_id}: {downloaded} files");
        Ok(())
    }
}

/// Reduce any accepted huggingface location (full hub or mirror URL, or a
/// bare id) to the dataset id.
pub fn dataset_id_from_location(location: &str) -> String {
    let trimmed = location.trim().trim_end_matches('/');
    for host_prefix in ["huggingface.co/datasets/", "hf-mirror.com/datasets/"] {
        if let Some(index) = trimmed.find(host_prefix) {
            return trimmed[index + host_prefix.len()..].to_string();
        }
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    tracing::warn!("cannot extract a dataset id from {location}, using last segment");
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

/// The id variant the fallback tries first: dashes to underscores,
/// lowercased, matching the naming convention of canonical hub datasets.
pub fn normalize_dataset_id(dataset_id: &str) -> String {
    dataset_id.replace('-', "_").to_lowercase()
}
