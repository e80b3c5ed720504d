use std::collections::BTreeMap;
use std::fs;

use camino::Utf8PathBuf;

use crate::domain::{
    DatasetLocator, DatasetRequest, DownloadOutcome, SourceClass, SourceKind, classify_source,
    infer_from_raw, preset_mapping,
};
use crate::error::PaperfetchError;
use crate::fs_util;
use crate::git::{GitClient, repo_name_from_url};
use crate::history::{HistoryEntry, HistoryStore};
use crate::hub::{HubClient, dataset_id_from_location, normalize_dataset_id};
use crate::kaggle::KaggleClient;
use crate::web::UrlFetcher;

/// Chooses and invokes the platform handler for each dataset locator, and
/// owns the download history. One dispatcher per download directory.
pub struct Dispatcher<H, G, K, U> {
    download_dir: Utf8PathBuf,
    history: HistoryStore,
    presets: BTreeMap<String, DatasetLocator>,
    hub: H,
    git: G,
    kaggle: K,
    fetcher: U,
}

/// A successful handler run: the identifier the download resolves to, where
/// it landed, and what to tell the caller.
struct Fetched {
    key: String,
    path: Utf8PathBuf,
    message: String,
    url: Option<String>,
}

enum Normalized {
    Fetch { kind: SourceKind, location: String },
    Manual { source: String, location: String },
    Unrecognized(String),
}

impl<H, G, K, U> Dispatcher<H, G, K, U>
where
    H: HubClient,
    G: GitClient,
    K: KaggleClient,
    U: UrlFetcher,
{
    pub fn new(
        download_dir: impl Into<Utf8PathBuf>,
        hub: H,
        git: G,
        kaggle: K,
        fetcher: U,
    ) -> Result<Self, PaperfetchError> {
        let download_dir = download_dir.into();
        fs::create_dir_all(download_dir.as_std_path())
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        let history = HistoryStore::load(&download_dir);
        let presets = preset_mapping()
            .into_iter()
            .map(|(name, locator)| (name.to_string(), locator))
            .collect();

        let dispatcher = Self {
            download_dir,
            history,
            presets,
            hub,
            git,
            kaggle,
            fetcher,
        };
        let missing = dispatcher.missing_integrations();
        if !missing.is_empty() {
            tracing::warn!(
                "optional platform integrations unavailable: {} (downloads will be attempted anyway)",
                missing.join(", ")
            );
        }
        Ok(dispatcher)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn download_dir(&self) -> &Utf8PathBuf {
        &self.download_dir
    }

    /// Platform integrations whose capability probe fails right now. Purely
    /// informational; handlers still run on request and report the real
    /// error.
    pub fn missing_integrations(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.git.version().is_none() {
            missing.push("git");
        }
        if !self.kaggle.credentialed() {
            missing.push("kaggle");
        }
        missing
    }

    pub fn download(&mut self, request: &DatasetRequest) -> DownloadOutcome {
        self.download_impl(request, None)
    }

    /// Like [`download`](Self::download), but the URL handler writes to the
    /// given filename instead of deriving one from the URL.
    pub fn download_with_filename(
        &mut self,
        request: &DatasetRequest,
        filename: &str,
    ) -> DownloadOutcome {
        self.download_impl(request, Some(filename))
    }

    fn download_impl(&mut self, request: &DatasetRequest, filename: Option<&str>) -> DownloadOutcome {
        // Named datasets short-circuit on history; a recorded path that
        // vanished from disk does not count.
        if let Some(name) = &request.name {
            if let Some(path) = self.history.fresh_path(name) {
                tracing::info!("{name} already downloaded, skipping");
                return DownloadOutcome::cached(path, format!("already downloaded: {path}"));
            }
        }

        match self.normalize(&request.locator) {
            Normalized::Fetch { kind, location } => {
                self.dispatch(request.name.as_deref(), kind, &location, filename)
            }
            Normalized::Manual { source, location } => DownloadOutcome::unsupported(format!(
                "manual retrieval required: {source} - {location}"
            )),
            Normalized::Unrecognized(input) => DownloadOutcome::unsupported(format!(
                "unrecognized dataset format, handle manually: {input}"
            )),
        }
    }

    /// Download every dataset in the batch, in input order. One dataset's
    /// failure never stops the rest; an empty batch is an error, not a
    /// silently successful no-op.
    pub fn download_multiple(
        &mut self,
        requests: &[(String, DatasetLocator)],
    ) -> Result<Vec<(String, DownloadOutcome)>, PaperfetchError> {
        if requests.is_empty() {
            return Err(PaperfetchError::EmptyBatch);
        }
        let mut results = Vec::with_capacity(requests.len());
        for (name, locator) in requests {
            tracing::info!("downloading dataset: {name}");
            let request = DatasetRequest::named(name.clone(), locator.clone());
            results.push((name.clone(), self.download(&request)));
        }
        Ok(results)
    }

    fn normalize(&self, locator: &DatasetLocator) -> Normalized {
        match locator {
            DatasetLocator::Explicit { source, location } => match classify_source(source) {
                SourceClass::Known(kind) => Normalized::Fetch {
                    kind,
                    location: location.clone(),
                },
                SourceClass::Manual => Normalized::Manual {
                    source: source.clone(),
                    location: location.clone(),
                },
                SourceClass::Unknown => {
                    tracing::warn!("unknown source '{source}', treating location as URL");
                    Normalized::Fetch {
                        kind: SourceKind::Url,
                        location: location.clone(),
                    }
                }
            },
            DatasetLocator::Preset(name) => match self.presets.get(name) {
                Some(resolved) => self.normalize(&resolved.clone()),
                None => {
                    tracing::warn!("{name} is not a preset, inferring source instead");
                    self.normalize_raw(name)
                }
            },
            DatasetLocator::Raw(value) => match self.presets.get(value) {
                Some(resolved) => self.normalize(&resolved.clone()),
                None => self.normalize_raw(value),
            },
        }
    }

    fn normalize_raw(&self, value: &str) -> Normalized {
        match infer_from_raw(value) {
            Some((kind, location)) => Normalized::Fetch { kind, location },
            None => Normalized::Unrecognized(value.to_string()),
        }
    }

    fn dispatch(
        &mut self,
        name: Option<&str>,
        kind: SourceKind,
        location: &str,
        filename: Option<&str>,
    ) -> DownloadOutcome {
        let fetched = match kind {
            SourceKind::Huggingface => self.fetch_huggingface(location),
            SourceKind::Git => self.fetch_git(location),
            SourceKind::Kaggle => self.fetch_kaggle(location),
            SourceKind::Url => self.fetch_url(location, filename),
        };

        match fetched {
            Ok(fetched) => {
                let key = name.map(str::to_string).unwrap_or_else(|| fetched.key.clone());
                let entry = HistoryEntry {
                    source: kind.as_str().to_string(),
                    path: fetched.path.to_string(),
                    date: iso_timestamp(),
                    url: fetched.url,
                };
                if let Err(err) = self.history.put(key, entry) {
                    tracing::warn!("failed to persist download history: {err}");
                }
                DownloadOutcome::success(fetched.path.as_str(), fetched.message)
            }
            Err(err) => {
                tracing::error!("{kind} download of {location} failed: {err}");
                DownloadOutcome::failed(format!("{kind} download failed: {location}"), err.to_string())
            }
        }
    }

    fn hub_destination(&self, dataset_id: &str) -> Utf8PathBuf {
        self.download_dir.join(dataset_id.replace('/', "_"))
    }

    /// Snapshot first; on failure fall through to the parquet export with
    /// the normalized id, then the original id. Best effort only — all
    /// failure messages are carried so a wrong identifier stays visible.
    fn fetch_huggingface(&self, location: &str) -> Result<Fetched, PaperfetchError> {
        let dataset_id = dataset_id_from_location(location);
        let snapshot_dest = self.hub_destination(&dataset_id);

        let snapshot_err = match self
            .hub
            .snapshot_download(&dataset_id, snapshot_dest.as_std_path())
        {
            Ok(()) => {
                return Ok(Fetched {
                    key: dataset_id,
                    message: format!("dataset downloaded to: {snapshot_dest}"),
                    path: snapshot_dest,
                    url: None,
                });
            }
            Err(err) => err,
        };
        tracing::warn!("snapshot of {dataset_id} failed ({snapshot_err}), trying parquet export");

        let normalized = normalize_dataset_id(&dataset_id);
        let export_dest = self.hub_destination(&normalized);
        let normalized_err = match self
            .hub
            .export_download(&normalized, export_dest.as_std_path())
        {
            Ok(()) => {
                return Ok(Fetched {
                    key: normalized,
                    message: format!("dataset saved to: {export_dest}"),
                    path: export_dest,
                    url: None,
                });
            }
            Err(err) => err,
        };

        if normalized != dataset_id {
            tracing::warn!(
                "export of {normalized} failed ({normalized_err}), retrying with original id"
            );
            match self
                .hub
                .export_download(&dataset_id, snapshot_dest.as_std_path())
            {
                Ok(()) => {
                    return Ok(Fetched {
                        key: dataset_id,
                        message: format!("dataset saved to: {snapshot_dest}"),
                        path: snapshot_dest,
                        url: None,
                    });
                }
                Err(original_err) => {
                    return Err(PaperfetchError::HubHttp(format!(
                        "snapshot: {snapshot_err}; export ({normalized}): {normalized_err}; export ({dataset_id}): {original_err}"
                    )));
                }
            }
        }

        Err(PaperfetchError::HubHttp(format!(
            "snapshot: {snapshot_err}; export: {normalized_err}"
        )))
    }

    fn fetch_git(&self, location: &str) -> Result<Fetched, PaperfetchError> {
        let repo_name = repo_name_from_url(location);
        let clone_path = self.download_dir.join(&repo_name);

        if clone_path.as_std_path().exists() {
            tracing::info!("updating existing repository: {repo_name}");
            self.git.pull(clone_path.as_std_path())?;
            Ok(Fetched {
                key: repo_name,
                message: format!("repository updated: {clone_path}"),
                path: clone_path,
                url: Some(location.to_string()),
            })
        } else {
            tracing::info!("cloning repository: {location}");
            self.git.clone_repo(location, clone_path.as_std_path())?;
            Ok(Fetched {
                key: repo_name,
                message: format!("repository cloned to: {clone_path}"),
                path: clone_path,
                url: Some(location.to_string()),
            })
        }
    }

    fn fetch_kaggle(&self, identifier: &str) -> Result<Fetched, PaperfetchError> {
        let destination = self
            .download_dir
            .join("kaggle")
            .join(identifier.replace('/', "_"));
        tracing::info!("downloading kaggle dataset: {identifier}");
        self.kaggle
            .download_dataset(identifier, destination.as_std_path())?;
        Ok(Fetched {
            key: identifier.to_string(),
            message: format!("kaggle dataset downloaded to: {destination}"),
            path: destination,
            url: None,
        })
    }

    fn fetch_url(&self, url: &str, filename: Option<&str>) -> Result<Fetched, PaperfetchError> {
        let filename = match filename {
            Some(name) => name.to_string(),
            None => fs_util::filename_from_url(url),
        };
        let destination = self.download_dir.join(&filename);
        tracing::info!("downloading file: {url} -> {destination}");
        self.fetcher.fetch(url, destination.as_std_path())?;
        Ok(Fetched {
            key: filename,
            message: format!("file downloaded to: {destination}"),
            path: destination,
            url: Some(url.to_string()),
        })
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
