use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::analyzer::PaperAnalyzer;
use crate::dispatch::Dispatcher;
use crate::domain::{DatasetLocator, DownloadOutcome};
use crate::error::PaperfetchError;
use crate::git::GitClient;
use crate::hub::HubClient;
use crate::kaggle::KaggleClient;
use crate::llm::LlmClient;
use crate::pdf;
use crate::web::UrlFetcher;

/// Everything extracted (and optionally downloaded) for one PDF.
#[derive(Debug, Clone, Serialize)]
pub struct PaperReport {
    pub pdf: String,
    pub dataset_names: Vec<String>,
    pub download_info: Vec<DownloadInfoEntry>,
    pub download_results: Vec<DownloadResultEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaperReport {
    fn failed(pdf: &Path, error: String) -> Self {
        Self {
            pdf: pdf.display().to_string(),
            dataset_names: Vec::new(),
            download_info: Vec::new(),
            download_results: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadInfoEntry {
    pub name: String,
    pub source: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResultEntry {
    pub name: String,
    #[serde(flatten)]
    pub outcome: DownloadOutcome,
}

/// Process one PDF: extract text, filter sentences, resolve names and
/// locators through the LLM, and — when a dispatcher is supplied — download
/// each dataset. Without a dispatcher this is analysis-only: nothing is
/// fetched and no history is touched.
pub fn process_pdf<L, H, G, K, U>(
    pdf_path: &Path,
    analyzer: &PaperAnalyzer<L>,
    dispatcher: Option<&mut Dispatcher<H, G, K, U>>,
) -> Result<PaperReport, PaperfetchError>
where
    L: LlmClient,
    H: HubClient,
    G: GitClient,
    K: KaggleClient,
    U: UrlFetcher,
{
    tracing::info!("processing PDF: {}", pdf_path.display());
    let pages = pdf::extract_pages(pdf_path)?;
    let sentences = analyzer.relevant_sentences(&pages);
    let context = sentences.join("\n");

    let dataset_names = match analyzer.dataset_names(&context) {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!("dataset naming failed: {err}");
            Vec::new()
        }
    };

    let info = match analyzer.download_info(&dataset_names, &context) {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!("download-info resolution failed: {err}");
            Vec::new()
        }
    };

    let download_results = match dispatcher {
        Some(dispatcher) if !info.is_empty() => match dispatcher.download_multiple(&info) {
            Ok(results) => results
                .into_iter()
                .map(|(name, outcome)| DownloadResultEntry { name, outcome })
                .collect(),
            Err(err) => {
                tracing::warn!("batch download failed: {err}");
                Vec::new()
            }
        },
        Some(_) => {
            tracing::warn!("no download info found, nothing to download");
            Vec::new()
        }
        None => Vec::new(),
    };

    Ok(PaperReport {
        pdf: pdf_path.display().to_string(),
        dataset_names,
        download_info: info.into_iter().map(info_entry).collect(),
        download_results,
        error: None,
    })
}

/// Process every `*.pdf` in a directory. A file that fails is reported as a
/// failed entry; the rest of the batch continues.
pub fn process_directory<L, H, G, K, U>(
    dir_path: &Path,
    analyzer: &PaperAnalyzer<L>,
    mut dispatcher: Option<&mut Dispatcher<H, G, K, U>>,
) -> Result<Vec<PaperReport>, PaperfetchError>
where
    L: LlmClient,
    H: HubClient,
    G: GitClient,
    K: KaggleClient,
    U: UrlFetcher,
{
    let mut pdf_files = Vec::new();
    let entries = fs::read_dir(dir_path)
        .map_err(|err| PaperfetchError::Filesystem(format!("{}: {err}", dir_path.display())))?;
    for entry in entries {
        let entry = entry.map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if path.is_file() && pdf::is_pdf_path(&path) {
            pdf_files.push(path);
        }
    }
    pdf_files.sort();

    if pdf_files.is_empty() {
        tracing::warn!("no PDF files in {}", dir_path.display());
        return Ok(Vec::new());
    }
    tracing::info!("found {} PDF files", pdf_files.len());

    let mut reports = Vec::with_capacity(pdf_files.len());
    for pdf_file in &pdf_files {
        let result = process_pdf(
            pdf_file,
            analyzer,
            dispatcher.as_mut().map(|dispatcher| &mut **dispatcher),
        );
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!("processing {} failed: {err}", pdf_file.display());
                reports.push(PaperReport::failed(pdf_file, err.to_string()));
            }
        }
    }
    Ok(reports)
}

/// Write reports to a JSON file, pretty-printed. Non-ASCII dataset names are
/// written as-is.
pub fn save_results<T: Serialize>(results: &T, output_path: &Path) -> Result<(), PaperfetchError> {
    let content = serde_json::to_vec_pretty(results)
        .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
    fs::write(output_path, &content)
        .map_err(|err| PaperfetchError::Filesystem(format!("{}: {err}", output_path.display())))?;
    tracing::info!("results saved to {}", output_path.display());
    Ok(())
}

fn info_entry((name, locator): (String, DatasetLocator)) -> DownloadInfoEntry {
    match locator {
        DatasetLocator::Explicit { source, location } => DownloadInfoEntry {
            name,
            source,
            location,
        },
        DatasetLocator::Preset(value) | DatasetLocator::Raw(value) => DownloadInfoEntry {
            name,
            source: "unresolved".to_string(),
            location: value,
        },
    }
}
