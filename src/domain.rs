use std::fmt;

use serde::Serialize;

/// The four platforms the dispatcher can fetch from automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Huggingface,
    Git,
    Kaggle,
    Url,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Huggingface => "huggingface",
            SourceKind::Git => "git",
            SourceKind::Kaggle => "kaggle",
            SourceKind::Url => "url",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of an LLM-provided source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceClass {
    Known(SourceKind),
    /// Requires manual retrieval (official/subscription/non-public sources).
    Manual,
    /// Not recognized at all; the dispatcher falls back to the URL handler.
    Unknown,
}

/// Where a dataset can be fetched from, before normalization.
///
/// Replaces the string-or-pair-or-list input of the upstream tool with one
/// type: presets and raw strings are resolved into explicit pairs at the
/// dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocator {
    /// A well-known dataset name resolved through the built-in preset table.
    Preset(String),
    /// An explicit (source, location) pair, typically LLM-provided.
    Explicit { source: String, location: String },
    /// A bare string whose source must be inferred.
    Raw(String),
}

impl DatasetLocator {
    pub fn explicit(source: impl Into<String>, location: impl Into<String>) -> Self {
        DatasetLocator::Explicit {
            source: source.into(),
            location: location.into(),
        }
    }
}

/// One dataset to retrieve. `name`, when present, is the key under which
/// the download is tracked in history.
#[derive(Debug, Clone)]
pub struct DatasetRequest {
    pub name: Option<String>,
    pub locator: DatasetLocator,
}

impl DatasetRequest {
    pub fn named(name: impl Into<String>, locator: DatasetLocator) -> Self {
        Self {
            name: Some(name.into()),
            locator,
        }
    }

    pub fn bare(locator: DatasetLocator) -> Self {
        Self {
            name: None,
            locator,
        }
    }

    pub fn from_raw(value: impl Into<String>) -> Self {
        Self::bare(DatasetLocator::Raw(value.into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Success,
    AlreadyCached,
    Failed,
    Unsupported,
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub status: DownloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl DownloadOutcome {
    pub fn success(local_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Success,
            local_path: Some(local_path.into()),
            message: message.into(),
            error_detail: None,
        }
    }

    pub fn cached(local_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::AlreadyCached,
            local_path: Some(local_path.into()),
            message: message.into(),
            error_detail: None,
        }
    }

    pub fn failed(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Failed,
            local_path: None,
            message: message.into(),
            error_detail: Some(detail.into()),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Unsupported,
            local_path: None,
            message: message.into(),
            error_detail: None,
        }
    }
}

/// Built-in locators for a handful of well-known datasets, checked before
/// any source inference.
pub fn preset_mapping() -> Vec<(&'static str, DatasetLocator)> {
    vec![
        (
            "HumanEval",
            DatasetLocator::explicit("huggingface", "openai/human-eval"),
        ),
        (
            "HotPotQA",
            DatasetLocator::explicit("huggingface", "hotpot_qa"),
        ),
        ("MBPP", DatasetLocator::explicit("huggingface", "mbpp")),
        (
            "AlfWorld",
            DatasetLocator::explicit("git", "https://github.com/alfworld/alfworld.git"),
        ),
        (
            "WebShop",
            DatasetLocator::explicit("git", "https://github.com/princeton-nlp/WebShop"),
        ),
    ]
}

/// Infer a (source, location) pair from a bare string. Returns `None` when
/// the string matches no recognizable shape.
pub fn infer_from_raw(raw: &str) -> Option<(SourceKind, String)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.to_ascii_lowercase().contains("github.com") {
        let location = if trimmed.ends_with(".git") {
            trimmed.to_string()
        } else {
            format!("{trimmed}.git")
        };
        return Some((SourceKind::Git, location));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some((SourceKind::Url, trimmed.to_string()));
    }

    // owner/name with no scheme reads as a huggingface dataset id.
    if trimmed.contains('/') {
        return Some((SourceKind::Huggingface, trimmed.to_string()));
    }

    None
}

const MANUAL_MARKERS: [&str; 4] = ["official", "manual", "non-public", "subscription"];

/// Classify an explicit source string from the LLM mapping.
pub fn classify_source(source: &str) -> SourceClass {
    let normalized = source.trim().to_lowercase();
    match normalized.as_str() {
        "huggingface" => SourceClass::Known(SourceKind::Huggingface),
        "git" | "github" => SourceClass::Known(SourceKind::Git),
        "kaggle" => SourceClass::Known(SourceKind::Kaggle),
        "url" | "official" | "official website" | "official publication"
        | "official database" => SourceClass::Known(SourceKind::Url),
        _ => {
            if MANUAL_MARKERS
                .iter()
                .any(|marker| normalized.contains(marker))
            {
                SourceClass::Manual
            } else {
                SourceClass::Unknown
            }
        }
    }
}
