use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PaperfetchError {
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("not a PDF file: {0}")]
    NotPdf(PathBuf),

    #[error("failed to read PDF: {0}")]
    PdfRead(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("LLM request failed: {0}")]
    LlmHttp(String),

    #[error("LLM returned status {status}: {message}")]
    LlmStatus { status: u16, message: String },

    #[error("malformed LLM response: {0}")]
    LlmResponse(String),

    #[error("hub request failed: {0}")]
    HubHttp(String),

    #[error("hub returned status {status}: {message}")]
    HubStatus { status: u16, message: String },

    #[error("git operation failed: {0}")]
    GitOperation(String),

    #[error("kaggle request failed: {0}")]
    KaggleHttp(String),

    #[error("kaggle returned status {status}: {message}")]
    KaggleStatus { status: u16, message: String },

    #[error("url download failed: {0}")]
    UrlHttp(String),

    #[error("url returned status {status}: {message}")]
    UrlStatus { status: u16, message: String },

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("empty dataset batch")]
    EmptyBatch,

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
