use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use paperfetch::analyzer::PaperAnalyzer;
use paperfetch::app;
use paperfetch::config::ConfigLoader;
use paperfetch::dispatch::Dispatcher;
use paperfetch::error::PaperfetchError;
use paperfetch::git::SystemGitClient;
use paperfetch::hub::HubHttpClient;
use paperfetch::kaggle::KaggleHttpClient;
use paperfetch::llm::HttpLlmClient;
use paperfetch::output::JsonOutput;
use paperfetch::pdf;
use paperfetch::web::HttpFetcher;

#[derive(Parser)]
#[command(name = "paperfetch")]
#[command(about = "Extract dataset mentions from academic PDFs and optionally download them")]
#[command(version, author)]
struct Cli {
    /// PDF file, or a directory containing PDFs
    path: PathBuf,

    /// Download the discovered datasets
    #[arg(long, short = 'd')]
    download: bool,

    /// Directory downloads land in (overrides the config file)
    #[arg(long)]
    download_dir: Option<String>,

    /// Verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Save results to a JSON file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Batch mode: treat PATH as a directory of PDFs
    #[arg(long, short = 'b')]
    batch: bool,

    /// Config file path (defaults to paperfetch.json when present)
    #[arg(long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    if let Some(dir) = &cli.download_dir {
        config.download_dir = dir.clone();
    }

    if !cli.path.exists() {
        return Err(miette::Report::new(PaperfetchError::PathNotFound(
            cli.path.clone(),
        )));
    }

    let llm = HttpLlmClient::new(&config.llm).into_diagnostic()?;
    let analyzer = PaperAnalyzer::new(llm, config.max_sentences);

    let mut dispatcher = if cli.download {
        let hub = HubHttpClient::new().into_diagnostic()?;
        let git = SystemGitClient::new();
        let kaggle = KaggleHttpClient::new().into_diagnostic()?;
        let fetcher = HttpFetcher::new().into_diagnostic()?;
        let dispatcher = Dispatcher::new(config.download_dir.as_str(), hub, git, kaggle, fetcher)
            .into_diagnostic()?;
        Some(dispatcher)
    } else {
        None
    };

    if cli.path.is_dir() || cli.batch {
        tracing::info!("batch processing directory: {}", cli.path.display());
        let reports = app::process_directory(&cli.path, &analyzer, dispatcher.as_mut())
            .into_diagnostic()?;
        finish(&reports, cli.output.as_deref())
    } else {
        if !pdf::is_pdf_path(&cli.path) {
            return Err(miette::Report::new(PaperfetchError::NotPdf(cli.path.clone())));
        }
        let report =
            app::process_pdf(&cli.path, &analyzer, dispatcher.as_mut()).into_diagnostic()?;
        finish(&report, cli.output.as_deref())
    }
}

fn finish<T: Serialize>(value: &T, output: Option<&Path>) -> miette::Result<()> {
    JsonOutput::print(value).into_diagnostic()?;
    if let Some(path) = output {
        app::save_results(value, path).into_diagnostic()?;
    }
    Ok(())
}
