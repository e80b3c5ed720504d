use std::path::Path;
use std::sync::Mutex;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use paperfetch::analyzer::PaperAnalyzer;
use paperfetch::app;
use paperfetch::dispatch::Dispatcher;
use paperfetch::domain::DownloadStatus;
use paperfetch::error::PaperfetchError;
use paperfetch::git::GitClient;
use paperfetch::hub::HubClient;
use paperfetch::kaggle::KaggleClient;
use paperfetch::llm::LlmClient;
use paperfetch::web::UrlFetcher;

/// First call answers the naming prompt, second call the download-info
/// prompt.
#[derive(Default)]
struct ScriptedLlm {
    calls: Mutex<usize>,
}

impl LlmClient for ScriptedLlm {
    fn complete(&self, _prompt: &str) -> Result<String, PaperfetchError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            Ok("#### name: ZIQI-Eval".to_string())
        } else {
            Ok(
                "####\n{\"ZIQI-Eval\": [\"url\", \"https://example.com/ziqi.zip\"]}\n####"
                    .to_string(),
            )
        }
    }
}

struct NopHub;

impl HubClient for NopHub {
    fn snapshot_download(&self, _id: &str, _destination: &Path) -> Result<(), PaperfetchError> {
        Err(PaperfetchError::HubHttp("hub not configured".to_string()))
    }

    fn export_download(&self, _id: &str, _destination: &Path) -> Result<(), PaperfetchError> {
        Err(PaperfetchError::HubHttp("hub not configured".to_string()))
    }
}

struct NopGit;

impl GitClient for NopGit {
    fn clone_repo(&self, _url: &str, _destination: &Path) -> Result<(), PaperfetchError> {
        Err(PaperfetchError::GitOperation("git not configured".to_string()))
    }

    fn pull(&self, _repo_dir: &Path) -> Result<(), PaperfetchError> {
        Err(PaperfetchError::GitOperation("git not configured".to_string()))
    }

    fn version(&self) -> Option<String> {
        None
    }
}

struct NopKaggle;

impl KaggleClient for NopKaggle {
    fn download_dataset(&self, _identifier: &str, _destination: &Path) -> Result<(), PaperfetchError> {
        Err(PaperfetchError::KaggleHttp("kaggle not configured".to_string()))
    }

    fn credentialed(&self) -> bool {
        false
    }
}

struct WritingFetcher;

impl UrlFetcher for WritingFetcher {
    fn fetch(&self, _url: &str, destination: &Path) -> Result<(), PaperfetchError> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(destination, b"payload").unwrap();
        Ok(())
    }
}

/// A one-page PDF whose text mentions a benchmark, built the way the lopdf
/// examples do.
fn write_sample_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn pdf_to_downloaded_dataset() {
    let temp = tempfile::tempdir().unwrap();
    let pdf_path = temp.path().join("paper.pdf");
    write_sample_pdf(&pdf_path, "We evaluate on the ZIQI-Eval benchmark.");

    let analyzer = PaperAnalyzer::new(ScriptedLlm::default(), None);
    let mut dispatcher = Dispatcher::new(
        camino::Utf8PathBuf::from_path_buf(temp.path().join("datasets")).unwrap(),
        NopHub,
        NopGit,
        NopKaggle,
        WritingFetcher,
    )
    .unwrap();

    let report = app::process_pdf(&pdf_path, &analyzer, Some(&mut dispatcher)).unwrap();

    assert_eq!(report.dataset_names, vec!["ZIQI-Eval"]);
    assert_eq!(report.download_info.len(), 1);
    assert_eq!(report.download_info[0].source, "url");
    assert_eq!(report.download_results.len(), 1);
    assert_eq!(report.download_results[0].name, "ZIQI-Eval");
    assert_eq!(
        report.download_results[0].outcome.status,
        DownloadStatus::Success
    );
    assert!(dispatcher.history().get("ZIQI-Eval").is_some());
}

#[test]
fn analysis_only_mode_touches_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let pdf_path = temp.path().join("paper.pdf");
    write_sample_pdf(&pdf_path, "We evaluate on the ZIQI-Eval benchmark.");

    let analyzer = PaperAnalyzer::new(ScriptedLlm::default(), None);
    let dispatcher: Option<&mut Dispatcher<NopHub, NopGit, NopKaggle, WritingFetcher>> = None;

    let report = app::process_pdf(&pdf_path, &analyzer, dispatcher).unwrap();

    assert_eq!(report.dataset_names, vec!["ZIQI-Eval"]);
    assert_eq!(report.download_info.len(), 1);
    assert!(report.download_results.is_empty());
    assert!(!temp.path().join("datasets").exists());
}

#[test]
fn directory_without_pdfs_yields_empty_batch() {
    let temp = tempfile::tempdir().unwrap();
    let analyzer = PaperAnalyzer::new(ScriptedLlm::default(), None);
    let dispatcher: Option<&mut Dispatcher<NopHub, NopGit, NopKaggle, WritingFetcher>> = None;

    let reports = app::process_directory(temp.path(), &analyzer, dispatcher).unwrap();
    assert!(reports.is_empty());
}

#[test]
fn directory_batch_reports_bad_files_and_continues() {
    let temp = tempfile::tempdir().unwrap();
    write_sample_pdf(
        &temp.path().join("a_good.pdf"),
        "We evaluate on the ZIQI-Eval benchmark.",
    );
    std::fs::write(temp.path().join("b_broken.pdf"), b"not a pdf at all").unwrap();

    let analyzer = PaperAnalyzer::new(ScriptedLlm::default(), None);
    let dispatcher: Option<&mut Dispatcher<NopHub, NopGit, NopKaggle, WritingFetcher>> = None;

    let reports = app::process_directory(temp.path(), &analyzer, dispatcher).unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports[0].pdf.ends_with("a_good.pdf"));
    assert!(reports[0].error.is_none());
    assert!(reports[1].pdf.ends_with("b_broken.pdf"));
    assert!(reports[1].error.is_some());
}

#[test]
fn save_results_round_trips_non_ascii_names() {
    let temp = tempfile::tempdir().unwrap();
    let output = temp.path().join("results.json");
    let names = vec!["ZIQI-Eval".to_string(), "数据集".to_string()];

    app::save_results(&names, &output).unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("数据集"));
    let parsed: Vec<String> = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, names);
}
