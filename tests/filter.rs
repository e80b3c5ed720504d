use paperfetch::filter::SentenceFilter;

#[test]
fn document_order_is_preserved_across_pages() {
    let filter = SentenceFilter::new();
    let pages = vec![
        "Intro text with no match. The dataset is available at GitHub.".to_string(),
        "Unrelated page.".to_string(),
        "See https://zenodo.org/record/1 for the corpus. Final remarks.".to_string(),
    ];

    let kept = filter.filter_pages(&pages, None);

    assert_eq!(kept.len(), 2);
    assert!(kept[0].contains("dataset"));
    assert!(kept[1].contains("zenodo"));
}

#[test]
fn every_kept_sentence_is_justified() {
    let filter = SentenceFilter::new();
    let pages = vec![
        "A benchmark for everything. Nothing here. Training data came from Kaggle! \
         Results are strong. Models were tuned. The test set has 500 items?"
            .to_string(),
        "Download from https://figshare.com/x. We thank our funders.".to_string(),
    ];

    let kept = filter.filter_pages(&pages, None);
    assert!(!kept.is_empty());
    for sentence in &kept {
        assert!(
            filter.matches(sentence),
            "kept sentence without a match: {sentence}"
        );
    }
}

#[test]
fn line_breaks_inside_sentences_are_joined() {
    let filter = SentenceFilter::new();
    let pages = vec!["The ZIQI-Eval\nbenchmark spans\nmany categories.".to_string()];

    let kept = filter.filter_pages(&pages, None);
    assert_eq!(kept.len(), 1);
    assert!(!kept[0].contains('\n'));
}
