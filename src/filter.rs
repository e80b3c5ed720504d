use regex::Regex;

/// Keeps sentences of page text that plausibly talk about datasets: dataset
/// vocabulary, a URL, or a hosting-platform name.
#[derive(Debug, Clone)]
pub struct SentenceFilter {
    dataset: Regex,
    url: Regex,
    platform: Regex,
}

impl SentenceFilter {
    pub fn new() -> Self {
        // Patterns are static, so compilation cannot fail.
        let dataset = Regex::new(
            r"(?i)\b(dataset(s)?|data(\s+)?set|corpus|benchmark|training\s+data|test\s+set|repository|collection|evaluation\s+data)\b",
        )
        .unwrap();
        let url = Regex::new(r"(?i)https?://\S+").unwrap();
        let platform =
            Regex::new(r"(?i)\b(github|huggingface|kaggle|zenodo|figshare|uci|openml)\b").unwrap();
        Self {
            dataset,
            url,
            platform,
        }
    }

    pub fn matches(&self, sentence: &str) -> bool {
        self.dataset.is_match(sentence)
            || self.url.is_match(sentence)
            || self.platform.is_match(sentence)
    }

    /// Filter an ordered sequence of page texts into the sentences worth
    /// sending to the naming prompt. Document order is preserved and the
    /// optional cap truncates the result once reached.
    pub fn filter_pages(&self, pages: &[String], max_sentences: Option<usize>) -> Vec<String> {
        let mut kept = Vec::new();
        for page in pages {
            let text = page.replace('\n', " ");
            for sentence in text.split(['.', '!', '?']) {
                let sentence = sentence.trim();
                if sentence.is_empty() {
                    continue;
                }
                if self.matches(sentence) {
                    kept.push(sentence.to_string());
                    if let Some(max) = max_sentences {
                        if kept.len() >= max {
                            tracing::debug!("sentence cap {max} reached");
                            return kept;
                        }
                    }
                }
            }
        }
        kept
    }
}

impl Default for SentenceFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_justified_sentences() {
        let filter = SentenceFilter::new();
        let pages = vec![
            "We evaluate on the ZIQI-Eval benchmark. The weather was nice. \
             Data are hosted at https://example.com/ziqi. Our model has 7B parameters."
                .to_string(),
        ];
        let kept = filter.filter_pages(&pages, None);
        assert_eq!(kept.len(), 2);
        for sentence in &kept {
            assert!(filter.matches(sentence), "unjustified sentence: {sentence}");
        }
    }

    #[test]
    fn platform_names_count_as_matches() {
        let filter = SentenceFilter::new();
        let pages = vec!["The code lives on GitHub and HuggingFace".to_string()];
        assert_eq!(filter.filter_pages(&pages, None).len(), 1);
    }

    #[test]
    fn no_match_yields_empty_not_error() {
        let filter = SentenceFilter::new();
        let pages = vec!["Nothing relevant here. Nor here!".to_string()];
        assert!(filter.filter_pages(&pages, None).is_empty());
        assert!(filter.filter_pages(&[], None).is_empty());
    }

    #[test]
    fn cap_truncates_output() {
        let filter = SentenceFilter::new();
        let pages = vec![
            "First dataset sentence. Second dataset sentence. Third dataset sentence.".to_string(),
        ];
        let kept = filter.filter_pages(&pages, Some(2));
        assert_eq!(kept.len(), 2);
        assert!(kept[0].starts_with("First"));
    }

    #[test]
    fn whole_word_matching_avoids_substrings() {
        let filter = SentenceFilter::new();
        // "corpuscle" must not match the "corpus" keyword.
        assert!(!filter.matches("A corpuscle under the microscope"));
        assert!(filter.matches("A large web corpus"));
        assert!(filter.matches("Several datasets were used"));
        assert!(filter.matches("the training data was augmented"));
    }
}
