use crate::domain::DatasetLocator;
use crate::error::PaperfetchError;
use crate::filter::SentenceFilter;
use crate::llm::{LlmClient, parse_download_response, parse_name_response};
use crate::prompt;

/// Runs the two LLM steps over filtered paper text: dataset naming and
/// download-info resolution. Both degrade to empty results on failure so a
/// bad response never aborts a paper.
pub struct PaperAnalyzer<L> {
    llm: L,
    filter: SentenceFilter,
    max_sentences: Option<usize>,
}

impl<L: LlmClient> PaperAnalyzer<L> {
    pub fn new(llm: L, max_sentences: Option<usize>) -> Self {
        Self {
            llm,
            filter: SentenceFilter::new(),
            max_sentences,
        }
    }

    /// Dataset-related sentences from page text, in document order.
    pub fn relevant_sentences(&self, pages: &[String]) -> Vec<String> {
        let sentences = self.filter.filter_pages(pages, self.max_sentences);
        tracing::info!("kept {} dataset-related sentences", sentences.len());
        sentences
    }

    /// Names of the datasets the paper mentions, per the LLM.
    pub fn dataset_names(&self, context: &str) -> Result<Vec<String>, PaperfetchError> {
        if context.trim().is_empty() {
            return Ok(Vec::new());
        }
        let response = self.llm.complete(&prompt::naming_prompt(context))?;
        let names = parse_name_response(&response);
        tracing::info!("extracted dataset names: {names:?}");
        Ok(names)
    }

    /// Name -> locator pairs for the given datasets. Parse failures come
    /// back as an empty mapping, not an error.
    pub fn download_info(
        &self,
        names: &[String],
        context: &str,
    ) -> Result<Vec<(String, DatasetLocator)>, PaperfetchError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let joined = names.join(", ");
        let response = self
            .llm
            .complete(&prompt::download_info_prompt(&joined, context))?;
        let info = parse_download_response(&response);
        if info.is_empty() {
            tracing::warn!("no usable download info for: {joined}");
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedLlm {
        response: String,
    }

    impl LlmClient for ScriptedLlm {
        fn complete(&self, _prompt: &str) -> Result<String, PaperfetchError> {
            Ok(self.response.clone())
        }
    }

    #[test]
    fn empty_context_skips_the_llm_call() {
        let analyzer = PaperAnalyzer::new(
            ScriptedLlm {
                response: "should never be used".to_string(),
            },
            None,
        );
        assert!(analyzer.dataset_names("  \n ").unwrap().is_empty());
        assert!(analyzer.download_info(&[], "context").unwrap().is_empty());
    }

    #[test]
    fn names_flow_through_the_parser() {
        let analyzer = PaperAnalyzer::new(
            ScriptedLlm {
                response: "#### name: ZIQI-Eval, MBPP".to_string(),
            },
            None,
        );
        let names = analyzer.dataset_names("the ZIQI-Eval benchmark").unwrap();
        assert_eq!(names, vec!["ZIQI-Eval", "MBPP"]);
    }

    #[test]
    fn garbage_download_info_degrades_to_empty() {
        let analyzer = PaperAnalyzer::new(
            ScriptedLlm {
                response: "I cannot help with that.".to_string(),
            },
            None,
        );
        let info = analyzer
            .download_info(&["ZIQI-Eval".to_string()], "context")
            .unwrap();
        assert!(info.is_empty());
    }
}
