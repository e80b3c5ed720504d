//! Prompt templates for the two LLM calls. Both instruct the model to wrap
//! the machine-readable part in `####` markers so the parsers in
//! [`crate::llm`] can locate it.

pub const SECTION_MARKER: &str = "####";

/// Ask for the dataset names mentioned in the filtered paper text.
pub fn naming_prompt(context: &str) -> String {
    format!(
        "Extract the datasets used in the experiments from the following paper text:\n\
         {context}\n\
         Return only the dataset names, comma separated, nothing else.\n\
         Required format:\n\
         #### name: xxx,xxx,xxx,xxx"
    )
}

/// Ask for a name -> [platform, location] mapping for the given datasets.
pub fn download_info_prompt(dataset_names: &str, context: &str) -> String {
    format!(
        "Find the download method and URL for each of the following datasets. \
         You are given the dataset names and the paper context they came from.\n\
         \n\
         Dataset names:\n\
         {dataset_names}\n\
         \n\
         Paper context:\n\
         {context}\n\
         \n\
         For every dataset:\n\
         1. Identify its primary hosting platform (huggingface, git, kaggle, ...).\n\
         2. Give the full download URL or repository/dataset identifier.\n\
         3. Prefer a link stated explicitly in the context.\n\
         4. Otherwise give the most official, reliable source you know.\n\
         \n\
         Answer with a valid JSON object (double-quoted keys and values) wrapped \
         in marker lines, like this:\n\
         ####\n\
         {{\n\
             \"HumanEval\": [\"huggingface\", \"openai/human-eval\"],\n\
             \"AlfWorld\": [\"git\", \"https://github.com/alfworld/alfworld.git\"],\n\
             \"WebShop\": [\"git\", \"https://github.com/princeton-nlp/WebShop\"]\n\
         }}\n\
         ####"
    )
}
