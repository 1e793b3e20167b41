//! The fixed ATS prompt sent to the model

use crate::processing::result::{KEY_JD_MATCH, KEY_MISSING_KEYWORDS, KEY_PROFILE_SUMMARY};
use log::debug;
use serde::{Deserialize, Serialize};

/// Parameters for prompt template substitution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParams {
    pub resume_content: String,
    pub job_content: String,
}

const RESUME_PLACEHOLDER: &str = "{text}";
const JOB_PLACEHOLDER: &str = "{jd}";

/// ATS evaluation prompt. The reply keys must stay in sync with
/// [`crate::processing::result`].
const ATS_TEMPLATE: &str = r#"Act like a skilled and very experienced ATS (Applicant Tracking System)
with a deep understanding of the tech field: software engineering, data science,
data analysis and big data engineering. Your task is to evaluate the resume against
the given job description. The job market is very competitive, so give the best
possible help for improving the resume. Assign the percentage match against the JD
and list the missing keywords with high accuracy.

Resume: {text}
Job Description: {jd}

Respond with a single JSON object and nothing else, using exactly this structure:
{"JD Match": "percentage", "MissingKeywords": ["keyword1", "keyword2"], "Profile Summary": "summary"}
"#;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: &'static str,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: ATS_TEMPLATE }
    }
}

impl PromptTemplate {
    pub fn template(&self) -> &str {
        self.template
    }

    /// Substitute resume and job description in one pass over the template,
    /// so placeholder-like text inside either input is left as is.
    pub fn render(&self, params: &PromptParams) -> String {
        let mut output = String::with_capacity(
            self.template.len() + params.resume_content.len() + params.job_content.len(),
        );
        let mut rest = self.template;

        loop {
            let next = [
                (RESUME_PLACEHOLDER, params.resume_content.as_str()),
                (JOB_PLACEHOLDER, params.job_content.as_str()),
            ]
            .into_iter()
            .filter_map(|(placeholder, value)| rest.find(placeholder).map(|pos| (pos, placeholder, value)))
            .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, placeholder, value)) => {
                    output.push_str(&rest[..pos]);
                    output.push_str(value);
                    rest = &rest[pos + placeholder.len()..];
                }
                None => {
                    output.push_str(rest);
                    break;
                }
            }
        }

        debug!(
            "Rendered prompt: {} chars (resume {}, job description {})",
            output.len(),
            params.resume_content.len(),
            params.job_content.len()
        );

        output
    }

    /// Keys the model is told to reply with.
    pub fn reply_keys() -> [&'static str; 3] {
        [KEY_JD_MATCH, KEY_MISSING_KEYWORDS, KEY_PROFILE_SUMMARY]
    }
}
