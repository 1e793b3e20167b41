//! The analysis pipeline: prompt, model call with bounded retry, normalization

use crate::config::RetryConfig;
use crate::error::{Result, SmartAtsError};
use crate::llm::client::{GenerationError, TextGenerator};
use crate::llm::prompts::{PromptParams, PromptTemplate};
use crate::processing::normalizer::normalize_reply;
use crate::processing::result::AnalysisOutcome;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Fixed attempt count with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.attempts(),
            delay: config.delay(),
        }
    }
}

/// Result of one analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub outcome: AnalysisOutcome,
    /// Reply as received; `None` when the model was never heard from
    pub raw_reply: Option<String>,
    pub model: String,
    pub attempts: u32,
    pub processing_time_ms: u64,
}

pub struct ResumeAnalyzer<G> {
    generator: G,
    template: PromptTemplate,
    retry: RetryPolicy,
}

impl<G: TextGenerator> ResumeAnalyzer<G> {
    pub fn new(generator: G, retry: RetryPolicy) -> Self {
        Self {
            generator,
            template: PromptTemplate::default(),
            retry,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn render_prompt(&self, resume_text: &str, job_description: &str) -> String {
        self.template.render(&PromptParams {
            resume_content: resume_text.to_string(),
            job_content: job_description.to_string(),
        })
    }

    /// Run one analysis.
    ///
    /// Only an empty job description is rejected here. Whether the resume
    /// yielded any text is the extraction stage's call, so an empty resume
    /// still goes to the model. Transport and parse problems come back as
    /// the matching [`AnalysisOutcome`], not as errors.
    pub async fn analyze(&self, resume_text: &str, job_description: &str) -> Result<Analysis> {
        if job_description.trim().is_empty() {
            return Err(SmartAtsError::InvalidInput(
                "job description is empty".to_string(),
            ));
        }

        let prompt = self.render_prompt(resume_text, job_description);
        let start_time = Instant::now();

        let (reply, attempts) = self.generate_with_retry(&prompt).await;

        let (outcome, raw_reply) = match reply {
            Ok(text) => (normalize_reply(&text), Some(text)),
            Err(e) => (
                AnalysisOutcome::TransportFailure {
                    message: e.to_string(),
                },
                None,
            ),
        };

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Analysis finished with {} after {} attempt(s) in {}ms",
            outcome.status(),
            attempts,
            processing_time_ms
        );

        Ok(Analysis {
            outcome,
            raw_reply,
            model: self.generator.model_name().to_string(),
            attempts,
            processing_time_ms,
        })
    }

    async fn generate_with_retry(
        &self,
        prompt: &str,
    ) -> (std::result::Result<String, GenerationError>, u32) {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.generator.generate(prompt).await {
                Ok(text) => return (Ok(text), attempt),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        "Model call attempt {}/{} failed: {}. Retrying in {}ms",
                        attempt,
                        max_attempts,
                        e,
                        self.retry.delay.as_millis()
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::result::{AnalysisResult, AnalysisStatus, MatchPercentage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records every prompt it was given.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<std::result::Result<String, GenerationError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<std::result::Result<String, GenerationError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::EmptyReply("script exhausted".to_string())))
        }
    }

    fn unavailable() -> GenerationError {
        GenerationError::Api {
            status: 503,
            message: "The model is overloaded".to_string(),
        }
    }

    fn retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    const REPLY: &str = r#"{"JD Match": "82%", "MissingKeywords": ["Docker","Kubernetes"], "Profile Summary": "Strong backend engineer."}"#;

    #[tokio::test]
    async fn test_end_to_end_success() {
        let analyzer = ResumeAnalyzer::new(ScriptedGenerator::new(vec![Ok(REPLY.to_string())]), retry(3));

        let analysis = analyzer.analyze("Backend engineer, Go and Rust", "Platform engineer").await.unwrap();

        assert_eq!(
            analysis.outcome,
            AnalysisOutcome::Success(AnalysisResult {
                match_percentage: Some(MatchPercentage::Text("82%".to_string())),
                missing_keywords: vec!["Docker".to_string(), "Kubernetes".to_string()],
                profile_summary: "Strong backend engineer.".to_string(),
            })
        );
        assert_eq!(analysis.raw_reply.as_deref(), Some(REPLY));
        assert_eq!(analysis.attempts, 1);
        assert_eq!(analysis.model, "scripted");
    }

    #[tokio::test]
    async fn test_empty_resume_still_calls_model() {
        let analyzer = ResumeAnalyzer::new(ScriptedGenerator::new(vec![Ok(REPLY.to_string())]), retry(1));

        let analysis = analyzer.analyze("", "Rust developer").await.unwrap();

        assert_eq!(analyzer.generator().calls(), 1);
        assert!(analysis.outcome.is_success());
    }

    #[tokio::test]
    async fn test_empty_job_description_is_rejected_before_model() {
        let analyzer = ResumeAnalyzer::new(ScriptedGenerator::new(vec![Ok(REPLY.to_string())]), retry(1));

        let result = analyzer.analyze("Resume text", "  \n").await;

        assert!(matches!(result, Err(SmartAtsError::InvalidInput(_))));
        assert_eq!(analyzer.generator().calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_contains_inputs() {
        let analyzer = ResumeAnalyzer::new(ScriptedGenerator::new(vec![Ok(REPLY.to_string())]), retry(1));

        analyzer.analyze("Kafka and Flink", "Streaming data engineer").await.unwrap();

        let prompts = analyzer.generator().prompts.lock().unwrap();
        assert!(prompts[0].contains("Kafka and Flink"));
        assert!(prompts[0].contains("Streaming data engineer"));
    }

    #[tokio::test]
    async fn test_retryable_failure_then_success() {
        let generator = ScriptedGenerator::new(vec![Err(unavailable()), Ok(REPLY.to_string())]);
        let analyzer = ResumeAnalyzer::new(generator, retry(3));

        let analysis = analyzer.analyze("resume", "job").await.unwrap();

        assert!(analysis.outcome.is_success());
        assert_eq!(analysis.attempts, 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_is_transport_failure() {
        let generator = ScriptedGenerator::new(vec![Err(unavailable()), Err(unavailable()), Err(unavailable())]);
        let analyzer = ResumeAnalyzer::new(generator, retry(3));

        let analysis = analyzer.analyze("resume", "job").await.unwrap();

        assert_eq!(analyzer.generator().calls(), 3);
        assert_eq!(analysis.attempts, 3);
        assert!(analysis.raw_reply.is_none());
        match analysis.outcome {
            AnalysisOutcome::TransportFailure { message } => assert!(message.contains("overloaded")),
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_failure_is_not_retried() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationError::Api { status: 403, message: "API key not valid".to_string() }),
            Ok(REPLY.to_string()),
        ]);
        let analyzer = ResumeAnalyzer::new(generator, retry(3));

        let analysis = analyzer.analyze("resume", "job").await.unwrap();

        assert_eq!(analyzer.generator().calls(), 1);
        assert_eq!(analysis.outcome.status(), AnalysisStatus::TransportFailure);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_parse_failure_not_transport() {
        let raw = "Sorry, I cannot help with that.";
        let analyzer = ResumeAnalyzer::new(ScriptedGenerator::new(vec![Ok(raw.to_string())]), retry(3));

        let analysis = analyzer.analyze("resume", "job").await.unwrap();

        assert_eq!(analyzer.generator().calls(), 1);
        match analysis.outcome {
            AnalysisOutcome::ParseFailure { raw_text, .. } => assert_eq!(raw_text, raw),
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let generator = ScriptedGenerator::new(vec![Err(unavailable()), Err(unavailable()), Ok(REPLY.to_string())]);
        let analyzer = ResumeAnalyzer::new(
            generator,
            RetryPolicy { max_attempts: 3, delay: Duration::from_secs(2) },
        );

        let start = tokio::time::Instant::now();
        let analysis = analyzer.analyze("resume", "job").await.unwrap();

        assert_eq!(analysis.attempts, 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&RetryConfig { max_attempts: 0, delay_ms: 1500 });
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_millis(1500));
    }
}
