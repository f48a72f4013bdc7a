//! # Clinical Consult
//!
//! Asks a chat completion model for several facets of clinical reasoning
//! about one patient history: problem representation, most likely
//! diagnosis, differential and alternative diagnoses, assessment,
//! treatment plan and follow-up.
//!
//! A submission flows one way: the history is validated, embedded into one
//! prompt per [`TaskLabel`], the prompts are sent concurrently and the
//! answers come back as a [`ResultSet`] keyed by the same labels.

#![warn(missing_docs)]

use tap::Pipe;
use tracing::{info, info_span, Instrument};

mod config;
mod dispatch;
mod openai;
mod prompt;
mod report;
mod utils;

#[cfg(test)]
mod fakes;

pub use config::{ApiKey, ConsultConfig, Error as ConfigError};
pub use dispatch::{dispatch, CompletionTransport, OpenAiTransport, ResultSet, TaskOutcome};
pub use openai::chat::ChatCompletionModel;
pub use openai::Error as TransportError;
pub use prompt::{
    build_prompts, instructions_markdown, Error as PromptError, PatientHistory, PromptSet,
    TaskLabel, HISTORY_SECTIONS,
};
pub use utils::Error as TemplateError;

/// Library errors.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    PromptError(#[from] prompt::Error),
    #[error(transparent)]
    ConfigError(#[from] config::Error),
    #[error("OpenAI error: {0}")]
    OpenAIError(#[from] openai::Error),
}

impl Error {
    /// The input was rejected before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::PromptError(prompt::Error::EmptyHistory))
    }
}

#[allow(missing_docs)]
pub type Result<T> = core::result::Result<T, Error>;

/// Run every analysis task for the patient `history`.
///
/// Blank input is rejected with [`PromptError::EmptyHistory`] before the
/// transport is touched. Otherwise the result holds one outcome per task,
/// whether or not individual requests failed.
pub async fn consult<T>(history: &str, transport: &T) -> Result<ResultSet>
where
    T: CompletionTransport + ?Sized,
{
    consult_history(&PatientHistory::new(history)?, transport).await
}

/// [`consult`] for a history that has already been validated.
pub async fn consult_history<T>(history: &PatientHistory, transport: &T) -> Result<ResultSet>
where
    T: CompletionTransport + ?Sized,
{
    let fingerprint = utils::fingerprint(history.as_str());
    let span = info_span!("consult", history = %fingerprint);
    let prompts = build_prompts(history)?;
    async {
        let results = dispatch(&prompts, transport).await;
        info!(failed = results.failures().count(), "consultation finished");
        results
    }
    .instrument(span)
    .await
    .pipe(Ok)
}

/// [`consult_history`] over an [`OpenAiTransport`] built from `config`.
///
/// The transport, and with it every pooled connection, is dropped once all
/// requests have finished.
pub async fn consult_with_config(
    history: &PatientHistory,
    config: &ConsultConfig,
) -> Result<ResultSet> {
    let transport = OpenAiTransport::new(config)?;
    consult_history(history, &transport).await
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;
    use crate::fakes::{completion_server, Reply, ScriptedTransport};
    use crate::prompt::SYSTEM_IDENTITY;

    fn config(endpoint: String) -> ConsultConfig {
        ConsultConfig {
            endpoint,
            ..ConsultConfig::new(ApiKey::new("sk-test"))
        }
    }

    #[tokio::test]
    async fn chest_pain_end_to_end() {
        let transport = ScriptedTransport::replying("Consider acute coronary syndrome.");
        let results = consult("Chief Concern: chest pain", &transport).await.unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(transport.calls(), 7);
        for label in TaskLabel::ALL {
            let text = results.get(label).unwrap().to_string();
            assert_eq!(text, "Consider acute coronary syndrome.");
            assert!(!text.starts_with("Error:"));
        }
    }

    #[tokio::test]
    async fn sends_the_history_in_every_prompt() {
        let transport = ScriptedTransport::echoing();
        let results = consult("Chief Concern: chest pain", &transport).await.unwrap();
        for (label, outcome) in results.iter() {
            let prompt = outcome.to_string();
            assert!(prompt.starts_with(label.title()));
            assert!(prompt.contains("Chief Concern: chest pain"));
        }
    }

    #[tokio::test]
    async fn empty_history_never_reaches_the_transport() {
        let transport = ScriptedTransport::replying("unused");
        for input in ["", "   ", "\n\n"] {
            let err = consult(input, &transport).await.unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), "Please enter the patient history.");
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn failures_do_not_fail_the_consultation() {
        let transport = ScriptedTransport::failing("network unreachable")
            .with_reply(TaskLabel::ClinicalAssessment, Reply::Text("ECG, troponin".to_string()));
        let results = consult("Chief Concern: chest pain", &transport).await.unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(results.failures().count(), 6);
        assert_eq!(
            results.get(TaskLabel::ClinicalAssessment),
            Some(&TaskOutcome::Completed("ECG, troponin".to_string()))
        );
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let transport: Box<dyn CompletionTransport> = Box::new(ScriptedTransport::replying("ok"));
        let results = consult("HPI: fever", transport.as_ref()).await.unwrap();
        assert_eq!(results.failures().count(), 0);
    }

    #[tokio::test]
    async fn consults_over_http_with_configured_endpoint() {
        let (endpoint, mut requests) = completion_server(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"Likely ACS."},"finish_reason":"stop"}]}"#,
        )
        .await;
        let history = PatientHistory::new("Chief Concern: chest pain").unwrap();
        let results = consult_with_config(&history, &config(endpoint)).await.unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(results.failures().count(), 0);
        for (_, outcome) in results.iter() {
            assert_eq!(outcome.to_string(), "Likely ACS.");
        }

        let mut bodies = Vec::new();
        while let Ok(request) = requests.try_recv() {
            let (_, body) = request.split_once("\r\n\r\n").unwrap();
            bodies.push(serde_json::from_str::<serde_json::Value>(body).unwrap());
        }
        assert_eq!(bodies.len(), 7);
        for body in &bodies {
            assert_eq!(body["model"], "gpt-4");
            assert_eq!(body["max_tokens"], 1500);
            assert_eq!(body["messages"][0]["content"], SYSTEM_IDENTITY);
            assert!(body["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("Chief Concern: chest pain"));
        }
    }

    #[tokio::test]
    async fn http_errors_become_failed_outcomes() {
        let (endpoint, _requests) = completion_server(
            "500 Internal Server Error",
            r#"{"error":{"message":"The server had an error"}}"#,
        )
        .await;
        let history = PatientHistory::new("HPI: fever").unwrap();
        let results = consult_with_config(&history, &config(endpoint)).await.unwrap();
        assert_eq!(results.failures().count(), 7);
        for (_, outcome) in results.iter() {
            assert_eq!(
                outcome.to_string(),
                "Error: chat completion failed with status 500: The server had an error"
            );
        }
    }

    #[test]
    fn configuration_errors_are_not_validation_errors() {
        let err = Error::from(ConsultConfig::load(Some(Path::new("missing.toml"))).unwrap_err());
        assert!(matches!(err, Error::ConfigError(ConfigError::MissingFile(_))));
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "configuration file not found: missing.toml");
    }
}
