//! Concurrent dispatch of a `PromptSet` to the completion endpoint.
//!
//! Every prompt becomes one request. All requests run concurrently on the
//! calling task and are joined before anything is returned. A request that
//! fails is recorded as a failed outcome for its own task only.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::future::{join_all, FutureExt};
use tap::Pipe;
use tracing::{debug, info, warn};

use crate::config::ConsultConfig;
use crate::openai::chat::{
    ChatClient, ChatCompletionArgs, ChatCompletionMessage, ChatCompletionModel,
};
use crate::openai::Error;
use crate::prompt::{PromptSet, TaskLabel, SYSTEM_IDENTITY};

/// Sends one prompt and returns the model's answer.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Answer `prompt`, sent on behalf of the task `label`.
    async fn complete(&self, label: TaskLabel, prompt: &str) -> Result<String, Error>;
}

/// Transport backed by the OpenAI chat completion API.
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    client: ChatClient,
    model: ChatCompletionModel,
    max_tokens: u16,
    temperature: f32,
}

impl OpenAiTransport {
    /// Build the HTTP client. Model and sampling parameters are fixed here
    /// for every request the transport sends.
    pub fn new(config: &ConsultConfig) -> Result<Self, Error> {
        Self {
            client: ChatClient::new(config)?,
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
        .pipe(Ok)
    }

    fn args(&self, prompt: &str) -> ChatCompletionArgs {
        ChatCompletionArgs::new(self.model)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_message(ChatCompletionMessage::system(SYSTEM_IDENTITY))
            .with_message(ChatCompletionMessage::user(prompt))
    }
}

#[async_trait]
impl CompletionTransport for OpenAiTransport {
    async fn complete(&self, _label: TaskLabel, prompt: &str) -> Result<String, Error> {
        self.client
            .chat_completion(&self.args(prompt))
            .await?
            .into_first_content()
    }
}

/// Terminal state of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The model's answer.
    Completed(String),
    /// Description of what went wrong.
    Failed(String),
}

impl TaskOutcome {
    #[allow(missing_docs)]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Displays the answer, or `Error: <description>` for a failed task.
impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(text) => f.write_str(text),
            Self::Failed(description) => write!(f, "Error: {}", description),
        }
    }
}

/// One outcome per dispatched task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet(BTreeMap<TaskLabel, TaskOutcome>);

impl ResultSet {
    /// Outcome of the task `label`, if it was dispatched.
    pub fn get(&self, label: TaskLabel) -> Option<&TaskOutcome> {
        self.0.get(&label)
    }

    /// Labels in display order.
    pub fn labels(&self) -> impl Iterator<Item = TaskLabel> + '_ {
        self.0.keys().copied()
    }

    /// Outcomes in display order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskLabel, &TaskOutcome)> {
        self.0.iter().map(|(label, outcome)| (*label, outcome))
    }

    /// Labels of the tasks that failed.
    pub fn failures(&self) -> impl Iterator<Item = TaskLabel> + '_ {
        self.iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(label, _)| label)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TaskLabel, TaskOutcome)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (TaskLabel, TaskOutcome)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ResultSet {
    type Item = (TaskLabel, TaskOutcome);
    type IntoIter = btree_map::IntoIter<TaskLabel, TaskOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

async fn run_task<T>(transport: &T, label: TaskLabel, prompt: &str) -> (TaskLabel, TaskOutcome)
where
    T: CompletionTransport + ?Sized,
{
    debug!(task = %label, "request submitted");
    let outcome = match AssertUnwindSafe(transport.complete(label, prompt))
        .catch_unwind()
        .await
    {
        Ok(Ok(text)) => {
            debug!(task = %label, bytes = text.len(), "request completed");
            TaskOutcome::Completed(text)
        }
        Ok(Err(err)) => {
            warn!(task = %label, error = %err, "request failed");
            TaskOutcome::Failed(err.to_string())
        }
        Err(_) => {
            warn!(task = %label, "request panicked");
            TaskOutcome::Failed("request panicked".to_string())
        }
    };
    (label, outcome)
}

/// Send every prompt concurrently and wait for all of them to finish.
///
/// The returned `ResultSet` always has exactly the labels of `prompts`.
/// Dropping the returned future cancels every request still in flight.
pub async fn dispatch<T>(prompts: &PromptSet, transport: &T) -> ResultSet
where
    T: CompletionTransport + ?Sized,
{
    info!(tasks = prompts.len(), "dispatching requests");
    let results = prompts
        .iter()
        .map(|(label, prompt)| run_task(transport, label, prompt))
        .pipe(join_all)
        .await
        .into_iter()
        .collect::<ResultSet>();
    info!(
        tasks = results.len(),
        failed = results.failures().count(),
        "all requests finished"
    );
    results
}
