use std::collections::btree_map::{self, BTreeMap};

use serde::Serialize;
use tap::Pipe;

use super::history::PatientHistory;
use super::task::TaskLabel;
use super::utils::{Error, Result};
use crate::utils::render_template;

const TASK_PROMPT: &'static str = "\
{title}:

{history}

{instructions}\
";

#[derive(Serialize)]
struct TaskPrompt<'a> {
    title: &'a str,
    history: &'a str,
    instructions: &'a str,
}

impl<'a> TaskPrompt<'a> {
    fn new(label: TaskLabel, history: &'a PatientHistory) -> Self {
        Self {
            title: label.title(),
            history: history.as_str(),
            instructions: label.instructions(),
        }
    }

    fn render(&self) -> Result<String> {
        render_template(TASK_PROMPT, &self).map_err(Error::TemplateError)
    }
}

/// One prompt per task, for a single submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSet(BTreeMap<TaskLabel, String>);

impl PromptSet {
    /// Prompt for the task `label`, if it is part of the set.
    pub fn get(&self, label: TaskLabel) -> Option<&str> {
        self.0.get(&label).map(String::as_str)
    }

    /// Labels in display order.
    pub fn labels(&self) -> impl Iterator<Item = TaskLabel> + '_ {
        self.0.keys().copied()
    }

    /// Prompts in display order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskLabel, &str)> {
        self.0.iter().map(|(label, prompt)| (*label, prompt.as_str()))
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

impl FromIterator<(TaskLabel, String)> for PromptSet {
    fn from_iter<I: IntoIterator<Item = (TaskLabel, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PromptSet {
    type Item = (TaskLabel, String);
    type IntoIter = btree_map::IntoIter<TaskLabel, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Embed the `history` into the prompt of every task.
pub fn build_prompts(history: &PatientHistory) -> Result<PromptSet> {
    TaskLabel::ALL
        .into_iter()
        .map(|label| Ok((label, TaskPrompt::new(label, history).render()?)))
        .collect::<Result<BTreeMap<_, _>>>()?
        .pipe(PromptSet)
        .pipe(Ok)
}
