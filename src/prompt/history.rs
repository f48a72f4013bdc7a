use serde::Serialize;
use tap::Pipe;

use super::utils::{Error, Result};
use crate::utils::render_template;

/// Free-text patient history as pasted by the clinician.
///
/// The text is kept verbatim. The only check is that it isn't blank; its
/// section headers are left for the model to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientHistory(String);

impl PatientHistory {
    /// Accept `text` unless it is empty or whitespace only.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::EmptyHistory);
        }
        Self(text).pipe(Ok)
    }

    #[allow(missing_docs)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Sections a history is expected to contain: `(header, meaning)`.
pub const HISTORY_SECTIONS: [(&'static str, &'static str); 12] = [
    ("Chief Concern", ""),
    ("HPI", "History of Present Illness"),
    ("ROS", "Review of Systems"),
    ("PMHx", "Past Medical History"),
    ("PSurgHx", "Past Surgical History"),
    ("FHx", "Family History"),
    ("SocHx", "Social History"),
    ("HRB", "Health Risk Behaviors"),
    ("Meds", "Medications"),
    ("Allergies", ""),
    ("Exam", ""),
    ("Lab Results", ""),
];

const INSTRUCTIONS_MARKDOWN: &'static str = "\
{depth}# Instructions

Please enter the patient history in the following format:

{sections}
";

#[derive(Serialize)]
struct InstructionsMarkdown<'a> {
    depth: &'a str,
    sections: String,
}

/// Guide to the expected history layout, as Markdown.
pub fn instructions_markdown(depth: usize) -> Result<String> {
    let depth = "#".repeat(depth);
    let sections = HISTORY_SECTIONS
        .iter()
        .map(|(header, meaning)| {
            if meaning.is_empty() {
                format!("- **{}**", header)
            } else {
                format!("- **{}** ({})", header, meaning)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    render_template(
        INSTRUCTIONS_MARKDOWN,
        &InstructionsMarkdown {
            depth: &depth,
            sections,
        },
    )
    .map_err(Error::TemplateError)
}
