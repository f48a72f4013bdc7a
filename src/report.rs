//! Rendering a `ResultSet` for display.

use itertools::Itertools;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::dispatch::ResultSet;
use crate::utils::{render_template, Error};

type Result<T> = core::result::Result<T, Error>;

const REPORT_MARKDOWN: &'static str = "\
{depth}# Clinical Analysis Results

{sections}
";

const SECTION_MARKDOWN: &'static str = "\
{depth}# {title}

{body}\
";

#[derive(serde::Serialize)]
struct ReportMarkdown<'a> {
    depth: &'a str,
    sections: String,
}

#[derive(serde::Serialize)]
struct SectionMarkdown<'a> {
    depth: &'a str,
    title: &'a str,
    body: String,
}

impl ResultSet {
    /// One section per task, in display order. Failed tasks show their
    /// `Error: ...` placeholder in place of the answer.
    pub fn to_markdown(&self, depth: usize) -> Result<String> {
        let depth = "#".repeat(depth);
        let section_depth = format!("{}#", depth);
        let sections = self
            .iter()
            .map(|(label, outcome)| {
                render_template(
                    SECTION_MARKDOWN,
                    &SectionMarkdown {
                        depth: &section_depth,
                        title: label.title(),
                        body: outcome.to_string(),
                    },
                )
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .join("\n\n");
        render_template(
            REPORT_MARKDOWN,
            &ReportMarkdown {
                depth: &depth,
                sections,
            },
        )
    }

    /// The JSON object produced by the `Serialize` impl, pretty printed.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Serializes as `{ "<task key>": "<text or Error: ...>" }`.
impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (label, outcome) in self.iter() {
            map.serialize_entry(label.key(), &outcome.to_string())?;
        }
        map.end()
    }
}
