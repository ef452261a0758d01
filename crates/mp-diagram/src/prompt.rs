//! Prompt construction from the text report.

use std::fmt::Write as _;
use std::path::Path;

use crate::sanitize::{BEGIN_MARKER, END_MARKER};
use crate::{DetailLevel, DiagramError, Notation};

/// Read the text report, keeping at most `max_chars` characters.
///
/// # Errors
///
/// Returns [`DiagramError::Report`] if the file cannot be read.
pub fn load_report(path: &Path, max_chars: usize) -> Result<String, DiagramError> {
    let mut report = std::fs::read_to_string(path).map_err(|source| DiagramError::Report {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some((cut, _)) = report.char_indices().nth(max_chars) {
        tracing::debug!(path = %path.display(), max_chars, "truncating report for prompt");
        report.truncate(cut);
    }
    Ok(report)
}

/// Instruction text asking the model for a diagram of the report.
#[must_use]
pub fn build_prompt(report: &str, notation: Notation, detail: DetailLevel) -> String {
    let mut prompt = String::with_capacity(report.len() + 512);
    prompt.push_str(
        "You are given database metadata exported as tab-separated sections \
         (=== TYPE === headers followed by a header row and data rows).\n",
    );

    match notation {
        Notation::Flowchart => {
            let _ = writeln!(
                prompt,
                "Draw a Mermaid flowchart of how the objects depend on each other. \
                 Start with `flowchart TD` and use one `A --> B` edge per line. \
                 Use plain identifiers without spaces. At most {} edges.",
                notation.max_edges()
            );
        }
        Notation::Er => {
            let _ = writeln!(
                prompt,
                "Draw a Mermaid erDiagram of the tables and their foreign-key relationships. \
                 Start with `erDiagram` and use one `A ||--o{{ B : label` relation per line. \
                 At most {} relations.",
                notation.max_edges()
            );
        }
    }

    prompt.push_str(match detail {
        DetailLevel::Basic => "Only include the most important relationships.\n",
        DetailLevel::Detailed => "Include every relationship the metadata supports.\n",
    });

    let _ = writeln!(
        prompt,
        "Output the diagram between a line containing {BEGIN_MARKER} and a line containing \
         {END_MARKER}, with no other text between them.\n\nMetadata:\n{report}"
    );
    prompt
}
