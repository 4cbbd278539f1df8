//! Rendering query results into a prompt context block.

use crate::document::QueryResult;

/// Heading placed before a non-empty context block.
pub const CONTEXT_HEADING: &str = "Relevant information from the knowledge base:";

/// Separator between sections of the context block.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// A section is only truncated into the block when more than this many
/// characters of room remain.
pub const MIN_TRUNCATED_SECTION: usize = 100;

/// Render results into one context block of at most `max_length` characters
/// of section text (heading and separators not counted).
///
/// Sections are added in result order. The first section that does not fit
/// is cut to the remaining room and suffixed with `...`, or dropped when no
/// more than [`MIN_TRUNCATED_SECTION`] characters remain; nothing after it is
/// added. Returns an empty string when no section made it in.
pub fn build_context(results: &[QueryResult], max_length: usize) -> String {
    let mut sections: Vec<String> = Vec::new();
    let mut used = 0usize;

    for result in results {
        let content = result.chunk_text.trim();
        if content.is_empty() {
            continue;
        }
        let len = content.chars().count();
        if used + len > max_length {
            let remaining = max_length.saturating_sub(used);
            if remaining > MIN_TRUNCATED_SECTION {
                let truncated: String = content.chars().take(remaining).collect();
                sections.push(format!("{truncated}..."));
            }
            break;
        }
        sections.push(content.to_string());
        used += len;
    }

    if sections.is_empty() {
        return String::new();
    }
    format!("{CONTEXT_HEADING}\n\n{}", sections.join(SECTION_SEPARATOR))
}
