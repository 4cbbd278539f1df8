use std::io::Write;
use std::path::Path;

use serene_safety::{
    EmergencyContacts, KeywordSet, OFF_TOPIC_RESPONSE, SafetyScreen, Screening, crisis_response,
};

use super::write_json;

/// Run the `serene screen` command.
///
/// Prints the classification and the reply the assistant would give.
/// A crisis is a successful screening, not a command failure.
pub fn run_screen(
    message: &str,
    keywords: Option<&Path>,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let keywords = match keywords {
        Some(path) => KeywordSet::from_json_file(path)?,
        None => KeywordSet::default(),
    };
    let screening = SafetyScreen::new(&keywords)?.screen(message);

    if json {
        return write_json(out, &screening);
    }
    match &screening {
        Screening::Clear => writeln!(out, "clear: no safety concerns detected")?,
        Screening::OffTopic { matched } => {
            writeln!(out, "off-topic (matched: {})", matched.join(", "))?;
            writeln!(out)?;
            writeln!(out, "{OFF_TOPIC_RESPONSE}")?;
        }
        Screening::Crisis(signal) => {
            writeln!(out, "crisis (matched: {})", signal.matched.join(", "))?;
            writeln!(out)?;
            write!(out, "{}", crisis_response(signal, &EmergencyContacts::default()))?;
        }
    }
    Ok(())
}
