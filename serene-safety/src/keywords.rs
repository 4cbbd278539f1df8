use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Phrases that indicate a user may be at risk.
pub const DEFAULT_CRISIS_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "end my life",
    "don't want to live",
    "self-harm",
    "cut myself",
    "hurt myself",
    "die",
    "end everything",
    "end it all",
    "no point living",
    "nobody would miss me",
    "better without me",
    "I can't take it anymore",
    "can't go on",
    "want to die",
    "burden",
    "no way out",
    "harm myself",
    "hopeless",
    "goodbye forever",
    "can't resist anymore",
];

/// Crisis phrases that point at suicide risk in particular.
pub const DEFAULT_SUICIDE_RISK_KEYWORDS: &[&str] =
    &["suicide", "kill myself", "end my life", "don't want to live", "want to die"];

/// Phrases that point at violence or abuse.
pub const DEFAULT_VIOLENCE_KEYWORDS: &[&str] =
    &["violence", "abuse", "abused", "abusing me", "hits me", "beats me"];

/// Requests outside the scope of a mental-health assistant.
pub const DEFAULT_OFF_TOPIC_KEYWORDS: &[&str] = &[
    "hack",
    "hacker",
    "hackear",
    "pornography",
    "pornografía",
    "pornografia",
    "steal",
    "robar",
    "piratear",
    "crackear",
    "crack",
    "illegal drugs",
    "drogas ilegales",
    "impersonate",
    "suplantar",
    "identity theft",
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

/// The phrase lists a [`SafetyScreen`](crate::SafetyScreen) matches against.
///
/// Treated as configuration data: load it from JSON to adapt the screen to
/// another language or policy. Missing lists fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSet {
    pub crisis: Vec<String>,
    /// Subset of crisis phrases that select the suicide-risk wording of
    /// [`crisis_response`](crate::crisis_response).
    pub suicide_risk: Vec<String>,
    /// Crisis-adjacent phrases that add the gender-violence line.
    pub violence: Vec<String>,
    pub off_topic: Vec<String>,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self {
            crisis: owned(DEFAULT_CRISIS_KEYWORDS),
            suicide_risk: owned(DEFAULT_SUICIDE_RISK_KEYWORDS),
            violence: owned(DEFAULT_VIOLENCE_KEYWORDS),
            off_topic: owned(DEFAULT_OFF_TOPIC_KEYWORDS),
        }
    }
}

impl KeywordSet {
    /// Parse a keyword set from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a keyword set from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
