//! Phrase matching over user messages.

use regex::RegexSet;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SafetyError};
use crate::keywords::KeywordSet;

/// Case-insensitive matcher for a list of phrases.
///
/// A phrase matches on word boundaries only ("die" does not match "diet"),
/// and any run of whitespace in the message matches a space in the phrase.
#[derive(Debug, Clone)]
struct PhraseMatcher {
    phrases: Vec<String>,
    set: RegexSet,
}

impl PhraseMatcher {
    fn new(list: &'static str, phrases: &[String]) -> Result<Self> {
        let phrases: Vec<String> = phrases.iter().map(|p| p.trim().to_string()).collect();
        if phrases.iter().any(String::is_empty) {
            return Err(SafetyError::EmptyKeyword { list });
        }
        let patterns: Vec<String> = phrases.iter().map(|p| phrase_pattern(p)).collect();
        Ok(Self { set: RegexSet::new(&patterns)?, phrases })
    }

    fn matches(&self, message: &str) -> Vec<String> {
        self.set.matches(message).into_iter().map(|i| self.phrases[i].clone()).collect()
    }

    fn is_match(&self, message: &str) -> bool {
        self.set.is_match(message)
    }
}

fn phrase_pattern(phrase: &str) -> String {
    let body = phrase
        .split_whitespace()
        .map(|word| regex::escape(&normalize(word)))
        .collect::<Vec<_>>()
        .join(r"\s+");
    let starts_word = phrase.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = phrase.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "(?i){}{body}{}",
        if starts_word { r"\b" } else { "" },
        if ends_word { r"\b" } else { "" }
    )
}

/// Fold typographic apostrophes so "can’t" matches "can't".
fn normalize(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
}

/// What a crisis screening found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrisisSignal {
    /// Every crisis or violence phrase found, in keyword-list order.
    pub matched: Vec<String>,
    /// Whether a suicide-risk phrase was among them.
    pub suicide_risk: bool,
    /// Whether a violence phrase was among them.
    pub violence: bool,
}

/// Result of screening one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Screening {
    /// Nothing found; the message can go to the assistant.
    Clear,
    /// The user may be at risk. Answer with the crisis protocol.
    Crisis(CrisisSignal),
    /// The message is outside the assistant's scope.
    OffTopic {
        /// Off-topic phrases found.
        matched: Vec<String>,
    },
}

impl Screening {
    pub fn is_clear(&self) -> bool {
        matches!(self, Screening::Clear)
    }

    pub fn is_crisis(&self) -> bool {
        matches!(self, Screening::Crisis(_))
    }
}

/// Compiled keyword screen. Screening is a pure function of the message.
///
/// # Example
///
/// ```rust,ignore
/// let screen = SafetyScreen::new(&KeywordSet::default())?;
/// match screen.screen(message) {
///     Screening::Crisis(signal) => reply(crisis_response(&signal, &contacts)),
///     Screening::OffTopic { .. } => reply(OFF_TOPIC_RESPONSE.to_string()),
///     Screening::Clear => forward(message),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SafetyScreen {
    crisis: PhraseMatcher,
    suicide_risk: PhraseMatcher,
    violence: PhraseMatcher,
    off_topic: PhraseMatcher,
}

impl SafetyScreen {
    /// Compile the phrase lists of `keywords`.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::EmptyKeyword`] for blank phrases and
    /// [`SafetyError::Pattern`] if a list is too large to compile.
    pub fn new(keywords: &KeywordSet) -> Result<Self> {
        Ok(Self {
            crisis: PhraseMatcher::new("crisis", &keywords.crisis)?,
            suicide_risk: PhraseMatcher::new("suicide_risk", &keywords.suicide_risk)?,
            violence: PhraseMatcher::new("violence", &keywords.violence)?,
            off_topic: PhraseMatcher::new("off_topic", &keywords.off_topic)?,
        })
    }

    /// Crisis and violence phrases found in `message`.
    pub fn detect_crisis(&self, message: &str) -> Vec<String> {
        let message = normalize(message);
        let mut matched = self.crisis.matches(&message);
        for phrase in self.violence.matches(&message) {
            if !matched.contains(&phrase) {
                matched.push(phrase);
            }
        }
        matched
    }

    /// Classify `message`. Crisis takes priority over off-topic.
    pub fn screen(&self, message: &str) -> Screening {
        let normalized = normalize(message);
        let matched = self.detect_crisis(&normalized);
        if !matched.is_empty() {
            let signal = CrisisSignal {
                matched,
                suicide_risk: self.suicide_risk.is_match(&normalized),
                violence: self.violence.is_match(&normalized),
            };
            warn!(
                matched = signal.matched.len(),
                suicide_risk = signal.suicide_risk,
                violence = signal.violence,
                "crisis keywords detected"
            );
            return Screening::Crisis(signal);
        }

        let off_topic = self.off_topic.matches(&normalized);
        if !off_topic.is_empty() {
            debug!(matched = off_topic.len(), "off-topic keywords detected");
            return Screening::OffTopic { matched: off_topic };
        }
        Screening::Clear
    }
}
