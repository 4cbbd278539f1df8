//! Keyword screening for the Serene support assistant.
//!
//! This crate provides:
//! - Configurable crisis, violence and off-topic phrase lists ([`KeywordSet`])
//! - A compiled, word-bounded, case-insensitive [`SafetyScreen`]
//! - The crisis-protocol reply with configurable [`EmergencyContacts`]
//!
//! Screening runs before retrieval and generation; a crisis short-circuits
//! the normal chat flow.

mod error;
mod keywords;
mod response;
mod screen;

pub use error::{Result, SafetyError};
pub use keywords::{
    DEFAULT_CRISIS_KEYWORDS, DEFAULT_OFF_TOPIC_KEYWORDS, DEFAULT_SUICIDE_RISK_KEYWORDS,
    DEFAULT_VIOLENCE_KEYWORDS, KeywordSet,
};
pub use response::{EmergencyContacts, OFF_TOPIC_RESPONSE, crisis_response};
pub use screen::{CrisisSignal, SafetyScreen, Screening};
