use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::screen::CrisisSignal;

/// Reply for messages screened as off-topic.
pub const OFF_TOPIC_RESPONSE: &str = "Your message seems to be about topics outside the scope of \
this mental-health assistant. Please ask about emotional wellbeing or mental health.";

/// Help lines listed in the crisis protocol. Defaults are for Spain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyContacts {
    pub general: String,
    pub suicide_prevention: String,
    pub mental_health: Option<String>,
    pub gender_violence: Option<String>,
    pub youth_phone: Option<String>,
    pub online_chat: Option<String>,
}

impl Default for EmergencyContacts {
    fn default() -> Self {
        Self {
            general: "112".to_string(),
            suicide_prevention: "024".to_string(),
            mental_health: Some("900 10 22 10".to_string()),
            gender_violence: Some("016".to_string()),
            youth_phone: Some("900 20 20 10".to_string()),
            online_chat: Some("https://www.telefonodelaesperanza.org/".to_string()),
        }
    }
}

/// Render the crisis-protocol reply for a detected crisis.
///
/// The wording is more direct when a suicide-risk phrase was found, and the
/// gender-violence line is listed when a violence phrase was found.
pub fn crisis_response(signal: &CrisisSignal, contacts: &EmergencyContacts) -> String {
    let mut out = String::from(
        "**Important safety message**\n\n\
         Something in your message suggests you may be going through a very hard time.\n\n",
    );

    if signal.suicide_risk {
        out.push_str(
            "Please know that help is available right now. Your feelings are valid, and there \
             are people trained to help you through them and find other ways forward.\n\n",
        );
    } else {
        out.push_str(
            "Please know that help is available and that you are not alone in what you are \
             going through.\n\n",
        );
    }

    out.push_str("Immediate help:\n\n");
    // Writing into a String cannot fail.
    let _ = writeln!(out, "- Emergency services: {}", contacts.general);
    let _ = writeln!(out, "- Suicide prevention line: {}", contacts.suicide_prevention);
    if let Some(number) = &contacts.mental_health {
        let _ = writeln!(out, "- Mental health helpline: {number}");
    }
    if signal.violence {
        if let Some(number) = &contacts.gender_violence {
            let _ = writeln!(out, "- Gender violence line: {number}");
        }
    }
    if let Some(number) = &contacts.youth_phone {
        let _ = writeln!(out, "- Children and young people: {number}");
    }
    if let Some(url) = &contacts.online_chat {
        let _ = writeln!(out, "- Online chat: {url}");
    }

    out.push_str(
        "\nThis assistant is not designed to handle crisis situations and does not replace \
         professional help. If you are in immediate danger, please contact emergency services.\n\n\
         Once you have reached out for support, I am here if you want to keep talking about \
         general mental-health topics.\n",
    );
    out
}
