//! Prompt construction for evidence extraction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Instructs the model to act as a pure extractor returning one JSON object
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a data extraction engine. \
Extract the following entities from the text and return them as a single JSON object: \
phoneNumbers (list of strings), bankAccounts (list of strings), \
paymentHandles (list of strings, UPI-style handles such as name@bank), \
links (list of strings, any URL or web address), emailAddresses (list of strings), \
caseIds (list of strings), policyNumbers (list of strings), orderNumbers (list of strings). \
Copy values exactly as they appear. Return ONLY valid JSON. \
If an entity is not found, return an empty list.";

/// Messages for one extraction request
pub fn extraction_messages(text: &str) -> Vec<Message> {
    vec![Message::system(EXTRACTION_SYSTEM_PROMPT), Message::user(text)]
}
