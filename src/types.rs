use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Key used to smuggle an execution failure into a result row.
pub const ERROR_KEY: &str = "__error__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a chat session, oldest first in the history buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What one question produces: the SQL that was scraped out of the agent
/// reply (or the `"N/A"` sentinel), the rows from re-running that SQL, and
/// the agent's narrative verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    pub result: Vec<Value>,
    pub answer: String,
}

impl QueryResult {
    /// Record shown when the agent itself could not be invoked. The failure
    /// becomes display data so the conversation can keep going.
    pub fn failed(message: &str) -> Self {
        Self {
            query: String::new(),
            result: vec![error_row(message)],
            answer: format!("Error: {}", message),
        }
    }
}

pub fn error_row(message: &str) -> Value {
    serde_json::json!({ ERROR_KEY: message })
}
