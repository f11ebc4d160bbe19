use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    /// Presentation hint for clients that style notifications as alerts.
    pub fn tags(self) -> &'static str {
        match self {
            Level::Success => "alert alert-success alert-dismissible fade show",
            Level::Warning => "alert alert-warning alert-dismissible fade show",
            Level::Error => "alert alert-danger alert-dismissible fade show",
        }
    }
}

/// A one-shot message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}
