//! Leveled, located observations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "Info"),
            Level::Warning => write!(f, "Warning"),
            Level::Error => write!(f, "Error"),
        }
    }
}

/// A single observation about the subject named by `locator`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub level: Level,
    pub locator: String,
    pub message: String,
}

impl Condition {
    pub fn new(level: Level, locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            locator: locator.into(),
            message: message.into(),
        }
    }

    pub fn info(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Info, locator, message)
    }

    pub fn warning(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Warning, locator, message)
    }

    pub fn error(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Error, locator, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Info < Level::Warning);
        assert!(Level::Warning < Level::Error);
    }

    #[test]
    fn test_condition_json_shape() {
        let c = Condition::error("disruption/api connection/new", "down");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["level"], "Error");
        assert_eq!(json["locator"], "disruption/api connection/new");
        assert_eq!(json["message"], "down");
    }
}
