use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthLevel {
    Ready,
    Down,
    Unknown,
}

impl HealthLevel {
    pub fn message(self) -> &'static str {
        match self {
            HealthLevel::Ready => "pack is running",
            HealthLevel::Down => "pack is pending",
            HealthLevel::Unknown => "unknown pack status",
        }
    }

    /// Lower is worse. Used to fold several resources into one report health.
    pub fn rank(self) -> u8 {
        match self {
            HealthLevel::Down => 0,
            HealthLevel::Unknown => 1,
            HealthLevel::Ready => 2,
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthLevel::Ready => write!(f, "READY"),
            HealthLevel::Down => write!(f, "DOWN"),
            HealthLevel::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify raw status text by case-sensitive substring, first match wins.
///
/// Containment, not equality: "not running" classifies as ready.
pub fn classify(status: &str) -> HealthLevel {
    if status.contains("running") {
        HealthLevel::Ready
    } else if status.contains("pending") {
        HealthLevel::Down
    } else {
        HealthLevel::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(classify("running"), HealthLevel::Ready);
        assert_eq!(classify("job running (2/2)"), HealthLevel::Ready);
        assert_eq!(classify("pending"), HealthLevel::Down);
        assert_eq!(classify("stopped"), HealthLevel::Unknown);
        assert_eq!(classify(""), HealthLevel::Unknown);
    }

    #[test]
    fn running_takes_priority_over_pending() {
        assert_eq!(classify("pending -> running"), HealthLevel::Ready);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(classify("RUNNING"), HealthLevel::Unknown);
    }

    #[test]
    fn negated_text_still_matches() {
        assert_eq!(classify("not running"), HealthLevel::Ready);
    }

    #[test]
    fn messages_and_display() {
        assert_eq!(HealthLevel::Ready.message(), "pack is running");
        assert_eq!(HealthLevel::Down.message(), "pack is pending");
        assert_eq!(HealthLevel::Unknown.message(), "unknown pack status");
        assert_eq!(HealthLevel::Down.to_string(), "DOWN");
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&HealthLevel::Unknown).unwrap(),
            "\"UNKNOWN\""
        );
    }

    #[test]
    fn rank_orders_down_first() {
        assert!(HealthLevel::Down.rank() < HealthLevel::Unknown.rank());
        assert!(HealthLevel::Unknown.rank() < HealthLevel::Ready.rank());
    }
}
