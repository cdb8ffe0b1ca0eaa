use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of an abbreviated commit id
pub const SHORT_ID_LEN: usize = 7;

/// One unreleased commit, as shown in a repository's detail rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub short_id: String,
    pub headline: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommitSummary {
    /// Build a summary from a full commit id and message
    pub fn new(sha: &str, message: &str, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            short_id: short_id(sha),
            headline: headline(message),
            timestamp,
        }
    }
}

/// First seven characters of `sha`, or all of it when shorter
pub fn short_id(sha: &str) -> String {
    sha.chars().take(SHORT_ID_LEN).collect()
}

/// First line of a commit message
pub fn headline(message: &str) -> String {
    message
        .lines()
        .next()
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncates_long_ids() {
        assert_eq!(short_id("0123456789abcdef"), "0123456");
        assert_eq!(short_id("0123456"), "0123456");
    }

    #[test]
    fn test_short_id_keeps_short_ids() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn test_headline_takes_first_line() {
        assert_eq!(headline("Fix login\n\nLonger body"), "Fix login");
        assert_eq!(headline("Windows line\r\nsecond"), "Windows line");
        assert_eq!(headline("single"), "single");
        assert_eq!(headline(""), "");
    }

    #[test]
    fn test_new_applies_both_trims() {
        let c = CommitSummary::new("deadbeefcafe", "Add feature\nbody", None);
        assert_eq!(c.short_id, "deadbee");
        assert_eq!(c.headline, "Add feature");
        assert!(c.timestamp.is_none());
    }
}
