//! EULA consent record, kept per account.
//!
//! Consent is sticky per version: once a user approves version `v`, they are
//! not prompted again until the required version changes. A denial is
//! recorded (and timestamped) but does not block anything by itself — the
//! validation pipeline simply prompts again on the next gated operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-account consent state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// The last EULA version the user approved, if any.
    pub approved_version: Option<String>,
    /// When the user last made a decision either way.
    pub decided_at: Option<DateTime<Utc>>,
}

impl ConsentRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the recorded approval covers the currently required version.
    #[must_use]
    pub fn covers(&self, required_version: &str) -> bool {
        self.approved_version.as_deref() == Some(required_version)
    }

    /// Record an approval of `version`.
    pub fn approve(&mut self, version: &str, now: DateTime<Utc>) {
        self.approved_version = Some(version.to_string());
        self.decided_at = Some(now);
    }

    /// Record a denial. Any prior approval is kept — denying a new version
    /// does not revoke consent already given to an older one.
    pub fn deny(&mut self, now: DateTime<Utc>) {
        self.decided_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_covers_nothing() {
        let consent = ConsentRecord::new();
        assert!(!consent.covers("v1"));
        assert!(consent.decided_at.is_none());
    }

    #[test]
    fn approval_is_sticky_per_version() {
        let mut consent = ConsentRecord::new();
        consent.approve("v1", Utc::now());
        assert!(consent.covers("v1"));
        assert!(!consent.covers("v2"));
    }

    #[test]
    fn denial_keeps_prior_approval() {
        let mut consent = ConsentRecord::new();
        consent.approve("v1", Utc::now());
        consent.deny(Utc::now());
        assert!(consent.covers("v1"));
        assert!(consent.decided_at.is_some());
    }
}
