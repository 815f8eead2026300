//! # Temporal Types
//!
//! `Timestamp` is the instant type behind trust-anchor expiry and mobile
//! security object validity windows. Seconds precision, UTC only.
//!
//! ## Security Invariant
//!
//! Configured instants (anchor files, CLI input) go through the strict
//! parser, which accepts only the `Z` suffix, so an operator typo in an
//! offset cannot move an expiry. Issuer-supplied CBOR dates may carry an
//! offset and are converted explicitly with [`Timestamp::parse_lenient`].

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InputValidationError;

/// A UTC instant truncated to whole seconds.
///
/// Serializes as `YYYY-MM-DDTHH:MM:SSZ`; deserialization is strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(0))
    }

    /// Parse an RFC 3339 instant that ends in `Z`.
    ///
    /// `+00:00` is refused too: the rule is about the text, not the offset.
    pub fn parse(s: &str) -> Result<Self, InputValidationError> {
        if !s.ends_with('Z') {
            return Err(invalid(s, "must be UTC with a Z suffix".to_string()));
        }
        Self::parse_lenient(s)
    }

    /// Parse any RFC 3339 instant and convert it to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, InputValidationError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::from_utc(dt.with_timezone(&Utc)))
            .map_err(|e| invalid(s, e.to_string()))
    }

    /// True when `self` lies strictly after `other`.
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

fn invalid(input: &str, reason: String) -> InputValidationError {
    InputValidationError::InvalidValue {
        what: "timestamp",
        reason: format!("{input:?}: {reason}"),
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = InputValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_string()
    }
}
