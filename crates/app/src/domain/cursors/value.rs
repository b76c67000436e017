//! Cursor values and their ordering.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// A platform-native identifier used as a sync watermark.
///
/// Identifiers that parse as unsigned integers order numerically and sort
/// before every non-numeric identifier; non-numeric identifiers order
/// lexicographically. This keeps the order total when a platform mixes both
/// forms, and keeps `"9" < "10"` for the common numeric case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorValue(String);

impl CursorValue {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    fn numeric(&self) -> Option<u128> {
        if self.0.is_empty() || !self.0.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        self.0.parse().ok()
    }

    /// Whether `self` lies strictly after the optional watermark.
    #[must_use]
    pub fn is_after(&self, watermark: Option<&CursorValue>) -> bool {
        watermark.is_none_or(|watermark| self > watermark)
    }
}

impl Ord for CursorValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(left), Some(right)) => left.cmp(&right).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for CursorValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CursorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CursorValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CursorValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}
