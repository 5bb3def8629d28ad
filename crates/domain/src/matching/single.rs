//! Single-value matcher.

use std::collections::BTreeSet;
use std::fmt;

use crate::definition::{MatchValue, WILDCARD};

/// What a single observed value must equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSingle {
    /// Equal to exactly this value.
    Explicit(String),
    /// Anything.
    Wildcard,
    /// Any member of this set.
    AnyOf(BTreeSet<String>),
}

impl MatchSingle {
    /// Whether `value` is acceptable.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Explicit(expected) => expected == value,
            Self::Wildcard => true,
            Self::AnyOf(options) => options.contains(value),
        }
    }

    /// The finite set of acceptable values, or `None` for a wildcard.
    #[must_use]
    pub fn options(&self) -> Option<BTreeSet<String>> {
        match self {
            Self::Explicit(value) => Some(BTreeSet::from([value.clone()])),
            Self::Wildcard => None,
            Self::AnyOf(options) => Some(options.clone()),
        }
    }
}

impl From<&MatchValue> for MatchSingle {
    fn from(value: &MatchValue) -> Self {
        if value.is_wildcard() {
            return Self::Wildcard;
        }
        match value {
            MatchValue::One(v) => Self::Explicit(v.clone()),
            MatchValue::Many(values) => Self::AnyOf(values.iter().cloned().collect()),
        }
    }
}

impl From<MatchValue> for MatchSingle {
    fn from(value: MatchValue) -> Self {
        Self::from(&value)
    }
}

impl fmt::Display for MatchSingle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(value) => f.write_str(value),
            Self::Wildcard => f.write_str(WILDCARD),
            Self::AnyOf(options) => {
                let joined: Vec<&str> = options.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join("|"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_explicit_only_on_equality() {
        let m = MatchSingle::Explicit("day".into());
        assert!(m.matches("day"));
        assert!(!m.matches("night"));
    }

    #[test]
    fn should_match_anything_when_wildcard() {
        assert!(MatchSingle::Wildcard.matches("whatever"));
        assert!(MatchSingle::Wildcard.matches(""));
    }

    #[test]
    fn should_match_any_of_on_membership() {
        let m = MatchSingle::AnyOf(BTreeSet::from(["a".to_string(), "b".to_string()]));
        assert!(m.matches("b"));
        assert!(!m.matches("c"));
    }

    #[test]
    fn should_convert_star_to_wildcard() {
        let m = MatchSingle::from(MatchValue::One("*".into()));
        assert_eq!(m, MatchSingle::Wildcard);
    }

    #[test]
    fn should_convert_list_to_any_of() {
        let m = MatchSingle::from(MatchValue::Many(vec!["a".into(), "b".into()]));
        assert!(matches!(m, MatchSingle::AnyOf(ref set) if set.len() == 2));
    }

    #[test]
    fn should_report_no_options_for_wildcard() {
        assert!(MatchSingle::Wildcard.options().is_none());
        assert_eq!(
            MatchSingle::Explicit("x".into()).options(),
            Some(BTreeSet::from(["x".to_string()]))
        );
    }
}
