//! Multi-value matcher.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::MatchSingle;
use crate::state::StateValue;

/// How a [`MatchSingle`] is combined over a set of observed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one observed state matches.
    Any,
    /// Every observed state matches.
    All,
    /// The observed set equals the matcher's acceptable set.
    Exact,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::All => f.write_str("all"),
            Self::Exact => f.write_str("exact"),
        }
    }
}

/// A [`MatchSingle`] applied to one state or a set of states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchMulti {
    pub mode: MatchMode,
    pub matcher: MatchSingle,
}

impl MatchMulti {
    #[must_use]
    pub fn new(mode: MatchMode, matcher: MatchSingle) -> Self {
        Self { mode, matcher }
    }

    /// Whether the observed state satisfies this matcher.
    ///
    /// Under [`MatchMode::Exact`] a wildcard never matches: it has no
    /// enumerable set to compare against.
    #[must_use]
    pub fn matches(&self, observed: &StateValue) -> bool {
        match self.mode {
            MatchMode::Any => observed.iter().any(|v| self.matcher.matches(v)),
            MatchMode::All => observed.iter().all(|v| self.matcher.matches(v)),
            MatchMode::Exact => self
                .matcher
                .options()
                .is_some_and(|options| options == observed.to_set()),
        }
    }
}

impl fmt::Display for MatchMulti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.mode, self.matcher)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn set(values: &[&str]) -> StateValue {
        StateValue::Set(values.iter().map(ToString::to_string).collect())
    }

    fn any_of(values: &[&str]) -> MatchSingle {
        MatchSingle::AnyOf(values.iter().map(ToString::to_string).collect::<BTreeSet<_>>())
    }

    #[test]
    fn should_match_any_when_one_observed_state_overlaps() {
        let m = MatchMulti::new(MatchMode::Any, any_of(&["a", "b"]));
        assert!(m.matches(&set(&["b", "c"])));
    }

    #[test]
    fn should_not_match_all_when_one_observed_state_is_outside() {
        let m = MatchMulti::new(MatchMode::All, any_of(&["a", "b"]));
        assert!(!m.matches(&set(&["b", "c"])));
        assert!(m.matches(&set(&["a", "b"])));
    }

    #[test]
    fn should_never_match_exact_wildcard() {
        let m = MatchMulti::new(MatchMode::Exact, MatchSingle::Wildcard);
        assert!(!m.matches(&StateValue::from("awake")));
        assert!(!m.matches(&set(&["awake", "asleep"])));
        assert!(!m.matches(&set(&[])));
    }

    #[test]
    fn should_match_exact_only_on_set_equality() {
        let m = MatchMulti::new(MatchMode::Exact, any_of(&["a", "b"]));
        assert!(m.matches(&set(&["a", "b"])));
        assert!(!m.matches(&set(&["a"])));
        assert!(!m.matches(&set(&["a", "b", "c"])));
    }

    #[test]
    fn should_normalize_single_observed_state_for_exact() {
        let m = MatchMulti::new(MatchMode::Exact, MatchSingle::Explicit("awake".into()));
        assert!(m.matches(&StateValue::from("awake")));
        assert!(!m.matches(&set(&["awake", "asleep"])));
    }

    #[test]
    fn should_treat_single_observed_state_as_one_element() {
        let m = MatchMulti::new(MatchMode::All, MatchSingle::Explicit("awake".into()));
        assert!(m.matches(&StateValue::from("awake")));
        assert!(!m.matches(&StateValue::from("asleep")));
    }
}
