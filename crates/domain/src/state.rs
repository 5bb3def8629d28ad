//! Observed person/group state.
//!
//! A person is always in exactly one state; a group resolves to a set of
//! states (see [`crate::users_groups::fold_group_states`]). Matchers accept either shape
//! and normalize to a set when needed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator used when a set of states is rendered as one string.
pub const STATE_SEPARATOR: &str = ",";

/// A single state or a set of states.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Single(String),
    Set(BTreeSet<String>),
}

/// Observed state per user or group identifier.
pub type UserStates = BTreeMap<String, StateValue>;

impl StateValue {
    /// Normalize into a set of states.
    #[must_use]
    pub fn to_set(&self) -> BTreeSet<String> {
        match self {
            Self::Single(value) => BTreeSet::from([value.clone()]),
            Self::Set(values) => values.clone(),
        }
    }

    /// Iterate over every observed state.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let (single, set) = match self {
            Self::Single(value) => (Some(value.as_str()), None),
            Self::Set(values) => (None, Some(values.iter().map(String::as_str))),
        };
        single.into_iter().chain(set.into_iter().flatten())
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.write_str(value),
            Self::Set(values) => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                f.write_str(&joined.join(STATE_SEPARATOR))
            }
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<BTreeSet<String>> for StateValue {
    fn from(values: BTreeSet<String>) -> Self {
        Self::Set(values)
    }
}

/// A state map with every value normalized to a set.
pub type CanonicalStates = BTreeMap<String, BTreeSet<String>>;

/// Canonical key of a state map: per identifier, the set of its states.
///
/// Two maps over the same identifiers are observably identical exactly when
/// their keys are equal. State names are compared as whole values, so a state
/// containing [`STATE_SEPARATOR`] never collides with a set of states.
#[must_use]
pub fn canonical_key(states: &UserStates) -> CanonicalStates {
    states
        .iter()
        .map(|(name, value)| (name.clone(), value.to_set()))
        .collect()
}
