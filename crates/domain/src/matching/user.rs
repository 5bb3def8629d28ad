//! Per-user/group state matcher.

use std::fmt;

use super::{MatchMulti, MatchSingle};
use crate::definition::{UserStateCondition, UserStateEntry, WILDCARD};
use crate::error::{ConfigError, MatchError};
use crate::state::UserStates;

/// A condition on the state of one user or group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStateMatch {
    /// The named identifier's state must satisfy `state`.
    User { user: String, state: MatchMulti },
    /// Ignores identity and state entirely.
    Wildcard,
}

impl UserStateMatch {
    /// The identifier this match depends on, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::User { user, .. } => Some(user.as_str()),
            Self::Wildcard => None,
        }
    }

    /// Evaluate against the supplied states.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingState`] when the bound identifier has no
    /// entry in `states`.
    pub fn matches(&self, states: &UserStates) -> Result<bool, MatchError> {
        match self {
            Self::User { user, state } => states
                .get(user)
                .map(|observed| state.matches(observed))
                .ok_or_else(|| MatchError::MissingState(user.clone())),
            Self::Wildcard => Ok(true),
        }
    }
}

impl TryFrom<&UserStateCondition> for UserStateMatch {
    type Error = ConfigError;

    fn try_from(condition: &UserStateCondition) -> Result<Self, Self::Error> {
        let (mode, value) = condition.selected()?;
        Ok(Self::User {
            user: condition.user.clone(),
            state: MatchMulti::new(mode, MatchSingle::from(value)),
        })
    }
}

impl TryFrom<&UserStateEntry> for UserStateMatch {
    type Error = ConfigError;

    fn try_from(entry: &UserStateEntry) -> Result<Self, Self::Error> {
        match entry {
            UserStateEntry::Wildcard => Ok(Self::Wildcard),
            UserStateEntry::Condition(condition) => Self::try_from(condition),
        }
    }
}

impl fmt::Display for UserStateMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User { user, state } => write!(f, "{user}: {state}"),
            Self::Wildcard => f.write_str(WILDCARD),
        }
    }
}
