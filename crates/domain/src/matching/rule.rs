//! Rule matcher: room, occupancy and an OR-list of user conditions.

use super::{MatchSingle, UserStateMatch};
use crate::error::{ConfigError, MatchError};
use crate::state::UserStates;

/// The full condition of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub room_state: MatchSingle,
    pub occupancy: MatchSingle,
    user_state: Vec<UserStateMatch>,
}

impl RuleMatch {
    /// Build a rule match.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyUserStates`] when `user_state` is empty;
    /// `rule` names the owning rule in the error.
    pub fn new(
        rule: &str,
        room_state: MatchSingle,
        occupancy: MatchSingle,
        user_state: Vec<UserStateMatch>,
    ) -> Result<Self, ConfigError> {
        if user_state.is_empty() {
            return Err(ConfigError::EmptyUserStates(rule.to_string()));
        }
        Ok(Self {
            room_state,
            occupancy,
            user_state,
        })
    }

    /// Assemble from parts whose user list is known to be non-empty.
    pub(crate) fn from_parts(
        room_state: MatchSingle,
        occupancy: MatchSingle,
        user_state: Vec<UserStateMatch>,
    ) -> Self {
        debug_assert!(!user_state.is_empty());
        Self {
            room_state,
            occupancy,
            user_state,
        }
    }

    /// The user conditions, combined with logical OR.
    #[must_use]
    pub fn user_state(&self) -> &[UserStateMatch] {
        &self.user_state
    }

    /// Every identifier this rule depends on.
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.user_state.iter().filter_map(UserStateMatch::user)
    }

    /// Whether the rule applies.
    ///
    /// Room and occupancy are checked first; user conditions are only
    /// consulted when both pass, and short-circuit on the first hit.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingState`] when a consulted user condition
    /// has no state in `user_states`.
    pub fn matches(
        &self,
        room_state: &str,
        occupancy: &str,
        user_states: &UserStates,
    ) -> Result<bool, MatchError> {
        if !self.room_state.matches(room_state) || !self.occupancy.matches(occupancy) {
            return Ok(false);
        }
        for condition in &self.user_state {
            if condition.matches(user_states)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
