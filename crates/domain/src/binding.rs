//! Light binding: a set of lights, its occupancy source and its rule set.

use crate::error::MatchError;
use crate::rules::{Rule, RuleSet};
use crate::state::UserStates;

/// A fully materialized binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightBinding {
    pub name: String,
    /// Light entity (or light group) driven by this binding.
    pub lights: String,
    pub occupancy_sensors: Vec<String>,
    /// Seconds without motion before the room counts as empty.
    pub occupancy_timeout: u64,
    /// Owning user or group.
    pub user: String,
    /// Profile applied when no rule matches.
    pub default_profile: Option<String>,
    pub rules: RuleSet,
}

impl LightBinding {
    /// The rule that applies to the given live state, first match wins.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingState`] when `user_states` lacks an
    /// identifier a consulted rule depends on.
    pub fn evaluate(
        &self,
        room_state: &str,
        occupancy: &str,
        user_states: &UserStates,
    ) -> Result<Option<&Rule>, MatchError> {
        self.rules.evaluate(room_state, occupancy, user_states)
    }

    /// The light profile to apply: the winning rule's, else the default.
    ///
    /// # Errors
    ///
    /// Same as [`LightBinding::evaluate`].
    pub fn resolve_profile(
        &self,
        room_state: &str,
        occupancy: &str,
        user_states: &UserStates,
    ) -> Result<Option<&str>, MatchError> {
        let rule = self.evaluate(room_state, occupancy, user_states)?;
        Ok(rule
            .map(|r| r.light_profile.as_str())
            .or(self.default_profile.as_deref()))
    }
}
