//! Rules and rule sets: "first match wins" evaluation.

use std::collections::{BTreeSet, HashSet};

use crate::definition::RuleDefinition;
use crate::error::{ConfigError, Error, MatchError};
use crate::matching::{MatchSingle, RuleMatch, UserStateMatch};
use crate::state::UserStates;

/// A named condition selecting a light profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Unique within its rule set.
    pub state_name: String,
    pub rule_match: RuleMatch,
    /// Name of the light profile applied when this rule wins.
    pub light_profile: String,
}

impl TryFrom<&RuleDefinition> for Rule {
    type Error = ConfigError;

    fn try_from(definition: &RuleDefinition) -> Result<Self, Self::Error> {
        let user_state = definition
            .user_state
            .iter()
            .map(UserStateMatch::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            state_name: definition.state_name.clone(),
            rule_match: RuleMatch::new(
                &definition.state_name,
                MatchSingle::from(&definition.room_state),
                MatchSingle::from(&definition.occupancy),
                user_state,
            )?,
            light_profile: definition.light_profile.clone(),
        })
    }
}

/// Ordered rules of one light binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a rule set, preserving declared order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRuleName`] when two rules share a
    /// state name.
    pub fn new(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.state_name.as_str()) {
                return Err(ConfigError::DuplicateRuleName(rule.state_name.clone()));
            }
        }
        Ok(Self { rules })
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every user or group referenced by some rule, wildcards excluded.
    #[must_use]
    pub fn rule_users(&self) -> BTreeSet<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.rule_match.users())
            .map(ToString::to_string)
            .collect()
    }

    /// The first rule, in declared order, that matches. `None` means the
    /// combination is unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingState`] when a consulted rule needs a
    /// state that `user_states` does not carry.
    pub fn evaluate(
        &self,
        room_state: &str,
        occupancy: &str,
        user_states: &UserStates,
    ) -> Result<Option<&Rule>, MatchError> {
        for rule in &self.rules {
            if rule.rule_match.matches(room_state, occupancy, user_states)? {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }
}

impl TryFrom<&[RuleDefinition]> for RuleSet {
    type Error = Error;

    fn try_from(definitions: &[RuleDefinition]) -> Result<Self, Self::Error> {
        let rules = definitions
            .iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules)?)
    }
}
