//! Live evaluation of a light binding.
//!
//! Callers report the state of individual people. Groups referenced by the
//! binding's rules are folded from those states and the rule set picks the
//! winning rule; when none matches, the binding's default profile applies.

use std::collections::BTreeSet;

use motionlight_domain::binding::LightBinding;
use motionlight_domain::error::MatchError;
use motionlight_domain::rules::Rule;
use motionlight_domain::state::{StateValue, UserStates};
use motionlight_domain::users_groups::{GroupResolver, Member, UsersGroups};

use crate::compiler::Config;

/// Outcome of evaluating one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation<'a> {
    /// Winning rule, `None` when the combination is unassigned.
    pub rule: Option<&'a Rule>,
    /// Profile to apply: the winning rule's, else the binding default.
    pub light_profile: Option<&'a str>,
}

/// Evaluates bindings of one compiled configuration.
pub struct Evaluator<'a> {
    config: &'a Config,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Evaluate `binding` against the current room, occupancy and individual
    /// person states. People with no reported state are assumed to be in the
    /// configured `state_if_unknown`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUser`] when `people` names anything but an
    /// individual user, [`MatchError::UndeclaredState`] when a reported state
    /// is not a person state, and [`MatchError::MissingState`] when a rule
    /// references a name the registry does not know.
    #[tracing::instrument(skip(self, binding, people), fields(binding = %binding.name))]
    pub fn evaluate(
        &self,
        binding: &'a LightBinding,
        room_state: &str,
        occupancy: &str,
        people: &UserStates,
    ) -> Result<Evaluation<'a>, MatchError> {
        let settings = &self.config.settings;
        let rule_users = binding.rules.rule_users();
        check_people(self.config, people)?;

        let mut atomic = UserStates::new();
        for person in individuals(&self.config.users_groups, &rule_users)? {
            let state = people
                .get(&person)
                .cloned()
                .unwrap_or_else(|| StateValue::from(settings.state_if_unknown.as_str()));
            atomic.insert(person, state);
        }

        let mut resolver = GroupResolver::new(&self.config.users_groups, &settings.absent_state);
        let observed = observe(&mut resolver, &rule_users, &atomic)?;

        let rule = binding.evaluate(room_state, occupancy, &observed)?;
        if rule.is_none() {
            tracing::warn!(room_state, occupancy, "no rule matched");
        }
        Ok(Evaluation {
            rule,
            light_profile: rule
                .map(|r| r.light_profile.as_str())
                .or(binding.default_profile.as_deref()),
        })
    }
}

fn check_people(config: &Config, people: &UserStates) -> Result<(), MatchError> {
    let valid = config.settings.all_person_states();
    for (name, state) in people {
        if !matches!(config.users_groups.get(name), Some(Member::User(_))) {
            return Err(MatchError::UnknownUser(name.clone()));
        }
        if let Some(undeclared) = state.iter().find(|s| !valid.contains(*s)) {
            return Err(MatchError::UndeclaredState {
                user: name.clone(),
                state: undeclared.to_string(),
            });
        }
    }
    Ok(())
}

/// Every individual user below any of `names`.
fn individuals(
    registry: &UsersGroups,
    names: &BTreeSet<String>,
) -> Result<BTreeSet<String>, MatchError> {
    let mut people = BTreeSet::new();
    for name in names {
        let members = registry
            .individuals(name)
            .ok_or_else(|| MatchError::MissingState(name.clone()))?;
        people.extend(members);
    }
    Ok(people)
}

/// The state map the rules see: one entry per name in `rule_users`, groups
/// folded from `atomic`.
///
/// # Errors
///
/// Returns [`MatchError::MissingState`] when `atomic` lacks an individual
/// below one of `rule_users`.
pub fn observe(
    resolver: &mut GroupResolver<'_>,
    rule_users: &BTreeSet<String>,
    atomic: &UserStates,
) -> Result<UserStates, MatchError> {
    resolver.reset();
    let mut observed = UserStates::new();
    for name in rule_users {
        observed.insert(name.clone(), resolver.resolve(name, atomic)?);
    }
    Ok(observed)
}
