//! Configuration compiler: parsed rules document in, immutable [`Config`] out.
//!
//! Compilation runs once per document load. Every template is built (so
//! unused or unknown inputs fail before a single rule is evaluated), every
//! binding is materialized in declared order, and every name a rule or
//! binding refers to is checked against the registry, the profiles and the
//! settings.

use std::collections::BTreeMap;

use motionlight_domain::binding::LightBinding;
use motionlight_domain::definition::{ConfigDocument, LightConfigDefinition, RuleEntry};
use motionlight_domain::error::{ConfigError, Error};
use motionlight_domain::matching::{MatchSingle, UserStateMatch};
use motionlight_domain::profile::LightProfile;
use motionlight_domain::rules::{Rule, RuleSet};
use motionlight_domain::settings::Settings;
use motionlight_domain::template::{RuleContent, RuleListTemplate};
use motionlight_domain::users_groups::UsersGroups;

/// A fully compiled configuration. Immutable and safe to share.
#[derive(Debug, Clone)]
pub struct Config {
    pub profiles: BTreeMap<String, LightProfile>,
    pub users_groups: UsersGroups,
    pub settings: Settings,
    pub templates: BTreeMap<String, RuleListTemplate>,
    pub bindings: BTreeMap<String, LightBinding>,
}

impl Config {
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&LightBinding> {
        self.bindings.get(name)
    }
}

/// Compile a rules document.
///
/// # Errors
///
/// Returns the first template, settings, registry or reference error found.
#[tracing::instrument(skip(document), fields(bindings = document.light_configs.len()))]
pub fn compile(document: &ConfigDocument) -> Result<Config, Error> {
    let settings = Settings::try_from(&document.settings)?;
    let users_groups = UsersGroups::from_definitions(&document.users, &document.groups)?;

    let mut templates = BTreeMap::new();
    for (name, definition) in &document.templates.light_config_rules {
        templates.insert(name.clone(), RuleContent::list_template(name, definition)?);
    }

    let mut bindings = BTreeMap::new();
    for (name, definition) in &document.light_configs {
        let binding = compile_binding(name, definition, &templates)?;
        check_binding(&binding, &document.light_profiles, &users_groups, &settings)?;
        tracing::debug!(binding = %name, rules = binding.rules.len(), "binding materialized");
        bindings.insert(name.clone(), binding);
    }

    tracing::info!(
        templates = templates.len(),
        bindings = bindings.len(),
        users = users_groups.users().count(),
        groups = users_groups.groups().count(),
        "configuration compiled"
    );

    Ok(Config {
        profiles: document.light_profiles.clone(),
        users_groups,
        settings,
        templates,
        bindings,
    })
}

fn compile_binding(
    name: &str,
    definition: &LightConfigDefinition,
    templates: &BTreeMap<String, RuleListTemplate>,
) -> Result<LightBinding, Error> {
    let mut rules: Vec<Rule> = Vec::new();
    for entry in &definition.light_profile_rules {
        match entry {
            RuleEntry::Rule(rule) => rules.push(Rule::try_from(rule)?),
            RuleEntry::Template(invocation) => {
                let template = templates.get(&invocation.template).ok_or_else(|| {
                    ConfigError::UnknownTemplate {
                        binding: name.to_string(),
                        template: invocation.template.clone(),
                    }
                })?;
                rules.extend(template.materialize(&invocation.values)?);
            }
        }
    }

    Ok(LightBinding {
        name: name.to_string(),
        lights: definition.lights.clone(),
        occupancy_sensors: definition.occupancy_sensors.clone().into_vec(),
        occupancy_timeout: definition.occupancy_timeout,
        user: definition.users.clone(),
        default_profile: definition.default_profile.clone(),
        rules: RuleSet::new(rules)?,
    })
}

fn check_binding(
    binding: &LightBinding,
    profiles: &BTreeMap<String, LightProfile>,
    users_groups: &UsersGroups,
    settings: &Settings,
) -> Result<(), ConfigError> {
    if !users_groups.contains(&binding.user) {
        return Err(ConfigError::UnknownUserOrGroup {
            owner: binding.name.clone(),
            name: binding.user.clone(),
        });
    }
    if let Some(profile) = &binding.default_profile {
        if !profiles.contains_key(profile) {
            return Err(ConfigError::UnknownLightProfile {
                owner: binding.name.clone(),
                profile: profile.clone(),
            });
        }
    }

    let person_states = settings.all_person_states();
    for rule in binding.rules.rules() {
        let owner = format!("{}.{}", binding.name, rule.state_name);
        if !profiles.contains_key(&rule.light_profile) {
            return Err(ConfigError::UnknownLightProfile {
                owner,
                profile: rule.light_profile.clone(),
            });
        }

        let rule_match = &rule.rule_match;
        check_states(&owner, "room", &rule_match.room_state, |s| {
            settings.valid_room_states.contains(s)
        })?;
        check_states(&owner, "occupancy", &rule_match.occupancy, |s| {
            settings.valid_occupancy_states.contains(s)
        })?;
        for user_state in rule_match.user_state() {
            let UserStateMatch::User { user, state } = user_state else {
                continue;
            };
            if !users_groups.contains(user) {
                return Err(ConfigError::UnknownUserOrGroup {
                    owner,
                    name: user.clone(),
                });
            }
            check_states(&owner, "person", &state.matcher, |s| person_states.contains(s))?;
        }
    }
    Ok(())
}

fn check_states(
    owner: &str,
    kind: &'static str,
    matcher: &MatchSingle,
    is_declared: impl Fn(&str) -> bool,
) -> Result<(), ConfigError> {
    let Some(options) = matcher.options() else {
        return Ok(());
    };
    match options.into_iter().find(|state| !is_declared(state)) {
        Some(state) => Err(ConfigError::UnknownState {
            owner: owner.to_string(),
            kind,
            state,
        }),
        None => Ok(()),
    }
}
