//! Definition types: the already-parsed shape of a rules document.
//!
//! These mirror the document one-to-one and carry no invariants beyond what
//! serde enforces. They are compiled into templates, matchers and rules by
//! the application layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matching::MatchMode;
use crate::profile::LightProfile;
use crate::settings::SettingsDefinition;

/// Literal that matches any value.
pub const WILDCARD: &str = "*";

/// A string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// A match value: a string, a list of strings, or the wildcard `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    One(String),
    Many(Vec<String>),
}

impl MatchValue {
    /// Whether this is the bare wildcard literal.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::One(value) if value == WILDCARD)
    }

    /// Every literal in this value, wildcard included.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice = match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for MatchValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

/// A condition on one user or group. Exactly one of the three state fields
/// must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStateCondition {
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_any: Option<MatchValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_all: Option<MatchValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_exact: Option<MatchValue>,
}

impl UserStateCondition {
    /// The single selected mode and its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUserStateCondition`] when zero or more
    /// than one of `state_any` / `state_all` / `state_exact` is set.
    pub fn selected(&self) -> Result<(MatchMode, &MatchValue), ConfigError> {
        let present: Vec<(MatchMode, &MatchValue)> = [
            (MatchMode::Any, self.state_any.as_ref()),
            (MatchMode::All, self.state_all.as_ref()),
            (MatchMode::Exact, self.state_exact.as_ref()),
        ]
        .into_iter()
        .filter_map(|(mode, value)| value.map(|v| (mode, v)))
        .collect();

        match present.as_slice() {
            [single] => Ok(*single),
            _ => Err(ConfigError::InvalidUserStateCondition {
                user: self.user.clone(),
                found: present.len(),
            }),
        }
    }
}

/// One entry of a rule's `user_state` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawUserStateEntry")]
pub enum UserStateEntry {
    /// The literal `"*"`: matches regardless of who is in which state.
    Wildcard,
    Condition(UserStateCondition),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserStateEntry {
    Literal(String),
    Condition(UserStateCondition),
}

impl TryFrom<RawUserStateEntry> for UserStateEntry {
    type Error = String;

    fn try_from(raw: RawUserStateEntry) -> Result<Self, Self::Error> {
        match raw {
            RawUserStateEntry::Literal(value) if value == WILDCARD => Ok(Self::Wildcard),
            RawUserStateEntry::Literal(value) => Err(format!(
                "expected '{WILDCARD}' or a user state condition, found '{value}'"
            )),
            RawUserStateEntry::Condition(condition) => Ok(Self::Condition(condition)),
        }
    }
}

/// A concrete or templated rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleDefinition {
    pub state_name: String,
    pub room_state: MatchValue,
    pub occupancy: MatchValue,
    pub user_state: Vec<UserStateEntry>,
    pub light_profile: String,
}

/// A named, parametrized list of rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateDefinition {
    pub inputs: OneOrMany,
    pub template: Vec<RuleDefinition>,
}

/// All templates in a document, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplatesDefinition {
    pub light_config_rules: BTreeMap<String, TemplateDefinition>,
}

/// Invocation of a rule-list template with concrete values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateInvocation {
    pub template: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// One entry of a binding's `light_profile_rules`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    Template(TemplateInvocation),
    Rule(RuleDefinition),
}

/// A light binding before its rules are materialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LightConfigDefinition {
    pub lights: String,
    #[serde(default)]
    pub occupancy_sensors: OneOrMany,
    #[serde(default)]
    pub occupancy_timeout: u64,
    /// Owning user or group.
    pub users: String,
    #[serde(default)]
    pub default_profile: Option<String>,
    pub light_profile_rules: Vec<RuleEntry>,
}

/// Leaf attributes of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserDefinition {
    pub guest: bool,
    pub tracking_entity: Option<String>,
}

/// The whole rules document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub templates: TemplatesDefinition,
    #[serde(default)]
    pub light_profiles: BTreeMap<String, LightProfile>,
    #[serde(default)]
    pub light_configs: BTreeMap<String, LightConfigDefinition>,
    #[serde(default)]
    pub users: BTreeMap<String, Option<UserDefinition>>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    pub settings: SettingsDefinition,
}
