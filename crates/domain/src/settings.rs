//! Global settings: the declared room, occupancy and person state spaces.

use std::collections::{BTreeSet, HashSet};

use serde::Deserialize;

use crate::error::ConfigError;

/// Person state meaning "not at home"; never counts towards a group state
/// unless every member shares it.
pub const DEFAULT_ABSENT_STATE: &str = "absent";

pub const DEFAULT_PERSON_STATES: [&str; 3] = ["asleep", "winddown", "awake"];

/// Home/away states. Person states may not reuse these names.
pub const HOME_AWAY_STATES: [&str; 4] = ["auto", "unknown", "home", "not_home"];

const FIELD_ROOM_STATES: &str = "room.valid_room_states";
const FIELD_OCCUPANCY_STATES: &str = "room.valid_occupancy_states";
const FIELD_PERSON_STATES: &str = "users_groups.valid_person_states";
const FIELD_ABSENT_STATE: &str = "users_groups.absent_state";

/// Characters joining states in rendered sets and state keys.
const STATE_NAME_FORBIDDEN: [char; 2] = [',', ':'];

/// `settings` as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettingsDefinition {
    pub room: RoomSettingsDefinition,
    #[serde(default)]
    pub users_groups: UserGroupSettingsDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomSettingsDefinition {
    pub valid_room_states: Vec<String>,
    pub valid_occupancy_states: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserGroupSettingsDefinition {
    pub valid_person_states: Option<Vec<String>>,
    pub absent_state: Option<String>,
    pub state_if_unknown: Option<String>,
}

/// Validated settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub valid_room_states: BTreeSet<String>,
    pub valid_occupancy_states: BTreeSet<String>,
    /// States a present person can be in. Never contains the absent state.
    pub valid_person_states: BTreeSet<String>,
    pub absent_state: String,
    /// State assumed for a person whose state cannot be determined.
    pub state_if_unknown: String,
}

impl Settings {
    /// Every state an individual can be observed in: the valid person states
    /// plus the absent state.
    #[must_use]
    pub fn all_person_states(&self) -> BTreeSet<String> {
        let mut states = self.valid_person_states.clone();
        states.insert(self.absent_state.clone());
        states
    }
}

impl TryFrom<&SettingsDefinition> for Settings {
    type Error = ConfigError;

    fn try_from(definition: &SettingsDefinition) -> Result<Self, Self::Error> {
        let valid_room_states = unique_states(FIELD_ROOM_STATES, &definition.room.valid_room_states)?;
        let valid_occupancy_states =
            unique_states(FIELD_OCCUPANCY_STATES, &definition.room.valid_occupancy_states)?;

        let users_groups = &definition.users_groups;
        let person_states = users_groups.valid_person_states.clone().unwrap_or_else(|| {
            DEFAULT_PERSON_STATES.iter().map(ToString::to_string).collect()
        });
        let valid_person_states = unique_states(FIELD_PERSON_STATES, &person_states)?;

        let absent_state = users_groups
            .absent_state
            .clone()
            .unwrap_or_else(|| DEFAULT_ABSENT_STATE.to_string());
        check_state_name(FIELD_ABSENT_STATE, &absent_state)?;
        if valid_person_states.contains(&absent_state) {
            return Err(ConfigError::ReservedState {
                field: FIELD_PERSON_STATES,
                state: absent_state,
            });
        }
        if let Some(state) = valid_person_states
            .iter()
            .chain(std::iter::once(&absent_state))
            .find(|s| HOME_AWAY_STATES.contains(&s.as_str()))
        {
            return Err(ConfigError::ReservedState {
                field: FIELD_PERSON_STATES,
                state: state.clone(),
            });
        }

        let state_if_unknown = users_groups
            .state_if_unknown
            .clone()
            .unwrap_or_else(|| absent_state.clone());
        if state_if_unknown != absent_state && !valid_person_states.contains(&state_if_unknown) {
            return Err(ConfigError::UnknownState {
                owner: "users_groups.state_if_unknown".to_string(),
                kind: "person",
                state: state_if_unknown,
            });
        }

        Ok(Self {
            valid_room_states,
            valid_occupancy_states,
            valid_person_states,
            absent_state,
            state_if_unknown,
        })
    }
}

fn unique_states(field: &'static str, states: &[String]) -> Result<BTreeSet<String>, ConfigError> {
    if states.is_empty() {
        return Err(ConfigError::EmptyStates(field));
    }
    let mut seen = HashSet::with_capacity(states.len());
    let duplicates: BTreeSet<&str> = states
        .iter()
        .filter(|s| !seen.insert(s.as_str()))
        .map(String::as_str)
        .collect();
    if !duplicates.is_empty() {
        return Err(ConfigError::DuplicateState {
            field,
            states: duplicates.into_iter().collect::<Vec<_>>().join(","),
        });
    }
    for state in states {
        check_state_name(field, state)?;
    }
    Ok(states.iter().cloned().collect())
}

fn check_state_name(field: &'static str, state: &str) -> Result<(), ConfigError> {
    if state.contains(STATE_NAME_FORBIDDEN) {
        return Err(ConfigError::InvalidStateName {
            field,
            state: state.to_string(),
        });
    }
    Ok(())
}
