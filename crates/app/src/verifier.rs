//! Exhaustive verifier: brute-force coverage of a binding's input space.
//!
//! The atomic state space is every assignment of a person state (or absent)
//! to every individual below the binding's rule users. Each assignment is
//! folded into the state map the rules observe, duplicates are dropped by
//! canonical key, and the survivors are crossed with every room and
//! occupancy state.

use std::collections::{BTreeSet, HashSet};

use motionlight_domain::binding::LightBinding;
use motionlight_domain::error::{ConfigError, Error};
use motionlight_domain::settings::Settings;
use motionlight_domain::state::{StateValue, UserStates, canonical_key};
use motionlight_domain::users_groups::{GroupResolver, UsersGroups};

use crate::compiler::Config;
use crate::evaluator::observe;
use crate::report::{CoverageReport, CoverageRow};

pub struct Verifier<'a> {
    users_groups: &'a UsersGroups,
    settings: &'a Settings,
}

impl<'a> Verifier<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            users_groups: &config.users_groups,
            settings: &config.settings,
        }
    }

    /// Every distinct state map the rules of `binding` can observe, restricted
    /// to the binding's rule users.
    ///
    /// Only individuals below some rule user are enumerated; the rest of the
    /// owner's members cannot change what the rules see.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownUserOrGroup`] when the owner or a rule
    /// user is not in the registry.
    pub fn enumerate_states(&self, binding: &LightBinding) -> Result<Vec<UserStates>, Error> {
        let unknown = |name: &str| ConfigError::UnknownUserOrGroup {
            owner: binding.name.clone(),
            name: name.to_string(),
        };

        let owner = self
            .users_groups
            .individuals(&binding.user)
            .ok_or_else(|| unknown(&binding.user))?;
        let rule_users = binding.rules.rule_users();
        let mut people = BTreeSet::new();
        for name in &rule_users {
            people.extend(self.users_groups.individuals(name).ok_or_else(|| unknown(name))?);
        }
        let people: Vec<&str> = people.iter().map(String::as_str).collect();
        let states: Vec<String> = self.settings.all_person_states().into_iter().collect();

        tracing::debug!(
            owner_individuals = owner.len(),
            enumerated_individuals = people.len(),
            person_states = states.len(),
            "enumerating atomic states"
        );

        let mut resolver = GroupResolver::new(self.users_groups, &self.settings.absent_state);
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for atomic in Combinations::new(&people, &states) {
            let observed = observe(&mut resolver, &rule_users, &atomic)?;
            if seen.insert(canonical_key(&observed)) {
                unique.push(observed);
            }
        }

        tracing::debug!(unique = unique.len(), "deduplicated observable states");
        Ok(unique)
    }

    /// Evaluate `binding` for every reachable combination.
    ///
    /// Rows come in enumeration order: for each distinct user-state map, every
    /// room state, then every occupancy state, both sorted.
    ///
    /// # Errors
    ///
    /// Same as [`Verifier::enumerate_states`].
    #[tracing::instrument(skip(self, binding), fields(binding = %binding.name))]
    pub fn verify(&self, binding: &LightBinding) -> Result<CoverageReport, Error> {
        let user_states = self.enumerate_states(binding)?;
        let rooms = &self.settings.valid_room_states;
        let occupancies = &self.settings.valid_occupancy_states;

        let mut rows = Vec::with_capacity(user_states.len() * rooms.len() * occupancies.len());
        for states in &user_states {
            for room_state in rooms {
                for occupancy in occupancies {
                    let rule = binding.evaluate(room_state, occupancy, states)?;
                    rows.push(CoverageRow {
                        room_state: room_state.clone(),
                        occupancy: occupancy.clone(),
                        user_states: states.clone(),
                        rule_name: rule.map(|r| r.state_name.clone()),
                    });
                }
            }
        }

        let report = CoverageReport::new(binding.name.clone(), rows);
        let unassigned = report.unassigned().count();
        if unassigned > 0 {
            tracing::warn!(unassigned, total = report.rows().len(), "unassigned combinations");
        } else {
            tracing::info!(total = report.rows().len(), "binding fully covered");
        }
        Ok(report)
    }

    /// Verify every binding of the configuration, in name order.
    ///
    /// # Errors
    ///
    /// Stops at the first binding that fails to verify.
    pub fn verify_all<'b>(
        &self,
        bindings: impl IntoIterator<Item = &'b LightBinding>,
    ) -> Result<Vec<CoverageReport>, Error> {
        bindings.into_iter().map(|binding| self.verify(binding)).collect()
    }
}

/// Cartesian product of `states` over `people`, last person varying fastest.
struct Combinations<'a> {
    people: &'a [&'a str],
    states: &'a [String],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    fn new(people: &'a [&'a str], states: &'a [String]) -> Self {
        Self {
            people,
            states,
            indices: vec![0; people.len()],
            done: states.is_empty() && !people.is_empty(),
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = UserStates;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .people
            .iter()
            .zip(&self.indices)
            .map(|(person, &i)| ((*person).to_string(), StateValue::from(self.states[i].as_str())))
            .collect();

        self.done = true;
        for index in self.indices.iter_mut().rev() {
            *index += 1;
            if *index < self.states.len() {
                self.done = false;
                break;
            }
            *index = 0;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::report::SortOrder;
    use serde_json::json;

    fn config(rules: serde_json::Value, users: &str) -> Config {
        compile(
            &serde_json::from_value(json!({
                "light_profiles": {"bright": {"enabled": true}, "dim": {"enabled": true}},
                "light_configs": {
                    "bedroom": {
                        "lights": "light.bedroom",
                        "users": users,
                        "light_profile_rules": rules
                    }
                },
                "users": {"alice": null, "bob": null, "carol": null},
                "groups": {"couple": ["alice", "bob"], "house": ["couple", "carol"]},
                "settings": {
                    "room": {
                        "valid_room_states": ["day", "night"],
                        "valid_occupancy_states": ["occupied", "empty"]
                    },
                    "users_groups": {"valid_person_states": ["awake", "asleep"]}
                }
            }))
            .unwrap(),
        )
        .unwrap()
    }

    fn alice_awake_rule() -> serde_json::Value {
        json!([{
            "state_name": "bright",
            "room_state": "*",
            "occupancy": "occupied",
            "user_state": [{"user": "alice", "state_any": "awake"}],
            "light_profile": "bright"
        }])
    }

    #[test]
    fn should_cover_each_person_state_room_and_occupancy_once() {
        let config = compile(
            &serde_json::from_value(json!({
                "light_profiles": {"bright": {"enabled": true}},
                "light_configs": {
                    "bedroom": {
                        "lights": "light.bedroom",
                        "users": "alice",
                        "light_profile_rules": alice_awake_rule()
                    }
                },
                "users": {"alice": null},
                "settings": {
                    "room": {
                        "valid_room_states": ["day", "night"],
                        "valid_occupancy_states": ["occupied", "empty"]
                    },
                    "users_groups": {"valid_person_states": ["asleep", "winddown", "awake"]}
                }
            }))
            .unwrap(),
        )
        .unwrap();
        let verifier = Verifier::new(&config);
        let report = verifier.verify(config.binding("bedroom").unwrap()).unwrap();

        assert_eq!(report.rows().len(), 16);
        let distinct: HashSet<_> = report
            .rows()
            .iter()
            .map(|r| {
                (
                    r.room_state.clone(),
                    r.occupancy.clone(),
                    canonical_key(&r.user_states),
                )
            })
            .collect();
        assert_eq!(distinct.len(), 16);
    }

    #[test]
    fn should_assign_bright_only_when_alice_awake_and_occupied() {
        let config = config(alice_awake_rule(), "alice");
        let mut report = Verifier::new(&config)
            .verify(config.binding("bedroom").unwrap())
            .unwrap();
        report.sort(SortOrder::Room);

        // awake, asleep and absent for alice: 3 x 2 x 2
        assert_eq!(report.rows().len(), 12);
        let bright: Vec<&CoverageRow> = report
            .rows()
            .iter()
            .filter(|r| r.rule_name.as_deref() == Some("bright"))
            .collect();
        assert_eq!(bright.len(), 2);
        assert!(bright.iter().all(|r| {
            r.occupancy == "occupied" && r.user_states["alice"].to_string() == "awake"
        }));
        assert!(report.rows().iter().all(|r| r.user_states.len() == 1));
    }

    #[test]
    fn should_report_six_of_eight_unassigned_without_absent_combinations() {
        let config = config(alice_awake_rule(), "alice");
        let report = Verifier::new(&config)
            .verify(config.binding("bedroom").unwrap())
            .unwrap();
        let present: Vec<&CoverageRow> = report
            .rows()
            .iter()
            .filter(|r| r.user_states["alice"].to_string() != "absent")
            .collect();

        assert_eq!(present.len(), 8);
        assert_eq!(present.iter().filter(|r| r.is_unassigned()).count(), 6);
    }

    #[test]
    fn should_deduplicate_folded_group_states() {
        let config = config(
            json!([{
                "state_name": "any_awake",
                "room_state": "*",
                "occupancy": "*",
                "user_state": [{"user": "couple", "state_any": "awake"}],
                "light_profile": "bright"
            }]),
            "couple",
        );
        let states = Verifier::new(&config)
            .enumerate_states(config.binding("bedroom").unwrap())
            .unwrap();

        // 9 atomic combinations fold into {awake}, {asleep}, {absent} and
        // {asleep, awake}.
        let keys: Vec<String> = states.iter().map(|s| s["couple"].to_string()).collect();
        assert_eq!(states.len(), 4);
        assert!(keys.contains(&"asleep,awake".to_string()));
        assert!(keys.contains(&"absent".to_string()));
        assert!(states.iter().all(|s| s.keys().eq(["couple"])));
    }

    #[test]
    fn should_keep_comma_state_apart_from_state_set() {
        let mut config = compile(
            &serde_json::from_value(json!({
                "light_profiles": {"bright": {"enabled": true}},
                "light_configs": {
                    "hall": {
                        "lights": "light.hall",
                        "users": "pair",
                        "light_profile_rules": [{
                            "state_name": "both",
                            "room_state": "*",
                            "occupancy": "*",
                            "user_state": [{"user": "pair", "state_exact": ["a", "b"]}],
                            "light_profile": "bright"
                        }]
                    }
                },
                "users": {"x": null, "y": null},
                "groups": {"pair": ["x", "y"]},
                "settings": {
                    "room": {
                        "valid_room_states": ["day"],
                        "valid_occupancy_states": ["occupied"]
                    },
                    "users_groups": {"valid_person_states": ["a", "b"]}
                }
            }))
            .unwrap(),
        )
        .unwrap();
        config.settings.valid_person_states.insert("a,b".to_string());

        let report = Verifier::new(&config)
            .verify(config.binding("hall").unwrap())
            .unwrap();

        // {a}, {b}, {"a,b"}, {absent}, {a, b}, {a, "a,b"} and {b, "a,b"}
        assert_eq!(report.rows().len(), 7);
        let comma_only = BTreeSet::from(["a,b".to_string()]);
        let row = report
            .rows()
            .iter()
            .find(|r| r.user_states["pair"].to_set() == comma_only)
            .unwrap();
        assert!(row.is_unassigned());
        let pair = BTreeSet::from(["a".to_string(), "b".to_string()]);
        assert!(report.rows().iter().any(|r| {
            r.user_states["pair"].to_set() == pair && r.rule_name.as_deref() == Some("both")
        }));
    }

    #[test]
    fn should_enumerate_only_individuals_below_rule_users() {
        let config = config(alice_awake_rule(), "house");
        let states = Verifier::new(&config)
            .enumerate_states(config.binding("bedroom").unwrap())
            .unwrap();
        assert_eq!(states.len(), 3);
    }

    #[test]
    fn should_produce_single_state_map_for_wildcard_only_rules() {
        let config = config(
            json!([{
                "state_name": "always",
                "room_state": "*",
                "occupancy": "*",
                "user_state": ["*"],
                "light_profile": "dim"
            }]),
            "house",
        );
        let report = Verifier::new(&config)
            .verify(config.binding("bedroom").unwrap())
            .unwrap();
        assert_eq!(report.rows().len(), 4);
        assert!(report.is_complete());
    }

    #[test]
    fn should_resolve_first_matching_rule_in_report() {
        let config = config(
            json!([
                {
                    "state_name": "catch_all",
                    "room_state": "*",
                    "occupancy": "*",
                    "user_state": ["*"],
                    "light_profile": "dim"
                },
                {
                    "state_name": "never_reached",
                    "room_state": "day",
                    "occupancy": "occupied",
                    "user_state": [{"user": "alice", "state_any": "awake"}],
                    "light_profile": "bright"
                }
            ]),
            "alice",
        );
        let report = Verifier::new(&config)
            .verify(config.binding("bedroom").unwrap())
            .unwrap();
        assert!(report
            .rows()
            .iter()
            .all(|r| r.rule_name.as_deref() == Some("catch_all")));
    }

    #[test]
    fn should_iterate_full_cartesian_product() {
        let people = ["a", "b"];
        let states = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let all: Vec<UserStates> = Combinations::new(&people, &states).collect();
        assert_eq!(all.len(), 9);
        assert_eq!(all[1]["b"].to_string(), "y");
        assert_eq!(all[3]["a"].to_string(), "y");
    }

    #[test]
    fn should_yield_one_empty_combination_for_no_people() {
        let states = vec!["x".to_string()];
        let all: Vec<UserStates> = Combinations::new(&[], &states).collect();
        assert_eq!(all, [UserStates::new()]);
    }
}
