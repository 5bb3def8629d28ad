//! End-to-end tests for the verification pipeline.
//!
//! Each test parses an inline YAML rules document with the same schema the CLI
//! reads, compiles it and runs the verifier or evaluator through the library
//! crates. No files are touched.

use motionlight_app::compiler::{Config, compile};
use motionlight_app::evaluator::Evaluator;
use motionlight_app::report::{SortOrder, UNASSIGNED, unassigned_table};
use motionlight_app::verifier::Verifier;
use motionlight_domain::definition::ConfigDocument;
use motionlight_domain::error::{ConfigError, Error, TemplateError};
use motionlight_domain::state::{StateValue, UserStates};

const HOUSE: &str = r#"
templates:
  light_config_rules:
    person_awake:
      inputs: [person, profile]
      template:
        - state_name: bright_when_awake
          room_state: "*"
          occupancy: occupied
          user_state:
            - user: "{person}"
              state_any: awake
          light_profile: "{profile}"

light_profiles:
  bright:
    enabled: true
    brightness_pct: 100
  night_light:
    enabled: true
    brightness_pct: 5
    icon: mdi:weather-night
  dark:
    enabled: false

light_configs:
  kitchen:
    lights: light.kitchen
    occupancy_sensors: binary_sensor.kitchen_motion
    occupancy_timeout: 300
    users: alice
    default_profile: dark
    light_profile_rules:
      - template: person_awake
        values:
          person: alice
          profile: bright
  bedroom:
    lights: light.bedroom
    occupancy_sensors:
      - binary_sensor.bedroom_motion
      - binary_sensor.bedroom_door
    users: couple
    light_profile_rules:
      - state_name: someone_asleep
        room_state: "*"
        occupancy: occupied
        user_state:
          - user: couple
            state_any: asleep
        light_profile: night_light
      - state_name: everyone_away
        room_state: "*"
        occupancy: "*"
        user_state:
          - user: couple
            state_exact: absent
        light_profile: dark
      - state_name: otherwise
        room_state: "*"
        occupancy: "*"
        user_state:
          - "*"
        light_profile: bright

users:
  alice:
  bob:
    guest: false

groups:
  couple: [alice, bob]

settings:
  room:
    valid_room_states: [day, night]
    valid_occupancy_states: [occupied, empty]
  users_groups:
    valid_person_states: [awake, asleep]
"#;

fn parse(yaml: &str) -> ConfigDocument {
    serde_yaml::from_str(yaml).expect("document should parse")
}

fn compiled() -> Config {
    compile(&parse(HOUSE)).expect("document should compile")
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

#[test]
fn should_assign_bright_only_for_occupied_and_awake() {
    let config = compiled();
    let mut report = Verifier::new(&config)
        .verify(config.binding("kitchen").unwrap())
        .unwrap();
    report.sort(SortOrder::Room);

    // alice: absent, asleep, awake across 2 rooms and 2 occupancy states
    assert_eq!(report.rows().len(), 12);
    let assigned: Vec<_> = report
        .rows()
        .iter()
        .filter(|r| r.rule_name.is_some())
        .collect();
    assert_eq!(assigned.len(), 2);
    assert!(assigned.iter().all(|r| {
        r.rule_name.as_deref() == Some("bright_when_awake")
            && r.occupancy == "occupied"
            && r.user_states["alice"] == StateValue::from("awake")
    }));

    let present_rows = report
        .rows()
        .iter()
        .filter(|r| r.user_states["alice"] != StateValue::from("absent"))
        .count();
    assert_eq!(present_rows, 8);
}

#[test]
fn should_render_unassigned_label_in_truth_table() {
    let config = compiled();
    let mut report = Verifier::new(&config)
        .verify(config.binding("kitchen").unwrap())
        .unwrap();
    report.sort(SortOrder::Room);
    let rendered = report.table(UNASSIGNED).to_string();

    assert_eq!(rendered.matches(UNASSIGNED).count(), 10);
    assert_eq!(rendered.matches("bright_when_awake").count(), 2);
    assert!(rendered.starts_with("room_state"));
}

#[test]
fn should_fully_cover_bedroom_with_catch_all() {
    let config = compiled();
    let report = Verifier::new(&config)
        .verify(config.binding("bedroom").unwrap())
        .unwrap();

    // couple folds into {absent}, {asleep}, {awake} and {asleep, awake}
    assert_eq!(report.rows().len(), 4 * 2 * 2);
    assert!(report.is_complete());
    assert!(report.rows().iter().any(|r| r.rule_name.as_deref() == Some("everyone_away")));
}

#[test]
fn should_list_only_kitchen_gaps_across_all_light_groups() {
    let config = compiled();
    let reports = Verifier::new(&config)
        .verify_all(config.bindings.values())
        .unwrap();
    let table = unassigned_table(&reports);
    let rendered = table.to_string();

    assert_eq!(table.len(), 10);
    assert!(rendered.lines().skip(2).all(|line| line.starts_with("kitchen")));
}

// ---------------------------------------------------------------------------
// Live evaluation
// ---------------------------------------------------------------------------

#[test]
fn should_pick_night_light_when_partner_away_and_other_asleep() {
    let config = compiled();
    let people = UserStates::from([
        ("alice".to_string(), StateValue::from("asleep")),
        ("bob".to_string(), StateValue::from("absent")),
    ]);
    let evaluation = Evaluator::new(&config)
        .evaluate(config.binding("bedroom").unwrap(), "night", "occupied", &people)
        .unwrap();

    assert_eq!(evaluation.rule.map(|r| r.state_name.as_str()), Some("someone_asleep"));
    assert_eq!(evaluation.light_profile, Some("night_light"));
    assert_eq!(config.profiles["night_light"].brightness_pct, Some(5));
}

#[test]
fn should_fall_back_to_default_profile_in_kitchen() {
    let config = compiled();
    let people = UserStates::from([("alice".to_string(), StateValue::from("asleep"))]);
    let evaluation = Evaluator::new(&config)
        .evaluate(config.binding("kitchen").unwrap(), "day", "occupied", &people)
        .unwrap();

    assert!(evaluation.rule.is_none());
    assert_eq!(evaluation.light_profile, Some("dark"));
}

// ---------------------------------------------------------------------------
// Compile-time failures
// ---------------------------------------------------------------------------

#[test]
fn should_reject_template_with_unused_input() {
    let yaml = HOUSE.replace("inputs: [person, profile]", "inputs: [person, profile, room]");
    let result = compile(&parse(&yaml));
    assert!(matches!(
        result,
        Err(Error::Template(TemplateError::UnusedInput { ref inputs, .. })) if inputs == "room"
    ));
}

#[test]
fn should_reject_template_with_unknown_input() {
    let yaml = HOUSE.replace("inputs: [person, profile]", "inputs: [person]");
    let result = compile(&parse(&yaml));
    assert!(matches!(
        result,
        Err(Error::Template(TemplateError::UnknownInput { ref input, .. })) if input == "profile"
    ));
}

#[test]
fn should_reject_group_cycle() {
    let yaml = HOUSE.replace(
        "couple: [alice, bob]",
        "couple: [alice, bob, family]\n  family: [couple]",
    );
    let result = compile(&parse(&yaml));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::GroupCycle { ref path })) if path.len() == 3
    ));
}

#[test]
fn should_reject_condition_with_two_modes() {
    let yaml = HOUSE.replace("state_any: asleep", "state_any: asleep\n            state_all: asleep");
    let result = compile(&parse(&yaml));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidUserStateCondition { found: 2, .. }))
    ));
}
