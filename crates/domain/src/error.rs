//! Error types shared across the workspace.
//!
//! Every layer raises one of three typed families and the top-level [`Error`]
//! composes them via `#[from]`:
//! - [`TemplateError`]: a template references, omits or is missing inputs.
//! - [`ConfigError`]: the users/groups registry, settings or rules are malformed.
//! - [`MatchError`]: evaluation was invoked with incomplete state.
//!
//! "No rule matched" is not an error. It is the `None` outcome of rule set
//! evaluation.

/// Top-level domain error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A template could not be built or materialized.
    #[error("template error")]
    Template(#[from] TemplateError),

    /// The configuration is invalid.
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// Evaluation was invoked with incomplete user state.
    #[error("match error")]
    Match(#[from] MatchError),
}

/// Failures of template construction and materialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A placeholder references a name that was never declared.
    #[error("template '{template}' references unknown input '{input}' (available: {available})")]
    UnknownInput {
        template: String,
        input: String,
        available: String,
    },

    /// Declared inputs are never referenced and extras are not allowed.
    #[error("template '{template}' has unused inputs '{inputs}'")]
    UnusedInput { template: String, inputs: String },

    /// Materialization was invoked without every required input.
    #[error("cannot materialize template '{template}': missing inputs '{inputs}'")]
    MissingInput { template: String, inputs: String },
}

/// Invalid configuration detected while building the registry or rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The group graph contains a cycle. `path` lists every hop, ending on the
    /// repeated group.
    #[error("loop in groups found: {}", .path.join(" -> "))]
    GroupCycle { path: Vec<String> },

    /// A group shares its name with a user.
    #[error("group '{0}' with the same name as a user is prohibited")]
    NameCollision(String),

    /// A group member is neither a user nor a group.
    #[error("group '{group}' contains unknown member '{member}'")]
    UnknownMember { group: String, member: String },

    /// A group lists the same member twice.
    #[error("group '{group}' lists member '{member}' more than once")]
    DuplicateMember { group: String, member: String },

    /// A user-state condition supplies zero or several of
    /// `state_any` / `state_all` / `state_exact`.
    #[error("user state condition for '{user}' must set exactly one of state_any, state_all, state_exact (found {found})")]
    InvalidUserStateCondition { user: String, found: usize },

    /// A rule has no user-state matches at all.
    #[error("rule '{0}' has an empty user_state list")]
    EmptyUserStates(String),

    /// A rule or binding names a light profile that does not exist.
    #[error("'{owner}' references unknown light profile '{profile}'")]
    UnknownLightProfile { owner: String, profile: String },

    /// A rule or binding names a user or group that does not exist.
    #[error("'{owner}' references unknown user or group '{name}'")]
    UnknownUserOrGroup { owner: String, name: String },

    /// A binding invokes a template that does not exist.
    #[error("binding '{binding}' uses unknown template '{template}'")]
    UnknownTemplate { binding: String, template: String },

    /// Two rules in one rule set share a state name.
    #[error("duplicate rule state name '{0}'")]
    DuplicateRuleName(String),

    /// A settings list contains the same state more than once.
    #[error("{field} has duplicate values: {states}")]
    DuplicateState { field: &'static str, states: String },

    /// A settings list is empty.
    #[error("{0} must be a non-empty list of states")]
    EmptyStates(&'static str),

    /// A person state reuses a name with special meaning.
    #[error("{field} contains reserved state name '{state}'")]
    ReservedState { field: &'static str, state: String },

    /// A state name contains a character used to join states.
    #[error("{field} state '{state}' must not contain ',' or ':'")]
    InvalidStateName { field: &'static str, state: String },

    /// A rule or setting refers to a state value that is never produced.
    #[error("'{owner}' uses undeclared {kind} state '{state}'")]
    UnknownState {
        owner: String,
        kind: &'static str,
        state: String,
    },
}

/// Evaluation-time failures. These indicate a caller defect rather than a
/// normal mismatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// No state was supplied for an identifier a matcher depends on.
    #[error("did not receive state for user or group '{0}'")]
    MissingState(String),

    /// A state was reported for a name that is not an individual user.
    #[error("'{0}' is not a known user")]
    UnknownUser(String),

    /// A reported state is neither a valid person state nor the absent state.
    #[error("user '{user}' reported undeclared state '{state}'")]
    UndeclaredState { user: String, state: String },
}
