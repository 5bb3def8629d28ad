//! Templated user-state condition.

use super::{InputSet, Inputs, Template, TemplateContent};
use crate::definition::{MatchValue, UserStateEntry};
use crate::error::{Error, TemplateError};
use crate::matching::{MatchMode, MatchMulti, MatchSingle, UserStateMatch};

/// Content of one templated `user_state` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStateContent {
    Wildcard,
    Condition {
        user: Template<String>,
        mode: MatchMode,
        state: Template<MatchValue>,
    },
}

impl UserStateContent {
    /// Build the template for one `user_state` entry. Extra inputs are
    /// allowed: a single condition rarely uses every input of its rule.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::InvalidUserStateCondition`] when the entry
    /// selects zero or several match modes, or a template error when a
    /// placeholder names an undeclared input.
    ///
    /// [`ConfigError::InvalidUserStateCondition`]: crate::error::ConfigError::InvalidUserStateCondition
    pub fn template(
        name: &str,
        entry: &UserStateEntry,
        declared: &InputSet,
    ) -> Result<Template<Self>, Error> {
        let content = match entry {
            UserStateEntry::Wildcard => Self::Wildcard,
            UserStateEntry::Condition(condition) => {
                let (mode, value) = condition.selected()?;
                Self::Condition {
                    user: Template::new(
                        format!("{name}.user"),
                        condition.user.clone(),
                        declared.clone(),
                        true,
                    )?,
                    mode,
                    state: Template::new(
                        format!("{name}.state_{mode}"),
                        value.clone(),
                        declared.clone(),
                        true,
                    )?,
                }
            }
        };
        Ok(Template::new(name, content, declared.clone(), true)?)
    }
}

impl TemplateContent for UserStateContent {
    type Output = UserStateMatch;

    fn validate_inputs(
        &self,
        _template: &str,
        _declared: &InputSet,
    ) -> Result<InputSet, TemplateError> {
        match self {
            Self::Wildcard => Ok(InputSet::new()),
            Self::Condition { user, state, .. } => Ok(user
                .used_inputs()
                .union(state.used_inputs())
                .cloned()
                .collect()),
        }
    }

    fn materialize_unchecked(&self, inputs: &Inputs) -> Self::Output {
        match self {
            Self::Wildcard => UserStateMatch::Wildcard,
            Self::Condition { user, mode, state } => UserStateMatch::User {
                user: user.materialize_unchecked(inputs),
                state: MatchMulti::new(*mode, MatchSingle::from(state.materialize_unchecked(inputs))),
            },
        }
    }
}
