//! Templated rule and rule list.

use super::{InputSet, Inputs, Template, TemplateContent, TemplateList, UserStateContent, input_set};
use crate::definition::{MatchValue, RuleDefinition, TemplateDefinition};
use crate::error::{ConfigError, Error, TemplateError};
use crate::matching::{MatchSingle, RuleMatch};
use crate::rules::Rule;

/// Content of one templated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContent {
    pub state_name: Template<String>,
    pub room_state: Template<MatchValue>,
    pub occupancy: Template<MatchValue>,
    pub user_state: TemplateList<UserStateContent>,
    pub light_profile: Template<String>,
}

/// A named list of templated rules, materialized once per invocation.
pub type RuleListTemplate = TemplateList<RuleContent>;

impl RuleContent {
    /// Build the template for one rule. The template is named
    /// `<name>.<state_name>`; every field is a child template.
    ///
    /// # Errors
    ///
    /// Returns a template error for undeclared placeholders, or a
    /// configuration error for an empty or malformed `user_state` list.
    pub fn template(
        name: &str,
        definition: &RuleDefinition,
        declared: &InputSet,
    ) -> Result<Template<Self>, Error> {
        let name = format!("{name}.{}", definition.state_name);
        if definition.user_state.is_empty() {
            return Err(ConfigError::EmptyUserStates(name).into());
        }

        let field = |field: &str| format!("{name}.{field}");
        let user_state = definition
            .user_state
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                UserStateContent::template(&format!("{}.{i}", field("user_state")), entry, declared)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let content = Self {
            state_name: Template::new(
                field("state_name"),
                definition.state_name.clone(),
                declared.clone(),
                true,
            )?,
            room_state: Template::new(
                field("room_state"),
                definition.room_state.clone(),
                declared.clone(),
                true,
            )?,
            occupancy: Template::new(
                field("occupancy"),
                definition.occupancy.clone(),
                declared.clone(),
                true,
            )?,
            user_state: Template::new(field("user_state"), user_state, declared.clone(), true)?,
            light_profile: Template::new(
                field("light_profile"),
                definition.light_profile.clone(),
                declared.clone(),
                true,
            )?,
        };
        Ok(Template::new(name, content, declared.clone(), true)?)
    }

    /// Build a named rule-list template.
    ///
    /// Individual rules may leave inputs unused, but the list as a whole must
    /// reference every declared input.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`RuleContent::template`], and returns
    /// [`TemplateError::UnusedInput`] when some declared input is referenced
    /// by no rule.
    pub fn list_template(name: &str, definition: &TemplateDefinition) -> Result<RuleListTemplate, Error> {
        let declared = input_set(definition.inputs.clone().into_vec());
        let rules = definition
            .template
            .iter()
            .enumerate()
            .map(|(i, rule)| Self::template(&format!("{name}.{i}"), rule, &declared))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Template::new(name, rules, declared, false)?)
    }
}

impl TemplateContent for RuleContent {
    type Output = Rule;

    fn validate_inputs(
        &self,
        _template: &str,
        _declared: &InputSet,
    ) -> Result<InputSet, TemplateError> {
        let mut used = InputSet::new();
        used.extend(self.state_name.used_inputs().iter().cloned());
        used.extend(self.room_state.used_inputs().iter().cloned());
        used.extend(self.occupancy.used_inputs().iter().cloned());
        used.extend(self.user_state.used_inputs().iter().cloned());
        used.extend(self.light_profile.used_inputs().iter().cloned());
        Ok(used)
    }

    fn materialize_unchecked(&self, inputs: &Inputs) -> Self::Output {
        let rule_match = RuleMatch::from_parts(
            MatchSingle::from(self.room_state.materialize_unchecked(inputs)),
            MatchSingle::from(self.occupancy.materialize_unchecked(inputs)),
            self.user_state.materialize_unchecked(inputs),
        );
        Rule {
            state_name: self.state_name.materialize_unchecked(inputs),
            rule_match,
            light_profile: self.light_profile.materialize_unchecked(inputs),
        }
    }
}
