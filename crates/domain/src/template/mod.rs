//! Template engine: declared inputs, strict usage accounting, literal
//! substitution.
//!
//! A [`Template`] wraps some content that contains zero or more placeholders
//! of the exact form `"{input}"`. Construction computes the set of inputs the
//! content actually uses and checks it against the declared set:
//! - a placeholder naming an undeclared input is rejected
//!   ([`TemplateError::UnknownInput`]);
//! - a declared input that is never used is rejected unless extras are
//!   allowed ([`TemplateError::UnusedInput`]).
//!
//! Materialization requires a value for every used input and replaces every
//! field whose whole value is a placeholder. There is no partial
//! interpolation: `"room_{x}"` is a plain literal.
//!
//! Each templated shape implements [`TemplateContent`]. Lists of templates are
//! themselves templates ([`TemplateList`]).

mod rule;
mod user_state;

pub use rule::{RuleContent, RuleListTemplate};
pub use user_state::UserStateContent;

use std::collections::{BTreeMap, BTreeSet};

use crate::definition::MatchValue;
use crate::error::TemplateError;

/// Concrete values supplied at materialization, keyed by input name.
pub type Inputs = BTreeMap<String, String>;

/// A set of input names.
pub type InputSet = BTreeSet<String>;

/// Capability shared by every templated shape.
pub trait TemplateContent {
    /// What materialization produces.
    type Output;

    /// Collect the inputs used by this content, checking each placeholder
    /// against `declared`. `template` names the owner for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownInput`] for a placeholder whose name is
    /// not in `declared`.
    fn validate_inputs(
        &self,
        template: &str,
        declared: &InputSet,
    ) -> Result<InputSet, TemplateError>;

    /// Substitute without checking that every used input is present.
    ///
    /// Callers must have verified that `inputs` covers the used inputs;
    /// [`Template::materialize`] does so.
    fn materialize_unchecked(&self, inputs: &Inputs) -> Self::Output;
}

/// Validated, immutable template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<C> {
    name: String,
    content: C,
    declared: InputSet,
    used: InputSet,
}

/// A template whose content is an ordered list of child templates.
pub type TemplateList<C> = Template<Vec<Template<C>>>;

impl<C: TemplateContent> Template<C> {
    /// Build a template, computing and validating its used inputs.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownInput`] when the content references an
    /// undeclared input, or [`TemplateError::UnusedInput`] when
    /// `allow_extra` is `false` and some declared input is never referenced.
    pub fn new(
        name: impl Into<String>,
        content: C,
        declared: InputSet,
        allow_extra: bool,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        let used = content.validate_inputs(&name, &declared)?;
        if let Some(unknown) = used.difference(&declared).next() {
            return Err(unknown_input(&name, unknown, &declared));
        }

        let unused: Vec<&str> = declared.difference(&used).map(String::as_str).collect();
        if !unused.is_empty() && !allow_extra {
            return Err(TemplateError::UnusedInput {
                template: name,
                inputs: unused.join(","),
            });
        }

        Ok(Self {
            name,
            content,
            declared,
            used,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn content(&self) -> &C {
        &self.content
    }

    /// The inputs the caller declared.
    #[must_use]
    pub fn declared_inputs(&self) -> &InputSet {
        &self.declared
    }

    /// The inputs actually referenced by placeholders.
    #[must_use]
    pub fn used_inputs(&self) -> &InputSet {
        &self.used
    }

    /// Produce a concrete value. Inputs beyond the used set are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingInput`] when some used input has no
    /// value in `inputs`.
    pub fn materialize(&self, inputs: &Inputs) -> Result<C::Output, TemplateError> {
        let missing: Vec<&str> = self
            .used
            .iter()
            .filter(|input| !inputs.contains_key(*input))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingInput {
                template: self.name.clone(),
                inputs: missing.join(","),
            });
        }
        Ok(self.content.materialize_unchecked(inputs))
    }

    fn materialize_unchecked(&self, inputs: &Inputs) -> C::Output {
        self.content.materialize_unchecked(inputs)
    }
}

impl<C: TemplateContent> TemplateContent for Vec<Template<C>> {
    type Output = Vec<C::Output>;

    fn validate_inputs(
        &self,
        _template: &str,
        _declared: &InputSet,
    ) -> Result<InputSet, TemplateError> {
        Ok(self
            .iter()
            .flat_map(|child| child.used.iter().cloned())
            .collect())
    }

    fn materialize_unchecked(&self, inputs: &Inputs) -> Self::Output {
        self.iter()
            .map(|child| child.materialize_unchecked(inputs))
            .collect()
    }
}

impl TemplateContent for String {
    type Output = String;

    fn validate_inputs(
        &self,
        template: &str,
        declared: &InputSet,
    ) -> Result<InputSet, TemplateError> {
        Ok(validate_value(template, self, declared)?.into_iter().collect())
    }

    fn materialize_unchecked(&self, inputs: &Inputs) -> Self::Output {
        substitute(self, inputs)
    }
}

impl TemplateContent for MatchValue {
    type Output = MatchValue;

    fn validate_inputs(
        &self,
        template: &str,
        declared: &InputSet,
    ) -> Result<InputSet, TemplateError> {
        let mut used = InputSet::new();
        for value in self.values() {
            used.extend(validate_value(template, value, declared)?);
        }
        Ok(used)
    }

    fn materialize_unchecked(&self, inputs: &Inputs) -> Self::Output {
        match self {
            Self::One(value) => Self::One(substitute(value, inputs)),
            Self::Many(values) => Self::Many(values.iter().map(|v| substitute(v, inputs)).collect()),
        }
    }
}

/// The input named by `value` if the whole value is a placeholder.
#[must_use]
pub fn placeholder(value: &str) -> Option<&str> {
    value.strip_prefix('{')?.strip_suffix('}')
}

fn validate_value(
    template: &str,
    value: &str,
    declared: &InputSet,
) -> Result<Option<String>, TemplateError> {
    match placeholder(value) {
        Some(input) if declared.contains(input) => Ok(Some(input.to_string())),
        Some(input) => Err(unknown_input(template, input, declared)),
        None => Ok(None),
    }
}

fn substitute(value: &str, inputs: &Inputs) -> String {
    placeholder(value)
        .and_then(|input| inputs.get(input))
        .map_or_else(|| value.to_string(), Clone::clone)
}

fn unknown_input(template: &str, input: &str, declared: &InputSet) -> TemplateError {
    let available: Vec<&str> = declared.iter().map(String::as_str).collect();
    TemplateError::UnknownInput {
        template: template.to_string(),
        input: input.to_string(),
        available: available.join(", "),
    }
}

/// Build an [`InputSet`] from input names.
#[must_use]
pub fn input_set<I, S>(inputs: I) -> InputSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    inputs.into_iter().map(Into::into).collect()
}
