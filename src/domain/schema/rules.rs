//! Validation rules attached to property definitions and classes.
//!
//! A rule is a predicate plus a human-readable message template. Templates may
//! reference `{display_name}` and `{value}`.

use crate::domain::bo::BusinessObject;
use crate::domain::value::PropValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Contract for a per-property validation rule.
///
/// Rules are only consulted for non-null values; a missing value is handled
/// by the compulsory check on the property definition.
pub trait PropRule: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn is_valid(&self, value: &PropValue) -> bool;

    fn message_template(&self) -> &str;

    /// Renders the failure message for `value` on the property shown as `display_name`.
    fn message(&self, display_name: &str, value: &PropValue) -> String {
        self.message_template()
            .replace("{display_name}", display_name)
            .replace("{value}", &value.to_string())
    }
}

/// Contract for a class-level rule checked against the whole object.
pub trait ObjectRule: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Returns a failure message, or `None` when the object satisfies the rule.
    fn check(&self, bo: &BusinessObject) -> Option<String>;
}

/// Bounds the character length of a string value.
#[derive(Debug, Clone)]
pub struct LengthRule {
    pub min: Option<usize>,
    pub max: Option<usize>,
    template: String,
}

impl LengthRule {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        let template = match (min, max) {
            (Some(min), Some(max)) => format!(
                "'{{display_name}}' must be between {} and {} characters long",
                min, max
            ),
            (None, Some(max)) => {
                format!("'{{display_name}}' cannot be longer than {} characters", max)
            }
            (Some(min), None) => {
                format!("'{{display_name}}' must be at least {} characters long", min)
            }
            (None, None) => String::new(),
        };
        Self { min, max, template }
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }
}

impl PropRule for LengthRule {
    fn name(&self) -> &str {
        "length"
    }

    fn is_valid(&self, value: &PropValue) -> bool {
        let Some(s) = value.as_str() else {
            return true;
        };
        let len = s.chars().count();
        self.min.map_or(true, |min| len >= min) && self.max.map_or(true, |max| len <= max)
    }

    fn message_template(&self) -> &str {
        &self.template
    }
}

/// Bounds a numeric value (integer or decimal).
#[derive(Debug, Clone)]
pub struct RangeRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
    template: String,
}

impl RangeRule {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        let template = match (min, max) {
            (Some(min), Some(max)) => format!(
                "'{{display_name}}' must be between {} and {} (was {{value}})",
                min, max
            ),
            (None, Some(max)) => {
                format!("'{{display_name}}' cannot be greater than {} (was {{value}})", max)
            }
            (Some(min), None) => {
                format!("'{{display_name}}' cannot be less than {} (was {{value}})", min)
            }
            (None, None) => String::new(),
        };
        Self { min, max, template }
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }
}

impl PropRule for RangeRule {
    fn name(&self) -> &str {
        "range"
    }

    fn is_valid(&self, value: &PropValue) -> bool {
        let Some(n) = value.as_f64() else {
            return true;
        };
        self.min.map_or(true, |min| n >= min) && self.max.map_or(true, |max| n <= max)
    }

    fn message_template(&self) -> &str {
        &self.template
    }
}

/// A rule backed by an arbitrary predicate.
#[derive(Clone)]
pub struct PredicateRule {
    name: String,
    predicate: Arc<dyn Fn(&PropValue) -> bool + Send + Sync>,
    template: String,
}

impl PredicateRule {
    pub fn new<F>(name: impl Into<String>, template: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&PropValue) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            template: template.into(),
        }
    }
}

impl fmt::Debug for PredicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRule")
            .field("name", &self.name)
            .field("template", &self.template)
            .finish()
    }
}

impl PropRule for PredicateRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self, value: &PropValue) -> bool {
        (self.predicate)(value)
    }

    fn message_template(&self) -> &str {
        &self.template
    }
}

/// Serializable rule declarations as they appear in schema definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleDefinition {
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
        #[serde(default)]
        message: Option<String>,
    },
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl RuleDefinition {
    pub fn into_rule(self) -> Arc<dyn PropRule> {
        match self {
            RuleDefinition::Length { min, max, message } => {
                let rule = LengthRule::new(min, max);
                Arc::new(match message {
                    Some(m) => rule.with_message(m),
                    None => rule,
                })
            }
            RuleDefinition::Range { min, max, message } => {
                let rule = RangeRule::new(min, max);
                Arc::new(match message {
                    Some(m) => rule.with_message(m),
                    None => rule,
                })
            }
        }
    }
}
