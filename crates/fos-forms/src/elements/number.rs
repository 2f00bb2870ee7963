//! Number and Range Elements
//!
//! Bounds and step come from the `min`, `max` and `step` attributes, the
//! same way a browser reads them.

use serde_json::Value as JsonValue;

use crate::attributes::Attributes;
use crate::input_spec::ValidatorSpec;

const NUMBER_PATTERN: &str = r"(^-?\d*(\.\d+)?$)";

/// Number configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberOptions {
    /// Range slider: bounds default to 0..=100
    pub range: bool,
}

/// Numeric constraints read from attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericBounds {
    pub min: Option<JsonValue>,
    pub max: Option<JsonValue>,
    pub step: Option<JsonValue>,
}

impl NumericBounds {
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let read = |name: &str| attributes.get(name).filter(|v| !v.is_null()).cloned();
        Self {
            min: read("min"),
            max: read("max"),
            step: read("step"),
        }
    }

    /// `step="any"` disables step validation
    pub fn step_is_any(&self) -> bool {
        matches!(&self.step, Some(JsonValue::String(s)) if s.eq_ignore_ascii_case("any"))
    }
}

impl NumberOptions {
    pub fn validators(&self, attributes: &Attributes) -> Vec<ValidatorSpec> {
        let mut bounds = NumericBounds::from_attributes(attributes);
        if self.range {
            bounds.min.get_or_insert(JsonValue::from(0));
            bounds.max.get_or_insert(JsonValue::from(100));
        }

        let mut validators = vec![
            ValidatorSpec::new("Regex").with_option("pattern", NUMBER_PATTERN),
        ];
        if let Some(min) = &bounds.min {
            validators.push(ValidatorSpec::new("GreaterThan")
                .with_option("min", min.clone())
                .with_option("inclusive", true));
        }
        if let Some(max) = &bounds.max {
            validators.push(ValidatorSpec::new("LessThan")
                .with_option("max", max.clone())
                .with_option("inclusive", true));
        }
        if !bounds.step_is_any() {
            validators.push(ValidatorSpec::new("Step")
                .with_option("base_value", bounds.min.clone().unwrap_or(JsonValue::from(0)))
                .with_option("step", bounds.step.clone().unwrap_or(JsonValue::from(1))));
        }
        validators
    }
}
