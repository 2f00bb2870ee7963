//! Date Element
//!
//! Format, range and step rules for `<input type="date">`. Values are
//! validated as strings; no locale formatting happens here.

use serde_json::Value as JsonValue;

use super::number::NumericBounds;
use super::{option_string, Options};
use crate::attributes::Attributes;
use crate::input_spec::ValidatorSpec;

pub const DEFAULT_DATE_FORMAT: &str = "Y-m-d";

const DEFAULT_BASE_DATE: &str = "1970-01-01";

/// Date configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DateOptions {
    pub format: String,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DateOptions {
    pub fn from_options(options: &Options) -> Self {
        Self {
            format: option_string(options, "format").unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
        }
    }

    pub fn validators(&self, attributes: &Attributes) -> Vec<ValidatorSpec> {
        let bounds = NumericBounds::from_attributes(attributes);
        let mut validators = vec![ValidatorSpec::new("Date").with_option("format", self.format.as_str())];

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
            let days = match &bounds.step {
                Some(JsonValue::Number(n)) => n.to_string(),
                Some(JsonValue::String(s)) => s.clone(),
                _ => "1".to_string(),
            };
            validators.push(ValidatorSpec::new("DateStep")
                .with_option("format", self.format.as_str())
                .with_option("base_value", bounds.min.clone().unwrap_or(JsonValue::from(DEFAULT_BASE_DATE)))
                .with_option("step", format!("P{days}D")));
        }
        validators
    }
}
