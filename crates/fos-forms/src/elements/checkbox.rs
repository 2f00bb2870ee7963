//! Checkbox Element
//!
//! Two-state control submitting either a checked or an unchecked value.

use serde_json::Value as JsonValue;

use super::{option_bool, option_string, Options};
use crate::input_spec::ValidatorSpec;
use crate::value::Value;

/// Checkbox configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxOptions {
    /// Render a hidden input carrying the unchecked value
    pub use_hidden_element: bool,
    pub checked_value: String,
    pub unchecked_value: String,
}

impl Default for CheckboxOptions {
    fn default() -> Self {
        Self {
            use_hidden_element: true,
            checked_value: "1".to_string(),
            unchecked_value: "0".to_string(),
        }
    }
}

impl CheckboxOptions {
    pub fn from_options(options: &Options) -> Self {
        let defaults = Self::default();
        Self {
            use_hidden_element: option_bool(options, "use_hidden_element", defaults.use_hidden_element),
            checked_value: option_string(options, "checked_value").unwrap_or(defaults.checked_value),
            unchecked_value: option_string(options, "unchecked_value").unwrap_or(defaults.unchecked_value),
        }
    }

    /// Submitted data arrives as strings, so compare string forms
    pub fn is_checked_value(&self, value: &Value) -> bool {
        value.to_form_string() == self.checked_value
    }

    /// Map any submitted value onto the checked or unchecked value
    pub fn coerce(&self, value: &Value) -> Value {
        if self.is_checked_value(value) {
            Value::String(self.checked_value.clone())
        } else {
            Value::String(self.unchecked_value.clone())
        }
    }

    pub fn validators(&self) -> Vec<ValidatorSpec> {
        if !self.use_hidden_element {
            return Vec::new();
        }
        vec![ValidatorSpec::new("InArray")
            .with_option("haystack", JsonValue::from(vec![
                self.checked_value.clone(),
                self.unchecked_value.clone(),
            ]))
            .with_option("strict", false)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts = CheckboxOptions::from_options(&Options::new());
        assert!(opts.use_hidden_element);
        assert_eq!(opts.checked_value, "1");
        assert_eq!(opts.unchecked_value, "0");
    }

    #[test]
    fn test_coerce() {
        let mut options = Options::new();
        options.insert("checked_value".into(), json!("yes"));
        options.insert("unchecked_value".into(), json!("no"));
        let opts = CheckboxOptions::from_options(&options);

        assert_eq!(opts.coerce(&Value::from("yes")), Value::from("yes"));
        assert_eq!(opts.coerce(&Value::from("anything")), Value::from("no"));
    }

    #[test]
    fn test_bool_maps_to_default_values() {
        let opts = CheckboxOptions::default();
        assert_eq!(opts.coerce(&Value::Bool(true)), Value::from("1"));
        assert_eq!(opts.coerce(&Value::Bool(false)), Value::from("0"));
    }

    #[test]
    fn test_validator_only_with_hidden_element() {
        let mut opts = CheckboxOptions::default();
        assert_eq!(opts.validators()[0].name, "InArray");
        opts.use_hidden_element = false;
        assert!(opts.validators().is_empty());
    }
}
