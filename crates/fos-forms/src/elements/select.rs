//! Select Element
//!
//! Value options, optional empty option and the in-array check.

use serde_json::Value as JsonValue;

use super::{option_bool, option_string, Options};
use crate::input_spec::{FilterSpec, ValidatorSpec};

/// Option element
#[derive(Debug, Clone, PartialEq)]
pub struct ValueOption {
    pub value: String,
    pub label: String,
    pub disabled: bool,
    /// Label of the optgroup this option was declared in
    pub group: Option<String>,
}

impl ValueOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
            group: None,
        }
    }
}

/// Select configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectOptions {
    pub value_options: Vec<ValueOption>,
    /// Label of a leading option with an empty value
    pub empty_option: Option<String>,
    pub disable_inarray_validator: bool,
}

impl SelectOptions {
    pub fn from_options(options: &Options) -> Self {
        Self {
            value_options: options
                .get("value_options")
                .map(parse_value_options)
                .unwrap_or_default(),
            empty_option: option_string(options, "empty_option"),
            disable_inarray_validator: option_bool(options, "disable_inarray_validator", false),
        }
    }

    /// Values accepted by the in-array check
    pub fn haystack(&self) -> Vec<String> {
        self.value_options.iter().map(|o| o.value.clone()).collect()
    }

    pub fn filters(&self, multiple: bool) -> Vec<FilterSpec> {
        if self.empty_option.is_some() && !multiple {
            vec![FilterSpec::new("ToNull").with_option("type", "string")]
        } else {
            Vec::new()
        }
    }

    pub fn validators(&self, multiple: bool) -> Vec<ValidatorSpec> {
        if self.disable_inarray_validator {
            return Vec::new();
        }
        let in_array = ValidatorSpec::new("InArray")
            .with_option("haystack", JsonValue::from(self.haystack()))
            .with_option("strict", false);
        vec![if multiple { in_array.exploded() } else { in_array }]
    }
}

/// Accepts `{"value": "label"}`, `["value", ...]` or
/// `[{"value": .., "label": .., "disabled": ..}, ...]`; an entry carrying
/// `options` is an optgroup whose options are flattened in place
fn parse_value_options(raw: &JsonValue) -> Vec<ValueOption> {
    let mut parsed = Vec::new();
    collect_value_options(raw, None, &mut parsed);
    parsed
}

fn collect_value_options(raw: &JsonValue, group: Option<&str>, out: &mut Vec<ValueOption>) {
    match raw {
        JsonValue::Object(map) => {
            for (value, label) in map {
                match label {
                    JsonValue::Object(spec) if spec.contains_key("options") => push_group(spec, out),
                    JsonValue::Object(spec) => {
                        if let Some(option) = option_from_spec(spec, Some(value), group) {
                            out.push(option);
                        }
                    }
                    label => out.push(ValueOption {
                        group: group.map(str::to_string),
                        ..ValueOption::new(value.clone(), scalar_string(label))
                    }),
                }
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                match item {
                    JsonValue::Object(spec) if spec.contains_key("options") => push_group(spec, out),
                    JsonValue::Object(spec) => {
                        if let Some(option) = option_from_spec(spec, None, group) {
                            out.push(option);
                        }
                    }
                    scalar => {
                        let value = scalar_string(scalar);
                        out.push(ValueOption {
                            group: group.map(str::to_string),
                            ..ValueOption::new(value.clone(), value)
                        });
                    }
                }
            }
        }
        _ => {}
    }
}

fn push_group(spec: &serde_json::Map<String, JsonValue>, out: &mut Vec<ValueOption>) {
    let label = spec.get("label").map(scalar_string).unwrap_or_default();
    if let Some(options) = spec.get("options") {
        collect_value_options(options, Some(label.as_str()), out);
    }
}

fn option_from_spec(
    spec: &serde_json::Map<String, JsonValue>,
    key: Option<&String>,
    group: Option<&str>,
) -> Option<ValueOption> {
    let value = spec.get("value").map(scalar_string).or_else(|| key.cloned())?;
    let label = spec.get("label").map(scalar_string).unwrap_or_else(|| value.clone());
    Some(ValueOption {
        value,
        label,
        disabled: spec.get("disabled").and_then(JsonValue::as_bool).unwrap_or(false),
        group: group.map(str::to_string),
    })
}

fn scalar_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
