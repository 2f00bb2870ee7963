//! Input Specifications
//!
//! Declarative validation/filtering rules derived from the element tree.
//! Nothing here runs a validator; the specs are handed to an external
//! input filter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::elements::Options;

/// Reference to a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

/// Reference to a validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub break_chain_on_failure: bool,
}

impl ValidatorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::new(),
            break_chain_on_failure: false,
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Stop the validator chain when this one fails
    pub fn breaking(mut self) -> Self {
        self.break_chain_on_failure = true;
        self
    }

    /// Wrap into an `Explode` validator that applies `self` to every item
    /// of a multi-value submission
    pub fn exploded(self) -> Self {
        let inner = serde_json::to_value(&self).unwrap_or(JsonValue::Null);
        ValidatorSpec::new("Explode").with_option("validator", inner)
    }
}

/// Specification for a single input
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_if_empty: Option<bool>,
}

impl InputSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Input with no rules and `required` explicitly off
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name).required(false)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_validator(mut self, validator: ValidatorSpec) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_validators(mut self, validators: impl IntoIterator<Item = ValidatorSpec>) -> Self {
        self.validators.extend(validators);
        self
    }
}

/// Derived validation tree for a whole fieldset or form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputFilterSpec {
    /// Leaf input
    Input(InputSpec),
    /// Nested fieldset
    Group { inputs: IndexMap<String, InputFilterSpec> },
    /// Repeated entries validated against one target spec
    Collection {
        count: usize,
        target: Box<InputFilterSpec>,
    },
}

impl InputFilterSpec {
    pub fn as_input(&self) -> Option<&InputSpec> {
        match self {
            Self::Input(spec) => Some(spec),
            _ => None,
        }
    }

    /// Look up a direct child of a group
    pub fn get(&self, name: &str) -> Option<&InputFilterSpec> {
        match self {
            Self::Group { inputs } => inputs.get(name),
            _ => None,
        }
    }

    /// Walk a path of names through nested groups and collection targets
    pub fn find(&self, path: &[&str]) -> Option<&InputFilterSpec> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            Self::Group { inputs } => inputs.get(*first)?.find(rest),
            Self::Collection { target, .. } => target.find(path),
            Self::Input(_) => None,
        }
    }
}

/// Capability: an element that declares its own input specification
pub trait InputProvider {
    fn input_specification(&self) -> Option<InputSpec>;
}

/// Capability: a fieldset that declares raw per-field rules
pub trait InputFilterProvider {
    fn input_filter_specification(&self) -> IndexMap<String, InputSpec>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_spec_serialization() {
        let spec = InputSpec::new("age")
            .required(true)
            .with_filter(FilterSpec::new("StringTrim"))
            .with_validator(ValidatorSpec::new("GreaterThan").with_option("min", 18));

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            json!({
                "name": "age",
                "required": true,
                "filters": [{"name": "StringTrim"}],
                "validators": [{"name": "GreaterThan", "options": {"min": 18}}]
            })
        );
    }

    #[test]
    fn test_input_spec_deserialization() {
        let spec: InputSpec = serde_json::from_value(json!({
            "required": true,
            "validators": [{"name": "NotEmpty", "break_chain_on_failure": true}]
        }))
        .unwrap();
        assert!(spec.name.is_none());
        assert!(spec.validators[0].break_chain_on_failure);
    }

    #[test]
    fn test_exploded_validator() {
        let v = ValidatorSpec::new("InArray").exploded();
        assert_eq!(v.name, "Explode");
        assert_eq!(v.options.get("validator"), Some(&json!({"name": "InArray"})));
    }

    #[test]
    fn test_find_path() {
        let mut inner = IndexMap::new();
        inner.insert("city".to_string(), InputFilterSpec::Input(InputSpec::new("city")));
        let mut outer = IndexMap::new();
        outer.insert(
            "addresses".to_string(),
            InputFilterSpec::Collection {
                count: 2,
                target: Box::new(InputFilterSpec::Group { inputs: inner }),
            },
        );
        let root = InputFilterSpec::Group { inputs: outer };

        let city = root.find(&["addresses", "city"]).and_then(InputFilterSpec::as_input);
        assert_eq!(city.and_then(|s| s.name.as_deref()), Some("city"));
        assert!(matches!(root.find(&["addresses"]), Some(InputFilterSpec::Collection { .. })));
        assert!(root.find(&["addresses", "street"]).is_none());
        assert!(root.find(&["missing"]).is_none());
    }

    #[test]
    fn test_optional_input_has_no_rules() {
        let spec = InputSpec::optional("nickname");
        assert!(!spec.required);
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({"name": "nickname", "required": false})
        );
    }
}
