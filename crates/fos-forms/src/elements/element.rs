//! Element Implementation
//!
//! Named leaf node: attributes, a value, label metadata and validation
//! messages.

use std::cell::OnceCell;

use serde_json::Value as JsonValue;

use super::{ElementKind, InputType, Options};
use crate::attributes::Attributes;
use crate::input_spec::{InputProvider, InputSpec, ValidatorSpec};
use crate::label::{Label, LabelAware};
use crate::value::Value;

/// Attributes that feed the cached validator chain
const VALIDATION_ATTRIBUTES: [&str; 4] = ["min", "max", "step", "multiple"];

/// Form element
#[derive(Debug, Clone, Default)]
pub struct Element {
    attributes: Attributes,
    /// `None` when never set, `Some(Value::Null)` when deliberately unset
    value: Option<Value>,
    label: Label,
    options: Options,
    messages: Vec<String>,
    kind: ElementKind,
    validators: OnceCell<Vec<ValidatorSpec>>,
}

impl Element {
    /// Create a base element
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Plain)
    }

    /// Create an element without a name
    pub fn unnamed(kind: ElementKind) -> Self {
        let mut element = Self::default();
        element.set_kind(kind);
        element
    }

    /// Create an element of a given kind
    pub fn with_kind(name: impl Into<String>, kind: ElementKind) -> Self {
        let mut element = Self::unnamed(kind);
        element.set_name(name);
        element
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Input(InputType::Text))
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Input(InputType::Hidden))
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Input(InputType::Email))
    }

    pub fn submit(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Input(InputType::Submit))
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Textarea)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Number(Default::default()))
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Checkbox(Default::default()))
    }

    pub fn select(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Select(Default::default()))
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::with_kind(name, ElementKind::Date(Default::default()))
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Change the kind; the `type` attribute follows
    pub fn set_kind(&mut self, mut kind: ElementKind) {
        kind.configure(&self.options);
        match kind.type_attribute() {
            Some(ty) => {
                self.attributes.set("type", ty);
            }
            None => {
                self.attributes.remove("type");
            }
        }
        self.kind = kind;
        self.validators.take();
    }

    /// Get the element's name
    pub fn name(&self) -> Option<&str> {
        self.attributes.get_str("name")
    }

    /// Set the element's name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.attributes.set("name", name.into());
    }

    /// Replace the options bag and re-read recognized keys.
    ///
    /// Accepts a map or any stream of key/value pairs.
    pub fn set_options<I, K>(&mut self, options: I)
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        let options: Options = options.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.apply_label_options(&options);
        self.kind.configure(&options);
        self.options = options;
        self.validators.take();
    }

    /// Set a single option
    pub fn set_option(&mut self, key: &str, value: JsonValue) {
        let mut options = self.options.clone();
        options.insert(key.to_string(), value);
        self.set_options(options);
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    /// Set an attribute; `value` is routed to the value setter
    pub fn set_attribute(&mut self, key: &str, value: impl Into<JsonValue>) {
        let value = value.into();
        if key == "value" {
            self.set_value(value);
            return;
        }
        if VALIDATION_ATTRIBUTES.contains(&key) {
            self.validators.take();
        }
        self.attributes.set(key, value);
    }

    /// Set several attributes at once
    pub fn set_attributes<I, K>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: AsRef<str>,
    {
        for (key, value) in attributes {
            self.set_attribute(key.as_ref(), value);
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.has(key)
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<JsonValue> {
        if VALIDATION_ATTRIBUTES.contains(&key) {
            self.validators.take();
        }
        self.attributes.remove(key).map(|attr| attr.value)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Remove every attribute except the name
    pub fn clear_attributes(&mut self) {
        let name = self.name().map(str::to_string);
        self.attributes.clear();
        if let Some(name) = name {
            self.set_name(name);
        }
        self.validators.take();
    }

    /// Set the value, applying the kind's coercion
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = Some(self.kind.coerce(value.into()));
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether a value was ever assigned, including an explicit null
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Forget the value entirely
    pub fn reset_value(&mut self) {
        self.value = None;
    }

    /// Checkbox state; false for every other kind
    pub fn is_checked(&self) -> bool {
        match (&self.kind, &self.value) {
            (ElementKind::Checkbox(opts), Some(value)) => opts.is_checked_value(value),
            _ => false,
        }
    }

    /// Check or uncheck a checkbox; no effect on other kinds
    pub fn set_checked(&mut self, checked: bool) {
        if let ElementKind::Checkbox(opts) = &self.kind {
            let value = if checked { &opts.checked_value } else { &opts.unchecked_value };
            self.value = Some(Value::String(value.clone()));
        }
    }

    /// Disabled controls are never overwritten by submitted data
    pub fn is_disabled(&self) -> bool {
        self.attributes.is_set("disabled")
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn set_messages(&mut self, messages: Vec<String>) {
        self.messages = messages;
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }
}

impl LabelAware for Element {
    fn label_state(&self) -> &Label {
        &self.label
    }

    fn label_state_mut(&mut self) -> &mut Label {
        &mut self.label
    }
}

impl InputProvider for Element {
    fn input_specification(&self) -> Option<InputSpec> {
        if !self.kind.provides_input() {
            return None;
        }
        let validators = self
            .validators
            .get_or_init(|| self.kind.validators(&self.attributes))
            .clone();
        let mut spec = InputSpec::default()
            .required(true)
            .with_validators(validators);
        spec.name = self.name().map(str::to_string);
        spec.filters = self.kind.filters(&self.attributes);
        Some(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_is_an_attribute() {
        let mut element = Element::new("username");
        assert_eq!(element.name(), Some("username"));
        element.set_name("login");
        assert_eq!(element.attribute("name"), Some(&json!("login")));
    }

    #[test]
    fn test_value_attribute_routes_to_setter() {
        let mut element = Element::text("title");
        element.set_attribute("value", "hello");
        assert_eq!(element.value(), Some(&Value::from("hello")));
        assert!(!element.has_attribute("value"));
    }

    #[test]
    fn test_has_value_distinguishes_null() {
        let mut element = Element::text("title");
        assert!(!element.has_value());
        element.set_value(Value::Null);
        assert!(element.has_value());
        element.reset_value();
        assert!(!element.has_value());
    }

    #[test]
    fn test_options_pick_label_keys() {
        let mut element = Element::text("title");
        element.set_options([
            ("label", json!("Title")),
            ("label_attributes", json!({"class": "control-label"})),
            ("custom", json!(3)),
        ]);
        assert_eq!(element.label(), Some("Title"));
        assert_eq!(element.label_attributes().get_str("class"), Some("control-label"));
        assert_eq!(element.option("custom"), Some(&json!(3)));
    }

    #[test]
    fn test_type_attribute_follows_kind() {
        let element = Element::email("contact");
        assert_eq!(element.attribute("type"), Some(&json!("email")));
        assert!(Element::textarea("body").attribute("type").is_none());
    }

    #[test]
    fn test_checkbox_coercion() {
        let mut element = Element::checkbox("agree");
        element.set_value(true);
        assert_eq!(element.value(), Some(&Value::from("1")));
        assert!(element.is_checked());

        element.set_value("garbage");
        assert_eq!(element.value(), Some(&Value::from("0")));
        assert!(!element.is_checked());

        element.set_checked(true);
        assert!(element.is_checked());
    }

    #[test]
    fn test_checkbox_options_reconfigure() {
        let mut element = Element::checkbox("agree");
        element.set_options([("checked_value", json!("yes")), ("unchecked_value", json!("no"))]);
        element.set_value("yes");
        assert!(element.is_checked());
        let spec = element.input_specification().unwrap();
        assert_eq!(spec.validators[0].options.get("haystack"), Some(&json!(["yes", "no"])));
    }

    #[test]
    fn test_text_has_no_input_specification() {
        assert!(Element::text("title").input_specification().is_none());
        assert!(Element::new("plain").input_specification().is_none());
    }

    #[test]
    fn test_email_input_specification() {
        let spec = Element::email("contact").input_specification().unwrap();
        assert_eq!(spec.name.as_deref(), Some("contact"));
        assert!(spec.required);
        assert_eq!(spec.filters.len(), 2);
        assert_eq!(spec.validators[0].name, "Regex");
    }

    #[test]
    fn test_validator_cache_invalidated_by_attributes() {
        let mut element = Element::number("age");
        let before = element.input_specification().unwrap();
        assert_eq!(before.validators.len(), 2);

        element.set_attribute("min", 18);
        let after = element.input_specification().unwrap();
        assert_eq!(after.validators.len(), 3);
        assert_eq!(after.validators[1].name, "GreaterThan");
    }

    #[test]
    fn test_disabled() {
        let mut element = Element::text("locked");
        assert!(!element.is_disabled());
        element.set_attribute("disabled", true);
        assert!(element.is_disabled());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = Element::text("title");
        original.set_value("a");
        let mut copy = original.clone();
        copy.set_value("b");
        assert_eq!(original.value(), Some(&Value::from("a")));
    }
}
