//! Label Capability
//!
//! Label text plus label-specific attributes and options, shared by every
//! element kind that renders a caption.

use serde_json::Value as JsonValue;

use crate::attributes::Attributes;
use crate::elements::Options;

/// Label state - caption for a form control
#[derive(Debug, Clone, Default)]
pub struct Label {
    /// Label text
    pub text: Option<String>,
    /// Attributes rendered on the label tag
    pub attributes: Attributes,
    /// Free-form label options (`disable_html_escape`, `label_position`, ...)
    pub options: Options,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Label capability
pub trait LabelAware {
    fn label_state(&self) -> &Label;

    fn label_state_mut(&mut self) -> &mut Label;

    /// Get the label text
    fn label(&self) -> Option<&str> {
        self.label_state().text.as_deref()
    }

    /// Set the label text
    fn set_label(&mut self, text: &str) {
        self.label_state_mut().text = Some(text.to_string());
    }

    fn label_attributes(&self) -> &Attributes {
        &self.label_state().attributes
    }

    /// Merge attributes onto the label tag
    fn set_label_attributes<I, K>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
        Self: Sized,
    {
        let label = self.label_state_mut();
        for (key, value) in attributes {
            label.attributes.set(key, value);
        }
    }

    /// The control this label is for
    fn html_for(&self) -> Option<&str> {
        self.label_state().attributes.get_str("for")
    }

    fn label_options(&self) -> &Options {
        &self.label_state().options
    }

    /// Replace label options
    fn set_label_options(&mut self, options: Options) {
        self.label_state_mut().options = options;
    }

    fn set_label_option(&mut self, key: &str, value: JsonValue) {
        self.label_state_mut().options.insert(key.to_string(), value);
    }

    fn label_option(&self, key: &str) -> Option<&JsonValue> {
        self.label_state().options.get(key)
    }

    fn has_label_option(&self, key: &str) -> bool {
        self.label_state().options.contains_key(key)
    }

    fn remove_label_option(&mut self, key: &str) -> Option<JsonValue> {
        self.label_state_mut().options.remove(key)
    }

    /// Pick the label keys out of an options bag.
    ///
    /// A label that is not a string, or label attributes/options that are not
    /// maps, are ignored.
    fn apply_label_options(&mut self, options: &Options) {
        let label = self.label_state_mut();
        if let Some(JsonValue::String(text)) = options.get("label") {
            label.text = Some(text.clone());
        }
        if let Some(JsonValue::Object(attributes)) = options.get("label_attributes") {
            for (key, value) in attributes {
                label.attributes.set(key.clone(), value.clone());
            }
        }
        if let Some(JsonValue::Object(label_options)) = options.get("label_options") {
            label.options = label_options.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Captioned {
        label: Label,
    }

    impl LabelAware for Captioned {
        fn label_state(&self) -> &Label {
            &self.label
        }

        fn label_state_mut(&mut self) -> &mut Label {
            &mut self.label
        }
    }

    fn options(value: JsonValue) -> Options {
        match value {
            JsonValue::Object(map) => map,
            _ => Options::new(),
        }
    }

    #[test]
    fn test_label() {
        let mut control = Captioned::default();
        control.set_label("Username");
        control.set_label_attributes([("for", json!("username"))]);

        assert_eq!(control.label(), Some("Username"));
        assert_eq!(control.html_for(), Some("username"));
    }

    #[test]
    fn test_apply_label_options() {
        let mut control = Captioned::default();
        control.apply_label_options(&options(json!({
            "label": "Email",
            "label_attributes": {"class": "required"},
            "label_options": {"disable_html_escape": true}
        })));

        assert_eq!(control.label(), Some("Email"));
        assert_eq!(control.label_attributes().get_str("class"), Some("required"));
        assert_eq!(control.label_option("disable_html_escape"), Some(&json!(true)));
    }

    #[test]
    fn test_non_string_label_is_ignored() {
        let mut control = Captioned::default();
        control.set_label("Kept");
        control.apply_label_options(&options(json!({"label": 42})));
        assert_eq!(control.label(), Some("Kept"));
    }

    #[test]
    fn test_label_option_roundtrip() {
        let mut control = Captioned::default();
        control.set_label_option("position", json!("append"));
        assert!(control.has_label_option("position"));
        assert_eq!(control.remove_label_option("position"), Some(json!("append")));
        assert!(!control.has_label_option("position"));
    }
}
