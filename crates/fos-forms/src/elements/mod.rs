//! Form Elements Module
//!
//! Leaf elements and the per-kind configuration they are built from.

mod checkbox;
mod date;
mod element;
mod email;
mod input;
mod number;
mod select;

pub use checkbox::CheckboxOptions;
pub use date::{DateOptions, DEFAULT_DATE_FORMAT};
pub use element::Element;
pub use email::EMAIL_PATTERN;
pub use input::InputType;
pub use number::{NumberOptions, NumericBounds};
pub use select::{SelectOptions, ValueOption};

use serde_json::Value as JsonValue;

use crate::attributes::Attributes;
use crate::input_spec::{FilterSpec, ValidatorSpec};
use crate::value::Value;

/// Free-form options bag, in insertion order
pub type Options = serde_json::Map<String, JsonValue>;

/// Concrete element kind with its typed configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ElementKind {
    /// Base element with no type of its own
    #[default]
    Plain,
    Input(InputType),
    Textarea,
    Checkbox(CheckboxOptions),
    Number(NumberOptions),
    Select(SelectOptions),
    Date(DateOptions),
}

impl ElementKind {
    /// Resolve a factory type name
    pub fn from_type(name: &str) -> Option<Self> {
        let kind = match name.to_lowercase().as_str() {
            "element" => Self::Plain,
            "textarea" => Self::Textarea,
            "checkbox" => Self::Checkbox(CheckboxOptions::default()),
            "number" => Self::Number(NumberOptions::default()),
            "range" => Self::Number(NumberOptions { range: true }),
            "select" => Self::Select(SelectOptions::default()),
            "date" => Self::Date(DateOptions::default()),
            other => Self::Input(InputType::parse(other)?),
        };
        Some(kind)
    }

    /// Factory type name of this kind
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Plain => "element",
            Self::Textarea => "textarea",
            Self::Select(_) => "select",
            _ => self.type_attribute().unwrap_or("element"),
        }
    }

    /// Value of the `type` attribute, for kinds rendered as `<input>`
    pub fn type_attribute(&self) -> Option<&'static str> {
        match self {
            Self::Plain | Self::Textarea | Self::Select(_) => None,
            Self::Input(ty) => Some(ty.as_str()),
            Self::Checkbox(_) => Some("checkbox"),
            Self::Number(NumberOptions { range: true }) => Some("range"),
            Self::Number(_) => Some("number"),
            Self::Date(_) => Some("date"),
        }
    }

    /// Re-read the options bag into the typed configuration
    pub fn configure(&mut self, options: &Options) {
        match self {
            Self::Checkbox(opts) => *opts = CheckboxOptions::from_options(options),
            Self::Select(opts) => *opts = SelectOptions::from_options(options),
            Self::Date(opts) => *opts = DateOptions::from_options(options),
            _ => {}
        }
    }

    pub(crate) fn coerce(&self, value: Value) -> Value {
        match self {
            Self::Checkbox(opts) => opts.coerce(&value),
            _ => value,
        }
    }

    /// Whether this kind declares its own input specification
    pub fn provides_input(&self) -> bool {
        !matches!(
            self,
            Self::Plain | Self::Textarea | Self::Input(
                InputType::Text | InputType::Password | InputType::Tel | InputType::Url
                    | InputType::Search | InputType::Color | InputType::Hidden
                    | InputType::Submit | InputType::Button
            )
        )
    }

    pub(crate) fn filters(&self, attributes: &Attributes) -> Vec<FilterSpec> {
        match self {
            Self::Input(InputType::Email) => email::filters(),
            Self::Number(_) | Self::Date(_) => vec![FilterSpec::new("StringTrim")],
            Self::Select(opts) => opts.filters(attributes.is_set("multiple")),
            _ => Vec::new(),
        }
    }

    pub(crate) fn validators(&self, attributes: &Attributes) -> Vec<ValidatorSpec> {
        match self {
            Self::Input(InputType::Email) => email::validators(attributes.is_set("multiple")),
            Self::Checkbox(opts) => opts.validators(),
            Self::Number(opts) => opts.validators(attributes),
            Self::Select(opts) => opts.validators(attributes.is_set("multiple")),
            Self::Date(opts) => opts.validators(attributes),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn option_bool(options: &Options, key: &str, default: bool) -> bool {
    match options.get(key) {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_i64().map_or(default, |n| n != 0),
        Some(JsonValue::String(s)) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        _ => default,
    }
}

pub(crate) fn option_string(options: &Options, key: &str) -> Option<String> {
    match options.get(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn option_i64(options: &Options, key: &str) -> Option<i64> {
    match options.get(key)? {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
