//! Input Types
//!
//! Supported HTML input types and how they map to element kinds.

/// HTML input types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Password,
    Email,
    Number,
    Tel,
    Url,
    Search,
    Date,
    Color,
    Range,
    Hidden,
    Checkbox,
    Submit,
    Button,
}

impl InputType {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        let ty = match s.to_lowercase().as_str() {
            "text" => Self::Text,
            "password" => Self::Password,
            "email" => Self::Email,
            "number" => Self::Number,
            "tel" => Self::Tel,
            "url" => Self::Url,
            "search" => Self::Search,
            "date" => Self::Date,
            "color" => Self::Color,
            "range" => Self::Range,
            "hidden" => Self::Hidden,
            "checkbox" => Self::Checkbox,
            "submit" => Self::Submit,
            "button" => Self::Button,
            _ => return None,
        };
        Some(ty)
    }

    /// Value of the `type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Email => "email",
            Self::Number => "number",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Search => "search",
            Self::Date => "date",
            Self::Color => "color",
            Self::Range => "range",
            Self::Hidden => "hidden",
            Self::Checkbox => "checkbox",
            Self::Submit => "submit",
            Self::Button => "button",
        }
    }

    /// Check if this is a text-like input
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::Password | Self::Email |
                       Self::Number | Self::Tel | Self::Url | Self::Search)
    }

    /// Check if this is a button type
    pub fn is_button(&self) -> bool {
        matches!(self, Self::Submit | Self::Button)
    }
}
