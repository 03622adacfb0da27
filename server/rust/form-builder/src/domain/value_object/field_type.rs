use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// フォームフィールドの入力種別。値は型に関係なくテキストとして保存する。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Email,
    Password,
    Date,
    Textarea,
    Select,
    Checkbox,
    File,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        Self::Text,
        Self::Number,
        Self::Email,
        Self::Password,
        Self::Date,
        Self::Textarea,
        Self::Select,
        Self::Checkbox,
        Self::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Email => "email",
            Self::Password => "password",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::File => "file",
        }
    }

    /// Human readable name shown in form builders.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Number => "Number",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::Date => "Date",
            Self::Textarea => "Text Area",
            Self::Select => "Select/Dropdown",
            Self::Checkbox => "Checkbox",
            Self::File => "File Upload",
        }
    }

    pub fn json_schema_type(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Checkbox => "boolean",
            _ => "string",
        }
    }

    pub fn json_schema_format(&self) -> Option<&'static str> {
        match self {
            Self::Email => Some("email"),
            Self::Password => Some("password"),
            Self::Date => Some("date"),
            Self::File => Some("binary"),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidFieldType(pub String);

impl FromStr for FieldType {
    type Err = InvalidFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| InvalidFieldType(s.to_string()))
    }
}
