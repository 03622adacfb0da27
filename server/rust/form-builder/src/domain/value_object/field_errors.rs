use std::collections::BTreeMap;

use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

/// フィールド名 → エラーメッセージの対応表。レスポンスの `errors` にそのまま載せる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Keeps the first message recorded for a field.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// validator のネストしたエラーを `fields[0].label` 形式のキーに平坦化する。
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut out = Self::new();
        flatten("", errors, &mut out);
        out
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join(", "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        Self::from_validation(&errors)
    }
}

fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(first) = list.first() {
                    let message = first
                        .message
                        .as_ref()
                        .map_or_else(|| first.code.to_string(), ToString::to_string);
                    out.insert(key, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(&key, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(&format!("{key}[{index}]"), inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Child {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        label: String,
    }

    #[derive(Validate)]
    struct Parent {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        name: String,
        #[validate(nested)]
        children: Vec<Child>,
    }

    #[test]
    fn test_flatten_nested_list_errors() {
        let parent = Parent {
            name: String::new(),
            children: vec![
                Child { label: "ok".to_string() },
                Child { label: String::new() },
            ],
        };
        let errors = FieldErrors::from_validation(&parent.validate().unwrap_err());
        assert_eq!(errors.get("name"), Some("This field may not be blank."));
        assert_eq!(errors.get("children[1].label"), Some("This field may not be blank."));
        assert_eq!(serde_json::to_value(&errors).unwrap().as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_insert_keeps_first_message() {
        let mut errors = FieldErrors::single("field_values", "Name is required");
        errors.insert("field_values", "Email is required");
        assert_eq!(errors.get("field_values"), Some("Name is required"));
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let errors = FieldErrors::single("name", "This field may not be blank.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"name": "This field may not be blank."}));
    }
}
