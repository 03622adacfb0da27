use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::entity::form_field::{build_fields, CreateFormField, FormField};

/// 実行時に定義されるフォームのスキーマ。フィールドは order 昇順で並ぶ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Vec<FormField>,
}

impl FormTemplate {
    pub fn new(
        name: String,
        description: Option<String>,
        created_by: String,
        specs: Vec<CreateFormField>,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            name,
            description,
            created_by,
            created_at: now,
            updated_at: now,
            fields: build_fields(id, specs),
        }
    }

    /// Drops every current field and rebuilds the list from `specs`.
    pub fn replace_fields(&mut self, specs: Vec<CreateFormField>) {
        self.fields = build_fields(self.id, specs);
        self.updated_at = Utc::now();
    }

    /// Fields in display order. Equal orders keep their stored sequence.
    pub fn ordered_fields(&self) -> Vec<&FormField> {
        let mut fields: Vec<&FormField> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    pub fn field(&self, field_id: Uuid) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FormField> {
        self.ordered_fields().into_iter().filter(|f| f.required)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateFormTemplate {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "This field may not be blank and must be at most 255 characters."
    ))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<CreateFormField>,
}

/// 名前・説明の更新とフィールドの全置換を同時に行う入力。
/// name / description が None の場合は既存値を維持する。
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateFormTemplate {
    #[validate(length(
        min = 1,
        max = 255,
        message = "This field may not be blank and must be at most 255 characters."
    ))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<CreateFormField>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ReplaceFormFields {
    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<CreateFormField>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::field_type::FieldType;

    fn spec(label: &str, required: bool) -> CreateFormField {
        CreateFormField {
            label: label.to_string(),
            required,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_template_owns_fields() {
        let t = FormTemplate::new(
            "Onboarding".to_string(),
            None,
            "user-1".to_string(),
            vec![spec("Name", true), spec("Email", false)],
        );
        assert_eq!(t.fields.len(), 2);
        assert!(t.fields.iter().all(|f| f.template_id == t.id));
        assert_eq!(t.created_at, t.updated_at);
    }

    #[test]
    fn test_replace_fields_issues_new_ids() {
        let mut t = FormTemplate::new(
            "Onboarding".to_string(),
            None,
            "user-1".to_string(),
            vec![spec("Name", true)],
        );
        let old_id = t.fields[0].id;
        t.replace_fields(vec![spec("Name", true)]);
        assert_eq!(t.fields.len(), 1);
        assert_ne!(t.fields[0].id, old_id);
        assert_eq!(t.fields[0].label, "Name");
        assert_eq!(t.fields[0].order, 0);
    }

    #[test]
    fn test_ordered_fields_sorts_by_order() {
        let mut t = FormTemplate::new(
            "Onboarding".to_string(),
            None,
            "user-1".to_string(),
            vec![spec("A", false), spec("B", true), spec("C", true)],
        );
        t.fields[0].order = 2;
        t.fields[1].order = 1;
        t.fields[2].order = 0;
        let labels: Vec<&str> = t.ordered_fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["C", "B", "A"]);
        let required: Vec<&str> = t.required_fields().map(|f| f.label.as_str()).collect();
        assert_eq!(required, vec!["C", "B"]);
    }

    #[test]
    fn test_create_input_requires_name() {
        let input: CreateFormTemplate = serde_json::from_value(serde_json::json!({
            "fields": [{"label": "Name", "field_type": "text"}]
        }))
        .unwrap();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert_eq!(input.fields[0].parsed_field_type(), FieldType::Text);
    }

    #[test]
    fn test_update_input_name_optional() {
        let input: UpdateFormTemplate =
            serde_json::from_value(serde_json::json!({"fields": []})).unwrap();
        assert!(input.validate().is_ok());
        assert!(input.name.is_none());
    }
}
