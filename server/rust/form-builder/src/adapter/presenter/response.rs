use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entity::form_field::FormField;
use crate::domain::entity::form_template::FormTemplate;
use crate::domain::entity::record::{FieldValue, Record};
use crate::domain::value_object::field_errors::FieldErrors;
use crate::domain::value_object::field_type::FieldType;
use crate::domain::value_object::page::Page;

#[derive(Debug, Serialize)]
pub struct FormFieldResponse {
    pub id: Uuid,
    pub label: String,
    pub field_type: FieldType,
    pub field_type_display: &'static str,
    pub placeholder: Option<String>,
    pub options: Option<Vec<String>>,
    pub required: bool,
    pub order: u32,
}

impl From<&FormField> for FormFieldResponse {
    fn from(field: &FormField) -> Self {
        Self {
            id: field.id,
            label: field.label.clone(),
            field_type: field.field_type,
            field_type_display: field.field_type.display_name(),
            placeholder: field.placeholder.clone(),
            options: field.options.clone(),
            required: field.required,
            order: field.order,
        }
    }
}

/// フィールドは order 昇順で返す。
#[derive(Debug, Serialize)]
pub struct FormTemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Vec<FormFieldResponse>,
}

impl From<&FormTemplate> for FormTemplateResponse {
    fn from(template: &FormTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name.clone(),
            description: template.description.clone(),
            created_by: template.created_by.clone(),
            created_at: template.created_at,
            updated_at: template.updated_at,
            fields: template
                .ordered_fields()
                .into_iter()
                .map(FormFieldResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldValueResponse {
    pub id: Uuid,
    pub form_field: Uuid,
    pub field_label: String,
    pub field_type: FieldType,
    pub value: Option<String>,
}

impl From<&FieldValue> for FieldValueResponse {
    fn from(value: &FieldValue) -> Self {
        Self {
            id: value.id,
            form_field: value.field_id,
            field_label: value.field_label.clone(),
            field_type: value.field_type,
            value: value.value.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub form_template: Uuid,
    pub form_template_name: String,
    pub display_name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub field_values: Vec<FieldValueResponse>,
    pub values_by_label: BTreeMap<String, Option<String>>,
}

impl From<&Record> for EmployeeResponse {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            form_template: record.template_id,
            form_template_name: record.template_name.clone(),
            display_name: record.display_name(),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            field_values: record.field_values.iter().map(FieldValueResponse::from).collect(),
            values_by_label: record.values_by_label(),
        }
    }
}

/// ページ番号ベースの一覧レスポンス。`next` / `previous` はページ番号。
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub success: bool,
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub page: u32,
    pub page_size: u32,
    #[serde(flatten)]
    pub results: BTreeMap<&'static str, Vec<T>>,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(key: &'static str, page: Page<T>) -> Self {
        let next = page.next();
        let previous = page.previous();
        Self {
            success: true,
            count: page.total,
            next,
            previous,
            page: page.page,
            page_size: page.page_size,
            results: BTreeMap::from([(key, page.items)]),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::page::PageRequest;

    #[test]
    fn test_paginated_response_shape() {
        let page = Page::new(vec![1, 2], 12, &PageRequest::new(1, 2));
        let json = serde_json::to_value(PaginatedResponse::new("employees", page)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 12);
        assert_eq!(json["next"], 2);
        assert!(json["previous"].is_null());
        assert_eq!(json["employees"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_field_response_includes_type_label() {
        let field = FormField {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            label: "Department".to_string(),
            field_type: FieldType::Select,
            placeholder: None,
            options: Some(vec!["Sales".to_string()]),
            required: false,
            order: 0,
        };
        let json = serde_json::to_value(FormFieldResponse::from(&field)).unwrap();
        assert_eq!(json["field_type"], "select");
        assert_eq!(json["field_type_display"], "Select/Dropdown");
    }

    #[test]
    fn test_error_response_omits_empty_errors() {
        let body = ErrorResponse {
            success: false,
            code: "SYS_FORMS_RECORD_NOT_FOUND".to_string(),
            message: "Employee not found".to_string(),
            errors: None,
        };
        let json = serde_json::to_value(body).unwrap();
        assert!(json.get("errors").is_none());
    }
}
