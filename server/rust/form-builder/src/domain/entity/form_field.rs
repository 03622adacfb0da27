use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::value_object::field_type::FieldType;

/// テンプレートに属する 1 つの入力欄の定義。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub id: Uuid,
    pub template_id: Uuid,
    pub label: String,
    pub field_type: FieldType,
    pub placeholder: Option<String>,
    pub options: Option<Vec<String>>,
    pub required: bool,
    pub order: u32,
}

/// Field specification submitted when a template is created or its field list replaced.
///
/// `order` is accepted on the wire but never used: fields are ordered by their
/// position in the submitted list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateFormField {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "This field may not be blank and must be at most 255 characters."
    ))]
    pub label: String,
    #[serde(default)]
    #[validate(custom(function = "validate_field_type"))]
    pub field_type: Option<String>,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub placeholder: Option<String>,
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: Option<u32>,
}

impl CreateFormField {
    /// 未指定の場合は text とみなす。validate() 済みであることが前提。
    pub fn parsed_field_type(&self) -> FieldType {
        self.field_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    pub fn into_field(self, template_id: Uuid, position: usize) -> FormField {
        FormField {
            id: Uuid::new_v4(),
            template_id,
            field_type: self.parsed_field_type(),
            label: self.label,
            placeholder: self.placeholder,
            options: self.options,
            required: self.required,
            order: u32::try_from(position).unwrap_or(u32::MAX),
        }
    }
}

fn validate_field_type(value: &str) -> Result<(), ValidationError> {
    value.parse::<FieldType>().map(|_| ()).map_err(|e| {
        ValidationError::new("invalid_choice").with_message(Cow::Owned(e.to_string()))
    })
}

/// Builds field definitions with positional, zero-based order.
pub fn build_fields(template_id: Uuid, specs: Vec<CreateFormField>) -> Vec<FormField> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| spec.into_field(template_id, i))
        .collect()
}
