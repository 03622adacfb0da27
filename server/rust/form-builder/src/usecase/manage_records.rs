use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entity::form_template::FormTemplate;
use crate::domain::entity::record::Record;
use crate::domain::repository::{FormTemplateRepository, RecordRepository};
use crate::domain::service::field_value_service::{
    FieldValueResolver, ResolvedValues, FIELD_VALUES_KEY,
};
use crate::domain::value_object::field_errors::FieldErrors;
use crate::usecase::has_caller;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRecordInput {
    #[serde(default)]
    pub form_template: Option<Uuid>,
    #[serde(default)]
    pub field_values: BTreeMap<String, SubmittedValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecordInput {
    #[serde(default)]
    pub field_values: BTreeMap<String, SubmittedValue>,
}

/// 送信された 1 つの値。文字列と数値はテキストとして受け付け、それ以外は検証エラーにする。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedValue {
    Text(String),
    Rejected(&'static str),
}

impl From<&str> for SubmittedValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl<'de> Deserialize<'de> for SubmittedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Self::Text(text),
            Value::Number(number) => Self::Text(number.to_string()),
            Value::Null => Self::Rejected("This field may not be null."),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
                Self::Rejected("Not a valid string.")
            }
        })
    }
}

/// 値をテキストに揃える。受け付けられない値は `field_values.<key>` で報告する。
fn text_values(
    input: &BTreeMap<String, SubmittedValue>,
) -> Result<BTreeMap<String, String>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut values = BTreeMap::new();
    for (key, value) in input {
        match value {
            SubmittedValue::Text(text) => {
                values.insert(key.clone(), text.clone());
            }
            SubmittedValue::Rejected(message) => {
                errors.insert(format!("{FIELD_VALUES_KEY}.{key}"), *message);
            }
        }
    }
    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("employee record not found: {0}")]
    RecordNotFound(Uuid),
    #[error("form template not found: {0}")]
    TemplateNotFound(Uuid),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("authentication required")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for RecordError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct ManageRecordsUseCase {
    template_repo: Arc<dyn FormTemplateRepository>,
    record_repo: Arc<dyn RecordRepository>,
}

impl ManageRecordsUseCase {
    pub fn new(
        template_repo: Arc<dyn FormTemplateRepository>,
        record_repo: Arc<dyn RecordRepository>,
    ) -> Self {
        Self {
            template_repo,
            record_repo,
        }
    }

    pub async fn get_record(&self, id: Uuid) -> Result<Record, RecordError> {
        self.record_repo
            .find_by_id(id)
            .await?
            .ok_or(RecordError::RecordNotFound(id))
    }

    /// 必須フィールドが欠けている場合は何も保存しない。
    pub async fn create_record(
        &self,
        input: CreateRecordInput,
        created_by: &str,
    ) -> Result<Record, RecordError> {
        if !has_caller(created_by) {
            return Err(RecordError::Unauthorized);
        }
        let template_id = input.form_template.ok_or_else(|| {
            RecordError::Validation(FieldErrors::single("form_template", "This field is required."))
        })?;
        let template = self
            .template_repo
            .find_by_id(template_id)
            .await?
            .ok_or(RecordError::TemplateNotFound(template_id))?;

        let mut record = Record::new(template.id, template.name.clone(), created_by.to_string());
        let resolved = resolve(&template, record.id, &input.field_values)?;
        record.field_values = resolved.values;
        self.record_repo.create(&record).await?;

        tracing::info!(
            record_id = %record.id,
            template_id = %template.id,
            value_count = record.field_values.len(),
            created_by = %created_by,
            "employee record created"
        );
        Ok(record)
    }

    /// Upserts the submitted values. Values for fields that were not submitted are kept.
    pub async fn update_record(
        &self,
        id: Uuid,
        input: UpdateRecordInput,
        updated_by: &str,
    ) -> Result<Record, RecordError> {
        if !has_caller(updated_by) {
            return Err(RecordError::Unauthorized);
        }
        let existing = self.get_record(id).await?;
        let template = self
            .template_repo
            .find_by_id(existing.template_id)
            .await?
            .ok_or(RecordError::TemplateNotFound(existing.template_id))?;

        let resolved = resolve(&template, id, &input.field_values)?;
        if !self.record_repo.upsert_values(id, &resolved.values).await? {
            return Err(RecordError::RecordNotFound(id));
        }

        tracing::info!(
            record_id = %id,
            value_count = resolved.values.len(),
            updated_by = %updated_by,
            "employee record updated"
        );
        self.get_record(id).await
    }

    pub async fn delete_record(&self, id: Uuid, deleted_by: &str) -> Result<(), RecordError> {
        if !has_caller(deleted_by) {
            return Err(RecordError::Unauthorized);
        }
        if !self.record_repo.delete(id).await? {
            return Err(RecordError::RecordNotFound(id));
        }
        tracing::info!(record_id = %id, deleted_by = %deleted_by, "employee record deleted");
        Ok(())
    }
}

fn resolve(
    template: &FormTemplate,
    record_id: Uuid,
    input: &BTreeMap<String, SubmittedValue>,
) -> Result<ResolvedValues, RecordError> {
    let input = text_values(input).map_err(RecordError::Validation)?;
    let resolved =
        FieldValueResolver::resolve(template, record_id, &input).map_err(RecordError::Validation)?;
    if !resolved.dropped.is_empty() {
        tracing::warn!(
            record_id = %record_id,
            template_id = %template.id,
            dropped = ?resolved.dropped,
            "ignoring values for fields outside the form template"
        );
    }
    Ok(resolved)
}
