use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_object::field_type::FieldType;

/// テンプレート 1 つに従う従業員レコード。値はフィールドごとの疎な集合で持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub template_id: Uuid,
    pub template_name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub field_values: Vec<FieldValue>,
}

/// One stored answer. `field_label` and `field_type` are read from the field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: Uuid,
    pub record_id: Uuid,
    pub field_id: Uuid,
    pub field_label: String,
    pub field_type: FieldType,
    pub value: Option<String>,
}

impl Record {
    pub fn new(template_id: Uuid, template_name: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            template_id,
            template_name,
            created_by,
            created_at: now,
            updated_at: now,
            field_values: Vec::new(),
        }
    }

    /// `Employee #<id> - <first value>`, falling back to `Employee #<id>`.
    pub fn display_name(&self) -> String {
        match self.field_values.first().and_then(|v| v.value.as_deref()) {
            Some(first) => format!("Employee #{} - {}", self.id, first),
            None => format!("Employee #{}", self.id),
        }
    }

    pub fn values_by_label(&self) -> BTreeMap<String, Option<String>> {
        self.field_values
            .iter()
            .map(|v| (v.field_label.clone(), v.value.clone()))
            .collect()
    }
}

/// レコード一覧の検索条件。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub search: Option<String>,
    pub template_id: Option<Uuid>,
}

impl RecordFilter {
    /// 空文字の検索語は指定なしとして扱う。
    pub fn new(search: Option<String>, template_id: Option<Uuid>) -> Self {
        Self {
            search: search.filter(|s| !s.is_empty()),
            template_id,
        }
    }
}
