use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::domain::entity::form_template::FormTemplate;
use crate::domain::entity::record::FieldValue;
use crate::domain::value_object::field_errors::FieldErrors;

pub const FIELD_VALUES_KEY: &str = "field_values";

/// Result of matching submitted `field id -> text` pairs against a template.
#[derive(Debug, Clone, Default)]
pub struct ResolvedValues {
    /// Values for fields of the template, in display order.
    pub values: Vec<FieldValue>,
    /// Submitted ids that are not fields of the template.
    pub dropped: Vec<Uuid>,
}

/// 送信された値の検証と、テンプレートのフィールドへの対応付けを行う。
pub struct FieldValueResolver;

impl FieldValueResolver {
    /// 必須チェックは order 昇順で最初に欠けたフィールドのみを報告する。
    /// 値はテキストのまま保存し、フィールド種別による型検証は行わない。
    pub fn resolve(
        template: &FormTemplate,
        record_id: Uuid,
        input: &BTreeMap<String, String>,
    ) -> Result<ResolvedValues, FieldErrors> {
        let mut submitted: HashMap<Uuid, &str> = HashMap::with_capacity(input.len());
        let mut malformed: Vec<&str> = Vec::new();
        for (key, value) in input {
            match Uuid::parse_str(key.trim()) {
                Ok(id) => {
                    submitted.insert(id, value.as_str());
                }
                Err(_) => malformed.push(key.as_str()),
            }
        }

        for field in template.required_fields() {
            let present = matches!(submitted.get(&field.id), Some(v) if !v.is_empty());
            if !present {
                return Err(FieldErrors::single(
                    FIELD_VALUES_KEY,
                    format!("{} is required", field.label),
                ));
            }
        }

        if let Some(key) = malformed.first() {
            return Err(FieldErrors::single(
                FIELD_VALUES_KEY,
                format!("\"{key}\" is not a valid field id."),
            ));
        }

        let values = template
            .ordered_fields()
            .into_iter()
            .filter_map(|field| {
                submitted.get(&field.id).map(|value| FieldValue {
                    id: Uuid::new_v4(),
                    record_id,
                    field_id: field.id,
                    field_label: field.label.clone(),
                    field_type: field.field_type,
                    value: Some((*value).to_string()),
                })
            })
            .collect();

        let mut dropped: Vec<Uuid> = submitted
            .keys()
            .filter(|id| template.field(**id).is_none())
            .copied()
            .collect();
        dropped.sort();

        Ok(ResolvedValues { values, dropped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::form_field::CreateFormField;

    fn template() -> FormTemplate {
        let spec = |label: &str, required: bool| CreateFormField {
            label: label.to_string(),
            required,
            ..Default::default()
        };
        FormTemplate::new(
            "Onboarding".to_string(),
            None,
            "u1".to_string(),
            vec![spec("Name", true), spec("Email", true), spec("Nickname", false)],
        )
    }

    fn input(pairs: &[(String, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.clone(), (*v).to_string())).collect()
    }

    #[test]
    fn test_resolve_all_fields() {
        let t = template();
        let record_id = Uuid::new_v4();
        let map = input(&[
            (t.fields[0].id.to_string(), "Alice"),
            (t.fields[1].id.to_string(), "alice@example.com"),
        ]);
        let resolved = FieldValueResolver::resolve(&t, record_id, &map).unwrap();
        assert_eq!(resolved.values.len(), 2);
        assert_eq!(resolved.values[0].field_label, "Name");
        assert_eq!(resolved.values[0].value.as_deref(), Some("Alice"));
        assert!(resolved.values.iter().all(|v| v.record_id == record_id));
        assert!(resolved.dropped.is_empty());
    }

    #[test]
    fn test_first_missing_required_field_reported() {
        let t = template();
        let map = input(&[(t.fields[2].id.to_string(), "Al")]);
        let err = FieldValueResolver::resolve(&t, Uuid::new_v4(), &map).unwrap_err();
        assert_eq!(err.get(FIELD_VALUES_KEY), Some("Name is required"));
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn test_required_walks_fields_in_order() {
        let mut t = template();
        t.fields[0].order = 5;
        let map = input(&[(t.fields[2].id.to_string(), "Al")]);
        let err = FieldValueResolver::resolve(&t, Uuid::new_v4(), &map).unwrap_err();
        assert_eq!(err.get(FIELD_VALUES_KEY), Some("Email is required"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let t = template();
        let map = input(&[
            (t.fields[0].id.to_string(), ""),
            (t.fields[1].id.to_string(), "a@example.com"),
        ]);
        let err = FieldValueResolver::resolve(&t, Uuid::new_v4(), &map).unwrap_err();
        assert_eq!(err.get(FIELD_VALUES_KEY), Some("Name is required"));
    }

    #[test]
    fn test_unknown_field_id_dropped() {
        let t = template();
        let stranger = Uuid::new_v4();
        let map = input(&[
            (t.fields[0].id.to_string(), "Alice"),
            (t.fields[1].id.to_string(), "alice@example.com"),
            (stranger.to_string(), "ignored"),
        ]);
        let resolved = FieldValueResolver::resolve(&t, Uuid::new_v4(), &map).unwrap();
        assert_eq!(resolved.values.len(), 2);
        assert!(resolved.values.iter().all(|v| v.field_id != stranger));
        assert_eq!(resolved.dropped, vec![stranger]);
    }

    #[test]
    fn test_malformed_field_id_rejected() {
        let t = template();
        let map = input(&[
            (t.fields[0].id.to_string(), "Alice"),
            (t.fields[1].id.to_string(), "alice@example.com"),
            ("42".to_string(), "x"),
        ]);
        let err = FieldValueResolver::resolve(&t, Uuid::new_v4(), &map).unwrap_err();
        assert_eq!(err.get(FIELD_VALUES_KEY), Some("\"42\" is not a valid field id."));
    }

    #[test]
    fn test_values_kept_as_text() {
        let mut t = template();
        t.fields[2].field_type = crate::domain::value_object::field_type::FieldType::Number;
        let map = input(&[
            (t.fields[0].id.to_string(), "Alice"),
            (t.fields[1].id.to_string(), "not-an-email"),
            (t.fields[2].id.to_string(), "twelve"),
        ]);
        let resolved = FieldValueResolver::resolve(&t, Uuid::new_v4(), &map).unwrap();
        assert_eq!(resolved.values[2].value.as_deref(), Some("twelve"));
    }
}
