use serde_json::{json, Map, Value};

use crate::domain::entity::form_field::FormField;
use crate::domain::entity::form_template::FormTemplate;

pub struct SchemaGeneratorService;

impl SchemaGeneratorService {
    /// テンプレートを JSON Schema として表現する。保存値の検証には使用しない。
    pub fn generate_json_schema(template: &FormTemplate) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in template.ordered_fields() {
            let key = field.id.to_string();
            properties.insert(key.clone(), Self::field_to_json_schema(field));
            if field.required {
                required.push(Value::String(key));
            }
        }

        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "title": template.name,
            "description": template.description,
            "properties": properties,
            "required": required,
        })
    }

    fn field_to_json_schema(field: &FormField) -> Value {
        let mut schema = Map::new();
        schema.insert(
            "type".to_string(),
            Value::String(field.field_type.json_schema_type().to_string()),
        );
        schema.insert("title".to_string(), Value::String(field.label.clone()));
        schema.insert("x-order".to_string(), Value::Number(field.order.into()));
        schema.insert(
            "x-field-type".to_string(),
            Value::String(field.field_type.as_str().to_string()),
        );

        if let Some(format) = field.field_type.json_schema_format() {
            schema.insert("format".to_string(), Value::String(format.to_string()));
        }
        if let Some(ref placeholder) = field.placeholder {
            schema.insert("examples".to_string(), json!([placeholder]));
        }
        if let Some(ref options) = field.options {
            if !options.is_empty() {
                schema.insert("enum".to_string(), json!(options));
            }
        }

        Value::Object(schema)
    }
}
