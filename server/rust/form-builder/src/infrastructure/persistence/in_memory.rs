//! インメモリ永続化。DB 未設定時の開発用と統合テストで使用する。
//! 1 つのストアが両方のリポジトリトレイトを実装し、Postgres と同じ連鎖削除を再現する。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::form_template::FormTemplate;
use crate::domain::entity::record::{FieldValue, Record, RecordFilter};
use crate::domain::repository::{FormTemplateRepository, RecordRepository};
use crate::domain::value_object::page::PageRequest;

#[derive(Default)]
struct Tables {
    templates: HashMap<Uuid, FormTemplate>,
    records: HashMap<Uuid, Record>,
}

impl Tables {
    /// Fills template name and field metadata from the current template and
    /// orders values by field order.
    fn hydrate(&self, record: &Record) -> Record {
        let mut out = record.clone();
        if let Some(template) = self.templates.get(&record.template_id) {
            out.template_name.clone_from(&template.name);
            out.field_values.retain(|v| template.field(v.field_id).is_some());
            for value in &mut out.field_values {
                if let Some(field) = template.field(value.field_id) {
                    value.field_label.clone_from(&field.label);
                    value.field_type = field.field_type;
                }
            }
            out.field_values
                .sort_by_key(|v| template.field(v.field_id).map_or(u32::MAX, |f| f.order));
        }
        out
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(mut items: Vec<T>, page: &PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    if offset >= items.len() {
        return Vec::new();
    }
    items.drain(offset..).take(limit).collect()
}

#[async_trait]
impl FormTemplateRepository for InMemoryStore {
    async fn find_all(&self, page: &PageRequest) -> anyhow::Result<(Vec<FormTemplate>, i64)> {
        let tables = self.tables.read().await;
        let mut templates: Vec<FormTemplate> = tables.templates.values().cloned().collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = i64::try_from(templates.len())?;
        Ok((paginate(templates, page), total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<FormTemplate>> {
        Ok(self.tables.read().await.templates.get(&id).cloned())
    }

    async fn create(&self, template: &FormTemplate) -> anyhow::Result<()> {
        self.tables
            .write()
            .await
            .templates
            .insert(template.id, template.clone());
        Ok(())
    }

    async fn replace(&self, template: &FormTemplate) -> anyhow::Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.templates.get_mut(&template.id) else {
            return Ok(false);
        };
        stored.name.clone_from(&template.name);
        stored.description.clone_from(&template.description);
        stored.updated_at = template.updated_at;
        stored.fields.clone_from(&template.fields);

        // 削除されたフィールドの値を連鎖削除する
        let kept: Vec<Uuid> = template.fields.iter().map(|f| f.id).collect();
        for record in tables.records.values_mut() {
            if record.template_id == template.id {
                record.field_values.retain(|v| kept.contains(&v.field_id));
            }
        }
        Ok(true)
    }

    async fn reorder_fields(&self, template_id: Uuid, field_ids: &[Uuid]) -> anyhow::Result<u64> {
        let mut tables = self.tables.write().await;
        let Some(template) = tables.templates.get_mut(&template_id) else {
            return Ok(0);
        };
        let mut updated = 0;
        for (i, field_id) in field_ids.iter().enumerate() {
            if let Some(field) = template.fields.iter_mut().find(|f| f.id == *field_id) {
                field.order = u32::try_from(i)?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.templates.remove(&id).is_none() {
            return Ok(false);
        }
        tables.records.retain(|_, r| r.template_id != id);
        Ok(true)
    }
}

#[async_trait]
impl RecordRepository for InMemoryStore {
    async fn find_all(
        &self,
        filter: &RecordFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Record>, i64)> {
        let tables = self.tables.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);

        let mut records: Vec<Record> = tables
            .records
            .values()
            .filter(|r| filter.template_id.is_none_or(|t| r.template_id == t))
            .map(|r| tables.hydrate(r))
            .filter(|r| match needle {
                Some(ref needle) => r.field_values.iter().any(|v| {
                    v.value
                        .as_deref()
                        .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
                }),
                None => true,
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = i64::try_from(records.len())?;
        Ok((paginate(records, page), total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Record>> {
        let tables = self.tables.read().await;
        Ok(tables.records.get(&id).map(|r| tables.hydrate(r)))
    }

    async fn create(&self, record: &Record) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.templates.contains_key(&record.template_id) {
            anyhow::bail!("form template {} does not exist", record.template_id);
        }
        tables.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn upsert_values(&self, record_id: Uuid, values: &[FieldValue]) -> anyhow::Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.records.get_mut(&record_id) else {
            return Ok(false);
        };
        for value in values {
            match record
                .field_values
                .iter_mut()
                .find(|v| v.field_id == value.field_id)
            {
                Some(existing) => existing.value.clone_from(&value.value),
                None => record.field_values.push(value.clone()),
            }
        }
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.tables.write().await.records.remove(&id).is_some())
    }
}
