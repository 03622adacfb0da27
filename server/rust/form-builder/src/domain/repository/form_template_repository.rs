use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entity::form_template::FormTemplate;
use crate::domain::value_object::page::PageRequest;

/// 変更系メソッドはすべて 1 トランザクションで実行する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormTemplateRepository: Send + Sync {
    /// Newest first, fields included.
    async fn find_all(&self, page: &PageRequest) -> anyhow::Result<(Vec<FormTemplate>, i64)>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<FormTemplate>>;
    /// Inserts the template and all of its fields.
    async fn create(&self, template: &FormTemplate) -> anyhow::Result<()>;
    /// Writes name/description, deletes every stored field of the template and inserts
    /// `template.fields`. Values recorded against the deleted fields go with them.
    /// Returns false when the template no longer exists.
    async fn replace(&self, template: &FormTemplate) -> anyhow::Result<bool>;
    /// Sets the order of each listed field to its index. Ids outside the template are
    /// skipped. Returns the number of fields updated.
    async fn reorder_fields(&self, template_id: Uuid, field_ids: &[Uuid]) -> anyhow::Result<u64>;
    /// Cascades to fields, records and their values.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
