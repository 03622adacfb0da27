use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entity::record::{FieldValue, Record, RecordFilter};
use crate::domain::value_object::page::PageRequest;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Newest first. Returns the page and the total number of matching records.
    async fn find_all(
        &self,
        filter: &RecordFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Record>, i64)>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Record>>;
    /// Inserts the record and its field values atomically.
    async fn create(&self, record: &Record) -> anyhow::Result<()>;
    /// Creates or overwrites one value per field; fields not listed are left as they are.
    /// Returns false when the record does not exist.
    async fn upsert_values(&self, record_id: Uuid, values: &[FieldValue]) -> anyhow::Result<bool>;
    /// Cascades to the record's field values only.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
