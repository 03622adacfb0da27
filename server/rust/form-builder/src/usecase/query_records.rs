use std::sync::Arc;

use crate::domain::entity::record::{Record, RecordFilter};
use crate::domain::repository::RecordRepository;
use crate::domain::value_object::page::{Page, PageRequest};

#[derive(Debug, thiserror::Error)]
pub enum QueryRecordsError {
    #[error("invalid page")]
    InvalidPage,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for QueryRecordsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// 従業員レコードの一覧。値の部分一致検索 (大文字小文字を区別しない) とテンプレート絞り込み。
pub struct QueryRecordsUseCase {
    record_repo: Arc<dyn RecordRepository>,
}

impl QueryRecordsUseCase {
    pub fn new(record_repo: Arc<dyn RecordRepository>) -> Self {
        Self { record_repo }
    }

    pub async fn list_records(
        &self,
        filter: RecordFilter,
        page: PageRequest,
    ) -> Result<Page<Record>, QueryRecordsError> {
        let (records, total) = self.record_repo.find_all(&filter, &page).await?;
        if !page.is_valid_for(total) {
            return Err(QueryRecordsError::InvalidPage);
        }
        Ok(Page::new(records, total, &page))
    }
}
