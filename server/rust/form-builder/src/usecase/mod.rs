pub mod manage_form_templates;
pub mod manage_records;
pub mod query_records;

pub use manage_form_templates::{FormTemplateError, ManageFormTemplatesUseCase};
pub use manage_records::{ManageRecordsUseCase, RecordError};
pub use query_records::{QueryRecordsError, QueryRecordsUseCase};

/// 書き込み操作は認証済み呼び出し元の識別子を必須とする。
pub(crate) fn has_caller(caller: &str) -> bool {
    !caller.trim().is_empty()
}
