pub mod form_template_repository;
pub mod record_repository;

pub use form_template_repository::FormTemplateRepository;
pub use record_repository::RecordRepository;
