pub mod form_template_repo_impl;
pub mod in_memory;
pub mod record_repo_impl;

pub use form_template_repo_impl::FormTemplatePostgresRepository;
pub use in_memory::InMemoryStore;
pub use record_repo_impl::RecordPostgresRepository;
