pub mod field_errors;
pub mod field_type;
pub mod page;
