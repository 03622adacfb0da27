pub mod field_value_service;
pub mod schema_service;
