pub mod form_field;
pub mod form_template;
pub mod record;
