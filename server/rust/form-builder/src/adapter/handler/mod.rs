pub mod error;
pub mod form_template_handler;
pub mod health_handler;
pub mod record_handler;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::adapter::handler::error::AppError;
use crate::adapter::middleware::auth::{auth_middleware, AuthState};
use crate::domain::value_object::page::PageRequest;
use crate::usecase::{ManageFormTemplatesUseCase, ManageRecordsUseCase, QueryRecordsUseCase};

#[derive(Clone)]
pub struct AppState {
    pub manage_templates_uc: Arc<ManageFormTemplatesUseCase>,
    pub manage_records_uc: Arc<ManageRecordsUseCase>,
    pub query_records_uc: Arc<QueryRecordsUseCase>,
    pub auth_state: AuthState,
    pub page_size: u32,
    /// None の場合はインメモリストアで動作している。
    pub db_pool: Option<PgPool>,
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthz", get(health_handler::healthz))
        .route("/readyz", get(health_handler::readyz));

    let api_routes = Router::new()
        .route(
            "/api/v1/form-templates",
            get(form_template_handler::list_templates).post(form_template_handler::create_template),
        )
        .route(
            "/api/v1/form-templates/{id}",
            get(form_template_handler::get_template)
                .put(form_template_handler::update_template)
                .delete(form_template_handler::delete_template),
        )
        .route(
            "/api/v1/form-templates/{id}/fields",
            put(form_template_handler::replace_fields),
        )
        .route(
            "/api/v1/form-templates/{id}/reorder",
            post(form_template_handler::reorder_fields),
        )
        .route(
            "/api/v1/form-templates/{id}/schema",
            get(form_template_handler::get_template_schema),
        )
        .route(
            "/api/v1/employees",
            get(record_handler::list_employees).post(record_handler::create_employee),
        )
        .route(
            "/api/v1/employees/{id}",
            get(record_handler::get_employee)
                .put(record_handler::update_employee)
                .delete(record_handler::delete_employee),
        )
        .layer(from_fn_with_state(state.auth_state.clone(), auth_middleware));

    public_routes
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `page` クエリを解釈する。未指定は 1 ページ目、数値でなければ範囲外と同じ扱い。
pub(crate) fn page_request(raw: Option<&str>, page_size: u32) -> Result<PageRequest, AppError> {
    let page = match raw.map(str::trim) {
        None | Some("") => 1,
        Some(value) => value.parse::<u32>().map_err(|_| AppError::invalid_page())?,
    };
    Ok(PageRequest::new(page, page_size))
}
