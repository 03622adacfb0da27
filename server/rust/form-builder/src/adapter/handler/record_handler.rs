use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::adapter::handler::error::AppError;
use crate::adapter::handler::{page_request, AppState};
use crate::adapter::presenter::response::{EmployeeResponse, PaginatedResponse};
use crate::domain::entity::record::RecordFilter;
use crate::domain::value_object::field_errors::FieldErrors;
use crate::infrastructure::auth::Claims;
use crate::usecase::manage_records::{CreateRecordInput, UpdateRecordInput};

#[derive(Debug, Deserialize)]
pub struct ListEmployeesQuery {
    pub search: Option<String>,
    pub form_template: Option<String>,
    pub page: Option<String>,
}

pub async fn list_employees(
    State(state): State<AppState>,
    query: Result<Query<ListEmployeesQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<EmployeeResponse>>, AppError> {
    let Query(query) = query?;
    let page = page_request(query.page.as_deref(), state.page_size)?;

    let template_id = match query.form_template.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
            AppError::validation(FieldErrors::single(
                "form_template",
                format!("\"{raw}\" is not a valid UUID."),
            ))
        })?),
    };

    let records = state
        .query_records_uc
        .list_records(RecordFilter::new(query.search, template_id), page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        "employees",
        records.map(|r| EmployeeResponse::from(&r)),
    )))
}

pub async fn get_employee(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    let record = state.manage_records_uc.get_record(id).await?;
    Ok(Json(json!({
        "success": true,
        "employee": EmployeeResponse::from(&record),
    })))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateRecordInput>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let Json(input) = payload?;
    let record = state
        .manage_records_uc
        .create_record(input, &claims.sub)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Employee created successfully",
            "employee": EmployeeResponse::from(&record),
        })),
    ))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateRecordInput>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let record = state
        .manage_records_uc
        .update_record(id, input, &claims.sub)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Employee updated successfully",
        "employee": EmployeeResponse::from(&record),
    })))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    state.manage_records_uc.delete_record(id, &claims.sub).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Employee deleted successfully",
    })))
}
