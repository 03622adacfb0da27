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
use crate::adapter::presenter::response::{FormTemplateResponse, PaginatedResponse};
use crate::domain::entity::form_template::{CreateFormTemplate, ReplaceFormFields, UpdateFormTemplate};
use crate::infrastructure::auth::Claims;

#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderFieldsRequest {
    #[serde(default)]
    pub field_order: Vec<Uuid>,
}

pub async fn list_templates(
    State(state): State<AppState>,
    query: Result<Query<ListTemplatesQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<FormTemplateResponse>>, AppError> {
    let Query(query) = query?;
    let page = page_request(query.page.as_deref(), state.page_size)?;
    let templates = state.manage_templates_uc.list_templates(page).await?;
    Ok(Json(PaginatedResponse::new(
        "form_templates",
        templates.map(|t| FormTemplateResponse::from(&t)),
    )))
}

pub async fn get_template(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    let template = state.manage_templates_uc.get_template(id).await?;
    Ok(Json(json!({
        "success": true,
        "form_template": FormTemplateResponse::from(&template),
    })))
}

pub async fn create_template(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateFormTemplate>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let Json(input) = payload?;
    let template = state
        .manage_templates_uc
        .create_template(input, &claims.sub)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Form template created successfully",
            "form_template": FormTemplateResponse::from(&template),
        })),
    ))
}

pub async fn update_template(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateFormTemplate>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let template = state
        .manage_templates_uc
        .update_template(id, input, &claims.sub)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Form template updated successfully",
        "form_template": FormTemplateResponse::from(&template),
    })))
}

pub async fn replace_fields(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReplaceFormFields>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let template = state
        .manage_templates_uc
        .replace_fields(id, input.fields, &claims.sub)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Form fields replaced successfully",
        "form_template": FormTemplateResponse::from(&template),
    })))
}

pub async fn reorder_fields(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReorderFieldsRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    state
        .manage_templates_uc
        .reorder_fields(id, &input.field_order, &claims.sub)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Fields reordered successfully",
    })))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    state
        .manage_templates_uc
        .delete_template(id, &claims.sub)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Form template deleted successfully",
    })))
}

pub async fn get_template_schema(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = path?;
    let schema = state.manage_templates_uc.get_template_schema(id).await?;
    Ok(Json(schema))
}
