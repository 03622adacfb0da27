use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use crate::adapter::handler::error::AppError;
use crate::infrastructure::auth::TokenVerifier;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// 検証済みの Claims をリクエスト拡張に格納する。
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&req)
        .ok_or_else(|| AppError::unauthorized("SYS_AUTH_MISSING_TOKEN", "Missing bearer token"))?;

    let claims = state.verifier.verify_token(&token).await.map_err(|e| {
        tracing::warn!(error = %e, "bearer token rejected");
        AppError::unauthorized("SYS_AUTH_TOKEN_INVALID", "Invalid or expired token")
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn extract_bearer_token(req: &Request<Body>) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
