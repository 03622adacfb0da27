//! Bearer トークン検証。呼び出し元の識別子 (`sub`) を取り出すだけで、ロール判定は行わない。

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT Claims。`sub` がユーザー識別子。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 共有シークレットで署名されたトークンを検証する。
pub struct JwtTokenVerifier {
    key: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str, issuer: &str, audience: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<Claims>(token, &self.key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn claims(sub: &str, exp_offset: i64) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: sub.to_string(),
            iss: "k1s0".to_string(),
            aud: Some("form-builder".to_string()),
            exp: u64::try_from(now + exp_offset).unwrap(),
            iat: u64::try_from(now).unwrap(),
            preferred_username: None,
            email: None,
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> JwtTokenVerifier {
        JwtTokenVerifier::new(SECRET, "k1s0", "form-builder")
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let token = sign(&claims("user-1", 3600), SECRET);
        let verified = verifier().verify_token(&token).await.unwrap();
        assert_eq!(verified.sub, "user-1");
    }

    #[tokio::test]
    async fn test_verify_wrong_secret() {
        let token = sign(&claims("user-1", 3600), "other-secret");
        assert!(matches!(
            verifier().verify_token(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_expired_token() {
        let token = sign(&claims("user-1", -3600), SECRET);
        assert!(matches!(
            verifier().verify_token(&token).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_verify_wrong_audience() {
        let mut c = claims("user-1", 3600);
        c.aud = Some("someone-else".to_string());
        let token = sign(&c, SECRET);
        assert!(verifier().verify_token(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_empty_subject() {
        let token = sign(&claims("", 3600), SECRET);
        assert!(verifier().verify_token(&token).await.is_err());
    }
}
