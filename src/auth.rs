//! Authentication middleware and token verification logic.
//!
//! Identities are issued elsewhere; this module only checks them. A request
//! is authenticated by a bearer JWT or, failing that, by the signed session
//! cookie set on an earlier authenticated request.
use std::fmt::Display;

use anyhow::{Context, Result};
use axum::{
    Extension,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{SignedCookieJar, cookie};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

const SESSION_COOKIE: &str = "study_session";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserId(pub(crate) String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 3 chars from start and 9 from the end
        let len = self.0.len();
        if len > 12 && self.0.is_ascii() {
            write!(f, "{}...{}", &self.0[..3], &self.0[len - 9..])
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

#[derive(Clone, Debug)]
pub struct AuthUser(pub Option<UserId>);

#[derive(Deserialize, Clone)]
struct Claims {
    sub: Option<String>,
    // Older tokens carry the id as `userId`.
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

pub(crate) fn verify_user_token(token: &str, secret: &SecretString) -> Result<UserId> {
    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let claims = decode::<Claims>(token, &key, &validation)
        .context("JWT error")?
        .claims;
    match claims.sub.or(claims.user_id) {
        Some(uid) if !uid.is_empty() => Ok(uid.into()),
        _ => anyhow::bail!("No subject in JWT"),
    }
}

pub async fn auth_middleware(
    Extension(config): Extension<AppConfig>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    debug!("Processing request: {} {}", req.method(), req.uri());
    let mut user_id: Option<UserId> = None;
    let headers = req.headers();
    let mut cookies = SignedCookieJar::from_headers(headers, config.cookie_secret.clone());

    // --- 1. Bearer JWT ---
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
    {
        match verify_user_token(token, &config.jwt_secret) {
            Ok(uid) => {
                cookies = add_signed_cookie(cookies, uid.as_str());
                info!("User ID verified from bearer token: {}", uid);
                user_id = Some(uid);
            }
            Err(e) => {
                warn!("Bearer token invalid: {:#}", e);
            }
        }
    }
    // --- 2. Session Cookie ---
    else if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let uid: UserId = cookie.value().to_string().into();
        debug!("Session cookie found: {}", uid);
        user_id = Some(uid);
    }

    debug!("Final user_id: {:?}", user_id);
    req.extensions_mut().insert(AuthUser(user_id));
    let resp = next.run(req).await;
    Ok((cookies, resp).into_response())
}

fn add_signed_cookie(cookies: SignedCookieJar, uid: &str) -> SignedCookieJar {
    cookies.add(
        cookie::Cookie::build((SESSION_COOKIE, uid.to_string()))
            .path("/")
            .http_only(true)
            .secure(true)
            .max_age(time::Duration::days(30))
            .same_site(cookie::SameSite::Strict)
            .build(),
    )
}

#[cfg(test)]
mod test {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn expiry() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_verify_sub_claim() {
        let secret: SecretString = "top-secret".to_string().into();
        let token = sign(json!({ "sub": "user-42", "exp": expiry() }), "top-secret");
        assert_eq!(
            verify_user_token(&token, &secret).unwrap(),
            UserId("user-42".to_string())
        );
    }

    #[test]
    fn test_verify_legacy_claim() {
        let secret: SecretString = "top-secret".to_string().into();
        let token = sign(json!({ "userId": "legacy", "exp": expiry() }), "top-secret");
        assert_eq!(verify_user_token(&token, &secret).unwrap().as_str(), "legacy");
    }

    #[test]
    fn test_verify_prefers_sub_over_legacy_claim() {
        let secret: SecretString = "top-secret".to_string().into();
        let token = sign(
            json!({ "sub": "u1", "userId": "old-u1", "exp": expiry() }),
            "top-secret",
        );
        assert_eq!(verify_user_token(&token, &secret).unwrap().as_str(), "u1");

        let anonymous = sign(json!({ "exp": expiry() }), "top-secret");
        assert!(verify_user_token(&anonymous, &secret).is_err());
    }

    #[test]
    fn test_rejects_bad_tokens() {
        let secret: SecretString = "top-secret".to_string().into();
        let wrong_key = sign(json!({ "sub": "u", "exp": expiry() }), "other-secret");
        assert!(verify_user_token(&wrong_key, &secret).is_err());

        let expired = sign(json!({ "sub": "u", "exp": 1_000 }), "top-secret");
        assert!(verify_user_token(&expired, &secret).is_err());

        let no_expiry = sign(json!({ "sub": "u" }), "top-secret");
        assert!(verify_user_token(&no_expiry, &secret).is_err());

        assert!(verify_user_token("not-a-jwt", &secret).is_err());
    }

    #[test]
    fn test_user_id_display_is_shortened() {
        let uid = UserId("0123456789abcdefghij".to_string());
        assert_eq!(uid.to_string(), "012...bcdefghij");
        assert_eq!(UserId("short".to_string()).to_string(), "short");
    }
}
