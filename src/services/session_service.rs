use crate::cache::RedisCache;
use crate::models::SessionUser;
use crate::services::token_service;
use crate::utils::error::AppError;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};

pub const ACCESS_COOKIE: &str = "ac_token";
pub const REFRESH_COOKIE: &str = "rf_token";

fn is_production() -> bool {
    std::env::var("APP_ENV")
        .map(|v| v == "production")
        .unwrap_or(false)
}

fn build_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_production())
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

pub fn access_cookie(token: String) -> Cookie<'static> {
    build_cookie(ACCESS_COOKIE, token, token_service::access_token_exp())
}

pub fn refresh_cookie(token: String) -> Cookie<'static> {
    build_cookie(REFRESH_COOKIE, token, token_service::refresh_token_exp())
}

/// Immediately-expiring cookie, used by logout to clear both tokens.
pub fn expired_cookie(name: &'static str) -> Cookie<'static> {
    build_cookie(name, String::new(), 0)
}

#[derive(Debug)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs a fresh access/refresh pair and writes the session record to Redis.
/// The Redis entry is the source of truth for `SessionUser` on authenticated
/// requests; a valid JWT without a live session is rejected.
pub async fn issue_session(
    cache: &RedisCache,
    user: &SessionUser,
) -> Result<IssuedSession, AppError> {
    let access_token = token_service::sign_access_token(&user.id)?;
    let refresh_token = token_service::sign_refresh_token(&user.id)?;

    let payload = serde_json::to_string(user)
        .map_err(|e| AppError::CacheError(format!("Failed to serialize session: {}", e)))?;
    cache.set(&user.id, &payload).await?;

    Ok(IssuedSession {
        access_token,
        refresh_token,
    })
}

pub async fn load_session(
    cache: &RedisCache,
    user_id: &str,
) -> Result<Option<SessionUser>, AppError> {
    match cache.get(user_id).await? {
        Some(raw) => {
            let user = serde_json::from_str(&raw)
                .map_err(|e| AppError::CacheError(format!("Corrupt session record: {}", e)))?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

pub async fn drop_session(cache: &RedisCache, user_id: &str) -> Result<(), AppError> {
    cache.del(user_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_cookie_attributes() {
        let cookie = access_cookie("token-value".into());
        assert_eq!(cookie.name(), "ac_token");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let cookie = expired_cookie(REFRESH_COOKIE);
        assert_eq!(cookie.name(), "rf_token");
        assert!(cookie.value().is_empty());
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(0)));
    }
}
