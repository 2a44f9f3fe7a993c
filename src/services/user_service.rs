use crate::{
    cache::RedisCache,
    database::MongoDB,
    models::{MediaRef, SessionUser, User},
    services::session_service::{self, IssuedSession},
    services::token_service::{self, PendingUser},
    utils::error::AppError,
    utils::mailer,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

const COLLECTION: &str = "users";

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RegistrationResponse {
    pub success: bool,
    pub message: String,
    pub activation_token: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ActivationRequest {
    pub token: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SocialAuthRequest {
    pub name: String,
    pub email: String,
    pub avatar: Option<MediaRef>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateEmailChangeRequest {
    pub token: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInfoRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvatarRequest {
    pub avatar: MediaRef,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyForgotRequest {
    pub token: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct SavePasswordRequest {
    pub token: String,
    pub new_password: String,
}

// ==================== VALIDATION ====================

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::InvalidRequest(
            "Please enter a valid email".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 6 {
        return Err(AppError::InvalidRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

// ==================== HELPERS ====================

async fn find_by_email(db: &MongoDB, email: &str) -> Result<Option<User>, AppError> {
    let collection = db.collection::<User>(COLLECTION);
    Ok(collection.find_one(doc! { "email": email }).await?)
}

async fn find_by_id(db: &MongoDB, user_id: &str) -> Result<User, AppError> {
    let oid = ObjectId::parse_str(user_id)?;
    let collection = db.collection::<User>(COLLECTION);
    collection
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Re-reads the user document and overwrites the cached session record.
/// Every profile mutation funnels through this so the Redis copy never lags
/// behind the store by more than one request.
async fn refresh_session_record(
    db: &MongoDB,
    cache: &RedisCache,
    user_id: &str,
) -> Result<SessionUser, AppError> {
    let user = find_by_id(db, user_id).await?;
    let session = SessionUser::from(&user);
    let payload = serde_json::to_string(&session)
        .map_err(|e| AppError::CacheError(format!("Failed to serialize session: {}", e)))?;
    cache.set(&session.id, &payload).await?;
    Ok(session)
}

// ==================== SERVICE FUNCTIONS ====================

/// Registration does not create a user yet: it hashes the password, wraps the
/// pending user in a short-lived activation token and mails the OTP. The user
/// document is only written once the OTP comes back on `/activation`.
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<String, AppError> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Please enter your name".to_string(),
        ));
    }

    if find_by_email(db, &request.email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash(&request.password, DEFAULT_COST)?;
    let pending = PendingUser {
        name: request.name.clone(),
        email: request.email.clone(),
        password_hash,
    };

    let issued = token_service::create_activation_token(&pending)?;
    mailer::send_otp_email(&request.email, "Account activation OTP", &issued.otp);

    log::info!("📝 Activation OTP issued for {}", request.email);
    Ok(issued.token)
}

pub async fn activate(db: &MongoDB, request: &ActivationRequest) -> Result<SessionUser, AppError> {
    let claims = token_service::verify_activation_token(&request.token)?;

    if claims.otp != request.otp {
        return Err(AppError::Unauthorized("Invalid OTP".to_string()));
    }

    // The activation token can outlive a competing registration; re-check
    if find_by_email(db, &claims.user.email).await?.is_some() {
        return Err(AppError::Conflict(
            "User already exists. Go to login or forgot password".to_string(),
        ));
    }

    let user = User {
        id: None,
        name: claims.user.name,
        email: claims.user.email,
        password: Some(claims.user.password_hash),
        avatar: None,
        role: "user".to_string(),
        is_verified: true,
        courses: vec![],
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    let collection = db.collection::<User>(COLLECTION);
    let result = collection.insert_one(&user).await?;
    let inserted_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::DatabaseError("Insert returned no id".to_string()))?;

    log::info!("✅ User activated: {}", user.email);

    let mut created = user;
    created.id = Some(inserted_id);
    Ok(SessionUser::from(&created))
}

pub async fn login(
    db: &MongoDB,
    cache: &RedisCache,
    request: &LoginRequest,
) -> Result<(SessionUser, IssuedSession), AppError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(AppError::InvalidRequest(
            "Please enter your email and password".to_string(),
        ));
    }

    let user = find_by_email(db, &request.email)
        .await?
        .ok_or_else(|| AppError::InvalidRequest("Invalid email or password".to_string()))?;

    let stored = user.password.as_ref().ok_or_else(|| {
        AppError::InvalidRequest("This account uses social login".to_string())
    })?;

    let valid = verify(&request.password, stored)?;
    if !valid {
        return Err(AppError::InvalidRequest(
            "Invalid email or password".to_string(),
        ));
    }

    let session_user = SessionUser::from(&user);
    let issued = session_service::issue_session(cache, &session_user).await?;
    Ok((session_user, issued))
}

/// Find-or-create for social providers. Accounts created this way carry no
/// password and are verified up front.
pub async fn social_auth(
    db: &MongoDB,
    cache: &RedisCache,
    request: &SocialAuthRequest,
) -> Result<(SessionUser, IssuedSession), AppError> {
    validate_email(&request.email)?;

    let user = match find_by_email(db, &request.email).await? {
        Some(existing) => existing,
        None => {
            let new_user = User {
                id: None,
                name: request.name.clone(),
                email: request.email.clone(),
                password: None,
                avatar: request.avatar.clone(),
                role: "user".to_string(),
                is_verified: true,
                courses: vec![],
                created_at: Some(BsonDateTime::now()),
                updated_at: Some(BsonDateTime::now()),
            };
            let collection = db.collection::<User>(COLLECTION);
            let result = collection.insert_one(&new_user).await?;
            let inserted_id = result
                .inserted_id
                .as_object_id()
                .ok_or_else(|| AppError::DatabaseError("Insert returned no id".to_string()))?;
            log::info!("✅ Social user created: {}", request.email);

            let mut created = new_user;
            created.id = Some(inserted_id);
            created
        }
    };

    let session_user = SessionUser::from(&user);
    let issued = session_service::issue_session(cache, &session_user).await?;
    Ok((session_user, issued))
}

pub async fn logout(cache: &RedisCache, user_id: &str) -> Result<(), AppError> {
    session_service::drop_session(cache, user_id).await
}

/// Rotates the access/refresh pair. The Redis session is required: a valid
/// refresh JWT alone does not resurrect an expired session.
pub async fn refresh(
    cache: &RedisCache,
    refresh_token: &str,
) -> Result<(SessionUser, IssuedSession), AppError> {
    let claims = token_service::verify_refresh_token(refresh_token)?;

    let session_user = session_service::load_session(cache, &claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("Session expired! Please login again".to_string())
        })?;

    let issued = session_service::issue_session(cache, &session_user).await?;
    Ok((session_user, issued))
}

pub async fn request_email_change(
    db: &MongoDB,
    user: &SessionUser,
    request: &UpdateEmailRequest,
) -> Result<String, AppError> {
    validate_email(&request.email)?;

    if find_by_email(db, &request.email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let issued = token_service::create_email_change_token(&request.email)?;
    mailer::send_otp_email(&request.email, "Email change OTP", &issued.otp);

    log::info!(
        "📝 Email change OTP issued for {} -> {}",
        user.email,
        request.email
    );
    Ok(issued.token)
}

pub async fn activate_email_change(
    db: &MongoDB,
    cache: &RedisCache,
    user_id: &str,
    request: &ActivateEmailChangeRequest,
) -> Result<SessionUser, AppError> {
    let claims = token_service::verify_email_change_token(&request.token)?;

    if claims.otp != request.otp {
        return Err(AppError::Unauthorized("Invalid OTP".to_string()));
    }

    if find_by_email(db, &claims.email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let oid = ObjectId::parse_str(user_id)?;
    let collection = db.collection::<User>(COLLECTION);
    collection
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "email": &claims.email, "updated_at": BsonDateTime::now() } },
        )
        .await?;

    log::info!("✅ Email updated for user {}", user_id);
    refresh_session_record(db, cache, user_id).await
}

pub async fn update_user_info(
    db: &MongoDB,
    cache: &RedisCache,
    user_id: &str,
    request: &UpdateInfoRequest,
) -> Result<SessionUser, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Please enter your name".to_string(),
        ));
    }

    let oid = ObjectId::parse_str(user_id)?;
    let collection = db.collection::<User>(COLLECTION);
    collection
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "name": &request.name, "updated_at": BsonDateTime::now() } },
        )
        .await?;

    refresh_session_record(db, cache, user_id).await
}

pub async fn update_password(
    db: &MongoDB,
    cache: &RedisCache,
    user_id: &str,
    request: &UpdatePasswordRequest,
) -> Result<SessionUser, AppError> {
    validate_password(&request.new_password)?;

    let user = find_by_id(db, user_id).await?;
    let stored = user.password.as_ref().ok_or_else(|| {
        AppError::InvalidRequest("Social-auth account has no password".to_string())
    })?;

    let valid = verify(&request.old_password, stored)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Old password is incorrect".to_string(),
        ));
    }

    let new_hash = hash(&request.new_password, DEFAULT_COST)?;
    let collection = db.collection::<User>(COLLECTION);
    collection
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "password": new_hash, "updated_at": BsonDateTime::now() } },
        )
        .await?;

    log::info!("✅ Password changed for user {}", user_id);
    refresh_session_record(db, cache, user_id).await
}

pub async fn update_avatar(
    db: &MongoDB,
    cache: &RedisCache,
    user_id: &str,
    request: &UpdateAvatarRequest,
) -> Result<SessionUser, AppError> {
    let oid = ObjectId::parse_str(user_id)?;
    let collection = db.collection::<User>(COLLECTION);
    collection
        .update_one(
            doc! { "_id": oid },
            doc! {
                "$set": {
                    "avatar": {
                        "public_id": &request.avatar.public_id,
                        "url": &request.avatar.url,
                    },
                    "updated_at": BsonDateTime::now(),
                }
            },
        )
        .await?;

    refresh_session_record(db, cache, user_id).await
}

pub async fn forgot_password_request(
    db: &MongoDB,
    request: &ForgotPasswordRequest,
) -> Result<String, AppError> {
    let user = find_by_email(db, &request.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found with this email".to_string()))?;

    let issued = token_service::create_forgot_token(&user.email)?;
    mailer::send_otp_email(&user.email, "Password reset OTP", &issued.otp);

    log::info!("📝 Password reset OTP issued for {}", user.email);
    Ok(issued.token)
}

/// Trades a verified OTP for a short-lived reset token; the new password
/// only travels on the follow-up `/save-password` call.
pub fn forgot_password_verify(request: &VerifyForgotRequest) -> Result<String, AppError> {
    let claims = token_service::verify_forgot_token(&request.token)?;

    if claims.otp != request.otp {
        return Err(AppError::Unauthorized("Invalid OTP".to_string()));
    }

    token_service::create_reset_token(&claims.email)
}

pub async fn save_password(
    db: &MongoDB,
    cache: &RedisCache,
    request: &SavePasswordRequest,
) -> Result<(), AppError> {
    validate_password(&request.new_password)?;

    let claims = token_service::verify_reset_token(&request.token)?;
    let user = find_by_email(db, &claims.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found with this email".to_string()))?;

    let new_hash = hash(&request.new_password, DEFAULT_COST)?;
    let collection = db.collection::<User>(COLLECTION);
    collection
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "password": new_hash, "updated_at": BsonDateTime::now() } },
        )
        .await?;

    // Any cached session predates the reset; force a fresh login
    if let Some(oid) = user.id {
        session_service::drop_session(cache, &oid.to_hex()).await?;
    }

    log::info!("✅ Password reset for {}", claims.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("jane.doe+tag@sub.example.co"));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@.com"));
        assert!(!is_valid_email("jane@example.com."));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("secret").is_ok());
        let err = validate_password("12345").unwrap_err();
        assert_eq!(
            err.status_code(),
            actix_web::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_forgot_verify_rejects_wrong_otp() {
        let issued = token_service::create_forgot_token("jane@example.com").unwrap();
        let request = VerifyForgotRequest {
            token: issued.token.clone(),
            otp: "0000000".into(),
        };
        // issued OTP never starts with 0, so this is always a mismatch
        let err = forgot_password_verify(&request).unwrap_err();
        assert_eq!(
            err.status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );

        let ok = forgot_password_verify(&VerifyForgotRequest {
            token: issued.token,
            otp: issued.otp,
        });
        assert!(ok.is_ok());
    }
}
