use crate::{
    cache::RedisCache,
    database::MongoDB,
    models::SessionUser,
    services::{session_service, user_service},
};
use actix_web::{web, HttpRequest, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/v1/auth/user/registration",
    tag = "Auth",
    request_body = user_service::RegisterRequest,
    responses(
        (status = 201, description = "Activation OTP issued", body = user_service::RegistrationResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    request: web::Json<user_service::RegisterRequest>,
) -> HttpResponse {
    log::info!("📝 POST /auth/user/registration - email: {}", request.email);

    match user_service::register(&db, &request).await {
        Ok(activation_token) => HttpResponse::Created().json(user_service::RegistrationResponse {
            success: true,
            message: format!(
                "Please check your email: {} to activate your account",
                request.email
            ),
            activation_token,
        }),
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/user/activation",
    tag = "Auth",
    request_body = user_service::ActivationRequest,
    responses(
        (status = 201, description = "User created", body = SessionUser),
        (status = 401, description = "Invalid OTP"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn activate(
    db: web::Data<MongoDB>,
    request: web::Json<user_service::ActivationRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/user/activation");

    match user_service::activate(&db, &request).await {
        Ok(user) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": "User created successfully",
            "data": user,
        })),
        Err(e) => {
            log::warn!("❌ Activation failed: {}", e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/user/login",
    tag = "Auth",
    request_body = user_service::LoginRequest,
    responses(
        (status = 200, description = "Login successful, cookies set", body = SessionUser),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    request: web::Json<user_service::LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/user/login - email: {}", request.email);

    match user_service::login(&db, &cache, &request).await {
        Ok((user, issued)) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok()
                .cookie(session_service::access_cookie(issued.access_token.clone()))
                .cookie(session_service::refresh_cookie(issued.refresh_token))
                .json(serde_json::json!({
                    "success": true,
                    "message": "User login successfully",
                    "data": user,
                    "access_token": issued.access_token,
                }))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}

pub async fn social_auth(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    request: web::Json<user_service::SocialAuthRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/user/social - email: {}", request.email);

    match user_service::social_auth(&db, &cache, &request).await {
        Ok((user, issued)) => HttpResponse::Ok()
            .cookie(session_service::access_cookie(issued.access_token.clone()))
            .cookie(session_service::refresh_cookie(issued.refresh_token))
            .json(serde_json::json!({
                "success": true,
                "message": "User login successfully",
                "data": user,
                "access_token": issued.access_token,
            })),
        Err(e) => {
            log::warn!("❌ Social auth failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}

pub async fn logout(cache: web::Data<RedisCache>, user: SessionUser) -> HttpResponse {
    log::info!("👋 GET /auth/user/logout - user: {}", user.id);

    match user_service::logout(&cache, &user.id).await {
        Ok(()) => HttpResponse::Ok()
            .cookie(session_service::expired_cookie(session_service::ACCESS_COOKIE))
            .cookie(session_service::expired_cookie(session_service::REFRESH_COOKIE))
            .json(serde_json::json!({
                "success": true,
                "message": "User logged out successfully",
            })),
        Err(e) => {
            log::error!("❌ Logout failed: {}", e);
            e.to_response()
        }
    }
}

/// Rotates the access/refresh pair from the `rf_token` cookie.
pub async fn refresh_token(cache: web::Data<RedisCache>, req: HttpRequest) -> HttpResponse {
    log::info!("🔄 GET /auth/user/refresh");

    let refresh = match req.cookie(session_service::REFRESH_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => {
            return crate::utils::error::AppError::Unauthorized(
                "Please login to access this resource".to_string(),
            )
            .to_response()
        }
    };

    match user_service::refresh(&cache, &refresh).await {
        Ok((_user, issued)) => {
            log::info!("✅ Token refreshed");
            HttpResponse::Ok()
                .cookie(session_service::access_cookie(issued.access_token.clone()))
                .cookie(session_service::refresh_cookie(issued.refresh_token))
                .json(serde_json::json!({
                    "success": true,
                    "access_token": issued.access_token,
                }))
        }
        Err(e) => {
            log::warn!("❌ Token refresh failed: {}", e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/user/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Session user", body = SessionUser),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_me(user: SessionUser) -> HttpResponse {
    log::info!("👤 GET /auth/user/me - user: {}", user.id);

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": user,
    }))
}

pub async fn request_email_update(
    db: web::Data<MongoDB>,
    user: SessionUser,
    request: web::Json<user_service::UpdateEmailRequest>,
) -> HttpResponse {
    log::info!("📝 POST /auth/user/request-email-update - user: {}", user.id);

    match user_service::request_email_change(&db, &user, &request).await {
        Ok(activation_token) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!(
                "Please check your email: {} to confirm the change",
                request.email
            ),
            "activation_token": activation_token,
        })),
        Err(e) => {
            log::warn!("❌ Email update request failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn activate_update_email(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    user: SessionUser,
    request: web::Json<user_service::ActivateEmailChangeRequest>,
) -> HttpResponse {
    log::info!("🔑 PATCH /auth/user/activate-update-email - user: {}", user.id);

    match user_service::activate_email_change(&db, &cache, &user.id, &request).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Email updated successfully",
            "data": updated,
        })),
        Err(e) => {
            log::warn!("❌ Email update failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn update_userinfo(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    user: SessionUser,
    request: web::Json<user_service::UpdateInfoRequest>,
) -> HttpResponse {
    log::info!("📝 PATCH /auth/user/update-userinfo - user: {}", user.id);

    match user_service::update_user_info(&db, &cache, &user.id, &request).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "User info updated successfully",
            "data": updated,
        })),
        Err(e) => {
            log::warn!("❌ User info update failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn change_password(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    user: SessionUser,
    request: web::Json<user_service::UpdatePasswordRequest>,
) -> HttpResponse {
    log::info!("🔒 PATCH /auth/user/change-password - user: {}", user.id);

    match user_service::update_password(&db, &cache, &user.id, &request).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password changed successfully",
            "data": updated,
        })),
        Err(e) => {
            log::warn!("❌ Password change failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn update_avatar(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    user: SessionUser,
    request: web::Json<user_service::UpdateAvatarRequest>,
) -> HttpResponse {
    log::info!("🖼️ PATCH /auth/user/update-avatar - user: {}", user.id);

    match user_service::update_avatar(&db, &cache, &user.id, &request).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Avatar updated successfully",
            "data": updated,
        })),
        Err(e) => {
            log::warn!("❌ Avatar update failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn request_forgot_pass(
    db: web::Data<MongoDB>,
    request: web::Json<user_service::ForgotPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/user/request-forgot-pass - email: {}", request.email);

    match user_service::forgot_password_request(&db, &request).await {
        Ok(token) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!(
                "Please check your email: {} to reset your password",
                request.email
            ),
            "forgot_token": token,
        })),
        Err(e) => {
            log::warn!("❌ Forgot password request failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn verify_forgot_pass(
    request: web::Json<user_service::VerifyForgotRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/user/verify-forgot-pass");

    match user_service::forgot_password_verify(&request) {
        Ok(reset_token) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "OTP verified successfully",
            "reset_token": reset_token,
        })),
        Err(e) => {
            log::warn!("❌ Forgot password verify failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn save_password(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    request: web::Json<user_service::SavePasswordRequest>,
) -> HttpResponse {
    log::info!("🔒 PATCH /auth/user/save-password");

    match user_service::save_password(&db, &cache, &request).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password saved successfully. Please login again",
        })),
        Err(e) => {
            log::warn!("❌ Password save failed: {}", e);
            e.to_response()
        }
    }
}
