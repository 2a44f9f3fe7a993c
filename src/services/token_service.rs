use crate::utils::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Each flow signs with its own secret so a token can never be replayed
// against a different endpoint.
fn activation_secret() -> String {
    std::env::var("ACTIVATION_SECRET").unwrap_or_else(|_| "activation-secret-change-me".to_string())
}

fn email_change_secret() -> String {
    std::env::var("EMAIL_CHANGE_SECRET")
        .unwrap_or_else(|_| "email-change-secret-change-me".to_string())
}

fn forgot_pass_secret() -> String {
    std::env::var("FORGOT_PASS_SECRET")
        .unwrap_or_else(|_| "forgot-pass-secret-change-me".to_string())
}

fn reset_pass_secret() -> String {
    std::env::var("RESET_PASS_SECRET").unwrap_or_else(|_| "reset-pass-secret-change-me".to_string())
}

fn access_secret() -> String {
    std::env::var("ACCESS_TOKEN_SECRET").unwrap_or_else(|_| "access-secret-change-me".to_string())
}

fn refresh_secret() -> String {
    std::env::var("REFRESH_TOKEN_SECRET").unwrap_or_else(|_| "refresh-secret-change-me".to_string())
}

/// Access token lifetime in seconds (cookie max-age uses the same value).
pub fn access_token_exp() -> i64 {
    std::env::var("ACCESS_TOKEN_EXP")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300)
}

/// Refresh token lifetime in seconds.
pub fn refresh_token_exp() -> i64 {
    std::env::var("REFRESH_TOKEN_EXP")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1200)
}

/// Uniformly random numeric OTP with the requested number of digits.
pub fn generate_otp(digits: u32) -> String {
    let low = 10u64.pow(digits - 1);
    let high = 10u64.pow(digits);
    rand::thread_rng().gen_range(low..high).to_string()
}

/// Token plus the OTP that was embedded into it. The token travels back to
/// the client; the OTP goes out via the mailer.
#[derive(Debug)]
pub struct OtpToken {
    pub token: String,
    pub otp: String,
}

/// User-to-be carried inside the activation token. Only the bcrypt hash of
/// the password is embedded; the JWT is signed, not encrypted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PendingUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivationClaims {
    pub user: PendingUser,
    pub otp: String,
    pub iat: usize,
    pub exp: usize,
}

/// Shared claim shape for the email-change and forgot-password tokens: an
/// email address gated behind an OTP.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailOtpClaims {
    pub email: String,
    pub otp: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

/// Claims for the access/refresh session tokens. `sub` is the user id hex,
/// which doubles as the Redis session key.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

fn timestamps(ttl: Duration) -> (usize, usize) {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + ttl).timestamp() as usize;
    (iat, exp)
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| AppError::DatabaseError(format!("Failed to sign token: {}", e)))
}

fn verify<T: for<'de> Deserialize<'de>>(token: &str, secret: &str) -> Result<T, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<T>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)?;
    Ok(data.claims)
}

/// Activation token: pending user + 5-digit OTP, 5 minute expiry.
pub fn create_activation_token(user: &PendingUser) -> Result<OtpToken, AppError> {
    let otp = generate_otp(5);
    let (iat, exp) = timestamps(Duration::minutes(5));
    let claims = ActivationClaims {
        user: user.clone(),
        otp: otp.clone(),
        iat,
        exp,
    };
    let token = sign(&claims, &activation_secret())?;
    Ok(OtpToken { token, otp })
}

pub fn verify_activation_token(token: &str) -> Result<ActivationClaims, AppError> {
    verify(token, &activation_secret())
}

/// Email-change token: requested address + 6-digit OTP, 5 minute expiry.
pub fn create_email_change_token(email: &str) -> Result<OtpToken, AppError> {
    let otp = generate_otp(6);
    let (iat, exp) = timestamps(Duration::minutes(5));
    let claims = EmailOtpClaims {
        email: email.to_string(),
        otp: otp.clone(),
        iat,
        exp,
    };
    let token = sign(&claims, &email_change_secret())?;
    Ok(OtpToken { token, otp })
}

pub fn verify_email_change_token(token: &str) -> Result<EmailOtpClaims, AppError> {
    verify(token, &email_change_secret())
}

/// Forgot-password token: account email + 7-digit OTP, 5 minute expiry.
pub fn create_forgot_token(email: &str) -> Result<OtpToken, AppError> {
    let otp = generate_otp(7);
    let (iat, exp) = timestamps(Duration::minutes(5));
    let claims = EmailOtpClaims {
        email: email.to_string(),
        otp: otp.clone(),
        iat,
        exp,
    };
    let token = sign(&claims, &forgot_pass_secret())?;
    Ok(OtpToken { token, otp })
}

pub fn verify_forgot_token(token: &str) -> Result<EmailOtpClaims, AppError> {
    verify(token, &forgot_pass_secret())
}

/// Reset token issued after a successful OTP verify, valid for 7 minutes.
pub fn create_reset_token(email: &str) -> Result<String, AppError> {
    let (iat, exp) = timestamps(Duration::minutes(7));
    let claims = ResetClaims {
        email: email.to_string(),
        iat,
        exp,
    };
    sign(&claims, &reset_pass_secret())
}

pub fn verify_reset_token(token: &str) -> Result<ResetClaims, AppError> {
    verify(token, &reset_pass_secret())
}

pub fn sign_access_token(user_id: &str) -> Result<String, AppError> {
    let (iat, exp) = timestamps(Duration::seconds(access_token_exp()));
    let claims = SessionClaims {
        sub: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat,
        exp,
    };
    sign(&claims, &access_secret())
}

pub fn sign_refresh_token(user_id: &str) -> Result<String, AppError> {
    let (iat, exp) = timestamps(Duration::seconds(refresh_token_exp()));
    let claims = SessionClaims {
        sub: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat,
        exp,
    };
    sign(&claims, &refresh_secret())
}

pub fn verify_access_token(token: &str) -> Result<SessionClaims, AppError> {
    verify(token, &access_secret())
}

pub fn verify_refresh_token(token: &str) -> Result<SessionClaims, AppError> {
    verify(token, &refresh_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingUser {
        PendingUser {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".into(),
        }
    }

    #[test]
    fn test_otp_digit_counts() {
        for digits in [5u32, 6, 7] {
            let otp = generate_otp(digits);
            assert_eq!(otp.len(), digits as usize, "otp {} digits", digits);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(otp.chars().next().unwrap(), '0');
        }
    }

    #[test]
    fn test_activation_token_round_trip() {
        let issued = create_activation_token(&pending()).unwrap();
        let claims = verify_activation_token(&issued.token).unwrap();
        assert_eq!(claims.otp, issued.otp);
        assert_eq!(claims.user.email, "jane@example.com");
        assert_eq!(claims.user.password_hash, pending().password_hash);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issued = create_activation_token(&pending()).unwrap();
        let mut tampered = issued.token.clone();
        tampered.push('x');
        assert!(verify_activation_token(&tampered).is_err());
    }

    #[test]
    fn test_flow_secrets_are_not_interchangeable() {
        // A forgot-password token must not pass email-change verification
        let issued = create_forgot_token("jane@example.com").unwrap();
        assert!(verify_email_change_token(&issued.token).is_err());
        assert!(verify_forgot_token(&issued.token).is_ok());
    }

    #[test]
    fn test_session_token_round_trip() {
        let access = sign_access_token("64f000000000000000000001").unwrap();
        let claims = verify_access_token(&access).unwrap();
        assert_eq!(claims.sub, "64f000000000000000000001");
        assert!(!claims.jti.is_empty());

        // Access tokens are not valid refresh tokens
        assert!(verify_refresh_token(&access).is_err());
    }

    #[test]
    fn test_reset_token_round_trip() {
        let token = create_reset_token("jane@example.com").unwrap();
        let claims = verify_reset_token(&token).unwrap();
        assert_eq!(claims.email, "jane@example.com");
    }
}
