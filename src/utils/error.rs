use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Application error, mapped onto HTTP status codes by the handlers.
#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    CacheError(String),
    NotFound(String),
    InvalidRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// JSON envelope used by every failing handler.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::CacheError(msg) => write!(f, "Cache error: {}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::InvalidRequest(msg) => write!(f, "{}", msg),
            AppError::Unauthorized(msg) => write!(f, "{}", msg),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        self.to_response()
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        // Duplicate key (E11000) surfaces as a conflict, everything else is a 500
        if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
            if write_error.code == 11000 {
                return AppError::Conflict("Duplicate value entered".to_string());
            }
        }
        AppError::DatabaseError(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => {
                AppError::Unauthorized("Token is expired! Please try again".to_string())
            }
            _ => AppError::Unauthorized("Token is invalid! Please try again".to_string()),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::DatabaseError(format!("Password hashing failed: {}", err))
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(_: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidRequest("Resource not found, invalid id".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::DatabaseError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expired_jwt_maps_to_unauthorized() {
        let err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature);
        let app_err: AppError = err.into();
        assert_eq!(app_err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(app_err.to_string().contains("expired"));
    }

    #[test]
    fn test_invalid_oid_maps_to_bad_request() {
        let err = mongodb::bson::oid::ObjectId::parse_str("not-an-oid").unwrap_err();
        let app_err: AppError = err.into();
        assert_eq!(app_err.status_code(), StatusCode::BAD_REQUEST);
    }
}
