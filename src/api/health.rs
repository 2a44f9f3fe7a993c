use crate::{cache::RedisCache, database::MongoDB};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub mongodb: String,
    pub redis: String,
    pub timestamp: i64,
}

/// Reports whether both backing stores answer. Degraded stores still return
/// 200 so the probe distinguishes "process up" from "dependencies up".
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<MongoDB>, cache: web::Data<RedisCache>) -> impl Responder {
    let mongodb = match db.database().list_collection_names().await {
        Ok(_) => "up".to_string(),
        Err(e) => {
            log::warn!("❌ Health check: MongoDB unreachable: {}", e);
            "down".to_string()
        }
    };
    let redis = match cache.get("health_probe").await {
        Ok(_) => "up".to_string(),
        Err(e) => {
            log::warn!("❌ Health check: Redis unreachable: {}", e);
            "down".to_string()
        }
    };

    let status = if mongodb == "up" && redis == "up" {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        service: "lms-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mongodb,
        redis,
        timestamp: chrono::Utc::now().timestamp(),
    })
}
