mod api;
mod cache;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const ADMIN_ROLES: &[&str] = &["admin", "super_admin"];

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let redis_url = env::var("REDIS_URL").expect("REDIS_URL must be set");
    let origin = env::var("ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    log::info!("🚀 Starting LMS Service...");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");
    let db_data = web::Data::new(db);

    log::info!("✅ MongoDB connected successfully");

    // Initialize Redis (session + catalog cache)
    let redis = cache::RedisCache::new(&redis_url)
        .await
        .expect("Failed to connect to Redis");
    let redis_data = web::Data::new(redis);

    log::info!("✅ Redis connected successfully");

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&origin)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(redis_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Auth & user endpoints
            .service(
                web::scope("/api/v1/auth/user")
                    .route("/registration", web::post().to(api::user::register))
                    .route("/activation", web::post().to(api::user::activate))
                    .route("/login", web::post().to(api::user::login))
                    .route("/social", web::post().to(api::user::social_auth))
                    .route(
                        "/request-forgot-pass",
                        web::post().to(api::user::request_forgot_pass),
                    )
                    .route(
                        "/verify-forgot-pass",
                        web::post().to(api::user::verify_forgot_pass),
                    )
                    .route("/save-password", web::patch().to(api::user::save_password))
                    .route("/refresh", web::get().to(api::user::refresh_token))
                    // Session-gated endpoints
                    .service(
                        web::scope("")
                            .wrap(middleware::Authenticated)
                            .route("/logout", web::get().to(api::user::logout))
                            .route("/me", web::get().to(api::user::get_me))
                            .route(
                                "/request-email-update",
                                web::post().to(api::user::request_email_update),
                            )
                            .route(
                                "/activate-update-email",
                                web::patch().to(api::user::activate_update_email),
                            )
                            .route(
                                "/update-userinfo",
                                web::patch().to(api::user::update_userinfo),
                            )
                            .route(
                                "/change-password",
                                web::patch().to(api::user::change_password),
                            )
                            .route("/update-avatar", web::patch().to(api::user::update_avatar)),
                    ),
            )
            // Course endpoints
            .service(
                web::scope("/api/v1/course")
                    .route("/all", web::get().to(api::course::get_all_courses))
                    .route(
                        "/retrieve/{id}",
                        web::get().to(api::course::get_single_course),
                    )
                    .service(
                        web::scope("")
                            .wrap(middleware::Authenticated)
                            .route(
                                "/content/{id}",
                                web::get().to(api::course::get_course_content),
                            )
                            .route("/add-question", web::patch().to(api::course::add_question))
                            .route("/reply-question", web::patch().to(api::course::add_answer))
                            .service(
                                web::resource("/create")
                                    .wrap(middleware::RequireRoles(ADMIN_ROLES))
                                    .route(web::post().to(api::course::create_course)),
                            )
                            .service(
                                web::resource("/edit/{id}")
                                    .wrap(middleware::RequireRoles(ADMIN_ROLES))
                                    .route(web::patch().to(api::course::edit_course)),
                            ),
                    ),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
