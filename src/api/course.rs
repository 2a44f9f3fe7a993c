use crate::{
    cache::RedisCache,
    database::MongoDB,
    models::SessionUser,
    services::course_service,
};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/v1/course/create",
    tag = "Course",
    request_body = course_service::CreateCourseRequest,
    responses(
        (status = 201, description = "Course created"),
        (status = 403, description = "Role not allowed")
    )
)]
pub async fn create_course(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    request: web::Json<course_service::CreateCourseRequest>,
) -> HttpResponse {
    log::info!("📚 POST /course/create - name: {}", request.name);

    match course_service::create_course(&db, &cache, request.into_inner()).await {
        Ok(course) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": "Course created successfully",
            "data": course,
        })),
        Err(e) => {
            log::warn!("❌ Course create failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn edit_course(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    path: web::Path<String>,
    request: web::Json<course_service::EditCourseRequest>,
) -> HttpResponse {
    let course_id = path.into_inner();
    log::info!("📚 PATCH /course/edit/{}", course_id);

    match course_service::edit_course(&db, &cache, &course_id, request.into_inner()).await {
        Ok(course) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Course updated successfully",
            "data": course,
        })),
        Err(e) => {
            log::warn!("❌ Course edit failed: {} - {}", course_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/course/retrieve/{id}",
    tag = "Course",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course preview"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_single_course(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
    path: web::Path<String>,
) -> HttpResponse {
    let course_id = path.into_inner();
    log::info!("📖 GET /course/retrieve/{}", course_id);

    match course_service::get_single_course(&db, &cache, &course_id).await {
        Ok(course) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Course retrieved successfully",
            "data": course,
        })),
        Err(e) => {
            log::warn!("❌ Course retrieve failed: {} - {}", course_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/course/all",
    tag = "Course",
    responses(
        (status = 200, description = "Course catalog")
    )
)]
pub async fn get_all_courses(
    db: web::Data<MongoDB>,
    cache: web::Data<RedisCache>,
) -> HttpResponse {
    log::info!("📖 GET /course/all");

    match course_service::get_all_courses(&db, &cache).await {
        Ok(courses) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Courses retrieved successfully",
            "data": courses,
        })),
        Err(e) => {
            log::warn!("❌ Course list failed: {}", e);
            e.to_response()
        }
    }
}

/// Full content, only for users whose session lists the course as purchased.
pub async fn get_course_content(
    db: web::Data<MongoDB>,
    user: SessionUser,
    path: web::Path<String>,
) -> HttpResponse {
    let course_id = path.into_inner();
    log::info!("🎓 GET /course/content/{} - user: {}", course_id, user.id);

    match course_service::get_course_content(&db, &user, &course_id).await {
        Ok(content) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Content retrieved successfully",
            "data": content,
        })),
        Err(e) => {
            log::warn!("❌ Content access failed: {} - {}", course_id, e);
            e.to_response()
        }
    }
}

pub async fn add_question(
    db: web::Data<MongoDB>,
    user: SessionUser,
    request: web::Json<course_service::AddQuestionRequest>,
) -> HttpResponse {
    log::info!(
        "💬 PATCH /course/add-question - course: {}",
        request.course_id
    );

    match course_service::add_question(&db, &user, &request).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Question added successfully",
        })),
        Err(e) => {
            log::warn!("❌ Add question failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn add_answer(
    db: web::Data<MongoDB>,
    user: SessionUser,
    request: web::Json<course_service::AddAnswerRequest>,
) -> HttpResponse {
    log::info!(
        "💬 PATCH /course/reply-question - question: {}",
        request.question_id
    );

    match course_service::add_answer(&db, &user, &request).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Reply added successfully",
        })),
        Err(e) => {
            log::warn!("❌ Add reply failed: {}", e);
            e.to_response()
        }
    }
}
