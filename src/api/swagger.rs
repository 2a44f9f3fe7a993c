use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LMS Service API",
        version = "1.0.0",
        description = "Learning-management backend. \n\n**Authentication:** session cookies (`ac_token` / `rf_token`) issued by the login endpoint; course mutation endpoints additionally require the admin or super_admin role.",
    ),
    paths(
        // Auth endpoints
        crate::api::user::register,
        crate::api::user::activate,
        crate::api::user::login,
        crate::api::user::get_me,

        // Course endpoints
        crate::api::course::create_course,
        crate::api::course::get_all_courses,
        crate::api::course::get_single_course,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::user_service::RegisterRequest,
            crate::services::user_service::RegistrationResponse,
            crate::services::user_service::ActivationRequest,
            crate::services::user_service::LoginRequest,
            crate::models::SessionUser,
            crate::models::MediaRef,
            crate::services::course_service::CreateCourseRequest,
            crate::services::course_service::CourseItemInput,
            crate::services::course_service::LinkInput,
            crate::services::course_service::TitleInput,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration with OTP-gated activation, cookie sessions, password reset and profile management."),
        (name = "Course", description = "Course catalog with cached reads, purchased content access and Q&A threads."),
        (name = "Health", description = "Health check endpoint for monitoring service status."),
    )
)]
pub struct ApiDoc;
