use crate::{
    cache::{RedisCache, ALL_COURSES_KEY},
    database::MongoDB,
    models::{
        CommentAuthor, Course, CourseItem, Link, MediaRef, Question, QuestionReply, SessionUser,
        TitleItem,
    },
    utils::error::AppError,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};

const COLLECTION: &str = "courses";

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CourseItemInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: String,
    pub video_section: String,
    #[serde(default)]
    pub video_length: f64,
    #[serde(default)]
    pub video_player: String,
    #[serde(default)]
    pub links: Vec<LinkInput>,
    #[serde(default)]
    pub suggestion: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LinkInput {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCourseRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub estimate_price: Option<f64>,
    pub thumbnail: Option<MediaRef>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    #[serde(default)]
    pub benefits: Vec<TitleInput>,
    #[serde(default)]
    pub prerequisites: Vec<TitleInput>,
    #[serde(default)]
    pub course_data: Vec<CourseItemInput>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TitleInput {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct EditCourseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub estimate_price: Option<f64>,
    pub thumbnail: Option<MediaRef>,
    pub tags: Option<String>,
    pub level: Option<String>,
    pub demo_url: Option<String>,
    pub benefits: Option<Vec<TitleInput>>,
    pub prerequisites: Option<Vec<TitleInput>>,
    pub course_data: Option<Vec<CourseItemInput>>,
}

#[derive(Debug, Deserialize)]
pub struct AddQuestionRequest {
    pub course_id: String,
    pub content_id: String,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct AddAnswerRequest {
    pub course_id: String,
    pub content_id: String,
    pub question_id: String,
    pub answer: String,
}

// ==================== HELPERS ====================

/// Projection for catalog reads: content details (video url, suggestion,
/// links, question threads) stay out of public previews.
fn preview_projection() -> Document {
    doc! {
        "course_data.video_url": 0,
        "course_data.suggestion": 0,
        "course_data.links": 0,
        "course_data.questions": 0,
    }
}

fn content_item_from_input(input: CourseItemInput) -> CourseItem {
    CourseItem {
        id: Some(ObjectId::new()),
        title: input.title,
        description: input.description,
        video_url: input.video_url,
        video_section: input.video_section,
        video_length: input.video_length,
        video_player: input.video_player,
        links: input
            .links
            .into_iter()
            .map(|l| Link {
                title: l.title,
                url: l.url,
            })
            .collect(),
        suggestion: input.suggestion,
        questions: vec![],
    }
}

fn new_course(request: CreateCourseRequest) -> Course {
    Course {
        id: None,
        name: request.name,
        description: request.description,
        price: request.price,
        estimate_price: request.estimate_price,
        thumbnail: request.thumbnail,
        tags: request.tags,
        level: request.level,
        demo_url: request.demo_url,
        benefits: request
            .benefits
            .into_iter()
            .map(|b| TitleItem { title: b.title })
            .collect(),
        prerequisites: request
            .prerequisites
            .into_iter()
            .map(|p| TitleItem { title: p.title })
            .collect(),
        reviews: vec![],
        course_data: request
            .course_data
            .into_iter()
            .map(content_item_from_input)
            .collect(),
        ratings: 0.0,
        purchased: 0,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    }
}

fn to_bson<T: Serialize>(value: &T) -> Result<mongodb::bson::Bson, AppError> {
    mongodb::bson::to_bson(value).map_err(|e| AppError::DatabaseError(e.to_string()))
}

/// `$set` document built only from the fields the request actually carries.
fn build_edit_document(request: EditCourseRequest) -> Result<Document, AppError> {
    let mut set = Document::new();
    if let Some(name) = request.name {
        set.insert("name", name);
    }
    if let Some(description) = request.description {
        set.insert("description", description);
    }
    if let Some(price) = request.price {
        set.insert("price", price);
    }
    if let Some(estimate_price) = request.estimate_price {
        set.insert("estimate_price", estimate_price);
    }
    if let Some(thumbnail) = request.thumbnail {
        set.insert("thumbnail", to_bson(&thumbnail)?);
    }
    if let Some(tags) = request.tags {
        set.insert("tags", tags);
    }
    if let Some(level) = request.level {
        set.insert("level", level);
    }
    if let Some(demo_url) = request.demo_url {
        set.insert("demo_url", demo_url);
    }
    if let Some(benefits) = request.benefits {
        set.insert("benefits", to_bson(&benefits)?);
    }
    if let Some(prerequisites) = request.prerequisites {
        set.insert("prerequisites", to_bson(&prerequisites)?);
    }
    if let Some(course_data) = request.course_data {
        let items: Vec<CourseItem> = course_data.into_iter().map(content_item_from_input).collect();
        set.insert("course_data", to_bson(&items)?);
    }
    set.insert("updated_at", BsonDateTime::now());
    Ok(set)
}

fn author_snapshot(user: &SessionUser) -> CommentAuthor {
    CommentAuthor {
        user_id: user.id.clone(),
        name: user.name.clone(),
        avatar: user.avatar.clone(),
    }
}

async fn fetch_all_previews(db: &MongoDB) -> Result<Vec<Course>, AppError> {
    let collection = db.collection::<Course>(COLLECTION);
    let cursor = collection
        .find(doc! {})
        .projection(preview_projection())
        .await?;
    Ok(cursor.try_collect().await?)
}

async fn fetch_preview(db: &MongoDB, course_id: &ObjectId) -> Result<Option<Course>, AppError> {
    let collection = db.collection::<Course>(COLLECTION);
    Ok(collection
        .find_one(doc! { "_id": course_id })
        .projection(preview_projection())
        .await?)
}

/// Overwrites the cached catalog list from the store. Called after every
/// course write; a plain SET keeps concurrent readers on the old entry
/// instead of a cache miss window.
async fn repopulate_catalog_cache(db: &MongoDB, cache: &RedisCache) -> Result<(), AppError> {
    let courses = fetch_all_previews(db).await?;
    let payload = serde_json::to_string(&courses)
        .map_err(|e| AppError::CacheError(format!("Failed to serialize courses: {}", e)))?;
    cache.set(ALL_COURSES_KEY, &payload).await?;
    Ok(())
}

async fn repopulate_single_cache(
    db: &MongoDB,
    cache: &RedisCache,
    course_id: &ObjectId,
) -> Result<(), AppError> {
    if let Some(course) = fetch_preview(db, course_id).await? {
        let payload = serde_json::to_string(&course)
            .map_err(|e| AppError::CacheError(format!("Failed to serialize course: {}", e)))?;
        cache.set(&course_id.to_hex(), &payload).await?;
    }
    Ok(())
}

// ==================== SERVICE FUNCTIONS ====================

pub async fn create_course(
    db: &MongoDB,
    cache: &RedisCache,
    request: CreateCourseRequest,
) -> Result<Course, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Must need to provide a name".to_string(),
        ));
    }

    let course = new_course(request);
    let collection = db.collection::<Course>(COLLECTION);
    let result = collection.insert_one(&course).await?;
    let inserted_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::DatabaseError("Insert returned no id".to_string()))?;

    repopulate_catalog_cache(db, cache).await?;
    log::info!("✅ Course created: {} ({})", course.name, inserted_id);

    let mut created = course;
    created.id = Some(inserted_id);
    Ok(created)
}

pub async fn edit_course(
    db: &MongoDB,
    cache: &RedisCache,
    course_id: &str,
    request: EditCourseRequest,
) -> Result<Course, AppError> {
    let oid = ObjectId::parse_str(course_id)?;
    let set = build_edit_document(request)?;

    let collection = db.collection::<Course>(COLLECTION);
    let updated = collection
        .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    // Refresh both keys the read paths consult
    repopulate_single_cache(db, cache, &oid).await?;
    repopulate_catalog_cache(db, cache).await?;

    log::info!("✅ Course updated: {}", course_id);
    Ok(updated)
}

pub async fn get_single_course(
    db: &MongoDB,
    cache: &RedisCache,
    course_id: &str,
) -> Result<Course, AppError> {
    let oid = ObjectId::parse_str(course_id)?;

    if let Some(cached) = cache.get(&oid.to_hex()).await? {
        if let Ok(course) = serde_json::from_str::<Course>(&cached) {
            return Ok(course);
        }
        // Corrupt entry falls through to the store and gets overwritten
    }

    let course = fetch_preview(db, &oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    let payload = serde_json::to_string(&course)
        .map_err(|e| AppError::CacheError(format!("Failed to serialize course: {}", e)))?;
    cache.set(&oid.to_hex(), &payload).await?;

    Ok(course)
}

pub async fn get_all_courses(db: &MongoDB, cache: &RedisCache) -> Result<Vec<Course>, AppError> {
    if let Some(cached) = cache.get(ALL_COURSES_KEY).await? {
        if let Ok(courses) = serde_json::from_str::<Vec<Course>>(&cached) {
            return Ok(courses);
        }
    }

    let courses = fetch_all_previews(db).await?;
    let payload = serde_json::to_string(&courses)
        .map_err(|e| AppError::CacheError(format!("Failed to serialize courses: {}", e)))?;
    cache.set(ALL_COURSES_KEY, &payload).await?;

    Ok(courses)
}

/// Full content for a purchased course. Membership comes from the session
/// record, which profile and purchase writes keep current.
pub async fn get_course_content(
    db: &MongoDB,
    user: &SessionUser,
    course_id: &str,
) -> Result<Vec<CourseItem>, AppError> {
    let oid = ObjectId::parse_str(course_id)?;

    if !user.has_course(&oid.to_hex()) {
        return Err(AppError::NotFound(
            "You are not eligible to access this course".to_string(),
        ));
    }

    let collection = db.collection::<Course>(COLLECTION);
    let course = collection
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    Ok(course.course_data)
}

pub async fn add_question(
    db: &MongoDB,
    user: &SessionUser,
    request: &AddQuestionRequest,
) -> Result<(), AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Question can not be empty".to_string(),
        ));
    }

    let course_oid = ObjectId::parse_str(&request.course_id)?;
    let content_oid = ObjectId::parse_str(&request.content_id)?;

    let question = Question {
        id: Some(ObjectId::new()),
        user: author_snapshot(user),
        question: request.question.clone(),
        question_replies: vec![],
        created_at: Some(BsonDateTime::now()),
    };

    let collection = db.collection::<Course>(COLLECTION);
    let result = collection
        .update_one(
            doc! { "_id": course_oid, "course_data._id": content_oid },
            doc! {
                "$push": { "course_data.$.questions": to_bson(&question)? },
                "$set": { "updated_at": BsonDateTime::now() },
            },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Course content not found".to_string()));
    }

    log::info!(
        "💬 Question added to course {} content {}",
        request.course_id,
        request.content_id
    );
    Ok(())
}

pub async fn add_answer(
    db: &MongoDB,
    user: &SessionUser,
    request: &AddAnswerRequest,
) -> Result<(), AppError> {
    if request.answer.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Answer can not be empty".to_string(),
        ));
    }

    let course_oid = ObjectId::parse_str(&request.course_id)?;
    let content_oid = ObjectId::parse_str(&request.content_id)?;
    let question_oid = ObjectId::parse_str(&request.question_id)?;

    let reply = QuestionReply {
        id: Some(ObjectId::new()),
        user: author_snapshot(user),
        answer: request.answer.clone(),
        created_at: Some(BsonDateTime::now()),
    };

    let collection = db.collection::<Course>(COLLECTION);
    let result = collection
        .update_one(
            doc! { "_id": course_oid },
            doc! {
                "$push": {
                    "course_data.$[content].questions.$[question].question_replies":
                        to_bson(&reply)?
                },
                "$set": { "updated_at": BsonDateTime::now() },
            },
        )
        .array_filters(vec![
            doc! { "content._id": content_oid },
            doc! { "question._id": question_oid },
        ])
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Course not found".to_string()));
    }
    if result.modified_count == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    log::info!(
        "💬 Reply added to question {} in course {}",
        request.question_id,
        request.course_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateCourseRequest {
        CreateCourseRequest {
            name: "Rust for Backend Developers".into(),
            description: "From zero to production".into(),
            price: 49.0,
            estimate_price: Some(99.0),
            thumbnail: None,
            tags: "rust,backend".into(),
            level: "intermediate".into(),
            demo_url: "https://example.com/demo".into(),
            benefits: vec![TitleInput {
                title: "Ship real services".into(),
            }],
            prerequisites: vec![],
            course_data: vec![CourseItemInput {
                title: "Intro".into(),
                description: "Welcome".into(),
                video_url: "https://example.com/v/1".into(),
                video_section: "Getting Started".into(),
                video_length: 12.5,
                video_player: "vdo".into(),
                links: vec![],
                suggestion: String::new(),
            }],
        }
    }

    #[test]
    fn test_new_course_assigns_content_ids() {
        let course = new_course(create_request());
        assert_eq!(course.course_data.len(), 1);
        assert!(course.course_data[0].id.is_some());
        assert!(course.course_data[0].questions.is_empty());
        assert_eq!(course.ratings, 0.0);
        assert_eq!(course.purchased, 0);
    }

    #[test]
    fn test_build_edit_document_only_sets_provided_fields() {
        let request = EditCourseRequest {
            name: Some("New name".into()),
            description: None,
            price: Some(59.0),
            estimate_price: None,
            thumbnail: None,
            tags: None,
            level: None,
            demo_url: None,
            benefits: None,
            prerequisites: None,
            course_data: None,
        };
        let set = build_edit_document(request).unwrap();
        assert!(set.contains_key("name"));
        assert!(set.contains_key("price"));
        assert!(set.contains_key("updated_at"));
        assert!(!set.contains_key("description"));
        assert!(!set.contains_key("course_data"));
    }

    #[test]
    fn test_preview_projection_strips_content_details() {
        let projection = preview_projection();
        for key in [
            "course_data.video_url",
            "course_data.suggestion",
            "course_data.links",
            "course_data.questions",
        ] {
            assert_eq!(projection.get_i32(key).unwrap(), 0);
        }
    }
}
