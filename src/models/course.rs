use crate::models::user::MediaRef;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Author snapshot embedded in questions, replies and reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<MediaRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReply {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: CommentAuthor,
    pub answer: String,
    pub created_at: Option<BsonDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: CommentAuthor,
    pub question: String,
    #[serde(default)]
    pub question_replies: Vec<QuestionReply>,
    pub created_at: Option<BsonDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: CommentAuthor,
    #[serde(default)]
    pub rating: f64,
    pub comment: String,
    #[serde(default)]
    pub comment_replies: Vec<QuestionReply>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// One lecture/content item. The fields marked with defaults are stripped by
/// the catalog preview projection, so a preview document still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
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
    pub links: Vec<Link>,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleItem {
    pub title: String,
}

/// Course document as stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<MediaRef>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    #[serde(default)]
    pub benefits: Vec<TitleItem>,
    #[serde(default)]
    pub prerequisites: Vec<TitleItem>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub course_data: Vec<CourseItem>,
    #[serde(default)]
    pub ratings: f64,
    #[serde(default)]
    pub purchased: i64,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_preview_document_deserializes_without_content_fields() {
        // Shape produced by the catalog projection: content details stripped
        let document = doc! {
            "_id": ObjectId::new(),
            "name": "Rust for Backend Developers",
            "description": "From zero to production",
            "price": 49.0,
            "tags": "rust,backend",
            "level": "intermediate",
            "demo_url": "https://example.com/demo",
            "course_data": [
                { "_id": ObjectId::new(), "title": "Intro", "video_section": "Getting Started" },
            ],
        };
        let course: Course = mongodb::bson::from_document(document).unwrap();
        assert_eq!(course.course_data.len(), 1);
        let item = &course.course_data[0];
        assert!(item.video_url.is_empty());
        assert!(item.links.is_empty());
        assert!(item.questions.is_empty());
        assert_eq!(course.ratings, 0.0);
        assert_eq!(course.purchased, 0);
    }
}
