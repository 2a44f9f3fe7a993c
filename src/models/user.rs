use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Reference to an external media object (avatar or thumbnail). The upload
/// itself happens outside this service; only the reference is stored.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MediaRef {
    pub public_id: String,
    pub url: String,
}

/// Purchased-course reference embedded in the user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRef {
    pub course_id: String,
}

/// User document as stored in MongoDB. The password field holds a bcrypt
/// hash and is never serialized into API responses or the session cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>, // None for social-auth accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<MediaRef>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub courses: Vec<CourseRef>,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

fn default_role() -> String {
    "user".to_string()
}

/// Public projection of a user. This is what gets cached in Redis as the
/// session record and attached to authenticated requests.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<MediaRef>,
    pub role: String,
    pub is_verified: bool,
    pub courses: Vec<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role: user.role.clone(),
            is_verified: user.is_verified,
            courses: user.courses.iter().map(|c| c.course_id.clone()).collect(),
        }
    }
}

impl SessionUser {
    pub fn has_course(&self, course_id: &str) -> bool {
        self.courses.iter().any(|c| c == course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_deserialize_defaults() {
        // Old documents without role/is_verified/courses still deserialize
        let document = doc! {
            "_id": ObjectId::new(),
            "name": "Jane",
            "email": "jane@example.com",
        };
        let user: User = mongodb::bson::from_document(document).unwrap();
        assert_eq!(user.role, "user");
        assert!(!user.is_verified);
        assert!(user.courses.is_empty());
        assert!(user.password.is_none());
    }

    #[test]
    fn test_session_user_strips_password() {
        let user = User {
            id: Some(ObjectId::new()),
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password: Some("$2b$10$hash".into()),
            avatar: None,
            role: "user".into(),
            is_verified: true,
            courses: vec![CourseRef {
                course_id: "abc".into(),
            }],
            created_at: None,
            updated_at: None,
        };
        let session = SessionUser::from(&user);
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("$2b$10$hash"));
        assert!(session.has_course("abc"));
        assert!(!session.has_course("def"));
    }
}
