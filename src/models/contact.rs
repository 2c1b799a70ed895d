use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Support ticket submitted through the public contact form
/// (`contact_messages` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub admin_read: bool,
    pub client_read: bool,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub replied_at: Option<i64>,
    pub created_at: i64,
}

impl ContactMessage {
    pub fn new(request: ContactRequest, now: i64) -> Self {
        ContactMessage {
            id: None,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            subject: request.subject.trim().to_string(),
            message: request.message.trim().to_string(),
            admin_read: false,
            client_read: true,
            reply: None,
            replied_at: None,
            created_at: now,
        }
    }

    /// An admin reply is unread for the client until they open it.
    pub fn apply_reply(&mut self, reply: &str, now: i64) {
        self.reply = Some(reply.trim().to_string());
        self.replied_at = Some(now);
        self.admin_read = true;
        self.client_read = false;
    }
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ContactRequest {
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub subject: String,
    #[validate(length(min = 10, max = 5000, message = "must be between 10 and 5000 characters"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 5000, message = "cannot be empty"))]
    pub reply: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ContactMessageResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub admin_read: bool,
    pub client_read: bool,
    pub reply: Option<String>,
    pub replied_at: Option<i64>,
    pub created_at: i64,
}

impl From<ContactMessage> for ContactMessageResponse {
    fn from(message: ContactMessage) -> Self {
        ContactMessageResponse {
            id: message.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: message.name,
            email: message.email,
            subject: message.subject,
            message: message.message,
            admin_read: message.admin_read,
            client_read: message.client_read,
            reply: message.reply,
            replied_at: message.replied_at,
            created_at: message.created_at,
        }
    }
}
