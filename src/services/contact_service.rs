use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use serde::Deserialize;
use validator::Validate;

use crate::{
    database::{self, MongoDB},
    models::{ContactMessage, ContactRequest, ReplyRequest},
    services::product_service::parse_object_id,
    utils::{AppError, AppResult},
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesQuery {
    /// Only messages an admin has not read yet
    pub unread: Option<bool>,
}

pub fn messages_filter(unread_only: bool) -> Document {
    if unread_only {
        doc! { "admin_read": false }
    } else {
        doc! {}
    }
}

async fn find_messages(db: &MongoDB, filter: Document) -> AppResult<Vec<ContactMessage>> {
    Ok(db
        .collection::<ContactMessage>(database::CONTACT_MESSAGES)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?)
}

async fn update_message(db: &MongoDB, filter: Document, update: Document) -> AppResult<ContactMessage> {
    db.collection::<ContactMessage>(database::CONTACT_MESSAGES)
        .find_one_and_update(filter, update)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".to_string()))
}

pub async fn submit(db: &MongoDB, request: ContactRequest) -> AppResult<ContactMessage> {
    request.validate()?;

    let mut message = ContactMessage::new(request, chrono::Utc::now().timestamp());

    let result = db
        .collection::<ContactMessage>(database::CONTACT_MESSAGES)
        .insert_one(&message)
        .await?;
    message.id = result.inserted_id.as_object_id();

    log::info!("📨 Contact message from {}: {}", message.email, message.subject);

    Ok(message)
}

// ==================== CLIENT ====================

pub async fn list_mine(db: &MongoDB, email: &str) -> AppResult<Vec<ContactMessage>> {
    find_messages(db, doc! { "email": email.to_lowercase() }).await
}

pub async fn mark_client_read(db: &MongoDB, email: &str, message_id: &str) -> AppResult<ContactMessage> {
    let object_id = parse_object_id(message_id, "message")?;

    update_message(
        db,
        doc! { "_id": object_id, "email": email.to_lowercase() },
        doc! { "$set": { "client_read": true } },
    )
    .await
}

// ==================== ADMIN ====================

pub async fn list_all(db: &MongoDB, unread_only: bool) -> AppResult<Vec<ContactMessage>> {
    find_messages(db, messages_filter(unread_only)).await
}

pub async fn mark_admin_read(db: &MongoDB, message_id: &str) -> AppResult<ContactMessage> {
    let object_id = parse_object_id(message_id, "message")?;

    update_message(db, doc! { "_id": object_id }, doc! { "$set": { "admin_read": true } }).await
}

pub async fn reply(db: &MongoDB, message_id: &str, request: &ReplyRequest) -> AppResult<ContactMessage> {
    request.validate()?;
    if request.reply.trim().is_empty() {
        return Err(AppError::BadRequest("reply cannot be empty".to_string()));
    }

    let object_id = parse_object_id(message_id, "message")?;
    let collection = db.collection::<ContactMessage>(database::CONTACT_MESSAGES);

    let mut message = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

    message.apply_reply(&request.reply, chrono::Utc::now().timestamp());

    collection
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": {
                "reply": message.reply.clone(),
                "replied_at": message.replied_at,
                "admin_read": message.admin_read,
                "client_read": message.client_read,
            } },
        )
        .await?;

    log::info!("💬 Replied to contact message {} from {}", message_id, message.email);

    Ok(message)
}

pub async fn delete(db: &MongoDB, message_id: &str) -> AppResult<()> {
    let object_id = parse_object_id(message_id, "message")?;

    let result = db
        .collection::<ContactMessage>(database::CONTACT_MESSAGES)
        .delete_one(doc! { "_id": object_id })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Message not found".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_filter() {
        assert_eq!(messages_filter(true), doc! { "admin_read": false });
        assert!(messages_filter(false).is_empty());
    }
}
