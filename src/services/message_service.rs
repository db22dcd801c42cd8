use std::collections::HashMap;

use chrono::Utc;
use log::info;
use sea_orm::*;
use validator::Validate;

use crate::errors::ApiError;
use crate::models::dto::{ChatMessage, MessageResponse, SendMessageRequest, SenderInfo, UnreadCountResponse};
use crate::models::{PrincipalKind, PrincipalRef, admins, complaint_messages, complaints, users};

pub struct MessageService;

impl MessageService {
    /// A user may act on complaints they own, an admin on complaints assigned to them.
    pub async fn authorize(
        db: &DatabaseConnection,
        complaint_id: i32,
        actor: PrincipalRef,
    ) -> Result<complaints::Model, ApiError> {
        let complaint = complaints::Entity::find_by_id(complaint_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Complaint not found".to_string()))?;

        let allowed = match actor.kind {
            PrincipalKind::User => complaint.user_id == actor.id,
            PrincipalKind::Admin => complaint.assigned_to == Some(actor.id),
        };

        if allowed { Ok(complaint) } else { Err(ApiError::unauthorized()) }
    }

    /// The whole conversation, oldest first.
    pub async fn list(db: &DatabaseConnection, complaint_id: i32, actor: PrincipalRef) -> Result<Vec<ChatMessage>, ApiError> {
        Self::authorize(db, complaint_id, actor).await?;

        let messages = complaint_messages::Entity::find()
            .filter(complaint_messages::Column::ComplaintId.eq(complaint_id))
            .order_by_asc(complaint_messages::Column::CreatedAt)
            .order_by_asc(complaint_messages::Column::Id)
            .all(db)
            .await?;

        with_senders(db, messages).await
    }

    pub async fn send(
        db: &DatabaseConnection,
        complaint_id: i32,
        actor: PrincipalRef,
        request: SendMessageRequest,
    ) -> Result<ChatMessage, ApiError> {
        request.validate()?;
        if request.message.trim().is_empty() {
            return Err(ApiError::field("message", "The message field is required."));
        }

        Self::authorize(db, complaint_id, actor).await?;

        let now = Utc::now();
        let message = complaint_messages::ActiveModel {
            complaint_id: Set(complaint_id),
            sender_id: Set(actor.id),
            sender_type: Set(actor.kind),
            message: Set(request.message),
            attachment_path: Set(None),
            is_read: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!("{} {} wrote on complaint {}", actor.kind.as_str(), actor.id, complaint_id);

        with_senders(db, vec![message])
            .await?
            .pop()
            .ok_or_else(|| ApiError::Internal("Message vanished after insert".to_string()))
    }

    /// Flips the read flag. Only messages from the other side can be confirmed.
    pub async fn mark_read(db: &DatabaseConnection, message_id: i32, actor: PrincipalRef) -> Result<MessageResponse, ApiError> {
        let message = complaint_messages::Entity::find_by_id(message_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;

        Self::authorize(db, message.complaint_id, actor).await?;

        if message.sender_type == actor.kind {
            return Err(ApiError::BadRequest("Cannot mark own message as read".to_string()));
        }

        if !message.is_read {
            let mut active: complaint_messages::ActiveModel = message.into();
            active.is_read = Set(true);
            active.updated_at = Set(Utc::now());
            active.update(db).await?;
        }

        Ok(MessageResponse::new("Message marked as read"))
    }

    /// Unread messages written by the other side of the conversation.
    pub async fn unread_count(
        db: &DatabaseConnection,
        complaint_id: i32,
        actor: PrincipalRef,
    ) -> Result<UnreadCountResponse, ApiError> {
        Self::authorize(db, complaint_id, actor).await?;

        let unread_count = complaint_messages::Entity::find()
            .filter(complaint_messages::Column::ComplaintId.eq(complaint_id))
            .filter(complaint_messages::Column::SenderType.eq(actor.kind.counterpart()))
            .filter(complaint_messages::Column::IsRead.eq(false))
            .count(db)
            .await?;

        Ok(UnreadCountResponse { unread_count })
    }
}

/// Resolves each (sender_id, sender_type) against the matching table.
async fn with_senders(
    db: &DatabaseConnection,
    messages: Vec<complaint_messages::Model>,
) -> Result<Vec<ChatMessage>, ApiError> {
    let ids_of = |kind: PrincipalKind| -> Vec<i32> {
        messages.iter().filter(|m| m.sender_type == kind).map(|m| m.sender_id).collect()
    };
    let user_ids = ids_of(PrincipalKind::User);
    let admin_ids = ids_of(PrincipalKind::Admin);

    let mut senders: HashMap<PrincipalRef, SenderInfo> = HashMap::new();

    if !user_ids.is_empty() {
        for user in users::Entity::find().filter(users::Column::Id.is_in(user_ids)).all(db).await? {
            senders.insert(
                PrincipalRef::user(user.id),
                SenderInfo { id: user.id, full_name: user.full_name, email: Some(user.email), role: None },
            );
        }
    }

    if !admin_ids.is_empty() {
        for admin in admins::Entity::find().filter(admins::Column::Id.is_in(admin_ids)).all(db).await? {
            senders.insert(
                PrincipalRef::admin(admin.id),
                SenderInfo { id: admin.id, full_name: admin.full_name, email: None, role: Some(admin.role) },
            );
        }
    }

    Ok(messages
        .into_iter()
        .map(|m| ChatMessage {
            sender: senders.get(&m.sender()).cloned(),
            id: m.id,
            complaint_id: m.complaint_id,
            sender_id: m.sender_id,
            sender_type: m.sender_type,
            message: m.message,
            attachment_path: m.attachment_path,
            is_read: m.is_read,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
        .collect())
}
