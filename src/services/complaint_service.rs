use std::collections::HashMap;

use chrono::Utc;
use log::{info, warn};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use validator::Validate;

use crate::errors::ApiError;
use crate::models::dto::{
    AdminSummary, CategoryCount, ComplaintFilter, ComplaintResponse, NewComplaint, PriorityCount,
    StatisticsResponse, UpdateResponse, UpdateStatusRequest,
};
use crate::models::{
    ComplaintStatus, PrincipalKind, PrincipalRef, Priority, admins, complaint_attachments, complaint_categories,
    complaint_messages, complaint_updates, complaints, users,
};
use crate::services::storage::{AttachmentStore, UploadedFile};
use crate::utils::tokens;

const NUMBER_ATTEMPTS: usize = 10;

pub struct ComplaintService;

impl ComplaintService {
    /// Files a new Pending complaint for `user_id`, with an optional attachment.
    pub async fn create(
        db: &DatabaseConnection,
        store: &AttachmentStore,
        user_id: i32,
        complaint: NewComplaint,
        attachment: Option<UploadedFile>,
    ) -> Result<ComplaintResponse, ApiError> {
        complaint.validate()?;

        if complaint_categories::Entity::find_by_id(complaint.category_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(ApiError::field("category_id", "The selected category id is invalid."));
        }

        if let Some(admin_id) = complaint.assigned_to {
            if admins::Entity::find_by_id(admin_id).one(db).await?.is_none() {
                return Err(ApiError::field("assigned_to", "The selected assigned to is invalid."));
            }
        }

        if let Some(upload) = &attachment {
            upload.validate()?;
        }

        // The file goes first so the rows never point at something missing.
        let stored_path = match &attachment {
            Some(upload) => Some(store.save(upload).await?),
            None => None,
        };

        let result = Self::insert_rows(db, user_id, complaint, attachment.as_ref(), stored_path.as_deref()).await;

        match result {
            Ok(created) => {
                info!("Complaint {} filed by user {}", created.complaint_number, user_id);
                Self::hydrate_one(db, created).await
            }
            Err(e) => {
                if let Some(path) = &stored_path {
                    if let Err(cleanup) = store.delete(path).await {
                        warn!("Could not remove orphaned attachment {}: {}", path, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    async fn insert_rows(
        db: &DatabaseConnection,
        user_id: i32,
        complaint: NewComplaint,
        upload: Option<&UploadedFile>,
        stored_path: Option<&str>,
    ) -> Result<complaints::Model, ApiError> {
        let now = Utc::now();
        let txn = db.begin().await?;

        let complaint_number = unique_complaint_number(&txn).await?;
        let created = complaints::ActiveModel {
            user_id: Set(user_id),
            category_id: Set(complaint.category_id),
            assigned_to: Set(complaint.assigned_to),
            complaint_number: Set(complaint_number),
            subject: Set(complaint.subject),
            description: Set(complaint.description),
            priority: Set(complaint.priority.unwrap_or_default()),
            status: Set(ComplaintStatus::Pending),
            is_anonymous: Set(complaint.is_anonymous),
            location: Set(complaint.location),
            resolved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let (Some(upload), Some(path)) = (upload, stored_path) {
            complaint_attachments::ActiveModel {
                complaint_id: Set(created.id),
                file_name: Set(upload.file_name.clone()),
                file_path: Set(path.to_string()),
                mime_type: Set(upload.mime_type.clone()),
                file_size: Set(i64::try_from(upload.size).unwrap_or(i64::MAX)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(created)
    }

    /// Complaints owned by one user, newest first.
    pub async fn list_for_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<ComplaintResponse>, ApiError> {
        let rows = complaints::Entity::find()
            .filter(complaints::Column::UserId.eq(user_id))
            .order_by_desc(complaints::Column::CreatedAt)
            .order_by_desc(complaints::Column::Id)
            .all(db)
            .await?;

        Self::hydrate(db, rows).await
    }

    /// Every complaint, newest first, narrowed by the filters that are set.
    pub async fn list_all(db: &DatabaseConnection, filter: ComplaintFilter) -> Result<Vec<ComplaintResponse>, ApiError> {
        let mut query = complaints::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(complaints::Column::Status.eq(status));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(complaints::Column::CategoryId.eq(category_id));
        }

        let rows = query
            .order_by_desc(complaints::Column::CreatedAt)
            .order_by_desc(complaints::Column::Id)
            .all(db)
            .await?;

        Self::hydrate(db, rows).await
    }

    /// A user sees only their own complaints; an admin sees any.
    pub async fn show(db: &DatabaseConnection, id: i32, viewer: PrincipalRef) -> Result<ComplaintResponse, ApiError> {
        let complaint = Self::find_visible(db, id, viewer).await?;
        Self::hydrate_one(db, complaint).await
    }

    async fn find_visible(db: &DatabaseConnection, id: i32, viewer: PrincipalRef) -> Result<complaints::Model, ApiError> {
        let mut query = complaints::Entity::find_by_id(id);
        if viewer.kind == PrincipalKind::User {
            query = query.filter(complaints::Column::UserId.eq(viewer.id));
        }

        query.one(db).await?.ok_or_else(complaint_not_found)
    }

    /// Moves a complaint to any status and records the change.
    /// Resolved stamps `resolved_at`; leaving Resolved keeps it.
    pub async fn transition(
        db: &DatabaseConnection,
        id: i32,
        admin_id: i32,
        request: UpdateStatusRequest,
    ) -> Result<ComplaintResponse, ApiError> {
        let now = Utc::now();
        let txn = db.begin().await?;

        let complaint = complaints::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(complaint_not_found)?;
        let previous = complaint.status;

        let mut active: complaints::ActiveModel = complaint.into();
        active.status = Set(request.status);
        active.updated_at = Set(now);
        if request.status == ComplaintStatus::Resolved {
            active.resolved_at = Set(Some(now));
        }
        let updated = active.update(&txn).await?;

        complaint_updates::ActiveModel {
            complaint_id: Set(id),
            admin_id: Set(admin_id),
            previous_status: Set(previous),
            new_status: Set(request.status),
            comments: Set(request.comments),
            resolution_details: Set(request.resolution_details),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(
            "Complaint {} moved from {} to {} by admin {}",
            updated.complaint_number, previous, request.status, admin_id
        );

        Self::hydrate_one(db, updated).await
    }

    /// Owner-only, and only while Pending. Takes the attachment, audit rows and
    /// messages with it.
    pub async fn delete(db: &DatabaseConnection, store: &AttachmentStore, id: i32, user_id: i32) -> Result<(), ApiError> {
        let complaint = Self::find_visible(db, id, PrincipalRef::user(user_id)).await?;

        if complaint.status != ComplaintStatus::Pending {
            return Err(ApiError::RuleViolation(format!(
                "Only pending complaints can be deleted. This complaint is already {}.",
                complaint.status
            )));
        }

        let attachments = complaint_attachments::Entity::find()
            .filter(complaint_attachments::Column::ComplaintId.eq(id))
            .all(db)
            .await?;

        let txn = db.begin().await?;
        complaint_attachments::Entity::delete_many()
            .filter(complaint_attachments::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        complaint_updates::Entity::delete_many()
            .filter(complaint_updates::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        complaint_messages::Entity::delete_many()
            .filter(complaint_messages::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        complaints::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        for attachment in attachments {
            store.delete(&attachment.file_path).await?;
        }

        info!("Complaint {} deleted by user {}", complaint.complaint_number, user_id);
        Ok(())
    }

    /// Aggregate counts, computed on every call.
    pub async fn statistics(db: &DatabaseConnection) -> Result<StatisticsResponse, ApiError> {
        let total = complaints::Entity::find().count(db).await?;
        let pending = count_with_status(db, ComplaintStatus::Pending).await?;
        let in_progress = count_with_status(db, ComplaintStatus::InProgress).await?;
        let resolved = count_with_status(db, ComplaintStatus::Resolved).await?;

        let per_category: Vec<(i32, i64)> = complaints::Entity::find()
            .select_only()
            .column(complaints::Column::CategoryId)
            .column_as(Expr::col(complaints::Column::Id).count(), "count")
            .group_by(complaints::Column::CategoryId)
            .order_by_asc(complaints::Column::CategoryId)
            .into_tuple()
            .all(db)
            .await?;

        let names: HashMap<i32, String> = complaint_categories::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|category| (category.id, category.category_name))
            .collect();

        let by_category = per_category
            .into_iter()
            .map(|(category_id, count)| CategoryCount {
                category_id,
                category_name: names.get(&category_id).cloned(),
                count,
            })
            .collect();

        let per_priority: Vec<(Priority, i64)> = complaints::Entity::find()
            .select_only()
            .column(complaints::Column::Priority)
            .column_as(Expr::col(complaints::Column::Id).count(), "count")
            .group_by(complaints::Column::Priority)
            .into_tuple()
            .all(db)
            .await?;

        let by_priority = per_priority
            .into_iter()
            .map(|(priority, count)| PriorityCount { priority, count })
            .collect();

        Ok(StatisticsResponse { total, pending, in_progress, resolved, by_category, by_priority })
    }

    pub async fn active_categories(db: &DatabaseConnection) -> Result<Vec<complaint_categories::Model>, ApiError> {
        let categories = complaint_categories::Entity::find()
            .filter(complaint_categories::Column::IsActive.eq(true))
            .order_by_asc(complaint_categories::Column::Id)
            .all(db)
            .await?;
        Ok(categories)
    }

    async fn hydrate_one(db: &DatabaseConnection, complaint: complaints::Model) -> Result<ComplaintResponse, ApiError> {
        Self::hydrate(db, vec![complaint])
            .await?
            .pop()
            .ok_or_else(complaint_not_found)
    }

    /// Attaches category, owner, assigned admin, attachment and the audit trail,
    /// keeping the input order.
    async fn hydrate(db: &DatabaseConnection, rows: Vec<complaints::Model>) -> Result<Vec<ComplaintResponse>, ApiError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
        let category_ids: Vec<i32> = rows.iter().map(|c| c.category_id).collect();
        let user_ids: Vec<i32> = rows.iter().map(|c| c.user_id).collect();

        let categories: HashMap<i32, complaint_categories::Model> = complaint_categories::Entity::find()
            .filter(complaint_categories::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let owners: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut attachments: HashMap<i32, complaint_attachments::Model> = HashMap::new();
        for attachment in complaint_attachments::Entity::find()
            .filter(complaint_attachments::Column::ComplaintId.is_in(ids.clone()))
            .order_by_asc(complaint_attachments::Column::Id)
            .all(db)
            .await?
        {
            attachments.entry(attachment.complaint_id).or_insert(attachment);
        }

        let updates = complaint_updates::Entity::find()
            .filter(complaint_updates::Column::ComplaintId.is_in(ids))
            .order_by_asc(complaint_updates::Column::Id)
            .all(db)
            .await?;

        let mut admin_ids: Vec<i32> = rows.iter().filter_map(|c| c.assigned_to).collect();
        admin_ids.extend(updates.iter().map(|u| u.admin_id));
        admin_ids.sort_unstable();
        admin_ids.dedup();

        let admins: HashMap<i32, AdminSummary> = if admin_ids.is_empty() {
            HashMap::new()
        } else {
            admins::Entity::find()
                .filter(admins::Column::Id.is_in(admin_ids))
                .all(db)
                .await?
                .iter()
                .map(|a| (a.id, AdminSummary::from(a)))
                .collect()
        };

        let mut trail: HashMap<i32, Vec<UpdateResponse>> = HashMap::new();
        for update in updates {
            let admin = admins.get(&update.admin_id).cloned();
            trail.entry(update.complaint_id).or_default().push(UpdateResponse { update, admin });
        }

        Ok(rows
            .into_iter()
            .map(|complaint| ComplaintResponse {
                category: categories.get(&complaint.category_id).cloned(),
                user: owners.get(&complaint.user_id).cloned(),
                assigned_admin: complaint.assigned_to.and_then(|id| admins.get(&id).cloned()),
                attachment: attachments.remove(&complaint.id),
                updates: trail.remove(&complaint.id).unwrap_or_default(),
                complaint,
            })
            .collect())
    }
}

fn complaint_not_found() -> ApiError {
    ApiError::NotFound("Complaint not found".to_string())
}

async fn count_with_status(db: &DatabaseConnection, status: ComplaintStatus) -> Result<u64, DbErr> {
    complaints::Entity::find()
        .filter(complaints::Column::Status.eq(status))
        .count(db)
        .await
}

/// `CMP-YYYYMMDD-XXXXXX`
pub fn generate_complaint_number() -> String {
    format!(
        "CMP-{}-{}",
        Utc::now().format("%Y%m%d"),
        tokens::random_alphanumeric(6).to_uppercase()
    )
}

async fn unique_complaint_number<C: ConnectionTrait>(db: &C) -> Result<String, ApiError> {
    for _ in 0..NUMBER_ATTEMPTS {
        let candidate = generate_complaint_number();
        let taken = complaints::Entity::find()
            .filter(complaints::Column::ComplaintNumber.eq(candidate.as_str()))
            .count(db)
            .await?
            > 0;
        if !taken {
            return Ok(candidate);
        }
        warn!("Complaint number {} already taken, retrying", candidate);
    }

    Err(ApiError::Internal("Could not allocate a unique complaint number".to_string()))
}
