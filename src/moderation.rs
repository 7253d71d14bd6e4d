use crate::error::{ApiError, ApiResult, SideEffect};
use crate::models::{
    AdminClaimFilter, AdminItemFilter, AdminStats, AnalyticsResponse, BulkActionRequest,
    BulkActionResponse, BulkActionResult, ClaimRequest, ClaimRow, ClaimStatus,
    ClaimUpdateRequest, Dispute, DisputeFilter, FlaggedAction, FlaggedActionRequest,
    FlaggedContent, FoundItemRow, Item, ItemStatus, ItemType, LostItemRow, ModerationAction,
    PlatformHealth, Profile, UrgencyLevel, UserFilter,
};
use crate::repository::{
    CLAIM_SELECT, FOUND_SELECT, LOST_SELECT, fetch_found_row, fetch_lost_row,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// AdminRepository Trait
///
/// The elevated-capability persistence handle: moderation, console listings,
/// aggregate statistics, and the audit trail. Kept as a distinct trait (and a
/// distinct `Arc` in the application state) so that handler code cannot reach
/// privileged mutations through the standard handle by accident: the
/// capability level is part of the type.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    // Aggregate counters for the console dashboard. Item counts are taken by
    // fetching the status column sets from both tables and counting in memory,
    // because the two-table split prevents a single aggregate query.
    async fn stats(&self) -> AdminStats;

    // Review listing over every lifecycle status, unified across both tables
    // and sorted newest-first. Pagination happens in the caller.
    async fn admin_items(&self, filter: &AdminItemFilter) -> Vec<Item>;

    async fn admin_claims(&self, filter: &AdminClaimFilter) -> Vec<ClaimRequest>;
    // Transitions a claim to approved/rejected. The caller emits the claimant
    // notification after this returns.
    async fn resolve_claim(&self, claim_id: Uuid, update: ClaimUpdateRequest)
    -> ApiResult<ClaimRequest>;

    async fn set_item_status(&self, id: Uuid, status: ItemStatus) -> ApiResult<Item>;
    // Applies a moderation verb to the owning table and stamps the moderation
    // metadata. Returns the refreshed unified item.
    async fn moderate_item(
        &self,
        id: Uuid,
        action: ModerationAction,
        note: Option<String>,
        admin_id: Uuid,
    ) -> ApiResult<Item>;
    // Locates the owning table by probing lost then found; the audit record is
    // written only after the delete succeeds.
    async fn delete_item(&self, id: Uuid, admin_id: Uuid) -> ApiResult<Item>;

    async fn list_users(&self, filter: &UserFilter) -> Vec<Profile>;
    async fn set_user_role(&self, id: Uuid, is_admin: bool) -> ApiResult<Profile>;

    async fn disputes(&self, filter: &DisputeFilter) -> Vec<Dispute>;
    async fn update_dispute(
        &self,
        id: Uuid,
        action: &str,
        note: Option<String>,
        admin_id: Uuid,
    ) -> ApiResult<Dispute>;

    async fn flagged_items(&self) -> Vec<FlaggedContent>;
    async fn flagged_action(
        &self,
        content_id: Uuid,
        req: &FlaggedActionRequest,
        admin_id: Uuid,
    ) -> ApiResult<()>;

    // Each id is processed independently; per-id failures are collected, never
    // propagated. One audit row covers the whole batch.
    async fn bulk_action(&self, req: &BulkActionRequest, admin_id: Uuid) -> BulkActionResponse;

    async fn analytics(&self, days: i64) -> AnalyticsResponse;

    /// Appends one audit record. Best-effort: a failed write is logged and
    /// never rolls back the mutation it describes.
    async fn audit(
        &self,
        admin_id: Uuid,
        action: &str,
        content_type: &str,
        content_id: &str,
        notes: Option<&str>,
    ) -> SideEffect;
}

/// AdminRepositoryState
pub type AdminRepositoryState = Arc<dyn AdminRepository>;

/// compute_success_rate
///
/// resolved / total * 100, rounded to one decimal; defined as 0 when no items
/// exist rather than dividing by zero.
pub fn compute_success_rate(resolved: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = resolved as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// flag_severity
///
/// Flagged-queue severity is derived from the item's urgency: high-urgency
/// lost items escalate, everything else reviews at medium.
pub fn flag_severity(urgency: UrgencyLevel) -> &'static str {
    match urgency {
        UrgencyLevel::High => "high",
        _ => "medium",
    }
}

/// health_score
///
/// 100 minus the flagged share of the corpus, floored at zero.
pub fn health_score(flagged: i64, total: i64) -> f64 {
    let score = 100.0 - (flagged as f64 / total.max(1) as f64 * 100.0);
    ((score.max(0.0)) * 10.0).round() / 10.0
}

/// PostgresAdminRepository
///
/// The concrete elevated handle, backed by the same PostgreSQL pool as the
/// standard repository but exposing only console/moderation operations.
pub struct PostgresAdminRepository {
    pool: PgPool,
    base_url: String,
}

impl PostgresAdminRepository {
    pub fn new(pool: PgPool, base_url: &str) -> Self {
        Self {
            pool,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Probes both tables for the owning side of an item id. Returns the
    /// discriminant plus the owner and title needed by notifications and audit
    /// notes.
    async fn locate(&self, id: Uuid) -> Option<(ItemType, Uuid, String)> {
        let lost = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT user_id, title FROM lost_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("locate (lost) error: {:?}", e);
            None
        });
        if let Some((user_id, title)) = lost {
            return Some((ItemType::Lost, user_id, title));
        }

        let found = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT user_id, title FROM found_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("locate (found) error: {:?}", e);
            None
        });
        found.map(|(user_id, title)| (ItemType::Found, user_id, title))
    }

    async fn refetch(&self, item_type: ItemType, id: Uuid) -> ApiResult<Item> {
        match item_type {
            ItemType::Lost => fetch_lost_row(&self.pool, id)
                .await
                .map(|r| Item::from_lost(r, &self.base_url)),
            ItemType::Found => fetch_found_row(&self.pool, id)
                .await
                .map(|r| Item::from_found(r, &self.base_url)),
        }
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))
    }

    /// The shared moderation mutation used by moderate_item and bulk_action.
    /// Maps the verb deterministically onto a status/flag update and stamps
    /// moderated_by/at/notes. Returns whether a row actually changed.
    async fn apply_moderation(
        &self,
        item_type: ItemType,
        id: Uuid,
        action: ModerationAction,
        note: Option<&str>,
        admin_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(match item_type {
            ItemType::Lost => "UPDATE lost_items SET ",
            ItemType::Found => "UPDATE found_items SET ",
        });

        match action {
            ModerationAction::Approve => {
                builder.push("status = ");
                builder.push_bind(ItemStatus::Active.to_db(item_type));
            }
            ModerationAction::Reject => {
                builder.push("status = 'REJECTED'");
            }
            ModerationAction::Archive => {
                builder.push("status = 'ARCHIVED'");
            }
            ModerationAction::Flag => {
                builder.push("flagged = true, flag_reason = ");
                builder.push_bind(note.map(|n| n.to_string()));
            }
        }

        builder.push(", moderated_by = ");
        builder.push_bind(admin_id);
        builder.push(", moderated_at = NOW(), moderation_notes = ");
        builder.push_bind(note.map(|n| n.to_string()));
        builder.push(", updated_at = NOW() WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AdminRepository for PostgresAdminRepository {
    /// stats
    ///
    /// Compiles the console counters. The per-table status sets are pulled in
    /// full and counted in memory; the divergent vocabularies (ACTIVE vs
    /// AVAILABLE, RESOLVED vs CLAIMED) are reconciled here.
    async fn stats(&self) -> AdminStats {
        let total_users =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles")
                .fetch_one(&self.pool)
                .await
                .unwrap_or(0);

        let lost_statuses = sqlx::query_scalar::<_, String>("SELECT status FROM lost_items")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("stats (lost) error: {:?}", e);
                vec![]
            });
        let found_statuses = sqlx::query_scalar::<_, String>("SELECT status FROM found_items")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("stats (found) error: {:?}", e);
                vec![]
            });

        let active_items = lost_statuses.iter().filter(|s| *s == "ACTIVE").count() as i64
            + found_statuses.iter().filter(|s| *s == "AVAILABLE").count() as i64;
        let resolved_items = lost_statuses.iter().filter(|s| *s == "RESOLVED").count() as i64
            + found_statuses.iter().filter(|s| *s == "CLAIMED").count() as i64;
        let total_items = lost_statuses.len() as i64 + found_statuses.len() as i64;

        let pending_claims = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM claim_requests WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await
        .unwrap_or(0);

        AdminStats {
            total_users,
            active_items,
            resolved_items,
            pending_claims,
            success_rate: compute_success_rate(resolved_items, total_items),
            total_items,
        }
    }

    async fn admin_items(&self, filter: &AdminItemFilter) -> Vec<Item> {
        let mut items: Vec<Item> = Vec::new();

        // Lost side.
        {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(LOST_SELECT);
            builder.push(" WHERE true ");
            if let Some(status) = filter.status {
                builder.push(" AND l.status = ");
                builder.push_bind(status.to_db(ItemType::Lost));
            }
            if filter.flagged_only == Some(true) {
                builder.push(" AND l.flagged = true");
            }
            builder.push(" ORDER BY l.created_at DESC");
            match builder
                .build_query_as::<LostItemRow>()
                .fetch_all(&self.pool)
                .await
            {
                Ok(rows) => items.extend(
                    rows.into_iter().map(|r| Item::from_lost(r, &self.base_url)),
                ),
                Err(e) => tracing::error!("admin_items (lost) error: {:?}", e),
            }
        }

        // Found side: the status filter maps through the table's own vocabulary.
        {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(FOUND_SELECT);
            builder.push(" WHERE true ");
            if let Some(status) = filter.status {
                builder.push(" AND f.status = ");
                builder.push_bind(status.to_db(ItemType::Found));
            }
            if filter.flagged_only == Some(true) {
                builder.push(" AND f.flagged = true");
            }
            builder.push(" ORDER BY f.created_at DESC");
            match builder
                .build_query_as::<FoundItemRow>()
                .fetch_all(&self.pool)
                .await
            {
                Ok(rows) => items.extend(
                    rows.into_iter()
                        .map(|r| Item::from_found(r, &self.base_url)),
                ),
                Err(e) => tracing::error!("admin_items (found) error: {:?}", e),
            }
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    async fn admin_claims(&self, filter: &AdminClaimFilter) -> Vec<ClaimRequest> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(CLAIM_SELECT);
        builder.push(" WHERE true ");
        if let Some(status) = filter.status {
            builder.push(" AND cr.status = ");
            builder.push_bind(status.as_str());
        }
        builder.push(" ORDER BY cr.created_at DESC LIMIT ");
        builder.push_bind(filter.per_page());
        builder.push(" OFFSET ");
        builder.push_bind((filter.page() - 1) * filter.per_page());

        match builder
            .build_query_as::<ClaimRow>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows.into_iter().map(ClaimRequest::from_row).collect(),
            Err(e) => {
                tracing::error!("admin_claims error: {:?}", e);
                vec![]
            }
        }
    }

    async fn resolve_claim(
        &self,
        claim_id: Uuid,
        update: ClaimUpdateRequest,
    ) -> ApiResult<ClaimRequest> {
        if update.status == ClaimStatus::Pending {
            return Err(ApiError::Validation(
                "Claim resolution must be approved or rejected".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            WITH updated AS (
                UPDATE claim_requests
                   SET status = $2,
                       admin_notes = COALESCE($3, admin_notes),
                       updated_at = NOW()
                 WHERE id = $1
                RETURNING *
            )
            SELECT cr.id, cr.item_id, cr.item_type, cr.claimer_id, cr.claimer_email,
                   cr.message, cr.status, cr.admin_notes, cr.created_at, cr.updated_at,
                   COALESCE(l.title, f.title) AS item_title,
                   p.first_name AS claimer_first_name, p.last_name AS claimer_last_name
            FROM updated cr
            LEFT JOIN lost_items l ON cr.item_type = 'lost' AND cr.item_id = l.id
            LEFT JOIN found_items f ON cr.item_type = 'found' AND cr.item_id = f.id
            LEFT JOIN profiles p ON cr.claimer_id = p.id
            "#,
        )
        .bind(claim_id)
        .bind(update.status.as_str())
        .bind(update.admin_notes)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ClaimRequest::from_row)
            .ok_or_else(|| ApiError::NotFound("Claim not found".to_string()))
    }

    async fn set_item_status(&self, id: Uuid, status: ItemStatus) -> ApiResult<Item> {
        let (item_type, _, _) = self
            .locate(id)
            .await
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

        let sql = match item_type {
            ItemType::Lost => {
                "UPDATE lost_items SET status = $2, updated_at = NOW() WHERE id = $1"
            }
            ItemType::Found => {
                "UPDATE found_items SET status = $2, updated_at = NOW() WHERE id = $1"
            }
        };
        sqlx::query(sql)
            .bind(id)
            .bind(status.to_db(item_type))
            .execute(&self.pool)
            .await?;

        self.refetch(item_type, id).await
    }

    async fn moderate_item(
        &self,
        id: Uuid,
        action: ModerationAction,
        note: Option<String>,
        admin_id: Uuid,
    ) -> ApiResult<Item> {
        let (item_type, _, _) = self
            .locate(id)
            .await
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

        let changed = self
            .apply_moderation(item_type, id, action, note.as_deref(), admin_id)
            .await?;
        if !changed {
            // Row vanished between the probe and the mutation.
            return Err(ApiError::NotFound("Item not found".to_string()));
        }

        self.refetch(item_type, id).await
    }

    async fn delete_item(&self, id: Uuid, admin_id: Uuid) -> ApiResult<Item> {
        let (item_type, _, title) = self
            .locate(id)
            .await
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

        // Snapshot the unified shape before the row disappears.
        let snapshot = self.refetch(item_type, id).await?;

        let sql = match item_type {
            ItemType::Lost => "DELETE FROM lost_items WHERE id = $1",
            ItemType::Found => "DELETE FROM found_items WHERE id = $1",
        };
        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Item not found".to_string()));
        }

        // Audit strictly after the delete: a failed delete must not leave a
        // dangling audit record.
        let _ = self
            .audit(
                admin_id,
                "delete_item",
                "item",
                &id.to_string(),
                Some(&format!("Deleted {} item: {}", item_type.table(), title)),
            )
            .await;

        Ok(snapshot)
    }

    async fn list_users(&self, filter: &UserFilter) -> Vec<Profile> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, first_name, last_name, user_type, account_status, email_verified, created_at FROM profiles WHERE true ",
        );
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            builder.push(" AND (first_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR last_name ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(filter.per_page());
        builder.push(" OFFSET ");
        builder.push_bind((filter.page() - 1) * filter.per_page());

        builder
            .build_query_as::<Profile>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            })
    }

    async fn set_user_role(&self, id: Uuid, is_admin: bool) -> ApiResult<Profile> {
        let user_type = if is_admin { "ADMIN" } else { "STUDENT" };
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET user_type = $2 WHERE id = $1
            RETURNING id, first_name, last_name, user_type, account_status, email_verified, created_at
            "#,
        )
        .bind(id)
        .bind(user_type)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    async fn disputes(&self, filter: &DisputeFilter) -> Vec<Dispute> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, item_id, item_type, owner_id, status, priority, admin_notes, last_activity, resolved_at, resolved_by, created_at FROM disputes WHERE true ",
        );
        if let Some(status) = &filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.clone());
        }
        if let Some(priority) = &filter.priority {
            builder.push(" AND priority = ");
            builder.push_bind(priority.clone());
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(filter.per_page());
        builder.push(" OFFSET ");
        builder.push_bind((filter.page() - 1) * filter.per_page());

        builder
            .build_query_as::<Dispute>()
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("disputes error: {:?}", e);
                vec![]
            })
    }

    async fn update_dispute(
        &self,
        id: Uuid,
        action: &str,
        note: Option<String>,
        admin_id: Uuid,
    ) -> ApiResult<Dispute> {
        let sql = if action == "resolve" {
            r#"
            UPDATE disputes
               SET status = $2, admin_notes = $3, last_activity = NOW(),
                   resolved_at = NOW(), resolved_by = $4
             WHERE id = $1
            RETURNING id, item_id, item_type, owner_id, status, priority, admin_notes, last_activity, resolved_at, resolved_by, created_at
            "#
        } else {
            r#"
            UPDATE disputes
               SET status = $2, admin_notes = $3, last_activity = NOW()
             WHERE id = $1
            RETURNING id, item_id, item_type, owner_id, status, priority, admin_notes, last_activity, resolved_at, resolved_by, created_at
            "#
        };

        let mut query = sqlx::query_as::<_, Dispute>(sql)
            .bind(id)
            .bind(action)
            .bind(note);
        if action == "resolve" {
            query = query.bind(admin_id);
        }

        query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Dispute not found".to_string()))
    }

    async fn flagged_items(&self) -> Vec<FlaggedContent> {
        let mut flagged: Vec<FlaggedContent> = Vec::new();

        let lost_sql = format!("{} WHERE l.flagged = true", LOST_SELECT);
        match sqlx::query_as::<_, LostItemRow>(&lost_sql)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => flagged.extend(rows.into_iter().map(|r| {
                let item = Item::from_lost(r, &self.base_url);
                flagged_entry(&item)
            })),
            Err(e) => tracing::error!("flagged_items (lost) error: {:?}", e),
        }

        let found_sql = format!("{} WHERE f.flagged = true", FOUND_SELECT);
        match sqlx::query_as::<_, FoundItemRow>(&found_sql)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => flagged.extend(rows.into_iter().map(|r| {
                let item = Item::from_found(r, &self.base_url);
                flagged_entry(&item)
            })),
            Err(e) => tracing::error!("flagged_items (found) error: {:?}", e),
        }

        flagged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        flagged
    }

    async fn flagged_action(
        &self,
        content_id: Uuid,
        req: &FlaggedActionRequest,
        admin_id: Uuid,
    ) -> ApiResult<()> {
        if req.content_type == "item" {
            let (item_type, _, _) = self
                .locate(content_id)
                .await
                .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

            match req.action {
                FlaggedAction::Approve => {
                    // Clear the flag and put the item back into circulation.
                    let sql = match item_type {
                        ItemType::Lost => {
                            "UPDATE lost_items SET flagged = false, flag_reason = NULL, status = 'ACTIVE', moderated_by = $2, moderated_at = NOW(), moderation_notes = $3, updated_at = NOW() WHERE id = $1"
                        }
                        ItemType::Found => {
                            "UPDATE found_items SET flagged = false, flag_reason = NULL, status = 'AVAILABLE', moderated_by = $2, moderated_at = NOW(), moderation_notes = $3, updated_at = NOW() WHERE id = $1"
                        }
                    };
                    sqlx::query(sql)
                        .bind(content_id)
                        .bind(admin_id)
                        .bind(&req.note)
                        .execute(&self.pool)
                        .await?;
                }
                FlaggedAction::Remove => {
                    let sql = match item_type {
                        ItemType::Lost => {
                            "UPDATE lost_items SET status = 'ARCHIVED', moderated_by = $2, moderated_at = NOW(), moderation_notes = $3, updated_at = NOW() WHERE id = $1"
                        }
                        ItemType::Found => {
                            "UPDATE found_items SET status = 'ARCHIVED', moderated_by = $2, moderated_at = NOW(), moderation_notes = $3, updated_at = NOW() WHERE id = $1"
                        }
                    };
                    sqlx::query(sql)
                        .bind(content_id)
                        .bind(admin_id)
                        .bind(&req.note)
                        .execute(&self.pool)
                        .await?;
                }
                // Escalation leaves the content untouched; the audit trail
                // carries the decision.
                FlaggedAction::Escalate => {}
            }
        }

        let _ = self
            .audit(
                admin_id,
                req.action.as_str(),
                &req.content_type,
                &content_id.to_string(),
                req.note.as_deref(),
            )
            .await;

        Ok(())
    }

    async fn bulk_action(&self, req: &BulkActionRequest, admin_id: Uuid) -> BulkActionResponse {
        let mut results: Vec<BulkActionResult> = Vec::with_capacity(req.item_ids.len());

        for &item_id in &req.item_ids {
            let outcome = match self.locate(item_id).await {
                None => BulkActionResult {
                    item_id,
                    success: false,
                    error: Some("Item not found".to_string()),
                },
                Some((item_type, _, _)) => {
                    match self
                        .apply_moderation(
                            item_type,
                            item_id,
                            req.action,
                            req.note.as_deref(),
                            admin_id,
                        )
                        .await
                    {
                        Ok(true) => BulkActionResult {
                            item_id,
                            success: true,
                            error: None,
                        },
                        Ok(false) => BulkActionResult {
                            item_id,
                            success: false,
                            error: Some("Item not found".to_string()),
                        },
                        Err(e) => BulkActionResult {
                            item_id,
                            success: false,
                            error: Some(e.to_string()),
                        },
                    }
                }
            };
            results.push(outcome);
        }

        let joined_ids = req
            .item_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let _ = self
            .audit(
                admin_id,
                &format!("bulk_{}", req.action.as_str()),
                "items",
                &joined_ids,
                req.note.as_deref(),
            )
            .await;

        let successful = results.iter().filter(|r| r.success).count() as i64;
        let processed = results.len() as i64;
        BulkActionResponse {
            success: true,
            processed,
            successful,
            failed: processed - successful,
            results,
        }
    }

    async fn analytics(&self, days: i64) -> AnalyticsResponse {
        let cutoff = Utc::now() - Duration::days(days);

        let count = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .bind(cutoff)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or(0)
            }
        };

        let new_users =
            count("SELECT COUNT(*) FROM profiles WHERE created_at >= $1").await;
        let lost_items =
            count("SELECT COUNT(*) FROM lost_items WHERE created_at >= $1").await;
        let found_items =
            count("SELECT COUNT(*) FROM found_items WHERE created_at >= $1").await;
        let new_claims =
            count("SELECT COUNT(*) FROM claim_requests WHERE created_at >= $1").await;
        let approved_claims = count(
            "SELECT COUNT(*) FROM claim_requests WHERE created_at >= $1 AND status = 'approved'",
        )
        .await;

        let total = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or(0)
            }
        };

        let total_items = total("SELECT COUNT(*) FROM lost_items").await
            + total("SELECT COUNT(*) FROM found_items").await;
        let active_items =
            total("SELECT COUNT(*) FROM lost_items WHERE status = 'ACTIVE'").await
                + total("SELECT COUNT(*) FROM found_items WHERE status = 'AVAILABLE'").await;
        let flagged_items = total("SELECT COUNT(*) FROM lost_items WHERE flagged = true").await
            + total("SELECT COUNT(*) FROM found_items WHERE flagged = true").await;

        AnalyticsResponse {
            new_users,
            new_items: lost_items + found_items,
            lost_items,
            found_items,
            new_claims,
            approved_claims,
            platform_health: PlatformHealth {
                total_items,
                active_items,
                flagged_items,
                health_score: health_score(flagged_items, total_items),
            },
        }
    }

    async fn audit(
        &self,
        admin_id: Uuid,
        action: &str,
        content_type: &str,
        content_id: &str,
        notes: Option<&str>,
    ) -> SideEffect {
        let result = sqlx::query(
            r#"
            INSERT INTO admin_actions (id, admin_id, action, content_type, content_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(admin_id)
        .bind(action)
        .bind(content_type)
        .bind(content_id)
        .bind(notes)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => SideEffect::Recorded,
            Err(e) => {
                tracing::warn!("audit write failed for action {:?}: {:?}", action, e);
                SideEffect::Dropped
            }
        }
    }
}

fn flagged_entry(item: &Item) -> FlaggedContent {
    FlaggedContent {
        id: item.id,
        content_type: "item".to_string(),
        title: item.title.clone(),
        user: item.owner_name.clone(),
        email: item.owner_email.clone(),
        reason: item
            .flag_reason
            .clone()
            .unwrap_or_else(|| "No reason provided".to_string()),
        flagged_by: "Admin/System".to_string(),
        created_at: item.created_at,
        severity: flag_severity(item.urgency).to_string(),
        action_required: true,
        report_count: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_zero_without_items() {
        assert_eq!(compute_success_rate(0, 0), 0.0);
        assert_eq!(compute_success_rate(5, 0), 0.0);
    }

    #[test]
    fn success_rate_rounds_to_one_decimal() {
        assert_eq!(compute_success_rate(1, 3), 33.3);
        assert_eq!(compute_success_rate(2, 3), 66.7);
        assert_eq!(compute_success_rate(4, 4), 100.0);
    }

    #[test]
    fn severity_tracks_urgency() {
        assert_eq!(flag_severity(UrgencyLevel::High), "high");
        assert_eq!(flag_severity(UrgencyLevel::Medium), "medium");
        assert_eq!(flag_severity(UrgencyLevel::Low), "medium");
    }

    #[test]
    fn health_score_floors_at_zero() {
        assert_eq!(health_score(0, 0), 100.0);
        assert_eq!(health_score(0, 10), 100.0);
        assert_eq!(health_score(5, 10), 50.0);
        assert_eq!(health_score(20, 10), 0.0);
    }
}
