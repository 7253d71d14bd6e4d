use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, SideEffect};
use crate::models::{
    ClaimRequest, ClaimRow, CreateItemRequest, FoundItemRow, Item, ItemFilter, ItemType,
    LostItemRow, Notification, Profile, UpdateItemRequest,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The standard-capability persistence handle: everything a request made on
/// behalf of an ordinary user may touch. Elevated moderation/console access
/// lives on a separate trait (`moderation::AdminRepository`) so the privilege
/// level of a call site is visible in its type, not implied by which queries
/// it happens to run.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, id: Uuid) -> Option<Profile>;
    // Tolerates a concurrent insert by the provider-side trigger: if the row
    // already exists, the existing row is returned unchanged.
    async fn create_profile(&self, profile: Profile) -> ApiResult<Profile>;
    // Registration-time admin promotion. Returns true if a row changed.
    async fn promote_profile(&self, id: Uuid) -> bool;

    // --- Items (dual-table unifier) ---
    // Public listing over both physical tables: active-equivalent rows only,
    // filters applied independently per table, unified and sorted newest-first.
    // Pagination happens in the caller, after the union.
    async fn list_items(&self, filter: &ItemFilter) -> Vec<Item>;
    // Probes lost then found. Bumps the view counter best-effort; a failed
    // bump never fails the read.
    async fn get_item(&self, id: Uuid) -> Option<Item>;
    async fn create_item(&self, req: CreateItemRequest, owner: &AuthUser) -> ApiResult<Item>;
    // Owner-only partial update. Ownership is checked before the mutation is
    // attempted; a row vanishing in between surfaces as NotFound.
    async fn update_item(
        &self,
        id: Uuid,
        patch: UpdateItemRequest,
        requester: Uuid,
    ) -> ApiResult<Item>;
    // All of a user's items across both tables, every lifecycle status.
    async fn user_items(&self, user_id: Uuid) -> Vec<Item>;

    // --- Claims ---
    // Persists the claim as pending. Business rules (own item, non-active
    // item) are enforced by the caller, which already holds the target item.
    async fn create_claim(
        &self,
        item: &Item,
        claimer: &AuthUser,
        message: String,
    ) -> ApiResult<ClaimRequest>;
    // Claims filed against any item the given user owns.
    async fn claims_for_owner(&self, owner_id: Uuid) -> Vec<ClaimRequest>;

    // --- Side effects ---
    /// Fire-and-forget notification insert. Failure is logged and reported
    /// through the returned [`SideEffect`], never propagated.
    async fn notify(&self, notification: Notification) -> SideEffect;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// paginate
///
/// In-memory pagination over an already-unified, already-sorted item list.
/// Windows never overlap; has_next/has_prev are derived from the same window
/// arithmetic the slice uses.
pub fn paginate<T>(items: Vec<T>, page: i64, per_page: i64) -> (Vec<T>, i64, bool, bool) {
    let total = items.len() as i64;
    let page = page.max(1);
    let per_page = per_page.max(1);
    let start = (page - 1) * per_page;
    let end = start + per_page;
    let window = items
        .into_iter()
        .skip(start as usize)
        .take(per_page as usize)
        .collect();
    (window, total, end < total, page > 1)
}

/// title_case
///
/// Canonical form for lookup names ("electronics" and "Electronics" resolve to
/// the same row; the stored form keeps a leading capital).
pub fn title_case(name: &str) -> String {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// --- Shared SELECT shapes ---
// The two tables diverge (urgency/reward vs current_location/condition), so
// each side carries its own projection; only the join spine is common.

pub(crate) const LOST_SELECT: &str = r#"
SELECT l.id, l.user_id, l.title, l.description,
       c.name AS category_name, loc.name AS location_name,
       l.images, l.reward_amount, l.urgency, l.date_lost, l.time_lost,
       l.contact_method, l.contact_info, l.status, l.flagged, l.flag_reason,
       l.moderation_notes, l.moderated_by, l.moderated_at, l.view_count,
       l.created_at, l.updated_at,
       p.first_name AS owner_first_name, p.last_name AS owner_last_name
  FROM lost_items l
  LEFT JOIN categories c ON l.category_id = c.id
  LEFT JOIN locations loc ON l.location_id = loc.id
  LEFT JOIN profiles p ON l.user_id = p.id
"#;

pub(crate) const FOUND_SELECT: &str = r#"
SELECT f.id, f.user_id, f.title, f.description,
       c.name AS category_name, loc.name AS location_name,
       f.images, f.current_location, f.condition_notes, f.date_found, f.time_found,
       f.contact_method, f.contact_info, f.status, f.flagged, f.flag_reason,
       f.moderation_notes, f.moderated_by, f.moderated_at, f.view_count,
       f.created_at, f.updated_at,
       p.first_name AS owner_first_name, p.last_name AS owner_last_name
  FROM found_items f
  LEFT JOIN categories c ON f.category_id = c.id
  LEFT JOIN locations loc ON f.location_id = loc.id
  LEFT JOIN profiles p ON f.user_id = p.id
"#;

pub(crate) const CLAIM_SELECT: &str = r#"
SELECT cr.id, cr.item_id, cr.item_type, cr.claimer_id, cr.claimer_email,
       cr.message, cr.status, cr.admin_notes, cr.created_at, cr.updated_at,
       COALESCE(l.title, f.title) AS item_title,
       p.first_name AS claimer_first_name, p.last_name AS claimer_last_name
  FROM claim_requests cr
  LEFT JOIN lost_items l ON cr.item_type = 'lost' AND cr.item_id = l.id
  LEFT JOIN found_items f ON cr.item_type = 'found' AND cr.item_id = f.id
  LEFT JOIN profiles p ON cr.claimer_id = p.id
"#;

/// Fetches one lost_items row with its lookup/owner joins. Shared between the
/// standard and elevated Postgres handles.
pub(crate) async fn fetch_lost_row(pool: &PgPool, id: Uuid) -> Option<LostItemRow> {
    let sql = format!("{} WHERE l.id = $1", LOST_SELECT);
    sqlx::query_as::<_, LostItemRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("fetch_lost error: {:?}", e);
            None
        })
}

/// Fetches one found_items row with its lookup/owner joins.
pub(crate) async fn fetch_found_row(pool: &PgPool, id: Uuid) -> Option<FoundItemRow> {
    let sql = format!("{} WHERE f.id = $1", FOUND_SELECT);
    sqlx::query_as::<_, FoundItemRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("fetch_found error: {:?}", e);
            None
        })
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
    // Base URL used to synthesize placeholder image URLs on unification.
    base_url: String,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool, base_url: &str) -> Self {
        Self {
            pool,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_lost(&self, id: Uuid) -> Option<LostItemRow> {
        fetch_lost_row(&self.pool, id).await
    }

    async fn fetch_found(&self, id: Uuid) -> Option<FoundItemRow> {
        fetch_found_row(&self.pool, id).await
    }

    /// Best-effort view counter bump. Logged on failure, never surfaced.
    async fn bump_view_count(&self, item_type: ItemType, id: Uuid) {
        let sql = match item_type {
            ItemType::Lost => "UPDATE lost_items SET view_count = view_count + 1 WHERE id = $1",
            ItemType::Found => "UPDATE found_items SET view_count = view_count + 1 WHERE id = $1",
        };
        if let Err(e) = sqlx::query(sql).bind(id).execute(&self.pool).await {
            tracing::warn!("view count bump failed for {}: {:?}", id, e);
        }
    }

    /// Lookup-or-create for categories. Uses the uniqueness constraint on the
    /// name with an idempotent upsert, so two concurrent misses both converge
    /// on the same row. Returns None (and logs) on storage failure, degrading
    /// item creation rather than aborting it.
    async fn resolve_category(&self, name: &str) -> Option<Uuid> {
        let canonical = title_case(name);
        if canonical.is_empty() {
            return None;
        }
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&canonical)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("category resolution failed for {:?}: {:?}", canonical, e);
                None
            }
        }
    }

    /// Lookup-or-create for locations, same contract as categories.
    async fn resolve_location(&self, name: &str) -> Option<Uuid> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO locations (id, name, building, description)
            VALUES ($1, $2, $2, 'Location: ' || $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(trimmed)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("location resolution failed for {:?}: {:?}", trimmed, e);
                None
            }
        }
    }

    /// Resolves a category name filter to candidate ids. An unknown name
    /// yields an empty list, which matches nothing rather than everything.
    async fn category_ids(&self, name: &str) -> Vec<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE lower(name) = lower($1)")
            .bind(name.trim())
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("category filter lookup error: {:?}", e);
                vec![]
            })
    }

    /// Resolves a location substring filter to candidate ids.
    async fn location_ids(&self, fragment: &str) -> Vec<Uuid> {
        let pattern = format!("%{}%", fragment.trim());
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM locations WHERE name ILIKE $1")
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("location filter lookup error: {:?}", e);
                vec![]
            })
    }

    async fn list_lost(
        &self,
        filter: &ItemFilter,
        category_ids: Option<&Vec<Uuid>>,
        location_ids: Option<&Vec<Uuid>>,
    ) -> Vec<Item> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(LOST_SELECT);
        builder.push(" WHERE l.status = 'ACTIVE' ");

        if let Some(ids) = category_ids {
            builder.push(" AND l.category_id = ANY(");
            builder.push_bind(ids.clone());
            builder.push(")");
        }
        if let Some(ids) = location_ids {
            builder.push(" AND l.location_id = ANY(");
            builder.push_bind(ids.clone());
            builder.push(")");
        }
        if let Some(urgency) = filter.urgency {
            builder.push(" AND l.urgency = ");
            builder.push_bind(urgency.to_db());
        }
        match filter.has_reward {
            Some(true) => {
                builder.push(" AND l.reward_amount > 0");
            }
            Some(false) => {
                builder.push(" AND (l.reward_amount IS NULL OR l.reward_amount <= 0)");
            }
            None => {}
        }
        if let Some(search) = &filter.search {
            // Case-insensitive search across title and description.
            let pattern = format!("%{}%", search);
            builder.push(" AND (l.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR l.description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        builder.push(" ORDER BY l.created_at DESC");

        match builder
            .build_query_as::<LostItemRow>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows
                .into_iter()
                .map(|r| Item::from_lost(r, &self.base_url))
                .collect(),
            Err(e) => {
                tracing::error!("list_lost error: {:?}", e);
                vec![]
            }
        }
    }

    async fn list_found(
        &self,
        filter: &ItemFilter,
        category_ids: Option<&Vec<Uuid>>,
        location_ids: Option<&Vec<Uuid>>,
    ) -> Vec<Item> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(FOUND_SELECT);
        builder.push(" WHERE f.status = 'AVAILABLE' ");

        if let Some(ids) = category_ids {
            builder.push(" AND f.category_id = ANY(");
            builder.push_bind(ids.clone());
            builder.push(")");
        }
        if let Some(ids) = location_ids {
            builder.push(" AND f.location_id = ANY(");
            builder.push_bind(ids.clone());
            builder.push(")");
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            builder.push(" AND (f.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR f.description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        builder.push(" ORDER BY f.created_at DESC");

        match builder
            .build_query_as::<FoundItemRow>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows
                .into_iter()
                .map(|r| Item::from_found(r, &self.base_url))
                .collect(),
            Err(e) => {
                tracing::error!("list_found error: {:?}", e);
                vec![]
            }
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_profile(&self, id: Uuid) -> Option<Profile> {
        sqlx::query_as::<_, Profile>(
            "SELECT id, first_name, last_name, user_type, account_status, email_verified, created_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or(None)
    }

    /// create_profile
    ///
    /// Inserts the mirroring profile record after external auth success. The
    /// provider-side trigger may have raced us here; ON CONFLICT DO NOTHING
    /// plus a re-read makes either winner acceptable.
    async fn create_profile(&self, profile: Profile) -> ApiResult<Profile> {
        let inserted = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, first_name, last_name, user_type, account_status, email_verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            RETURNING id, first_name, last_name, user_type, account_status, email_verified, created_at
            "#,
        )
        .bind(profile.id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.user_type)
        .bind(&profile.account_status)
        .bind(profile.email_verified)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            // Lost the race against the trigger; the existing row wins.
            None => self.get_profile(profile.id).await.ok_or_else(|| {
                ApiError::Upstream("profile vanished between insert and read".to_string())
            }),
        }
    }

    async fn promote_profile(&self, id: Uuid) -> bool {
        match sqlx::query("UPDATE profiles SET user_type = 'ADMIN' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("promote_profile error: {:?}", e);
                false
            }
        }
    }

    /// list_items
    ///
    /// The dual-table union. Each side is skipped entirely when the type
    /// filter excludes it, or when a divergent-schema filter can never match
    /// it (found items have no reward and an effective urgency of Medium).
    /// Predicates are parameterized through QueryBuilder throughout.
    async fn list_items(&self, filter: &ItemFilter) -> Vec<Item> {
        // Category/location filters resolve to id lists via the lookup tables
        // first; the id lists are then pushed into both per-table queries.
        let category_ids = match &filter.category {
            Some(name) => Some(self.category_ids(name).await),
            None => None,
        };
        let location_ids = match &filter.location {
            Some(fragment) => Some(self.location_ids(fragment).await),
            None => None,
        };

        let mut items: Vec<Item> = Vec::new();

        if filter.item_type != Some(ItemType::Found) {
            items.extend(
                self.list_lost(filter, category_ids.as_ref(), location_ids.as_ref())
                    .await,
            );
        }

        let found_excluded_by_urgency = filter
            .urgency
            .is_some_and(|u| u != crate::models::UrgencyLevel::Medium);
        let found_excluded_by_reward = filter.has_reward == Some(true);
        if filter.item_type != Some(ItemType::Lost)
            && !found_excluded_by_urgency
            && !found_excluded_by_reward
        {
            items.extend(
                self.list_found(filter, category_ids.as_ref(), location_ids.as_ref())
                    .await,
            );
        }

        // Relative ordering spans both tables, so the sort happens after the union.
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    async fn get_item(&self, id: Uuid) -> Option<Item> {
        // Exactly one table may hold the id; probe lost first, then found.
        if let Some(row) = self.fetch_lost(id).await {
            self.bump_view_count(ItemType::Lost, id).await;
            return Some(Item::from_lost(row, &self.base_url));
        }
        if let Some(row) = self.fetch_found(id).await {
            self.bump_view_count(ItemType::Found, id).await;
            return Some(Item::from_found(row, &self.base_url));
        }
        None
    }

    /// create_item
    ///
    /// Routes the insert to the physical table matching the requested type and
    /// stores only the type-appropriate optional columns. Lookup failures for
    /// category/location degrade to a NULL reference instead of aborting the
    /// creation. The insert uses a CTE so the returned row already carries the
    /// joined lookup names and owner profile.
    async fn create_item(&self, req: CreateItemRequest, owner: &AuthUser) -> ApiResult<Item> {
        if req.title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }
        if req.description.trim().is_empty() {
            return Err(ApiError::Validation("Description is required".to_string()));
        }
        if req.location.trim().is_empty() {
            return Err(ApiError::Validation("Location is required".to_string()));
        }

        let category_id = self.resolve_category(&req.category).await;
        let location_id = self.resolve_location(&req.location).await;
        let contact = req.contact_preference.unwrap_or_default().to_db();
        let new_id = Uuid::new_v4();

        match req.item_type {
            ItemType::Lost => {
                let urgency = req.urgency.unwrap_or_default().to_db();
                let sql = format!(
                    r#"
                    WITH l AS (
                        INSERT INTO lost_items
                            (id, user_id, title, description, category_id, location_id, images,
                             reward_amount, urgency, date_lost, time_lost, contact_method, contact_info, status)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'ACTIVE')
                        RETURNING *
                    )
                    {}
                    "#,
                    lost_projection_over_cte()
                );
                let row = sqlx::query_as::<_, LostItemRow>(&sql)
                    .bind(new_id)
                    .bind(owner.id)
                    .bind(req.title.trim())
                    .bind(req.description.trim())
                    .bind(category_id)
                    .bind(location_id)
                    .bind(req.images.unwrap_or_default())
                    .bind(req.reward)
                    .bind(urgency)
                    .bind(req.date_reported)
                    .bind(req.time_reported)
                    .bind(contact)
                    .bind(&owner.email)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(Item::from_lost(row, &self.base_url))
            }
            ItemType::Found => {
                let sql = format!(
                    r#"
                    WITH f AS (
                        INSERT INTO found_items
                            (id, user_id, title, description, category_id, location_id, images,
                             current_location, condition_notes, date_found, time_found,
                             contact_method, contact_info, status)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'AVAILABLE')
                        RETURNING *
                    )
                    {}
                    "#,
                    found_projection_over_cte()
                );
                let row = sqlx::query_as::<_, FoundItemRow>(&sql)
                    .bind(new_id)
                    .bind(owner.id)
                    .bind(req.title.trim())
                    .bind(req.description.trim())
                    .bind(category_id)
                    .bind(location_id)
                    .bind(req.images.unwrap_or_default())
                    .bind(req.location.trim())
                    .bind("Good condition")
                    .bind(req.date_reported)
                    .bind(req.time_reported)
                    .bind(contact)
                    .bind(&owner.email)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(Item::from_found(row, &self.base_url))
            }
        }
    }

    /// update_item
    ///
    /// Owner-only partial update using COALESCE so absent patch keys are
    /// indistinguishable from "no change". Ownership is verified first; the
    /// mutation itself re-checks id + owner, so a row deleted in between
    /// simply affects zero rows and surfaces as NotFound.
    async fn update_item(
        &self,
        id: Uuid,
        patch: UpdateItemRequest,
        requester: Uuid,
    ) -> ApiResult<Item> {
        if let Some(existing) = self.fetch_lost(id).await {
            if existing.user_id != requester {
                return Err(ApiError::Forbidden(
                    "Not authorized to update this item".to_string(),
                ));
            }
            let status_db = patch.status.map(|s| s.to_db(ItemType::Lost));
            let urgency_db = patch.urgency.map(|u| u.to_db());
            let sql = format!(
                r#"
                WITH l AS (
                    UPDATE lost_items
                       SET title = COALESCE($3, title),
                           description = COALESCE($4, description),
                           images = COALESCE($5, images),
                           status = COALESCE($6, status),
                           urgency = COALESCE($7, urgency),
                           reward_amount = COALESCE($8, reward_amount),
                           updated_at = NOW()
                     WHERE id = $1 AND user_id = $2
                    RETURNING *
                )
                {}
                "#,
                lost_projection_over_cte()
            );
            let updated = sqlx::query_as::<_, LostItemRow>(&sql)
                .bind(id)
                .bind(requester)
                .bind(patch.title)
                .bind(patch.description)
                .bind(patch.images)
                .bind(status_db)
                .bind(urgency_db)
                .bind(patch.reward)
                .fetch_optional(&self.pool)
                .await?;
            return updated
                .map(|r| Item::from_lost(r, &self.base_url))
                .ok_or_else(|| ApiError::NotFound("Item not found".to_string()));
        }

        if let Some(existing) = self.fetch_found(id).await {
            if existing.user_id != requester {
                return Err(ApiError::Forbidden(
                    "Not authorized to update this item".to_string(),
                ));
            }
            let status_db = patch.status.map(|s| s.to_db(ItemType::Found));
            let sql = format!(
                r#"
                WITH f AS (
                    UPDATE found_items
                       SET title = COALESCE($3, title),
                           description = COALESCE($4, description),
                           images = COALESCE($5, images),
                           status = COALESCE($6, status),
                           current_location = COALESCE($7, current_location),
                           updated_at = NOW()
                     WHERE id = $1 AND user_id = $2
                    RETURNING *
                )
                {}
                "#,
                found_projection_over_cte()
            );
            let updated = sqlx::query_as::<_, FoundItemRow>(&sql)
                .bind(id)
                .bind(requester)
                .bind(patch.title)
                .bind(patch.description)
                .bind(patch.images)
                .bind(status_db)
                .bind(patch.current_location)
                .fetch_optional(&self.pool)
                .await?;
            return updated
                .map(|r| Item::from_found(r, &self.base_url))
                .ok_or_else(|| ApiError::NotFound("Item not found".to_string()));
        }

        Err(ApiError::NotFound("Item not found".to_string()))
    }

    async fn user_items(&self, user_id: Uuid) -> Vec<Item> {
        let lost_sql = format!("{} WHERE l.user_id = $1", LOST_SELECT);
        let found_sql = format!("{} WHERE f.user_id = $1", FOUND_SELECT);

        let mut items: Vec<Item> = Vec::new();

        match sqlx::query_as::<_, LostItemRow>(&lost_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => items.extend(
                rows.into_iter()
                    .map(|r| Item::from_lost(r, &self.base_url)),
            ),
            Err(e) => tracing::error!("user_items (lost) error: {:?}", e),
        }
        match sqlx::query_as::<_, FoundItemRow>(&found_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => items.extend(
                rows.into_iter()
                    .map(|r| Item::from_found(r, &self.base_url)),
            ),
            Err(e) => tracing::error!("user_items (found) error: {:?}", e),
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    /// create_claim
    ///
    /// Persists the claim as pending and returns it already enriched with the
    /// item title and claimer profile via a CTE join.
    async fn create_claim(
        &self,
        item: &Item,
        claimer: &AuthUser,
        message: String,
    ) -> ApiResult<ClaimRequest> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            WITH inserted AS (
                INSERT INTO claim_requests (id, item_id, item_type, claimer_id, claimer_email, message, status)
                VALUES ($1, $2, $3, $4, $5, $6, 'pending')
                RETURNING *
            )
            SELECT i.id, i.item_id, i.item_type, i.claimer_id, i.claimer_email,
                   i.message, i.status, i.admin_notes, i.created_at, i.updated_at,
                   COALESCE(l.title, f.title) AS item_title,
                   p.first_name AS claimer_first_name, p.last_name AS claimer_last_name
            FROM inserted i
            LEFT JOIN lost_items l ON i.item_type = 'lost' AND i.item_id = l.id
            LEFT JOIN found_items f ON i.item_type = 'found' AND i.item_id = f.id
            LEFT JOIN profiles p ON i.claimer_id = p.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(item.id)
        .bind(item.item_type.as_str())
        .bind(claimer.id)
        .bind(&claimer.email)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(ClaimRequest::from_row(row))
    }

    async fn claims_for_owner(&self, owner_id: Uuid) -> Vec<ClaimRequest> {
        let sql = format!(
            "{} WHERE l.user_id = $1 OR f.user_id = $1 ORDER BY cr.created_at DESC",
            CLAIM_SELECT
        );
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(ClaimRequest::from_row).collect())
            .unwrap_or_else(|e| {
                tracing::error!("claims_for_owner error: {:?}", e);
                vec![]
            })
    }

    async fn notify(&self, notification: Notification) -> SideEffect {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, type, related_item_id, related_claim_id, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, $7, false)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.notification_type)
        .bind(notification.related_item_id)
        .bind(notification.related_claim_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => SideEffect::Recorded,
            Err(e) => {
                tracing::warn!(
                    "notification insert failed for user {}: {:?}",
                    notification.user_id,
                    e
                );
                SideEffect::Dropped
            }
        }
    }
}

// Projection helpers: the CTE-based INSERT/UPDATE statements alias the mutated
// rows as `l`/`f` so the shared column shape can be reused verbatim.

fn lost_projection_over_cte() -> &'static str {
    r#"
    SELECT l.id, l.user_id, l.title, l.description,
           c.name AS category_name, loc.name AS location_name,
           l.images, l.reward_amount, l.urgency, l.date_lost, l.time_lost,
           l.contact_method, l.contact_info, l.status, l.flagged, l.flag_reason,
           l.moderation_notes, l.moderated_by, l.moderated_at, l.view_count,
           l.created_at, l.updated_at,
           p.first_name AS owner_first_name, p.last_name AS owner_last_name
      FROM l
      LEFT JOIN categories c ON l.category_id = c.id
      LEFT JOIN locations loc ON l.location_id = loc.id
      LEFT JOIN profiles p ON l.user_id = p.id
    "#
}

fn found_projection_over_cte() -> &'static str {
    r#"
    SELECT f.id, f.user_id, f.title, f.description,
           c.name AS category_name, loc.name AS location_name,
           f.images, f.current_location, f.condition_notes, f.date_found, f.time_found,
           f.contact_method, f.contact_info, f.status, f.flagged, f.flag_reason,
           f.moderation_notes, f.moderated_by, f.moderated_at, f.view_count,
           f.created_at, f.updated_at,
           p.first_name AS owner_first_name, p.last_name AS owner_last_name
      FROM f
      LEFT JOIN categories c ON f.category_id = c.id
      LEFT JOIN locations loc ON f.location_id = loc.id
      LEFT JOIN profiles p ON f.user_id = p.id
    "#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_windows_never_overlap() {
        let items: Vec<i32> = (0..25).collect();
        let (page1, total, has_next, has_prev) = paginate(items.clone(), 1, 10);
        assert_eq!(total, 25);
        assert_eq!(page1, (0..10).collect::<Vec<_>>());
        assert!(has_next);
        assert!(!has_prev);

        let (page2, _, has_next, has_prev) = paginate(items.clone(), 2, 10);
        assert_eq!(page2, (10..20).collect::<Vec<_>>());
        assert!(has_next);
        assert!(has_prev);

        let (page3, _, has_next, has_prev) = paginate(items, 3, 10);
        assert_eq!(page3, (20..25).collect::<Vec<_>>());
        assert!(!has_next);
        assert!(has_prev);
    }

    #[test]
    fn paginate_exact_boundary_has_no_next() {
        let items: Vec<i32> = (0..20).collect();
        let (_, _, has_next, _) = paginate(items, 2, 10);
        assert!(!has_next);
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let items: Vec<i32> = (0..5).collect();
        let (window, total, has_next, has_prev) = paginate(items, 4, 10);
        assert!(window.is_empty());
        assert_eq!(total, 5);
        assert!(!has_next);
        assert!(has_prev);
    }

    #[test]
    fn paginate_clamps_nonsense_page() {
        let items: Vec<i32> = (0..5).collect();
        let (window, _, _, has_prev) = paginate(items, 0, 10);
        assert_eq!(window.len(), 5);
        assert!(!has_prev);
    }

    #[test]
    fn title_case_canonicalizes_lookup_names() {
        assert_eq!(title_case("electronics"), "Electronics");
        assert_eq!(title_case("  keys "), "Keys");
        assert_eq!(title_case("Electronics"), "Electronics");
        assert_eq!(title_case(""), "");
    }
}
