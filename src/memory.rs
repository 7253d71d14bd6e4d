use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, SideEffect};
use crate::models::{
    AdminClaimFilter, AdminItemFilter, AdminStats, AnalyticsResponse, BulkActionRequest,
    BulkActionResponse, BulkActionResult, ClaimRequest, ClaimStatus, ClaimUpdateRequest,
    CreateItemRequest, Dispute, DisputeFilter, FlaggedAction, FlaggedActionRequest,
    FlaggedContent, Item, ItemFilter, ItemStatus, ItemType, ModerationAction, Notification,
    PlatformHealth, Profile, UpdateItemRequest, UrgencyLevel, UserFilter, full_name,
};
use crate::moderation::{AdminRepository, compute_success_rate, flag_severity, health_score};
use crate::repository::{Repository, title_case};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// MockRepository
///
/// In-memory implementation of both persistence handles, used exclusively for
/// unit and integration testing. It mirrors the dual-table layout with two
/// separate item maps so the unification semantics under test match the real
/// repository: divergent status vocabularies, type-specific optional fields,
/// and the probe-lost-then-found resolution order.
#[derive(Default)]
pub struct MockRepository {
    lost: Mutex<HashMap<Uuid, Item>>,
    found: Mutex<HashMap<Uuid, Item>>,
    profiles: Mutex<HashMap<Uuid, Profile>>,
    claims: Mutex<HashMap<Uuid, ClaimRequest>>,
    categories: Mutex<HashMap<String, Uuid>>,
    locations: Mutex<HashMap<String, Uuid>>,
    disputes: Mutex<HashMap<Uuid, Dispute>>,
    notifications: Mutex<Vec<Notification>>,
    audits: Mutex<Vec<String>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications recorded so far, for test assertions.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    /// All audit actions recorded so far, for test assertions.
    pub fn audits(&self) -> Vec<String> {
        self.audits.lock().unwrap().clone()
    }

    /// Known category names (canonical form), for lookup-or-create assertions.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.lock().unwrap().keys().cloned().collect()
    }

    pub fn seed_dispute(&self, dispute: Dispute) {
        self.disputes.lock().unwrap().insert(dispute.id, dispute);
    }

    fn item(&self, id: Uuid) -> Option<Item> {
        if let Some(item) = self.lost.lock().unwrap().get(&id) {
            return Some(item.clone());
        }
        self.found.lock().unwrap().get(&id).cloned()
    }

    fn store_of(&self, item_type: ItemType) -> &Mutex<HashMap<Uuid, Item>> {
        match item_type {
            ItemType::Lost => &self.lost,
            ItemType::Found => &self.found,
        }
    }

    fn all_items(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.lost.lock().unwrap().values().cloned().collect();
        items.extend(self.found.lock().unwrap().values().cloned());
        sort_newest_first(&mut items);
        items
    }

    fn apply_moderation(
        &self,
        id: Uuid,
        action: ModerationAction,
        note: Option<&str>,
        admin_id: Uuid,
    ) -> Option<Item> {
        let item_type = self.item(id)?.item_type;
        let mut store = self.store_of(item_type).lock().unwrap();
        let item = store.get_mut(&id)?;
        match action {
            ModerationAction::Approve => item.status = ItemStatus::Active,
            ModerationAction::Reject => item.status = ItemStatus::Rejected,
            ModerationAction::Archive => item.status = ItemStatus::Archived,
            ModerationAction::Flag => {
                item.flagged = true;
                item.flag_reason = note.map(|n| n.to_string());
            }
        }
        item.moderated_by = Some(admin_id);
        item.moderated_at = Some(Utc::now());
        item.moderation_notes = note.map(|n| n.to_string());
        item.updated_at = Utc::now();
        Some(item.clone())
    }
}

/// Deterministic ordering for the mock: newest first, id as tiebreaker so
/// same-instant items page stably across calls.
fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl Repository for MockRepository {
    async fn get_profile(&self, id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&id).cloned()
    }

    async fn create_profile(&self, profile: Profile) -> ApiResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(profiles.entry(profile.id).or_insert(profile).clone())
    }

    async fn promote_profile(&self, id: Uuid) -> bool {
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(&id) {
            Some(profile) => {
                profile.user_type = "ADMIN".to_string();
                true
            }
            None => false,
        }
    }

    async fn list_items(&self, filter: &ItemFilter) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .all_items()
            .into_iter()
            .filter(|item| item.status == ItemStatus::Active)
            .filter(|item| filter.item_type.is_none_or(|t| item.item_type == t))
            .filter(|item| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| item.category == c.to_lowercase())
            })
            .filter(|item| {
                filter.location.as_ref().is_none_or(|fragment| {
                    item.location
                        .to_lowercase()
                        .contains(&fragment.to_lowercase())
                })
            })
            .filter(|item| filter.urgency.is_none_or(|u| item.urgency == u))
            .filter(|item| match filter.has_reward {
                Some(true) => item.reward > 0.0,
                Some(false) => item.reward <= 0.0,
                None => true,
            })
            .filter(|item| {
                filter.search.as_ref().is_none_or(|needle| {
                    let needle = needle.to_lowercase();
                    item.title.to_lowercase().contains(&needle)
                        || item.description.to_lowercase().contains(&needle)
                })
            })
            .collect();
        sort_newest_first(&mut items);
        items
    }

    async fn get_item(&self, id: Uuid) -> Option<Item> {
        let item_type = self.item(id)?.item_type;
        let mut store = self.store_of(item_type).lock().unwrap();
        let item = store.get_mut(&id)?;
        item.view_count += 1;
        Some(item.clone())
    }

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

        // Lookup-or-create mirrors the real repository's canonical form.
        let canonical = title_case(&req.category);
        if !canonical.is_empty() {
            self.categories
                .lock()
                .unwrap()
                .entry(canonical.clone())
                .or_insert_with(Uuid::new_v4);
        }
        self.locations
            .lock()
            .unwrap()
            .entry(req.location.trim().to_string())
            .or_insert_with(Uuid::new_v4);

        let now = Utc::now();
        let images = req.images.unwrap_or_default();
        let image = images
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:3000/placeholder/400x300".to_string());
        let profile = self.get_profile(owner.id).await;

        let item = Item {
            id: Uuid::new_v4(),
            item_type: req.item_type,
            user_id: owner.id,
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            category: if canonical.is_empty() {
                "other".to_string()
            } else {
                canonical.to_lowercase()
            },
            location: req.location.trim().to_string(),
            images,
            image,
            reward: match req.item_type {
                ItemType::Lost => req.reward.unwrap_or(0.0),
                ItemType::Found => 0.0,
            },
            urgency: match req.item_type {
                ItemType::Lost => req.urgency.unwrap_or_default(),
                ItemType::Found => UrgencyLevel::Medium,
            },
            date_reported: req.date_reported,
            time_reported: req.time_reported,
            contact_preference: req.contact_preference.unwrap_or_default(),
            status: ItemStatus::Active,
            flagged: false,
            flag_reason: None,
            moderation_notes: None,
            moderated_by: None,
            moderated_at: None,
            view_count: 0,
            created_at: now,
            updated_at: now,
            owner_name: profile
                .map(|p| full_name(Some(&p.first_name), Some(&p.last_name)))
                .unwrap_or_else(|| "Unknown".to_string()),
            owner_email: owner.email.clone(),
            current_location: match req.item_type {
                ItemType::Found => Some(req.location.trim().to_string()),
                ItemType::Lost => None,
            },
            condition_notes: match req.item_type {
                ItemType::Found => Some("Good condition".to_string()),
                ItemType::Lost => None,
            },
        };

        self.store_of(req.item_type)
            .lock()
            .unwrap()
            .insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        id: Uuid,
        patch: UpdateItemRequest,
        requester: Uuid,
    ) -> ApiResult<Item> {
        let item_type = self
            .item(id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?
            .item_type;

        let mut store = self.store_of(item_type).lock().unwrap();
        let item = store
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;
        if item.user_id != requester {
            return Err(ApiError::Forbidden(
                "Not authorized to update this item".to_string(),
            ));
        }

        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(images) = patch.images {
            item.images = images;
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if item_type == ItemType::Lost {
            if let Some(urgency) = patch.urgency {
                item.urgency = urgency;
            }
            if let Some(reward) = patch.reward {
                item.reward = reward;
            }
        }
        if item_type == ItemType::Found {
            if let Some(current_location) = patch.current_location {
                item.current_location = Some(current_location);
            }
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn user_items(&self, user_id: Uuid) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .all_items()
            .into_iter()
            .filter(|item| item.user_id == user_id)
            .collect();
        sort_newest_first(&mut items);
        items
    }

    async fn create_claim(
        &self,
        item: &Item,
        claimer: &AuthUser,
        message: String,
    ) -> ApiResult<ClaimRequest> {
        let now = Utc::now();
        let claim = ClaimRequest {
            id: Uuid::new_v4(),
            item_id: item.id,
            item_type: item.item_type,
            claimer_id: claimer.id,
            message,
            status: ClaimStatus::Pending,
            item_title: Some(item.title.clone()),
            claimer_name: claimer.full_name(),
            claimer_email: Some(claimer.email.clone()),
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.claims.lock().unwrap().insert(claim.id, claim.clone());
        Ok(claim)
    }

    async fn claims_for_owner(&self, owner_id: Uuid) -> Vec<ClaimRequest> {
        let owned: Vec<Uuid> = self
            .all_items()
            .into_iter()
            .filter(|item| item.user_id == owner_id)
            .map(|item| item.id)
            .collect();
        let mut claims: Vec<ClaimRequest> = self
            .claims
            .lock()
            .unwrap()
            .values()
            .filter(|c| owned.contains(&c.item_id))
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        claims
    }

    async fn notify(&self, notification: Notification) -> SideEffect {
        self.notifications.lock().unwrap().push(notification);
        SideEffect::Recorded
    }
}

#[async_trait]
impl AdminRepository for MockRepository {
    async fn stats(&self) -> AdminStats {
        let items = self.all_items();
        let total_items = items.len() as i64;
        let active_items = items
            .iter()
            .filter(|i| i.status == ItemStatus::Active)
            .count() as i64;
        let resolved_items = items
            .iter()
            .filter(|i| i.status == ItemStatus::Resolved)
            .count() as i64;
        let pending_claims = self
            .claims
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.status == ClaimStatus::Pending)
            .count() as i64;

        AdminStats {
            total_users: self.profiles.lock().unwrap().len() as i64,
            active_items,
            resolved_items,
            pending_claims,
            success_rate: compute_success_rate(resolved_items, total_items),
            total_items,
        }
    }

    async fn admin_items(&self, filter: &AdminItemFilter) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .all_items()
            .into_iter()
            .filter(|item| filter.status.is_none_or(|s| item.status == s))
            .filter(|item| filter.flagged_only != Some(true) || item.flagged)
            .collect();
        sort_newest_first(&mut items);
        items
    }

    async fn admin_claims(&self, filter: &AdminClaimFilter) -> Vec<ClaimRequest> {
        let mut claims: Vec<ClaimRequest> = self
            .claims
            .lock()
            .unwrap()
            .values()
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let start = ((filter.page() - 1) * filter.per_page()) as usize;
        claims
            .into_iter()
            .skip(start)
            .take(filter.per_page() as usize)
            .collect()
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
        let mut claims = self.claims.lock().unwrap();
        let claim = claims
            .get_mut(&claim_id)
            .ok_or_else(|| ApiError::NotFound("Claim not found".to_string()))?;
        claim.status = update.status;
        if update.admin_notes.is_some() {
            claim.admin_notes = update.admin_notes;
        }
        claim.updated_at = Utc::now();
        Ok(claim.clone())
    }

    async fn set_item_status(&self, id: Uuid, status: ItemStatus) -> ApiResult<Item> {
        let item_type = self
            .item(id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?
            .item_type;
        let mut store = self.store_of(item_type).lock().unwrap();
        let item = store
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;
        item.status = status;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn moderate_item(
        &self,
        id: Uuid,
        action: ModerationAction,
        note: Option<String>,
        admin_id: Uuid,
    ) -> ApiResult<Item> {
        self.apply_moderation(id, action, note.as_deref(), admin_id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))
    }

    async fn delete_item(&self, id: Uuid, admin_id: Uuid) -> ApiResult<Item> {
        let item_type = self
            .item(id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?
            .item_type;
        let removed = self
            .store_of(item_type)
            .lock()
            .unwrap()
            .remove(&id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;
        let _ = self
            .audit(
                admin_id,
                "delete_item",
                "item",
                &id.to_string(),
                Some(&format!(
                    "Deleted {} item: {}",
                    item_type.table(),
                    removed.title
                )),
            )
            .await;
        Ok(removed)
    }

    async fn list_users(&self, filter: &UserFilter) -> Vec<Profile> {
        let mut users: Vec<Profile> = self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| {
                filter.search.as_ref().is_none_or(|needle| {
                    let needle = needle.to_lowercase();
                    p.first_name.to_lowercase().contains(&needle)
                        || p.last_name.to_lowercase().contains(&needle)
                })
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        let start = ((filter.page() - 1) * filter.per_page()) as usize;
        users
            .into_iter()
            .skip(start)
            .take(filter.per_page() as usize)
            .collect()
    }

    async fn set_user_role(&self, id: Uuid, is_admin: bool) -> ApiResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        profile.user_type = if is_admin { "ADMIN" } else { "STUDENT" }.to_string();
        Ok(profile.clone())
    }

    async fn disputes(&self, filter: &DisputeFilter) -> Vec<Dispute> {
        let mut disputes: Vec<Dispute> = self
            .disputes
            .lock()
            .unwrap()
            .values()
            .filter(|d| filter.status.as_ref().is_none_or(|s| &d.status == s))
            .filter(|d| filter.priority.as_ref().is_none_or(|p| &d.priority == p))
            .cloned()
            .collect();
        disputes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let start = ((filter.page() - 1) * filter.per_page()) as usize;
        disputes
            .into_iter()
            .skip(start)
            .take(filter.per_page() as usize)
            .collect()
    }

    async fn update_dispute(
        &self,
        id: Uuid,
        action: &str,
        note: Option<String>,
        admin_id: Uuid,
    ) -> ApiResult<Dispute> {
        let mut disputes = self.disputes.lock().unwrap();
        let dispute = disputes
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Dispute not found".to_string()))?;
        dispute.status = action.to_string();
        dispute.admin_notes = note;
        dispute.last_activity = Some(Utc::now());
        if action == "resolve" {
            dispute.resolved_at = Some(Utc::now());
            dispute.resolved_by = Some(admin_id);
        }
        Ok(dispute.clone())
    }

    async fn flagged_items(&self) -> Vec<FlaggedContent> {
        let mut flagged: Vec<FlaggedContent> = self
            .all_items()
            .into_iter()
            .filter(|item| item.flagged)
            .map(|item| FlaggedContent {
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
            })
            .collect();
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
            let item_type = self
                .item(content_id)
                .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?
                .item_type;
            let mut store = self.store_of(item_type).lock().unwrap();
            if let Some(item) = store.get_mut(&content_id) {
                match req.action {
                    FlaggedAction::Approve => {
                        item.flagged = false;
                        item.flag_reason = None;
                        item.status = ItemStatus::Active;
                    }
                    FlaggedAction::Remove => {
                        item.status = ItemStatus::Archived;
                    }
                    FlaggedAction::Escalate => {}
                }
                item.moderated_by = Some(admin_id);
                item.moderation_notes = req.note.clone();
                item.updated_at = Utc::now();
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
            let outcome =
                match self.apply_moderation(item_id, req.action, req.note.as_deref(), admin_id) {
                    Some(_) => BulkActionResult {
                        item_id,
                        success: true,
                        error: None,
                    },
                    None => BulkActionResult {
                        item_id,
                        success: false,
                        error: Some("Item not found".to_string()),
                    },
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
        let items = self.all_items();
        let recent: Vec<&Item> = items.iter().filter(|i| i.created_at >= cutoff).collect();
        let lost_items = recent
            .iter()
            .filter(|i| i.item_type == ItemType::Lost)
            .count() as i64;
        let found_items = recent
            .iter()
            .filter(|i| i.item_type == ItemType::Found)
            .count() as i64;

        let claims = self.claims.lock().unwrap();
        let new_claims = claims
            .values()
            .filter(|c| c.created_at >= cutoff)
            .count() as i64;
        let approved_claims = claims
            .values()
            .filter(|c| c.created_at >= cutoff && c.status == ClaimStatus::Approved)
            .count() as i64;

        let total_items = items.len() as i64;
        let active_items = items
            .iter()
            .filter(|i| i.status == ItemStatus::Active)
            .count() as i64;
        let flagged_items = items.iter().filter(|i| i.flagged).count() as i64;

        AnalyticsResponse {
            new_users: self
                .profiles
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.created_at >= cutoff)
                .count() as i64,
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
        _admin_id: Uuid,
        action: &str,
        content_type: &str,
        content_id: &str,
        _notes: Option<&str>,
    ) -> SideEffect {
        self.audits
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", action, content_type, content_id));
        SideEffect::Recorded
    }
}
