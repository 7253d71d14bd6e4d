use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Domain Enumerations ---

/// ItemType
///
/// Discriminant of the unified Item entity. Each variant maps 1:1 onto a
/// physical table (`lost_items` / `found_items`) with a divergent schema;
/// callers only ever see this logical tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ItemType {
    #[default]
    Lost,
    Found,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Lost => "lost",
            ItemType::Found => "found",
        }
    }

    /// The physical table backing this variant.
    pub fn table(&self) -> &'static str {
        match self {
            ItemType::Lost => "lost_items",
            ItemType::Found => "found_items",
        }
    }
}

/// ItemStatus
///
/// The canonical external lifecycle vocabulary. The two physical tables store
/// divergent vocabularies (lost: ACTIVE/RESOLVED/REJECTED/ARCHIVED, found:
/// AVAILABLE/CLAIMED/REJECTED/ARCHIVED); this type owns the normalization in
/// both directions so no caller ever sees a table-specific status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ItemStatus {
    #[default]
    Active,
    Resolved,
    Rejected,
    Archived,
}

impl ItemStatus {
    /// Normalizes a raw status column value from either physical table.
    pub fn from_db(raw: &str) -> ItemStatus {
        match raw {
            "ACTIVE" | "AVAILABLE" => ItemStatus::Active,
            "RESOLVED" | "CLAIMED" => ItemStatus::Resolved,
            "REJECTED" => ItemStatus::Rejected,
            _ => ItemStatus::Archived,
        }
    }

    /// Renders the canonical status into the vocabulary of the given table.
    pub fn to_db(&self, item_type: ItemType) -> &'static str {
        match (self, item_type) {
            (ItemStatus::Active, ItemType::Lost) => "ACTIVE",
            (ItemStatus::Active, ItemType::Found) => "AVAILABLE",
            (ItemStatus::Resolved, ItemType::Lost) => "RESOLVED",
            (ItemStatus::Resolved, ItemType::Found) => "CLAIMED",
            (ItemStatus::Rejected, _) => "REJECTED",
            (ItemStatus::Archived, _) => "ARCHIVED",
        }
    }
}

/// UrgencyLevel
///
/// Only lost items carry a stored urgency; found items expose an effective
/// urgency of Medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UrgencyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl UrgencyLevel {
    pub fn from_db(raw: &str) -> UrgencyLevel {
        match raw {
            "LOW" => UrgencyLevel::Low,
            "HIGH" => UrgencyLevel::High,
            _ => UrgencyLevel::Medium,
        }
    }

    pub fn to_db(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "LOW",
            UrgencyLevel::Medium => "MEDIUM",
            UrgencyLevel::High => "HIGH",
        }
    }
}

/// ContactPreference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContactPreference {
    #[default]
    Email,
    Phone,
}

impl ContactPreference {
    pub fn from_db(raw: &str) -> ContactPreference {
        match raw {
            "PHONE" => ContactPreference::Phone,
            _ => ContactPreference::Email,
        }
    }

    pub fn to_db(&self) -> &'static str {
        match self {
            ContactPreference::Email => "EMAIL",
            ContactPreference::Phone => "PHONE",
        }
    }
}

/// ClaimStatus
///
/// Stored lowercase in the claims table; no per-table divergence here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ClaimStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    pub fn from_db(raw: &str) -> ClaimStatus {
        match raw {
            "approved" => ClaimStatus::Approved,
            "rejected" => ClaimStatus::Rejected,
            _ => ClaimStatus::Pending,
        }
    }
}

/// ModerationAction
///
/// Admin moderation verbs. Each maps deterministically onto a status/flag
/// mutation (approve -> active-equivalent, reject -> REJECTED,
/// archive -> ARCHIVED, flag -> flagged=true with the note as reason).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ModerationAction {
    Approve,
    Reject,
    Archive,
    Flag,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Archive => "archive",
            ModerationAction::Flag => "flag",
        }
    }
}

/// FlaggedAction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum FlaggedAction {
    Approve,
    Remove,
    Escalate,
}

impl FlaggedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlaggedAction::Approve => "approve",
            FlaggedAction::Remove => "remove",
            FlaggedAction::Escalate => "escalate",
        }
    }
}

// Account types stored on the profiles table.
pub const USER_TYPE_STUDENT: &str = "STUDENT";
pub const USER_TYPE_ADMIN: &str = "ADMIN";

/// full_name
///
/// Joins optional first/last name parts the way the profile rows store them,
/// falling back to "Unknown" when neither part is present.
pub fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    match (
        first.map(str::trim).filter(|s| !s.is_empty()),
        last.map(str::trim).filter(|s| !s.is_empty()),
    ) {
        (Some(f), Some(l)) => format!("{} {}", f, l),
        (Some(f), None) => f.to_string(),
        (None, Some(l)) => l.to_string(),
        (None, None) => "Unknown".to_string(),
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// Profile
///
/// The user's canonical identity record in the `public.profiles` table, mirroring
/// the external auth provider's user id. Email is intentionally absent: the
/// provider remains its source of truth and it travels on the JWT instead.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Profile {
    // Primary Key, also the Foreign Key to the external auth.users table.
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    // The RBAC field: 'STUDENT' or 'ADMIN'.
    pub user_type: String,
    pub account_status: String,
    pub email_verified: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.user_type == USER_TYPE_ADMIN
    }
}

/// UserProfile
///
/// Output schema for the authenticated user's profile. Enriched with the email
/// and derived admin flag that only exist on the auth side.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub account_status: String,
    pub is_admin: bool,
}

impl UserProfile {
    pub fn from_profile(profile: &Profile, email: &str) -> Self {
        Self {
            id: profile.id,
            email: email.to_string(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            user_type: profile.user_type.clone(),
            account_status: profile.account_status.clone(),
            is_admin: profile.is_admin(),
        }
    }
}

// --- Physical Item Rows (Internal) ---

/// LostItemRow
///
/// Raw database row from `lost_items`, joined with the category/location
/// lookups and the owner profile. Never serialized to clients; it exists only
/// to be unified into [`Item`].
#[derive(Debug, Clone, FromRow)]
pub struct LostItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_name: Option<String>,
    pub location_name: Option<String>,
    pub images: Option<Vec<String>>,
    pub reward_amount: Option<f64>,
    pub urgency: String,
    pub date_lost: Option<NaiveDate>,
    pub time_lost: Option<String>,
    pub contact_method: String,
    pub contact_info: Option<String>,
    pub status: String,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub moderation_notes: Option<String>,
    pub moderated_by: Option<Uuid>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_first_name: Option<String>,
    pub owner_last_name: Option<String>,
}

/// FoundItemRow
///
/// Raw database row from `found_items`. Note the schema divergence from
/// [`LostItemRow`]: no urgency or reward columns, but a current location and
/// condition note.
#[derive(Debug, Clone, FromRow)]
pub struct FoundItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_name: Option<String>,
    pub location_name: Option<String>,
    pub images: Option<Vec<String>>,
    pub current_location: Option<String>,
    pub condition_notes: Option<String>,
    pub date_found: Option<NaiveDate>,
    pub time_found: Option<String>,
    pub contact_method: String,
    pub contact_info: Option<String>,
    pub status: String,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub moderation_notes: Option<String>,
    pub moderated_by: Option<Uuid>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_first_name: Option<String>,
    pub owner_last_name: Option<String>,
}

/// Item
///
/// The unified logical item exposed to all callers. Two physical tables with
/// divergent schemas and status vocabularies collapse into this one shape; the
/// `type` discriminant is the only trace of the split.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Item {
    pub id: Uuid,
    /// 'type' is a reserved keyword in Rust, so we rename it for internal Rust use.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    // FK to public.profiles.id (reporter). Immutable after creation.
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub images: Vec<String>,
    /// First image, or a placeholder URL when none were attached.
    pub image: String,
    /// Always 0 for found items.
    pub reward: f64,
    /// Effective urgency; found items report Medium.
    pub urgency: UrgencyLevel,
    pub date_reported: Option<NaiveDate>,
    pub time_reported: Option<String>,
    pub contact_preference: ContactPreference,
    pub status: ItemStatus,

    // Moderation metadata, orthogonal to lifecycle status.
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub moderation_notes: Option<String>,
    pub moderated_by: Option<Uuid>,
    #[ts(type = "string | null")]
    pub moderated_at: Option<DateTime<Utc>>,

    pub view_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,

    // Owner enrichment (joined from profiles + the contact snapshot on the row).
    pub owner_name: String,
    pub owner_email: String,

    // Found-only extras, absent on lost items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_notes: Option<String>,
}

impl Item {
    /// Unifies a lost_items row into the logical shape.
    pub fn from_lost(row: LostItemRow, base_url: &str) -> Item {
        let images = row.images.unwrap_or_default();
        let image = images
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{}/placeholder/400x300", base_url));
        Item {
            id: row.id,
            item_type: ItemType::Lost,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category: row
                .category_name
                .map(|n| n.to_lowercase())
                .unwrap_or_else(|| "other".to_string()),
            location: row.location_name.unwrap_or_else(|| "Unknown".to_string()),
            images,
            image,
            reward: row.reward_amount.unwrap_or(0.0),
            urgency: UrgencyLevel::from_db(&row.urgency),
            date_reported: row.date_lost,
            time_reported: row.time_lost,
            contact_preference: ContactPreference::from_db(&row.contact_method),
            status: ItemStatus::from_db(&row.status),
            flagged: row.flagged,
            flag_reason: row.flag_reason,
            moderation_notes: row.moderation_notes,
            moderated_by: row.moderated_by,
            moderated_at: row.moderated_at,
            view_count: row.view_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner_name: full_name(
                row.owner_first_name.as_deref(),
                row.owner_last_name.as_deref(),
            ),
            owner_email: row.contact_info.unwrap_or_else(|| "Unknown".to_string()),
            current_location: None,
            condition_notes: None,
        }
    }

    /// Unifies a found_items row into the logical shape. Found items have no
    /// reward and an effective urgency of Medium.
    pub fn from_found(row: FoundItemRow, base_url: &str) -> Item {
        let images = row.images.unwrap_or_default();
        let image = images
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{}/placeholder/400x300", base_url));
        Item {
            id: row.id,
            item_type: ItemType::Found,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category: row
                .category_name
                .map(|n| n.to_lowercase())
                .unwrap_or_else(|| "other".to_string()),
            location: row.location_name.unwrap_or_else(|| "Unknown".to_string()),
            images,
            image,
            reward: 0.0,
            urgency: UrgencyLevel::Medium,
            date_reported: row.date_found,
            time_reported: row.time_found,
            contact_preference: ContactPreference::from_db(&row.contact_method),
            status: ItemStatus::from_db(&row.status),
            flagged: row.flagged,
            flag_reason: row.flag_reason,
            moderation_notes: row.moderation_notes,
            moderated_by: row.moderated_by,
            moderated_at: row.moderated_at,
            view_count: row.view_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner_name: full_name(
                row.owner_first_name.as_deref(),
                row.owner_last_name.as_deref(),
            ),
            owner_email: row.contact_info.unwrap_or_else(|| "Unknown".to_string()),
            current_location: row.current_location,
            condition_notes: row.condition_notes,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /auth/register).
/// The password is only passed through to the external auth provider and never
/// persisted or logged internally by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// RegisterResponse
///
/// Registration never hands out a session token; clients must log in explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub requires_confirmation: bool,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// CreateItemRequest
///
/// Input payload for reporting a lost or found item (POST /items). The `type`
/// discriminant routes the insert to the matching physical table; only the
/// type-appropriate optional fields are stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    // Lost-only; ignored for found items.
    #[serde(default)]
    pub urgency: Option<UrgencyLevel>,
    #[serde(default)]
    pub reward: Option<f64>,
    #[serde(default)]
    pub date_reported: Option<NaiveDate>,
    #[serde(default)]
    pub time_reported: Option<String>,
    #[serde(default)]
    pub contact_preference: Option<ContactPreference>,
}

/// UpdateItemRequest
///
/// Partial update payload for modifying an existing item (PUT /items/{id}).
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// so absent keys are indistinguishable from "no change".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateItemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,

    // Lost-only; ignored on found items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<UrgencyLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,

    // Found-only; ignored on lost items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,
}

impl UpdateItemRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.images.is_none()
            && self.status.is_none()
            && self.urgency.is_none()
            && self.reward.is_none()
            && self.current_location.is_none()
    }
}

/// ItemListResponse
///
/// Paginated listing over the unified item view. `total` counts matches across
/// both physical tables; pagination happens after the union because relative
/// ordering spans both.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// ImageUploadResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ImageUploadResponse {
    pub url: String,
    pub public_url: String,
    pub path: String,
}

// --- Claims ---

/// ClaimRow
///
/// Raw database row from `claim_requests`, joined with the item title and the
/// claimer profile. Internal use only.
#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_type: String,
    pub claimer_id: Uuid,
    pub claimer_email: Option<String>,
    pub message: String,
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_title: Option<String>,
    pub claimer_first_name: Option<String>,
    pub claimer_last_name: Option<String>,
}

/// ClaimRequest
///
/// Enriched claim shape returned to dashboards and the admin console.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ClaimRequest {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_type: ItemType,
    pub claimer_id: Uuid,
    pub message: String,
    pub status: ClaimStatus,
    pub item_title: Option<String>,
    pub claimer_name: String,
    pub claimer_email: Option<String>,
    pub admin_notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl ClaimRequest {
    pub fn from_row(row: ClaimRow) -> ClaimRequest {
        ClaimRequest {
            id: row.id,
            item_id: row.item_id,
            item_type: if row.item_type == "found" {
                ItemType::Found
            } else {
                ItemType::Lost
            },
            claimer_id: row.claimer_id,
            message: row.message,
            status: ClaimStatus::from_db(&row.status),
            item_title: row.item_title,
            claimer_name: full_name(
                row.claimer_first_name.as_deref(),
                row.claimer_last_name.as_deref(),
            ),
            claimer_email: row.claimer_email,
            admin_notes: row.admin_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// CreateClaimRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateClaimRequest {
    pub item_id: Uuid,
    pub message: String,
}

/// ClaimUpdateRequest
///
/// Admin resolution payload (PUT /admin/claims/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ClaimUpdateRequest {
    pub status: ClaimStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

// --- Dashboard & Admin Schemas (Output) ---

/// DashboardStats
///
/// Per-user counters for the dashboard. Computed in memory over the user's
/// own items; success_rate is 0 when the user has posted nothing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_items_posted: i64,
    pub items_recovered: i64,
    pub helping_others: i64,
    pub success_rate: f64,
}

/// DashboardData
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub recent_items: Vec<Item>,
    pub claim_requests: Vec<ClaimRequest>,
}

/// AdminStats
///
/// Output schema for the administrative statistics dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminStats {
    pub total_users: i64,
    pub active_items: i64,
    pub resolved_items: i64,
    pub pending_claims: i64,
    pub success_rate: f64,
    pub total_items: i64,
}

/// AdminItemsResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminItemsResponse {
    pub items: Vec<Item>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// AdminClaimsResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminClaimsResponse {
    pub claims: Vec<ClaimRequest>,
    pub page: i64,
    pub per_page: i64,
}

/// AdminUsersResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminUsersResponse {
    pub users: Vec<Profile>,
    pub page: i64,
    pub per_page: i64,
}

/// SetStatusRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SetStatusRequest {
    pub status: ItemStatus,
}

/// ModerateRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ModerateRequest {
    pub action: ModerationAction,
    #[serde(default)]
    pub note: Option<String>,
}

/// RoleUpdateRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleUpdateRequest {
    pub is_admin: bool,
}

// --- Disputes ---

/// Dispute
///
/// Row from the optional `disputes` table. Serialized as-is for the admin
/// console.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Dispute {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_type: String,
    pub owner_id: Uuid,
    pub status: String,
    pub priority: String,
    pub admin_notes: Option<String>,
    #[ts(type = "string | null")]
    pub last_activity: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// DisputesResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DisputesResponse {
    pub disputes: Vec<Dispute>,
    pub page: i64,
    pub per_page: i64,
}

/// DisputeUpdateRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DisputeUpdateRequest {
    pub action: String,
    #[serde(default)]
    pub note: Option<String>,
}

// --- Flagged Content ---

/// FlaggedContent
///
/// Review-queue entry for flagged items, with a severity derived from the
/// item's urgency.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FlaggedContent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    pub user: String,
    pub email: String,
    pub reason: String,
    pub flagged_by: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub severity: String,
    pub action_required: bool,
    pub report_count: i64,
}

/// FlaggedResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FlaggedResponse {
    pub flagged_content: Vec<FlaggedContent>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// FlaggedActionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FlaggedActionRequest {
    pub action: FlaggedAction,
    pub content_type: String,
    #[serde(default)]
    pub note: Option<String>,
}

// --- Bulk Actions ---

/// BulkActionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BulkActionRequest {
    pub item_ids: Vec<Uuid>,
    pub action: ModerationAction,
    #[serde(default)]
    pub note: Option<String>,
}

/// BulkActionResult
///
/// Per-id outcome inside a bulk batch. Failures never abort the batch; they
/// are collected here instead.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BulkActionResult {
    pub item_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// BulkActionResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BulkActionResponse {
    pub success: bool,
    pub processed: i64,
    pub successful: i64,
    pub failed: i64,
    pub results: Vec<BulkActionResult>,
}

// --- Analytics ---

/// PlatformHealth
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PlatformHealth {
    pub total_items: i64,
    pub active_items: i64,
    pub flagged_items: i64,
    pub health_score: f64,
}

/// AnalyticsResponse
///
/// Windowed activity metrics for the admin dashboard (GET /admin/analytics).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyticsResponse {
    pub new_users: i64,
    pub new_items: i64,
    pub lost_items: i64,
    pub found_items: i64,
    pub new_claims: i64,
    pub approved_claims: i64,
    pub platform_health: PlatformHealth,
}

// --- Notifications ---

/// Notification
///
/// Fire-and-forget record written as a side effect of claim creation, claim
/// resolution, and moderation actions. Never read back by this core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Notification {
    // Recipient.
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub related_item_id: Option<Uuid>,
    pub related_claim_id: Option<Uuid>,
}

// --- Query Filters ---

/// ItemFilter
///
/// Accepted query parameters for the public item listing (GET /items). Filters
/// are applied independently per physical table because the schemas diverge;
/// an urgency or reward filter therefore constrains the found side through its
/// effective values (urgency Medium, reward 0).
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct ItemFilter {
    /// Restrict to one side of the union.
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    /// Category name (exact, case-insensitive), resolved through the lookup table.
    pub category: Option<String>,
    /// Location substring, resolved to an id list through the lookup table.
    pub location: Option<String>,
    pub urgency: Option<UrgencyLevel>,
    /// Free-text search over title and description.
    pub search: Option<String>,
    pub has_reward: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ItemFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(12).clamp(1, 50)
    }
}

/// AdminItemFilter
///
/// Admin review listing parameters (GET /admin/items). Unlike the public
/// filter this sees every lifecycle status.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct AdminItemFilter {
    pub status: Option<ItemStatus>,
    pub flagged_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl AdminItemFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// AdminClaimFilter
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct AdminClaimFilter {
    pub status: Option<ClaimStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl AdminClaimFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// UserFilter
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct UserFilter {
    /// Matches first name, last name, or both.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl UserFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// DisputeFilter
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct DisputeFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl DisputeFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// FlaggedFilter
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct FlaggedFilter {
    /// Content type: currently only "item" is flaggable.
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub severity: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl FlaggedFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// AnalyticsQuery
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct AnalyticsQuery {
    /// Time frame: 1d, 7d, 30d, 90d. Defaults to 7d.
    pub timeframe: Option<String>,
}

impl AnalyticsQuery {
    pub fn days(&self) -> i64 {
        match self.timeframe.as_deref() {
            Some("1d") => 1,
            Some("30d") => 30,
            Some("90d") => 90,
            _ => 7,
        }
    }
}
