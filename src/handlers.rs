use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    identity::split_full_name,
    media,
    models::{
        AdminClaimFilter, AdminItemFilter, AdminStats, AdminClaimsResponse, AdminItemsResponse,
        AdminUsersResponse, AnalyticsQuery, AnalyticsResponse, BulkActionRequest,
        BulkActionResponse, ClaimRequest, ClaimStatus, ClaimUpdateRequest, CreateClaimRequest,
        CreateItemRequest, DashboardData, DashboardStats, Dispute, DisputeFilter,
        DisputeUpdateRequest, DisputesResponse, FlaggedActionRequest, FlaggedResponse,
        ImageUploadResponse, Item, ItemFilter, ItemListResponse, ItemStatus, ItemType,
        LoginRequest, LoginResponse, ModerateRequest, ModerationAction, Notification, Profile,
        RegisterRequest, RegisterResponse, RoleUpdateRequest, SetStatusRequest, UpdateItemRequest,
        UserFilter, UserProfile, USER_TYPE_ADMIN, USER_TYPE_STUDENT,
    },
    moderation::compute_success_rate,
    repository::paginate,
    storage::resolve_upload_path,
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;

// --- Health ---

/// health_check
///
/// [Public Route] Liveness probe for monitoring and load balancer checks.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive"))
)]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "timestamp": Utc::now() }))
}

// --- Identity Gateway ---

/// register
///
/// [Public Route] Creates the account at the external auth provider, then
/// makes sure the mirroring profile row exists locally.
///
/// The provider-side trigger usually materializes the profile; when it has not
/// (a short race window after account creation), the handler falls back to
/// splitting the full name and inserting the row itself. Registration never
/// returns a session token; clients must log in explicitly.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Invalid email domain or provider rejection")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    // Institutional addresses only.
    if !payload.email.ends_with(&state.config.email_domain) {
        return Err(ApiError::Validation(
            "Please use your university email address".to_string(),
        ));
    }

    let provider_user = state
        .identity
        .sign_up(
            &payload.email,
            &payload.password,
            &payload.full_name,
            payload.is_admin,
        )
        .await?;

    match state.repo.get_profile(provider_user.id).await {
        None => {
            // Trigger has not materialized the profile yet; insert it ourselves.
            let (first_name, last_name) = split_full_name(&payload.full_name);
            let profile = Profile {
                id: provider_user.id,
                first_name,
                last_name,
                user_type: if payload.is_admin {
                    USER_TYPE_ADMIN.to_string()
                } else {
                    USER_TYPE_STUDENT.to_string()
                },
                account_status: "ACTIVE".to_string(),
                email_verified: provider_user.email_confirmed_at.is_some(),
                created_at: Utc::now(),
            };
            if let Err(e) = state.repo.create_profile(profile).await {
                // The provider account exists either way; the login path will
                // synthesize the profile if this insert was the casualty.
                tracing::error!("fallback profile insert failed: {}", e);
            }
        }
        Some(existing) => {
            if payload.is_admin && !existing.is_admin() {
                state.repo.promote_profile(provider_user.id).await;
            }
        }
    }

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful! Please log in with your credentials.".to_string(),
        user_id: provider_user.id,
        email: payload.email,
        is_admin: payload.is_admin,
        requires_confirmation: provider_user.email_confirmed_at.is_none(),
    }))
}

/// login
///
/// [Public Route] Password-grant authentication against the external provider.
/// Tolerates a profile row missing even after successful auth (race with the
/// provider trigger) by synthesizing one from the token metadata.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .identity
        .sign_in(&payload.email, &payload.password)
        .await?;

    let profile = match state.repo.get_profile(session.user.id).await {
        Some(profile) => profile,
        None => {
            let full = session
                .user
                .metadata_full_name()
                .unwrap_or_else(|| "User".to_string());
            let (first_name, last_name) = split_full_name(&full);
            let user_type = if session.user.metadata_is_admin() {
                USER_TYPE_ADMIN
            } else {
                USER_TYPE_STUDENT
            };
            state
                .repo
                .create_profile(Profile {
                    id: session.user.id,
                    first_name,
                    last_name,
                    user_type: user_type.to_string(),
                    account_status: "ACTIVE".to_string(),
                    email_verified: session.user.email_confirmed_at.is_some(),
                    created_at: Utc::now(),
                })
                .await?
        }
    };

    tracing::info!(
        "User {} logged in successfully (Admin: {})",
        session.user.email,
        profile.is_admin()
    );

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        user: UserProfile::from_profile(&profile, &session.user.email),
    }))
}

/// get_me
///
/// [Authenticated Route] The authenticated user's profile, re-read from the
/// database so role or status changes since token issuance are visible.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .repo
        .get_profile(user.id)
        .await
        .ok_or_else(|| ApiError::Auth("User profile not found".to_string()))?;
    Ok(Json(UserProfile::from_profile(&profile, &user.email)))
}

// --- Items ---

/// get_items
///
/// [Public Route] Lists claimable items from both physical tables with
/// filtering and pagination. The repository returns the full unified,
/// filtered, sorted set; the pagination window is cut here, after the union,
/// because relative ordering spans both tables.
#[utoipa::path(
    get,
    path = "/items",
    params(ItemFilter),
    responses((status = 200, description = "Paginated unified listing", body = ItemListResponse))
)]
pub async fn get_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Json<ItemListResponse> {
    let all = state.repo.list_items(&filter).await;
    let page = filter.page();
    let per_page = filter.per_page();
    let (items, total, has_next, has_prev) = paginate(all, page, per_page);
    Json(ItemListResponse {
        items,
        total,
        page,
        per_page,
        has_next,
        has_prev,
    })
}

/// get_item_details
///
/// [Public Route] Single-item read. Increments the view counter as a
/// best-effort side effect inside the repository; the read never fails
/// because of the counter.
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Found", body = Item),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn get_item_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, ApiError> {
    state
        .repo
        .get_item(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))
}

/// create_item
///
/// [Authenticated Route] Reports a lost or found item. The `type` field routes
/// the insert to the matching physical table; the reporter identity comes from
/// the authenticated session, never the payload.
#[utoipa::path(
    post,
    path = "/items",
    request_body = CreateItemRequest,
    responses(
        (status = 200, description = "Created", body = Item),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_item(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let item = state.repo.create_item(payload, &user).await?;
    Ok(Json(item))
}

/// update_item
///
/// [Authenticated Route] Owner-only partial update. Absent fields are left
/// untouched; the Forbidden/NotFound distinction is made in the repository
/// with race-safe ordering.
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated", body = Item),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn update_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let item = state.repo.update_item(id, payload, user.id).await?;
    Ok(Json(item))
}

// --- Media Ingestion ---

/// upload_image
///
/// [Authenticated Route] Accepts a multipart image upload, normalizes it
/// through the media pipeline (type allow-list, 10 MiB ceiling, flatten +
/// bounded re-encode), and stores it under `{user_id}/{uuid}.{ext}`.
///
/// Storage failure handling: one retry under a collision-resistant suffixed
/// key, then a fallback write to the local uploads directory served through
/// GET /uploads/{path}.
#[utoipa::path(
    post,
    path = "/upload",
    responses(
        (status = 200, description = "Stored", body = ImageUploadResponse),
        (status = 400, description = "Unsupported type, oversized, or corrupt image")
    )
)]
pub async fn upload_image(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(|n| n.to_string());
            content_type = field.content_type().map(|c| c.to_string());
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let data = data.ok_or_else(|| {
        ApiError::Validation("Missing file in multipart form".to_string())
    })?;
    let content_type = content_type.ok_or_else(|| {
        ApiError::Validation("Missing content type on uploaded file".to_string())
    })?;

    let processed = media::process_upload(&data, &content_type, filename.as_deref())?;

    // Object key under the uploader's folder.
    let key = format!("{}/{}.{}", user.id, Uuid::new_v4(), processed.extension);

    match state
        .storage
        .put_object(&key, processed.bytes.clone(), &processed.content_type)
        .await
    {
        Ok(()) => {
            let url = state.storage.public_url(&key);
            return Ok(Json(ImageUploadResponse {
                url: url.clone(),
                public_url: url,
                path: key,
            }));
        }
        Err(e) => {
            tracing::warn!("object storage upload failed: {}, retrying once", e);
        }
    }

    // Retry once under a collision-resistant key (fresh uuid + timestamp).
    let retry_key = format!(
        "{}/{}-{}.{}",
        user.id,
        Uuid::new_v4(),
        Utc::now().timestamp(),
        processed.extension
    );
    match state
        .storage
        .put_object(&retry_key, processed.bytes.clone(), &processed.content_type)
        .await
    {
        Ok(()) => {
            let url = state.storage.public_url(&retry_key);
            return Ok(Json(ImageUploadResponse {
                url: url.clone(),
                public_url: url,
                path: retry_key,
            }));
        }
        Err(e) => {
            tracing::warn!("object storage retry failed: {}, using local fallback", e);
        }
    }

    // Local filesystem fallback: same bytes, equivalent per-user path.
    let rel = format!("{}/{}.{}", user.id, Uuid::new_v4(), processed.extension);
    let root = PathBuf::from(&state.config.uploads_dir);
    let full_path = resolve_upload_path(&root, &rel)?;
    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Upstream(format!("uploads dir: {}", e)))?;
    }
    tokio::fs::write(&full_path, &processed.bytes)
        .await
        .map_err(|e| ApiError::Upstream(format!("fallback write: {}", e)))?;
    tracing::info!("saved image via local fallback: {}", full_path.display());

    let url = format!(
        "{}/uploads/{}",
        state.config.public_base_url.trim_end_matches('/'),
        rel
    );
    Ok(Json(ImageUploadResponse {
        url: url.clone(),
        public_url: url,
        path: rel,
    }))
}

/// serve_upload
///
/// [Public Route] Read-back path for images stored through the local fallback.
/// The resolved path must remain inside the uploads root; anything else is
/// rejected before touching the filesystem.
#[utoipa::path(
    get,
    path = "/uploads/{path}",
    params(("path" = String, Path, description = "Relative image path")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 403, description = "Traversal attempt"),
        (status = 404, description = "No such image")
    )
)]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(rel): Path<String>,
) -> Result<Response, ApiError> {
    let root = PathBuf::from(&state.config.uploads_dir);
    let full_path = resolve_upload_path(&root, &rel)?;

    let bytes = tokio::fs::read(&full_path)
        .await
        .map_err(|_| ApiError::NotFound("Image not found".to_string()))?;

    let mime = mime_guess::from_path(&full_path).first_or_octet_stream();
    Ok((
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        bytes,
    )
        .into_response())
}

/// get_placeholder
///
/// [Public Route] Neutral placeholder image for items without photos.
/// Dimensions come in as `{width}x{height}` and are clamped inside the media
/// module.
#[utoipa::path(
    get,
    path = "/placeholder/{dims}",
    params(("dims" = String, Path, description = "Dimensions, e.g. 400x300")),
    responses((status = 200, description = "PNG bytes"))
)]
pub async fn get_placeholder(Path(dims): Path<String>) -> Result<Response, ApiError> {
    let (width, height) = dims
        .split_once('x')
        .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
        .ok_or_else(|| {
            ApiError::Validation("Placeholder dimensions must look like 400x300".to_string())
        })?;

    let png = media::placeholder_png(width, height);
    Ok((
        [(header::CONTENT_TYPE, "image/png".to_string())],
        png,
    )
        .into_response())
}

// --- Dashboard ---

/// get_dashboard
///
/// [Authenticated Route] Per-user stats, recent items, and claims filed
/// against the user's items. Counters are computed in memory over the user's
/// own rows; success_rate is 0 for users with no items.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard", body = DashboardData))
)]
pub async fn get_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
) -> Json<DashboardData> {
    let items = state.repo.user_items(user.id).await;
    let claim_requests = state.repo.claims_for_owner(user.id).await;

    let total_items_posted = items.len() as i64;
    let items_recovered = items
        .iter()
        .filter(|i| i.status == ItemStatus::Resolved)
        .count() as i64;
    let helping_others = items
        .iter()
        .filter(|i| i.item_type == ItemType::Found)
        .count() as i64;

    let stats = DashboardStats {
        total_items_posted,
        items_recovered,
        helping_others,
        success_rate: compute_success_rate(items_recovered, total_items_posted),
    };

    let recent_items = items.into_iter().take(5).collect();

    Json(DashboardData {
        stats,
        recent_items,
        claim_requests,
    })
}

// --- Claim Workflow ---

/// create_claim
///
/// [Authenticated Route] Files a claim against an item. Claiming one's own
/// item or a non-active item is a conflict regardless of anything else. The
/// owner notification is emitted strictly after the claim row is durably
/// created, and its failure never unwinds the claim.
#[utoipa::path(
    post,
    path = "/claims",
    request_body = CreateClaimRequest,
    responses(
        (status = 200, description = "Claim filed", body = ClaimRequest),
        (status = 400, description = "Own item or item not claimable"),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn create_claim(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateClaimRequest>,
) -> Result<Json<ClaimRequest>, ApiError> {
    let item = state
        .repo
        .get_item(payload.item_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

    if item.user_id == user.id {
        return Err(ApiError::Conflict("Cannot claim your own item".to_string()));
    }
    if item.status != ItemStatus::Active {
        return Err(ApiError::Conflict(
            "Item is not available for claiming".to_string(),
        ));
    }

    let claim = state
        .repo
        .create_claim(&item, &user, payload.message)
        .await?;

    let _ = state
        .repo
        .notify(Notification {
            user_id: item.user_id,
            title: "New Claim Request".to_string(),
            message: format!(
                "Someone wants to claim your {} item: {}",
                item.item_type.as_str(),
                item.title
            ),
            notification_type: "item_claimed".to_string(),
            related_item_id: Some(item.id),
            related_claim_id: Some(claim.id),
        })
        .await;

    Ok(Json(claim))
}

// --- Admin Console ---

/// get_admin_stats
///
/// [Admin Route] Aggregate counters across both item tables, users, and claims.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminStats))
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, ApiError> {
    user.require_admin()?;
    Ok(Json(state.admin.stats().await))
}

/// get_admin_items
///
/// [Admin Route] Review listing over every lifecycle status, unified across
/// both tables; the status filter maps through each table's own vocabulary.
#[utoipa::path(
    get,
    path = "/admin/items",
    params(AdminItemFilter),
    responses((status = 200, description = "All items", body = AdminItemsResponse))
)]
pub async fn get_admin_items(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<AdminItemFilter>,
) -> Result<Json<AdminItemsResponse>, ApiError> {
    user.require_admin()?;
    let all = state.admin.admin_items(&filter).await;
    let page = filter.page();
    let per_page = filter.per_page();
    let (items, total, _, _) = paginate(all, page, per_page);
    Ok(Json(AdminItemsResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// update_item_status
///
/// [Admin Route] Writes a canonical status back through the owning table's
/// vocabulary.
#[utoipa::path(
    put,
    path = "/admin/items/{id}/status",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Item),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn update_item_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<Item>, ApiError> {
    user.require_admin()?;
    let item = state.admin.set_item_status(id, payload.status).await?;
    let _ = state
        .admin
        .audit(user.id, "set_status", "item", &id.to_string(), None)
        .await;
    Ok(Json(item))
}

/// moderate_item
///
/// [Admin Route] Applies a moderation verb (approve/reject/archive/flag) and
/// notifies the owner keyed by the action. The notification and audit record
/// are best-effort.
#[utoipa::path(
    post,
    path = "/admin/items/{id}/moderate",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = ModerateRequest,
    responses(
        (status = 200, description = "Moderated", body = Item),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn moderate_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateRequest>,
) -> Result<Json<Item>, ApiError> {
    user.require_admin()?;
    let item = state
        .admin
        .moderate_item(id, payload.action, payload.note.clone(), user.id)
        .await?;

    let (title, message, notification_type) = match payload.action {
        ModerationAction::Approve => (
            "Item Approved",
            "Your item has been approved and is now visible to other users.",
            "item_approve",
        ),
        ModerationAction::Reject => (
            "Item Rejected",
            "Your item submission has been rejected. Please review community guidelines.",
            "item_reject",
        ),
        ModerationAction::Archive => (
            "Item Archived",
            "Your item has been archived by admin.",
            "item_archive",
        ),
        ModerationAction::Flag => (
            "Item Flagged",
            "Your item has been flagged for review. Please contact support if you have questions.",
            "item_flag",
        ),
    };
    let _ = state
        .repo
        .notify(Notification {
            user_id: item.user_id,
            title: title.to_string(),
            message: message.to_string(),
            notification_type: notification_type.to_string(),
            related_item_id: Some(item.id),
            related_claim_id: None,
        })
        .await;
    let _ = state
        .admin
        .audit(
            user.id,
            payload.action.as_str(),
            "item",
            &id.to_string(),
            payload.note.as_deref(),
        )
        .await;

    Ok(Json(item))
}

/// delete_item_admin
///
/// [Admin Route] Removes an item from whichever table owns it. The audit
/// record is written inside the repository, strictly after the delete
/// succeeds.
#[utoipa::path(
    delete,
    path = "/admin/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn delete_item_admin(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let deleted = state.admin.delete_item(id, user.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Item deleted successfully",
        "deleted_item": deleted,
        "table": deleted.item_type.table(),
    })))
}

/// get_admin_claims
#[utoipa::path(
    get,
    path = "/admin/claims",
    params(AdminClaimFilter),
    responses((status = 200, description = "Claims", body = AdminClaimsResponse))
)]
pub async fn get_admin_claims(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<AdminClaimFilter>,
) -> Result<Json<AdminClaimsResponse>, ApiError> {
    user.require_admin()?;
    let claims = state.admin.admin_claims(&filter).await;
    Ok(Json(AdminClaimsResponse {
        claims,
        page: filter.page(),
        per_page: filter.per_page(),
    }))
}

/// update_claim
///
/// [Admin Route] Resolves a claim to approved/rejected, then emits exactly one
/// notification to the claimant describing the outcome.
#[utoipa::path(
    put,
    path = "/admin/claims/{id}",
    params(("id" = Uuid, Path, description = "Claim ID")),
    request_body = ClaimUpdateRequest,
    responses(
        (status = 200, description = "Resolved", body = ClaimRequest),
        (status = 404, description = "Unknown claim")
    )
)]
pub async fn update_claim(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClaimUpdateRequest>,
) -> Result<Json<ClaimRequest>, ApiError> {
    user.require_admin()?;
    let claim = state.admin.resolve_claim(id, payload).await?;

    let (title, message, notification_type) = match claim.status {
        ClaimStatus::Approved => (
            "Claim Approved",
            "Your claim request has been approved by admin.",
            "claim_approved",
        ),
        _ => (
            "Claim Rejected",
            "Your claim request has been rejected by admin.",
            "claim_rejected",
        ),
    };
    let _ = state
        .repo
        .notify(Notification {
            user_id: claim.claimer_id,
            title: title.to_string(),
            message: message.to_string(),
            notification_type: notification_type.to_string(),
            related_item_id: Some(claim.item_id),
            related_claim_id: Some(claim.id),
        })
        .await;
    let _ = state
        .admin
        .audit(
            user.id,
            &format!("claim_{}", claim.status.as_str()),
            "claim",
            &id.to_string(),
            claim.admin_notes.as_deref(),
        )
        .await;

    Ok(Json(claim))
}

/// get_admin_users
#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserFilter),
    responses((status = 200, description = "Users", body = AdminUsersResponse))
)]
pub async fn get_admin_users(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<AdminUsersResponse>, ApiError> {
    user.require_admin()?;
    let users = state.admin.list_users(&filter).await;
    Ok(Json(AdminUsersResponse {
        users,
        page: filter.page(),
        per_page: filter.per_page(),
    }))
}

/// update_user_role
///
/// [Admin Route] Direct mutation of a profile's account type.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Updated", body = Profile),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_user_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Result<Json<Profile>, ApiError> {
    user.require_admin()?;
    let profile = state.admin.set_user_role(id, payload.is_admin).await?;
    let _ = state
        .admin
        .audit(
            user.id,
            "set_role",
            "user",
            &id.to_string(),
            Some(&format!("is_admin={}", payload.is_admin)),
        )
        .await;
    Ok(Json(profile))
}

/// get_admin_disputes
#[utoipa::path(
    get,
    path = "/admin/disputes",
    params(DisputeFilter),
    responses((status = 200, description = "Disputes", body = DisputesResponse))
)]
pub async fn get_admin_disputes(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<DisputeFilter>,
) -> Result<Json<DisputesResponse>, ApiError> {
    user.require_admin()?;
    let disputes = state.admin.disputes(&filter).await;
    Ok(Json(DisputesResponse {
        disputes,
        page: filter.page(),
        per_page: filter.per_page(),
    }))
}

/// update_dispute
///
/// [Admin Route] Updates a dispute's status/notes; resolution stamps the
/// resolver and notifies the item owner.
#[utoipa::path(
    put,
    path = "/admin/disputes/{id}",
    params(("id" = Uuid, Path, description = "Dispute ID")),
    request_body = DisputeUpdateRequest,
    responses(
        (status = 200, description = "Updated", body = Dispute),
        (status = 404, description = "Unknown dispute")
    )
)]
pub async fn update_dispute(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DisputeUpdateRequest>,
) -> Result<Json<Dispute>, ApiError> {
    user.require_admin()?;
    let dispute = state
        .admin
        .update_dispute(id, &payload.action, payload.note.clone(), user.id)
        .await?;

    if payload.action == "resolve" {
        let _ = state
            .repo
            .notify(Notification {
                user_id: dispute.owner_id,
                title: "Dispute Resolved".to_string(),
                message: "The dispute regarding your item has been resolved by admin."
                    .to_string(),
                notification_type: "dispute_resolved".to_string(),
                related_item_id: Some(dispute.item_id),
                related_claim_id: None,
            })
            .await;
    }
    let _ = state
        .admin
        .audit(
            user.id,
            &format!("dispute_{}", payload.action),
            "dispute",
            &id.to_string(),
            payload.note.as_deref(),
        )
        .await;

    Ok(Json(dispute))
}

/// get_flagged
///
/// [Admin Route] The flagged-content review queue with severity filtering and
/// in-memory pagination.
#[utoipa::path(
    get,
    path = "/admin/flagged",
    params(crate::models::FlaggedFilter),
    responses((status = 200, description = "Flagged content", body = FlaggedResponse))
)]
pub async fn get_flagged(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<crate::models::FlaggedFilter>,
) -> Result<Json<FlaggedResponse>, ApiError> {
    user.require_admin()?;

    // Only items are flaggable today; other content types yield empty queues.
    let mut flagged = if filter
        .content_type
        .as_deref()
        .is_none_or(|t| t == "item")
    {
        state.admin.flagged_items().await
    } else {
        vec![]
    };
    if let Some(severity) = &filter.severity {
        flagged.retain(|f| &f.severity == severity);
    }

    let page = filter.page();
    let per_page = filter.per_page();
    let (flagged_content, total, _, _) = paginate(flagged, page, per_page);
    Ok(Json(FlaggedResponse {
        flagged_content,
        total,
        page,
        per_page,
    }))
}

/// flagged_action
///
/// [Admin Route] Takes action on flagged content (approve clears the flag and
/// reinstates; remove archives; escalate records the decision only). Always
/// audited.
#[utoipa::path(
    post,
    path = "/admin/flagged/{id}/action",
    params(("id" = Uuid, Path, description = "Content ID")),
    request_body = FlaggedActionRequest,
    responses(
        (status = 200, description = "Handled"),
        (status = 404, description = "Unknown content")
    )
)]
pub async fn flagged_action(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlaggedActionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    state.admin.flagged_action(id, &payload, user.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "action": payload.action.as_str(),
    })))
}

/// get_analytics
#[utoipa::path(
    get,
    path = "/admin/analytics",
    params(AnalyticsQuery),
    responses((status = 200, description = "Analytics", body = AnalyticsResponse))
)]
pub async fn get_analytics(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    user.require_admin()?;
    Ok(Json(state.admin.analytics(query.days()).await))
}

/// bulk_action
///
/// [Admin Route] Applies one moderation verb across many ids. Each id is
/// processed independently; per-id failures are collected and reported, never
/// aborting the batch. One audit row covers the batch.
#[utoipa::path(
    post,
    path = "/admin/bulk-action",
    request_body = BulkActionRequest,
    responses((status = 200, description = "Batch outcome", body = BulkActionResponse))
)]
pub async fn bulk_action(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<BulkActionRequest>,
) -> Result<Json<BulkActionResponse>, ApiError> {
    user.require_admin()?;
    Ok(Json(state.admin.bulk_action(&payload, user.id).await))
}
