use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::notification::{self, NotificationKind};
use crate::services::notification::{Channel, ResolvedPreference};
use crate::state::AppState;

pub fn notifications_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_inbox))
        .route("/unread-count", get(get_unread_count))
        .route("/{id}/read", post(mark_as_read))
        .route("/read-all", post(mark_all_as_read))
        .with_state(state)
}

pub fn preferences_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_preferences))
        .route("/{kind}", put(update_preference))
        .with_state(state)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct InboxResponse {
    pub notifications: Vec<NotificationDto>,
    pub total: u64,
    pub unread: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationDto {
    pub id: i64,
    pub kind: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    pub related_kind: Option<String>,
    pub related_id: Option<i64>,
    pub metadata: serde_json::Value,
    pub read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationDto {
    fn from(n: notification::Model) -> Self {
        let metadata = n
            .metadata
            .as_deref()
            .and_then(|m| serde_json::from_str(m).ok())
            .unwrap_or(serde_json::Value::Null);

        Self {
            id: n.id,
            kind: n.kind,
            priority: n.priority,
            title: n.title,
            message: n.message,
            related_kind: n.related_kind,
            related_id: n.related_id,
            metadata,
            read: n.read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct InboxQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/agents/{agent_id}/notifications",
    tag = "Notifications",
    params(
        ("agent_id" = i64, Path, description = "Agent ID"),
        ("limit" = Option<u64>, Query, description = "Number of notifications to return"),
        ("offset" = Option<u64>, Query, description = "Offset for pagination"),
    ),
    responses(
        (status = 200, body = InboxResponse)
    )
)]
async fn get_inbox(
    State(state): State<AppState>,
    Path(agent_id): Path<i64>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<InboxResponse>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.offset.unwrap_or(0);

    let notifications = state
        .notifications
        .agent_notifications(agent_id, limit, offset)
        .await?;

    let unread = state.notifications.unread_count(agent_id).await?;

    let total = notification::Entity::find()
        .filter(notification::Column::AgentId.eq(agent_id))
        .count(&state.db)
        .await?;

    let dtos: Vec<NotificationDto> = notifications
        .into_iter()
        .map(NotificationDto::from)
        .collect();

    Ok(Json(InboxResponse {
        notifications: dtos,
        total,
        unread,
    }))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[utoipa::path(
    get,
    path = "/api/agents/{agent_id}/notifications/unread-count",
    tag = "Notifications",
    params(
        ("agent_id" = i64, Path, description = "Agent ID"),
    ),
    responses(
        (status = 200, body = UnreadCountResponse)
    )
)]
async fn get_unread_count(
    State(state): State<AppState>,
    Path(agent_id): Path<i64>,
) -> Result<Json<UnreadCountResponse>> {
    let count = state.notifications.unread_count(agent_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    post,
    path = "/api/agents/{agent_id}/notifications/{id}/read",
    tag = "Notifications",
    params(
        ("agent_id" = i64, Path, description = "Agent ID"),
        ("id" = i64, Path, description = "Notification ID"),
    ),
    responses(
        (status = 200, body = serde_json::Value)
    )
)]
async fn mark_as_read(
    State(state): State<AppState>,
    Path((agent_id, id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>> {
    state.notifications.mark_as_read(id, agent_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    post,
    path = "/api/agents/{agent_id}/notifications/read-all",
    tag = "Notifications",
    params(
        ("agent_id" = i64, Path, description = "Agent ID"),
    ),
    responses(
        (status = 200, body = serde_json::Value)
    )
)]
async fn mark_all_as_read(
    State(state): State<AppState>,
    Path(agent_id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let updated = state.notifications.mark_all_as_read(agent_id).await?;
    Ok(Json(serde_json::json!({ "success": true, "updated": updated })))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PreferenceDto {
    pub kind: String,
    pub enabled: bool,
    pub channel: String,
    pub immediate: bool,
}

#[utoipa::path(
    get,
    path = "/api/agents/{agent_id}/preferences",
    tag = "Notifications",
    params(
        ("agent_id" = i64, Path, description = "Agent ID"),
    ),
    responses(
        (status = 200, body = Vec<PreferenceDto>)
    )
)]
async fn get_preferences(
    State(state): State<AppState>,
    Path(agent_id): Path<i64>,
) -> Result<Json<Vec<PreferenceDto>>> {
    let prefs = state.notifications.preferences(agent_id).await?;

    let dtos = prefs
        .into_iter()
        .map(|(kind, p)| PreferenceDto {
            kind: kind.as_str().to_string(),
            enabled: p.enabled,
            channel: p.channel.as_str().to_string(),
            immediate: p.immediate,
        })
        .collect();

    Ok(Json(dtos))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePrefRequest {
    pub enabled: Option<bool>,
    pub channel: Option<String>,
    pub immediate: Option<bool>,
}

#[utoipa::path(
    put,
    path = "/api/agents/{agent_id}/preferences/{kind}",
    tag = "Notifications",
    params(
        ("agent_id" = i64, Path, description = "Agent ID"),
        ("kind" = String, Path, description = "Notification kind"),
    ),
    request_body = UpdatePrefRequest,
    responses(
        (status = 200, body = PreferenceDto)
    )
)]
async fn update_preference(
    State(state): State<AppState>,
    Path((agent_id, kind)): Path<(i64, String)>,
    Json(req): Json<UpdatePrefRequest>,
) -> Result<Json<PreferenceDto>> {
    let kind = NotificationKind::parse(&kind)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid notification kind: {}", kind)))?;

    if let Some(channel) = req.channel.as_deref() {
        if Channel::parse(channel).is_none() {
            return Err(AppError::BadRequest(format!(
                "Invalid channel: {}",
                channel
            )));
        }
    }

    let current = state.notifications.preference(agent_id, kind).await?;
    let pref = ResolvedPreference {
        enabled: req.enabled.unwrap_or(current.enabled),
        channel: req
            .channel
            .as_deref()
            .and_then(Channel::parse)
            .unwrap_or(current.channel),
        immediate: req.immediate.unwrap_or(current.immediate),
    };

    let saved = state.notifications.set_preference(agent_id, kind, pref).await?;

    Ok(Json(PreferenceDto {
        kind: saved.kind,
        enabled: saved.enabled,
        channel: saved.channel,
        immediate: saved.immediate,
    }))
}
