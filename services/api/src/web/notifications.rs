//! services/api/src/web/notifications.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use barbershop_core::domain::Notification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::rest::{port_error, HttpResult};
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct FeedQuery {
    /// Only unread notifications when `true`.
    #[serde(default)]
    pub unread: bool,
}

#[derive(Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub urgent: bool,
    pub related_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            read: n.read,
            urgent: n.urgent,
            related_id: n.related_id,
            created_at: n.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MarkedResponse {
    pub updated: u64,
}

/// GET /notifications - The feed, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    params(FeedQuery),
    responses((status = 200, description = "Notifications", body = [NotificationResponse]))
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> HttpResult<Json<Vec<NotificationResponse>>> {
    let notifications = state
        .notifications
        .list_notifications(query.unread)
        .await
        .map_err(port_error)?;
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

/// POST /notifications/{id}/read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Unknown notification", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> HttpResult<StatusCode> {
    state.notifications.mark_read(id).await.map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notifications/read-all
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses((status = 200, description = "Number of notifications marked", body = MarkedResponse))
)]
pub async fn mark_all_read_handler(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<MarkedResponse>> {
    let updated = state
        .notifications
        .mark_all_read()
        .await
        .map_err(port_error)?;
    Ok(Json(MarkedResponse { updated }))
}
