use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::{ErrorResponse, MessageResponse};
use crate::auth::AuthenticatedUser;
use crate::state::ServerState;
use crate::storage::{NewRecord, RecordKind, RecordStore, RecordUpdate, StorageError};

/// Record insert/update request
#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    #[serde(rename = "vl")]
    pub value: f64,
    #[serde(rename = "type")]
    pub category: String,
    pub day: Option<i64>,
    pub month: String,
}

/// Record list item
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: i64,
    #[serde(rename = "vl")]
    pub value: f64,
    #[serde(rename = "type")]
    pub category: String,
    pub day: Option<i64>,
    pub month: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub month: String,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn resolve_kind(segment: &str) -> Result<RecordKind, HandlerError> {
    RecordKind::from_path(segment).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Not Found".to_string(),
                code: "NOT_FOUND".to_string(),
            }),
        )
    })
}

fn storage_error(e: StorageError) -> HandlerError {
    match e {
        StorageError::RecordNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Record not found".to_string(),
                code: "NOT_FOUND".to_string(),
            }),
        ),
        other => {
            warn!("Storage error: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal error".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                }),
            )
        }
    }
}

/// Insert a finance record for the authenticated user
pub async fn insert_record(
    State(state): State<Arc<ServerState>>,
    Path(kind): Path<String>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<RecordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), HandlerError> {
    let kind = resolve_kind(&kind)?;

    state
        .record_store
        .insert(
            kind,
            &user.0,
            NewRecord {
                value: request.value,
                category: request.category,
                day: request.day,
                month: request.month,
            },
        )
        .await
        .map_err(storage_error)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("{kind} inserted successfully"),
        }),
    ))
}

/// List the authenticated user's records for a month
pub async fn list_records(
    State(state): State<Arc<ServerState>>,
    Path(kind): Path<String>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RecordResponse>>, HandlerError> {
    let kind = resolve_kind(&kind)?;

    let records = state
        .record_store
        .list_for_month(kind, &user.0, &query.month)
        .await
        .map_err(storage_error)?;

    Ok(Json(
        records
            .into_iter()
            .map(|r| RecordResponse {
                id: r.id,
                value: r.value,
                category: r.category,
                day: r.day,
                month: r.month,
            })
            .collect(),
    ))
}

/// Update one of the authenticated user's records
pub async fn update_record(
    State(state): State<Arc<ServerState>>,
    Path(kind): Path<String>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<IdQuery>,
    Json(request): Json<RecordRequest>,
) -> Result<Json<MessageResponse>, HandlerError> {
    let kind = resolve_kind(&kind)?;

    state
        .record_store
        .update(
            kind,
            &user.0,
            query.id,
            RecordUpdate {
                value: request.value,
                category: request.category,
                day: request.day,
            },
        )
        .await
        .map_err(storage_error)?;

    Ok(Json(MessageResponse {
        message: format!("{kind} updated successfully"),
    }))
}

/// Delete one of the authenticated user's records
pub async fn delete_record(
    State(state): State<Arc<ServerState>>,
    Path(kind): Path<String>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<IdQuery>,
) -> Result<Json<MessageResponse>, HandlerError> {
    let kind = resolve_kind(&kind)?;

    state
        .record_store
        .delete(kind, &user.0, query.id)
        .await
        .map_err(storage_error)?;

    Ok(Json(MessageResponse {
        message: format!("{kind} deleted successfully"),
    }))
}
