//! # 送信許可ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/users/{id}/permissions` - ユーザーの許可一覧（管理者）
//! - `PUT /api/users/{id}/permissions/{identity_id}` - 許可の付与・取り消し（管理者）

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use mailgate_domain::{identity::SenderIdentityId, user::UserId};
use mailgate_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    usecase::{PermissionUseCaseImpl, Requester},
};

/// 許可 API の共有状態
pub struct PermissionState {
    pub usecase: PermissionUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// リクエスタクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct RequesterQuery {
    pub requester_id: Uuid,
    pub is_admin:     bool,
}

/// 許可変更リクエスト
#[derive(Debug, Deserialize)]
pub struct SetPermissionRequest {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    pub granted:      bool,
}

/// 許可一覧 DTO（アイデンティティ ID のリスト）
#[derive(Debug, Serialize)]
pub struct PermissionListDto {
    pub sender_identity_ids: Vec<Uuid>,
}

// --- ハンドラ ---

/// GET /api/users/{id}/permissions
pub async fn list_permissions(
    State(state): State<Arc<PermissionState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RequesterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(query.requester_id),
        is_admin: query.is_admin,
    };

    let ids = state
        .usecase
        .list_for_user(&requester, &UserId::from_uuid(user_id))
        .await?;

    let response = ApiResponse::new(PermissionListDto {
        sender_identity_ids: ids.into_iter().map(|id| *id.as_uuid()).collect(),
    });
    Ok((StatusCode::OK, Json(response)))
}

/// PUT /api/users/{id}/permissions/{identity_id}
///
/// `granted: true` で付与（冪等）、`false` で取り消し。
///
/// ## レスポンス
///
/// - `204 No Content`: 変更成功
/// - `404 Not Found`: ユーザーまたはアイデンティティが見つからない
pub async fn set_permission(
    State(state): State<Arc<PermissionState>>,
    Path((user_id, identity_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SetPermissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };

    state
        .usecase
        .set_permission(
            &requester,
            &UserId::from_uuid(user_id),
            &SenderIdentityId::from_uuid(identity_id),
            req.granted,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
