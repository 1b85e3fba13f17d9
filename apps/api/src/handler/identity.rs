//! # 送信者アイデンティティハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/identities` - 一覧（`view=available` でコンポーズ画面向け）
//! - `POST /api/identities` - 作成（管理者）
//! - `PATCH /api/identities/{id}/active` - アクティブ状態のトグル（管理者）
//! - `DELETE /api/identities/{id}` - 削除（管理者、送信ログ参照があればブロック）

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use mailgate_domain::identity::{SenderIdentity, SenderIdentityId};
use mailgate_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    usecase::{IdentityUseCaseImpl, Requester, identity::CreateIdentityInput},
};

/// アイデンティティ API の共有状態
pub struct IdentityState {
    pub usecase: IdentityUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 一覧クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListIdentitiesQuery {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    /// `"available"` を指定するとリクエスタが送信に使えるもののみ返す
    pub view:         Option<String>,
}

/// アイデンティティ作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateIdentityRequest {
    pub requester_id:  Uuid,
    pub is_admin:      bool,
    pub display_name:  String,
    pub email_address: String,
}

/// アクティブ状態変更リクエスト
#[derive(Debug, Deserialize)]
pub struct SetIdentityActiveRequest {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    pub is_active:    bool,
}

/// 削除クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct RequesterQuery {
    pub requester_id: Uuid,
    pub is_admin:     bool,
}

/// アイデンティティ DTO
#[derive(Debug, Serialize)]
pub struct IdentityDto {
    pub id:            Uuid,
    pub display_name:  String,
    pub email_address: String,
    pub is_active:     bool,
    pub created_at:    String,
}

impl From<SenderIdentity> for IdentityDto {
    fn from(identity: SenderIdentity) -> Self {
        Self {
            id:            *identity.id().as_uuid(),
            display_name:  identity.display_name().as_str().to_string(),
            email_address: identity.email_address().as_str().to_string(),
            is_active:     identity.is_active(),
            created_at:    identity.created_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// GET /api/identities
///
/// `view=available` ならリクエスタが送信に使用できるアイデンティティを、
/// それ以外なら全アイデンティティ（管理者のみ）を返す。
pub async fn list_identities(
    State(state): State<Arc<IdentityState>>,
    Query(query): Query<ListIdentitiesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  mailgate_domain::user::UserId::from_uuid(query.requester_id),
        is_admin: query.is_admin,
    };

    let identities = if query.view.as_deref() == Some("available") {
        state.usecase.list_available(&requester).await?
    } else {
        state.usecase.list_all(&requester).await?
    };

    let items: Vec<IdentityDto> = identities.into_iter().map(IdentityDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/identities
///
/// ## レスポンス
///
/// - `201 Created`: 作成されたアイデンティティ
/// - `400 Bad Request`: 表示名・アドレスの検証失敗
/// - `403 Forbidden`: 管理者でない
pub async fn create_identity(
    State(state): State<Arc<IdentityState>>,
    Json(req): Json<CreateIdentityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  mailgate_domain::user::UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };

    let identity = state
        .usecase
        .create(
            &requester,
            CreateIdentityInput {
                display_name:  req.display_name,
                email_address: req.email_address,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(IdentityDto::from(identity))),
    ))
}

/// PATCH /api/identities/{id}/active
pub async fn set_identity_active(
    State(state): State<Arc<IdentityState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetIdentityActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  mailgate_domain::user::UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };

    let identity = state
        .usecase
        .set_active(&requester, &SenderIdentityId::from_uuid(id), req.is_active)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(IdentityDto::from(identity))),
    ))
}

/// DELETE /api/identities/{id}
///
/// ## レスポンス
///
/// - `204 No Content`: 削除成功
/// - `404 Not Found`: アイデンティティが見つからない
/// - `409 Conflict`: 送信ログが参照している
pub async fn delete_identity(
    State(state): State<Arc<IdentityState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RequesterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  mailgate_domain::user::UserId::from_uuid(query.requester_id),
        is_admin: query.is_admin,
    };

    state
        .usecase
        .delete(&requester, &SenderIdentityId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
