//! # ユーザーハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/users` - ユーザー一覧（管理者）
//! - `POST /api/users` - ユーザー招待（管理者）
//! - `PATCH /api/users/{id}/role` - ロール変更（管理者、自己降格は拒否）
//! - `PATCH /api/users/{id}/status` - ステータス変更（管理者、自己無効化は拒否）

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use mailgate_domain::user::{User, UserId, UserRole, UserStatus};
use mailgate_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    usecase::{Requester, UserUseCaseImpl, user::InviteUserInput},
};

/// ユーザー API の共有状態
pub struct UserState {
    pub usecase: UserUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// リクエスタクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct RequesterQuery {
    pub requester_id: Uuid,
    pub is_admin:     bool,
}

/// ユーザー招待リクエスト
#[derive(Debug, Deserialize)]
pub struct InviteUserRequest {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    pub email:        String,
    pub name:         Option<String>,
    /// 省略時は `user`
    pub role:         Option<String>,
}

/// ロール変更リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    pub role:         String,
}

/// ステータス変更リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    pub status:       String,
}

/// ユーザー DTO
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id:         Uuid,
    pub name:       Option<String>,
    pub email:      String,
    pub role:       String,
    pub status:     String,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id:         *user.id().as_uuid(),
            name:       user.name().map(|n| n.as_str().to_string()),
            email:      user.email().as_str().to_string(),
            role:       user.role().to_string(),
            status:     user.status().to_string(),
            created_at: user.created_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<UserState>>,
    Query(query): Query<RequesterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(query.requester_id),
        is_admin: query.is_admin,
    };

    let users = state.usecase.list(&requester).await?;
    let items: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();

    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/users
///
/// ## レスポンス
///
/// - `201 Created`: 招待されたユーザー
/// - `409 Conflict`: メールアドレスが既に登録済み
pub async fn invite_user(
    State(state): State<Arc<UserState>>,
    Json(req): Json<InviteUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };

    let role = match req.role.as_deref() {
        Some(value) => UserRole::from_str(value)?,
        None => UserRole::User,
    };

    let user = state
        .usecase
        .invite(
            &requester,
            InviteUserInput {
                email: req.email,
                name: req.name,
                role,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserDto::from(user))),
    ))
}

/// PATCH /api/users/{id}/role
///
/// ## レスポンス
///
/// - `200 OK`: 変更後のユーザー
/// - `400 Bad Request`: 自分自身の降格、不正なロール値
/// - `404 Not Found`: ユーザーが見つからない
pub async fn update_user_role(
    State(state): State<Arc<UserState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };
    let role = UserRole::from_str(&req.role)?;

    let user = state
        .usecase
        .update_role(&requester, &UserId::from_uuid(id), role)
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from(user)))))
}

/// PATCH /api/users/{id}/status
///
/// ## レスポンス
///
/// - `200 OK`: 変更後のユーザー
/// - `400 Bad Request`: 自分自身の無効化、不正なステータス値
/// - `404 Not Found`: ユーザーが見つからない
pub async fn update_user_status(
    State(state): State<Arc<UserState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };
    let status = UserStatus::from_str(&req.status)?;

    let user = state
        .usecase
        .update_status(&requester, &UserId::from_uuid(id), status)
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from(user)))))
}
