//! # メールテンプレートハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/templates` - 一覧（全認証ユーザー）
//! - `GET /api/templates/{id}` - 詳細（全認証ユーザー）
//! - `POST /api/templates` - 作成（管理者）
//! - `PATCH /api/templates/{id}` - 更新（管理者）
//! - `DELETE /api/templates/{id}` - 削除（管理者）

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use mailgate_domain::{template::{EmailTemplate, EmailTemplateId}, user::UserId};
use mailgate_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    usecase::{Requester, TemplateUseCaseImpl, template::TemplateContentInput},
};

/// テンプレート API の共有状態
pub struct TemplateState {
    pub usecase: TemplateUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// リクエスタクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct RequesterQuery {
    pub requester_id: Uuid,
    pub is_admin:     bool,
}

/// テンプレート作成・更新リクエスト
#[derive(Debug, Deserialize)]
pub struct TemplateContentRequest {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    pub name:         String,
    pub description:  Option<String>,
    pub html_content: String,
}

/// テンプレート DTO
#[derive(Debug, Serialize)]
pub struct TemplateDto {
    pub id:           Uuid,
    pub name:         String,
    pub description:  Option<String>,
    pub html_content: String,
    pub created_by:   Uuid,
    pub created_at:   String,
    pub updated_at:   String,
}

impl From<EmailTemplate> for TemplateDto {
    fn from(template: EmailTemplate) -> Self {
        Self {
            id:           *template.id().as_uuid(),
            name:         template.name().as_str().to_string(),
            description:  template.description().map(str::to_string),
            html_content: template.html_content().to_string(),
            created_by:   *template.created_by().as_uuid(),
            created_at:   template.created_at().to_rfc3339(),
            updated_at:   template.updated_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// GET /api/templates
pub async fn list_templates(
    State(state): State<Arc<TemplateState>>,
) -> Result<impl IntoResponse, ApiError> {
    let templates = state.usecase.list().await?;
    let items: Vec<TemplateDto> = templates.into_iter().map(TemplateDto::from).collect();

    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /api/templates/{id}
pub async fn get_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let template = state.usecase.get(&EmailTemplateId::from_uuid(id)).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(TemplateDto::from(template))),
    ))
}

/// POST /api/templates
///
/// ## レスポンス
///
/// - `201 Created`: 作成されたテンプレート
/// - `400 Bad Request`: 名前または本文が空
/// - `403 Forbidden`: 管理者でない
pub async fn create_template(
    State(state): State<Arc<TemplateState>>,
    Json(req): Json<TemplateContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };

    let template = state
        .usecase
        .create(
            &requester,
            TemplateContentInput {
                name:         req.name,
                description:  req.description,
                html_content: req.html_content,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(TemplateDto::from(template))),
    ))
}

/// PATCH /api/templates/{id}
pub async fn update_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TemplateContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(req.requester_id),
        is_admin: req.is_admin,
    };

    let template = state
        .usecase
        .update(
            &requester,
            &EmailTemplateId::from_uuid(id),
            TemplateContentInput {
                name:         req.name,
                description:  req.description,
                html_content: req.html_content,
            },
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(TemplateDto::from(template))),
    ))
}

/// DELETE /api/templates/{id}
pub async fn delete_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RequesterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = Requester {
        user_id:  UserId::from_uuid(query.requester_id),
        is_admin: query.is_admin,
    };

    state
        .usecase
        .delete(&requester, &EmailTemplateId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
