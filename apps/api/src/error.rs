//! # API エラー定義
//!
//! API 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! ## エラー分類（送信ワークフローの観点）
//!
//! | 分類 | バリアント | 扱い |
//! |------|-----------|------|
//! | 入力エラー | `BadRequest` | 認可前に拒否。送信ログは書かない |
//! | 認可エラー | `NotFound` / `Forbidden` | 認可解決後に拒否。送信ログは書かない |
//! | 永続化フォールト | `Database` / `Internal` | 監査保証が破れるため 500 として伝播 |
//!
//! 配送失敗はエラーではなく正常な否定結果（`SendOutcome::DeliveryFailed`）
//! であり、この型には現れない。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mailgate_domain::DomainError;
use mailgate_shared::ErrorResponse;
use thiserror::Error;

/// API で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// リソースが見つからない
    #[error("{0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("{0}")]
    BadRequest(String),

    /// 権限不足
    #[error("{0}")]
    Forbidden(String),

    /// 競合（重複登録、削除ブロックなど）
    #[error("{0}")]
    Conflict(String),

    /// データベースエラー
    #[error("database error: {0}")]
    Database(#[from] mailgate_infra::InfraError),

    /// 内部エラー
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(msg) => Self::BadRequest(msg),
            DomainError::NotFound { .. } => Self::NotFound(error.to_string()),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::not_found(msg)),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse::forbidden(msg)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::conflict(msg)),
            ApiError::Database(e) => {
                tracing::error!(error = %e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
