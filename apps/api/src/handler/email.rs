//! # 送信ハンドラ
//!
//! コンポーズフォームからの送信リクエストと送信履歴を提供する。
//!
//! ## エンドポイント
//!
//! - `POST /api/emails/send` - メール送信（送信ワークフローの入口）
//! - `GET /api/emails/logs` - 送信履歴（管理者は全件、一般ユーザーは自分の分のみ）
//!
//! ## 送信結果エンベロープ
//!
//! `POST /api/emails/send` のレスポンスは `{success, message?, error?}`。
//! 入力エラー・認可拒否・配送失敗はコンポーズフォームの正常な否定結果として
//! この形で返す（HTTP 200）。ログ永続化フォールトのみ 500 の
//! Problem Details になる（監査保証の破れはシステムエラー）。

use std::sync::Arc;

use axum::{Json, extract::{Query, State}};
use mailgate_domain::{
    identity::SenderIdentityId,
    mail::{Attachment, parse_address_list},
    send_log::EmailLog,
    user::UserId,
};
use mailgate_infra::repository::EmailLogRepository;
use mailgate_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    usecase::{SendEmailInput, SendEmailUseCaseImpl, SendOutcome},
};

/// 送信履歴のデフォルト取得件数
const DEFAULT_LOG_LIMIT: i64 = 50;

/// 送信 API の共有状態
pub struct EmailState {
    pub send_usecase:         SendEmailUseCaseImpl,
    pub email_log_repository: Arc<dyn EmailLogRepository>,
}

// --- リクエスト/レスポンス型 ---

/// 添付ファイル DTO
#[derive(Debug, Deserialize)]
pub struct AttachmentDto {
    pub filename:     String,
    pub content:      Vec<u8>,
    pub content_type: Option<String>,
}

/// 送信リクエスト
///
/// `to` / `cc` / `bcc` はカンマ区切り文字列。境界でトークンに分解し、
/// trim して空トークンを捨てる。
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub requester_id:       Uuid,
    pub is_admin:           bool,
    pub sender_identity_id: Uuid,
    pub to:                 String,
    pub cc:                 Option<String>,
    pub bcc:                Option<String>,
    pub subject:            String,
    pub html:               String,
    #[serde(default)]
    pub attachments:        Vec<AttachmentDto>,
}

/// 送信結果エンベロープ
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendEmailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:   Option<String>,
}

impl SendEmailResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error:   None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error:   Some(error.into()),
        }
    }
}

/// 送信履歴クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct EmailLogQuery {
    pub requester_id: Uuid,
    pub is_admin:     bool,
    pub limit:        Option<i64>,
}

/// 送信ログ DTO
#[derive(Debug, Serialize)]
pub struct EmailLogDto {
    pub id:                 Uuid,
    pub user_id:            Uuid,
    pub sender_identity_id: Uuid,
    pub recipients:         Vec<String>,
    pub subject:            String,
    pub content_hash:       String,
    pub delivery_status:    String,
    pub error_message:      Option<String>,
    pub sent_at:            String,
}

impl From<EmailLog> for EmailLogDto {
    fn from(log: EmailLog) -> Self {
        Self {
            id:                 *log.id().as_uuid(),
            user_id:            *log.user_id().as_uuid(),
            sender_identity_id: *log.sender_identity_id().as_uuid(),
            recipients:         log.recipients().to_vec(),
            subject:            log.subject().to_string(),
            content_hash:       log.content_hash().as_str().to_string(),
            delivery_status:    log.delivery_status().to_string(),
            error_message:      log.error_message().map(str::to_string),
            sent_at:            log.sent_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// POST /api/emails/send
///
/// 送信ワークフローを実行し、結果エンベロープを返す。
///
/// ## レスポンス
///
/// - `200 OK` + `{success: true, message}`: 送信成功
/// - `200 OK` + `{success: false, error}`: 入力エラー / 認可拒否 / 配送失敗
/// - `500 Internal Server Error`: ログ永続化フォールト等のシステムエラー
pub async fn send_email(
    State(state): State<Arc<EmailState>>,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let input = SendEmailInput {
        user_id:            UserId::from_uuid(req.requester_id),
        is_admin:           req.is_admin,
        sender_identity_id: SenderIdentityId::from_uuid(req.sender_identity_id),
        to:                 parse_address_list(&req.to),
        cc:                 req.cc.as_deref().map(parse_address_list).unwrap_or_default(),
        bcc:                req.bcc.as_deref().map(parse_address_list).unwrap_or_default(),
        subject:            req.subject,
        html:               req.html,
        attachments:        req
            .attachments
            .into_iter()
            .map(|a| Attachment {
                filename:     a.filename,
                content:      a.content,
                content_type: a
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            })
            .collect(),
    };

    match state.send_usecase.send(input).await {
        Ok(SendOutcome::Sent { .. }) => {
            Ok(Json(SendEmailResponse::success("Email sent successfully")))
        }
        Ok(SendOutcome::DeliveryFailed { error }) => Ok(Json(SendEmailResponse::failure(error))),
        // 入力エラーと認可拒否はコンポーズフォームの否定結果として返す
        Err(
            ApiError::BadRequest(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message),
        ) => Ok(Json(SendEmailResponse::failure(message))),
        // 永続化フォールト等は Problem Details（500）として伝播する
        Err(error) => Err(error),
    }
}

/// GET /api/emails/logs
///
/// 送信履歴を新しい順で取得する。管理者は全件、一般ユーザーは
/// 自分の送信分のみ。
pub async fn list_email_logs(
    State(state): State<Arc<EmailState>>,
    Query(query): Query<EmailLogQuery>,
) -> Result<Json<ApiResponse<Vec<EmailLogDto>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);

    let logs = if query.is_admin {
        state.email_log_repository.find_recent(limit).await?
    } else {
        state
            .email_log_repository
            .find_recent_by_user(&UserId::from_uuid(query.requester_id), limit)
            .await?
    };

    let items: Vec<EmailLogDto> = logs.into_iter().map(EmailLogDto::from).collect();
    Ok(Json(ApiResponse::new(items)))
}
