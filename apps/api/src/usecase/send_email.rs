//! # 送信ワークフロー
//!
//! 認可解決 → エンベロープ構築 → 配送 → ログ記録を 1 つの論理的な
//! トランザクション境界として統合するユースケース。
//!
//! ## 状態遷移
//!
//! ```text
//! Received → Authorizing → (Denied | Delivering) → Logging → Completed
//! ```
//!
//! ## 設計方針
//!
//! - **入力エラーは認可前に弾く**: 構造検証の違反は送信試行ではない。
//!   認可・配送・ログのいずれにも触れずに拒否する
//! - **認可拒否はログを書かない**: 拒否は no-op であり送信試行ではない。
//!   ログ対象はトランスポートに到達した試行のみ
//! - **配送失敗は正常系**: `failed` としてログに記録し、否定結果として
//!   呼び出し元に返す（エラーとして伝播しない）
//! - **ログ永続化の失敗はフォールト**: 「すべての試行が記録される」という
//!   監査保証が破れるため、配送失敗と区別してエラーとして伝播する

use std::sync::Arc;

use mailgate_domain::{
    clock::Clock,
    identity::{SenderIdentity, SenderIdentityId},
    mail::{Attachment, MailerError, OutboundEmail},
    send_log::{DeliveryStatus, EmailLog},
    user::UserId,
};
use mailgate_infra::{
    mailer::Mailer,
    repository::{EmailLogRepository, PermissionRepository, SenderIdentityRepository},
};
use mailgate_shared::{event_log::event, log_business_event};

use crate::error::ApiError;

/// 送信リクエストの入力
///
/// 宛先リストは境界（ハンドラ）でカンマ区切り文字列から分解済み。
pub struct SendEmailInput {
    pub user_id:            UserId,
    pub is_admin:           bool,
    pub sender_identity_id: SenderIdentityId,
    pub to:                 Vec<String>,
    pub cc:                 Vec<String>,
    pub bcc:                Vec<String>,
    pub subject:            String,
    pub html:               String,
    pub attachments:        Vec<Attachment>,
}

/// 送信ワークフローの終端結果
///
/// 配送失敗（トランスポートの拒否・タイムアウト）はエラーではなく
/// この型の `DeliveryFailed` として返る。入力エラー・認可拒否・
/// 永続化フォールトは `ApiError` として返る（この型には現れない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// トランスポートがメッセージを受理した
    Sent { message_id: String },
    /// トランスポートが拒否した（ログには `failed` で記録済み）
    DeliveryFailed { error: String },
}

/// 送信ワークフローユースケース
pub struct SendEmailUseCaseImpl {
    identity_repository:   Arc<dyn SenderIdentityRepository>,
    permission_repository: Arc<dyn PermissionRepository>,
    email_log_repository:  Arc<dyn EmailLogRepository>,
    mailer:                Arc<dyn Mailer>,
    clock:                 Arc<dyn Clock>,
}

impl SendEmailUseCaseImpl {
    pub fn new(
        identity_repository: Arc<dyn SenderIdentityRepository>,
        permission_repository: Arc<dyn PermissionRepository>,
        email_log_repository: Arc<dyn EmailLogRepository>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity_repository,
            permission_repository,
            email_log_repository,
            mailer,
            clock,
        }
    }

    /// メールを送信する
    ///
    /// 1. 構造検証（Received）
    /// 2. 認可解決（Authorizing）
    /// 3. 配送（Delivering）
    /// 4. ログ記録（Logging、配送結果に関わらず必ず実行）
    /// 5. 結果返却（Completed）
    pub async fn send(&self, input: SendEmailInput) -> Result<SendOutcome, ApiError> {
        // Received: 構造検証。違反は呼び出し元の入力エラーであり、
        // 認可・配送・ログのいずれにも触れずに拒否する
        if input.to.is_empty() {
            return Err(ApiError::BadRequest(
                "At least one recipient is required".to_string(),
            ));
        }
        if input.subject.trim().is_empty() {
            return Err(ApiError::BadRequest("Subject is required".to_string()));
        }
        if input.html.trim().is_empty() {
            return Err(ApiError::BadRequest("Email body is required".to_string()));
        }

        // Authorizing: 拒否は no-op（ログを書かない）
        let identity = self
            .authorize(&input.user_id, input.is_admin, &input.sender_identity_id)
            .await?;

        // Delivering: エンベロープを構築してトランスポートを呼び出す
        let email = OutboundEmail::build(
            &identity,
            input.to.clone(),
            input.cc,
            input.bcc,
            input.subject.clone(),
            input.html.clone(),
            input.attachments,
        );

        let delivery = match self.mailer.send(&email).await {
            Ok(message_id) => Ok(message_id),
            // トランスポート失敗は想定内の結果。ログ記録に進む
            Err(MailerError::SendFailed(message)) => Err(message),
            // エンベロープ不正はトランスポート未到達のフォールト。
            // 送信試行ではないためログは書かず、そのまま伝播する
            Err(fault @ MailerError::InvalidEnvelope(_)) => {
                return Err(ApiError::Internal(fault.to_string()));
            }
        };

        // Logging: 成功・失敗を問わず必ず 1 件記録する。
        // ここの失敗は監査保証の破れであり、配送失敗と区別して伝播する
        let (status, error_message) = match &delivery {
            Ok(_) => (DeliveryStatus::Sent, None),
            Err(message) => (DeliveryStatus::Failed, Some(message.clone())),
        };
        let log = EmailLog::record(
            input.user_id.clone(),
            input.sender_identity_id.clone(),
            input.to,
            input.subject,
            &input.html,
            status,
            error_message,
            self.clock.now(),
        );
        self.email_log_repository.insert(&log).await?;

        // Completed
        match delivery {
            Ok(message_id) => {
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_SENT,
                    event.entity_type = event::entity_type::EMAIL_LOG,
                    event.entity_id = %log.id(),
                    event.actor_id = %input.user_id,
                    event.result = event::result::SUCCESS,
                    email.sender_identity_id = %input.sender_identity_id,
                    email.recipient_count = log.recipients().len(),
                    "メール送信成功"
                );
                Ok(SendOutcome::Sent { message_id })
            }
            Err(error) => {
                log_business_event!(
                    event.category = event::category::EMAIL,
                    event.action = event::action::EMAIL_FAILED,
                    event.entity_type = event::entity_type::EMAIL_LOG,
                    event.entity_id = %log.id(),
                    event.actor_id = %input.user_id,
                    event.result = event::result::FAILURE,
                    email.sender_identity_id = %input.sender_identity_id,
                    error = %error,
                    "メール送信失敗"
                );
                Ok(SendOutcome::DeliveryFailed { error })
            }
        }
    }

    /// 認可を解決する
    ///
    /// - アイデンティティ不在 → `NotFound`
    /// - 管理者: アクティブなら許可、非アクティブなら `Inactive` 拒否
    ///   （許可テーブルは参照しない）
    /// - 一般ユーザー: 許可行なし → `Unauthorized` 拒否（アクティブ状態に
    ///   関わらず）。許可行あり + 非アクティブ → `Inactive` 拒否
    ///
    /// 副作用なし（純粋な読み取り）。
    async fn authorize(
        &self,
        user_id: &UserId,
        is_admin: bool,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<SenderIdentity, ApiError> {
        let Some(identity) = self
            .identity_repository
            .find_by_id(sender_identity_id)
            .await?
        else {
            return Err(ApiError::NotFound("Sender identity not found.".to_string()));
        };

        if is_admin {
            if !identity.is_active() {
                return Err(ApiError::Forbidden(
                    "Sender identity is inactive.".to_string(),
                ));
            }
            return Ok(identity);
        }

        let has_grant = self
            .permission_repository
            .exists(user_id, sender_identity_id)
            .await?;
        if !has_grant {
            return Err(ApiError::Forbidden(
                "Unauthorized: You do not have permission to use this sender identity."
                    .to_string(),
            ));
        }
        if !identity.is_active() {
            return Err(ApiError::Forbidden(
                "Sender identity is inactive.".to_string(),
            ));
        }

        Ok(identity)
    }
}
