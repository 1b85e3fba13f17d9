//! # EmailLogRepository
//!
//! 送信ログの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **append-only**: 挿入と参照のみを提供し、更新・削除は存在しない
//! - **成功・失敗の両方を記録**: 配送ゲートウェイに到達した試行はすべて対象
//! - **jsonb の宛先リスト**: `recipients` は文字列配列を jsonb で保持する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailgate_domain::{
    identity::SenderIdentityId,
    send_log::{ContentHash, DeliveryStatus, EmailLog, EmailLogId},
    user::UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use crate::error::InfraError;

/// 送信ログリポジトリトレイト
#[async_trait]
pub trait EmailLogRepository: Send + Sync {
    /// 送信ログを挿入する
    async fn insert(&self, log: &EmailLog) -> Result<(), InfraError>;

    /// 新しい順にログを取得する（履歴画面向け）
    async fn find_recent(&self, limit: i64) -> Result<Vec<EmailLog>, InfraError>;

    /// 特定ユーザーのログを新しい順に取得する
    async fn find_recent_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<EmailLog>, InfraError>;

    /// アイデンティティを参照するログの件数を取得する
    ///
    /// アイデンティティ削除の可否判断（参照が残る限り削除をブロック）に使用する。
    async fn count_for_identity(
        &self,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<i64, InfraError>;
}

/// PostgreSQL 実装の EmailLogRepository
#[derive(Debug, Clone)]
pub struct PostgresEmailLogRepository {
    pool: PgPool,
}

impl PostgresEmailLogRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 行をドメインエンティティに変換する
fn row_to_log(row: &PgRow) -> Result<EmailLog, InfraError> {
    let recipients: Vec<String> =
        serde_json::from_value(row.try_get::<serde_json::Value, _>("recipients")?)?;

    Ok(EmailLog::from_db(
        EmailLogId::from_uuid(row.try_get("id")?),
        UserId::from_uuid(row.try_get("user_id")?),
        SenderIdentityId::from_uuid(row.try_get("sender_identity_id")?),
        recipients,
        row.try_get("subject")?,
        ContentHash::from_hex(row.try_get::<String, _>("html_content_hash")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        DeliveryStatus::from_str(row.try_get::<String, _>("delivery_status")?.as_str())
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        row.try_get("error_message")?,
        row.try_get::<DateTime<Utc>, _>("sent_at")?,
    ))
}

#[async_trait]
impl EmailLogRepository for PostgresEmailLogRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, log: &EmailLog) -> Result<(), InfraError> {
        let recipients = serde_json::to_value(log.recipients())?;

        sqlx::query(
            r#"
            INSERT INTO email_logs (
                id, user_id, sender_identity_id, recipients,
                subject, html_content_hash, delivery_status, error_message, sent_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id().as_uuid())
        .bind(log.user_id().as_uuid())
        .bind(log.sender_identity_id().as_uuid())
        .bind(recipients)
        .bind(log.subject())
        .bind(log.content_hash().as_str())
        .bind(log.delivery_status().to_string())
        .bind(log.error_message())
        .bind(log.sent_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_recent(&self, limit: i64) -> Result<Vec<EmailLog>, InfraError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, sender_identity_id, recipients,
                   subject, html_content_hash, delivery_status, error_message, sent_at
            FROM email_logs
            ORDER BY sent_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_log).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_recent_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<EmailLog>, InfraError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, sender_identity_id, recipients,
                   subject, html_content_hash, delivery_status, error_message, sent_at
            FROM email_logs
            WHERE user_id = $1
            ORDER BY sent_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_log).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn count_for_identity(
        &self,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<i64, InfraError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS log_count
            FROM email_logs
            WHERE sender_identity_id = $1
            "#,
        )
        .bind(sender_identity_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("log_count")?)
    }
}
