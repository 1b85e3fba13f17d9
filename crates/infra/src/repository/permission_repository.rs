//! # PermissionRepository
//!
//! ユーザー × 送信者アイデンティティの許可（多対多）を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **存在が許可**: 行の存在 = 許可あり。認可解決は存在のみを見る
//! - **check-then-insert**: 付与は事前確認してから挿入する。同時実行の
//!   狭い TOCTOU 窓で重複行が生まれうるが、認可の正しさには影響しない
//!   （ストレージの浪費のみ）。取り消しは一致する行をすべて削除する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailgate_domain::{identity::SenderIdentityId, user::UserId};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::InfraError;

/// 許可リポジトリトレイト
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// 許可行が存在するか確認する
    async fn exists(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<bool, InfraError>;

    /// 許可を付与する（check-then-insert）
    ///
    /// 既に許可行が存在する場合は何もしない。
    async fn grant(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError>;

    /// 許可を取り消す
    ///
    /// 重複行が存在する場合もすべて削除する。
    async fn revoke(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<(), InfraError>;

    /// ユーザーが許可を持つアイデンティティ ID の一覧を取得する
    async fn find_identity_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SenderIdentityId>, InfraError>;
}

/// PostgreSQL 実装の PermissionRepository
#[derive(Debug, Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn exists(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<bool, InfraError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_sender_permissions
                WHERE user_id = $1 AND sender_identity_id = $2
            ) AS present
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(sender_identity_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("present")?)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn grant(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        // check-then-insert: 一意制約は張らず、重複は許容する
        if self.exists(user_id, sender_identity_id).await? {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO user_sender_permissions (id, user_id, sender_identity_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id.as_uuid())
        .bind(sender_identity_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn revoke(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            DELETE FROM user_sender_permissions
            WHERE user_id = $1 AND sender_identity_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(sender_identity_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_identity_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SenderIdentityId>, InfraError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT sender_identity_id
            FROM user_sender_permissions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SenderIdentityId::from_uuid(
                    row.try_get("sender_identity_id")?,
                ))
            })
            .collect()
    }
}
