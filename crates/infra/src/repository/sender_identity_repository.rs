//! # SenderIdentityRepository
//!
//! 送信者アイデンティティの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **不変フィールド**: 更新操作は `is_active` トグルのみ
//! - **ハード削除**: 許可行は FK の ON DELETE CASCADE で連鎖削除される。
//!   送信ログが参照しているアイデンティティの削除可否はユースケース層が判断する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailgate_domain::{
    identity::{DisplayName, SenderIdentity, SenderIdentityId},
    user::Email,
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::InfraError;

/// 送信者アイデンティティリポジトリトレイト
#[async_trait]
pub trait SenderIdentityRepository: Send + Sync {
    /// アイデンティティを挿入する
    async fn insert(&self, identity: &SenderIdentity) -> Result<(), InfraError>;

    /// ID でアイデンティティを検索する
    async fn find_by_id(
        &self,
        id: &SenderIdentityId,
    ) -> Result<Option<SenderIdentity>, InfraError>;

    /// 全アイデンティティを作成順で取得する（管理画面向け）
    async fn find_all(&self) -> Result<Vec<SenderIdentity>, InfraError>;

    /// アクティブなアイデンティティのみ取得する（コンポーズ画面向け）
    async fn find_all_active(&self) -> Result<Vec<SenderIdentity>, InfraError>;

    /// アクティブ状態を変更する
    async fn set_active(
        &self,
        id: &SenderIdentityId,
        is_active: bool,
    ) -> Result<(), InfraError>;

    /// アイデンティティを削除する
    ///
    /// 許可行は FK で連鎖削除される。送信ログ参照の有無は呼び出し元が
    /// 事前に確認する。
    async fn delete(&self, id: &SenderIdentityId) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の SenderIdentityRepository
#[derive(Debug, Clone)]
pub struct PostgresSenderIdentityRepository {
    pool: PgPool,
}

impl PostgresSenderIdentityRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 行をドメインエンティティに変換する
fn row_to_identity(row: &PgRow) -> Result<SenderIdentity, InfraError> {
    Ok(SenderIdentity::from_db(
        SenderIdentityId::from_uuid(row.try_get("id")?),
        DisplayName::new(row.try_get::<String, _>("display_name")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        Email::new(row.try_get::<String, _>("email_address")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        row.try_get("is_active")?,
        row.try_get::<DateTime<Utc>, _>("created_at")?,
    ))
}

#[async_trait]
impl SenderIdentityRepository for PostgresSenderIdentityRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, identity: &SenderIdentity) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO sender_identities (id, display_name, email_address, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(identity.id().as_uuid())
        .bind(identity.display_name().as_str())
        .bind(identity.email_address().as_str())
        .bind(identity.is_active())
        .bind(identity.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_id(
        &self,
        id: &SenderIdentityId,
    ) -> Result<Option<SenderIdentity>, InfraError> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, email_address, is_active, created_at
            FROM sender_identities
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_identity).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<SenderIdentity>, InfraError> {
        let rows = sqlx::query(
            r#"
            SELECT id, display_name, email_address, is_active, created_at
            FROM sender_identities
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_identity).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all_active(&self) -> Result<Vec<SenderIdentity>, InfraError> {
        let rows = sqlx::query(
            r#"
            SELECT id, display_name, email_address, is_active, created_at
            FROM sender_identities
            WHERE is_active = TRUE
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_identity).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn set_active(
        &self,
        id: &SenderIdentityId,
        is_active: bool,
    ) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE sender_identities
            SET is_active = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn delete(&self, id: &SenderIdentityId) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            DELETE FROM sender_identities
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresSenderIdentityRepository>();
    }
}
