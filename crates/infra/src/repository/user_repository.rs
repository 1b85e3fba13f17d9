//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **メールアドレス一意**: `users.email` の一意制約を前提とし、
//!   重複チェックはユースケース層で事前に行う
//! - **型安全な復元**: 保存された role / status 文字列はドメイン enum に
//!   パースし、不正値は `Unexpected` エラーにする

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailgate_domain::user::{Email, User, UserId, UserName, UserRole, UserStatus};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::InfraError;

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを挿入する
    async fn insert(&self, user: &User) -> Result<(), InfraError>;

    /// ID でユーザーを検索する
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

    /// メールアドレスでユーザーを検索する
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;

    /// 全ユーザーを作成順で取得する（管理画面向け）
    async fn find_all(&self) -> Result<Vec<User>, InfraError>;

    /// ロールを更新する
    async fn update_role(&self, id: &UserId, role: UserRole) -> Result<(), InfraError>;

    /// ステータスを更新する
    async fn update_status(&self, id: &UserId, status: UserStatus) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 行をドメインエンティティに変換する
fn row_to_user(row: &PgRow) -> Result<User, InfraError> {
    let name = row
        .try_get::<Option<String>, _>("name")?
        .map(UserName::new)
        .transpose()
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    Ok(User::from_db(
        UserId::from_uuid(row.try_get("id")?),
        name,
        Email::new(row.try_get::<String, _>("email")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        UserRole::from_str(row.try_get::<String, _>("role")?.as_str())
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        UserStatus::from_str(row.try_get::<String, _>("status")?.as_str())
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        row.try_get::<DateTime<Utc>, _>("created_at")?,
    ))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, user: &User) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.name().map(|n| n.as_str()))
        .bind(user.email().as_str())
        .bind(user.role().to_string())
        .bind(user.status().to_string())
        .bind(user.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, role, status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, role, status, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<User>, InfraError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, role, status, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn update_role(&self, id: &UserId, role: UserRole) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE users
            SET role = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(role.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn update_status(&self, id: &UserId, status: UserStatus) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE users
            SET status = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
