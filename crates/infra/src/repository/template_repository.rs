//! # TemplateRepository
//!
//! メールテンプレートの永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailgate_domain::{
    template::{EmailTemplate, EmailTemplateId, TemplateName},
    user::UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::InfraError;

/// テンプレートリポジトリトレイト
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// テンプレートを挿入する
    async fn insert(&self, template: &EmailTemplate) -> Result<(), InfraError>;

    /// ID でテンプレートを検索する
    async fn find_by_id(
        &self,
        id: &EmailTemplateId,
    ) -> Result<Option<EmailTemplate>, InfraError>;

    /// 全テンプレートを新しい順で取得する
    async fn find_all(&self) -> Result<Vec<EmailTemplate>, InfraError>;

    /// テンプレートの内容を更新する
    async fn update(&self, template: &EmailTemplate) -> Result<(), InfraError>;

    /// テンプレートを削除する
    async fn delete(&self, id: &EmailTemplateId) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の TemplateRepository
#[derive(Debug, Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 行をドメインエンティティに変換する
fn row_to_template(row: &PgRow) -> Result<EmailTemplate, InfraError> {
    Ok(EmailTemplate::from_db(
        EmailTemplateId::from_uuid(row.try_get("id")?),
        TemplateName::new(row.try_get::<String, _>("name")?)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
        row.try_get("description")?,
        row.try_get("html_content")?,
        UserId::from_uuid(row.try_get("created_by")?),
        row.try_get::<DateTime<Utc>, _>("created_at")?,
        row.try_get::<DateTime<Utc>, _>("updated_at")?,
    ))
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO email_templates (
                id, name, description, html_content, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(template.id().as_uuid())
        .bind(template.name().as_str())
        .bind(template.description())
        .bind(template.html_content())
        .bind(template.created_by().as_uuid())
        .bind(template.created_at())
        .bind(template.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_id(
        &self,
        id: &EmailTemplateId,
    ) -> Result<Option<EmailTemplate>, InfraError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, html_content, created_by, created_at, updated_at
            FROM email_templates
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_template).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<EmailTemplate>, InfraError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, html_content, created_by, created_at, updated_at
            FROM email_templates
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_template).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn update(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE email_templates
            SET name = $2, description = $3, html_content = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(template.id().as_uuid())
        .bind(template.name().as_str())
        .bind(template.description())
        .bind(template.html_content())
        .bind(template.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn delete(&self, id: &EmailTemplateId) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            DELETE FROM email_templates
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
        assert_send_sync::<PostgresTemplateRepository>();
    }
}
