//! # メールテンプレート管理ユースケース
//!
//! ## 設計方針
//!
//! - 閲覧（一覧・取得）は全認証ユーザー。テンプレートはコンポーズ画面の
//!   本文供給源のため、一般ユーザーにも読み取りを開放する
//! - 作成・更新・削除は管理者のみ

use std::sync::Arc;

use mailgate_domain::{
    clock::Clock,
    template::{EmailTemplate, EmailTemplateId, TemplateName},
};
use mailgate_infra::repository::TemplateRepository;
use mailgate_shared::{event_log::event, log_business_event};

use super::Requester;
use crate::error::ApiError;

/// テンプレート作成・更新の入力
pub struct TemplateContentInput {
    pub name:         String,
    pub description:  Option<String>,
    pub html_content: String,
}

/// メールテンプレート管理ユースケース
pub struct TemplateUseCaseImpl {
    template_repository: Arc<dyn TemplateRepository>,
    clock:               Arc<dyn Clock>,
}

impl TemplateUseCaseImpl {
    pub fn new(template_repository: Arc<dyn TemplateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            template_repository,
            clock,
        }
    }

    /// 全テンプレートを取得する（全認証ユーザー）
    pub async fn list(&self) -> Result<Vec<EmailTemplate>, ApiError> {
        Ok(self.template_repository.find_all().await?)
    }

    /// テンプレートを取得する（全認証ユーザー）
    pub async fn get(&self, id: &EmailTemplateId) -> Result<EmailTemplate, ApiError> {
        self.template_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))
    }

    /// テンプレートを作成する
    pub async fn create(
        &self,
        requester: &Requester,
        input: TemplateContentInput,
    ) -> Result<EmailTemplate, ApiError> {
        requester.require_admin()?;

        let (name, html_content) = validate_content(&input)?;

        let template = EmailTemplate::new(
            EmailTemplateId::new(),
            name,
            input.description,
            html_content,
            requester.user_id.clone(),
            self.clock.now(),
        );
        self.template_repository.insert(&template).await?;

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_CREATED,
            event.entity_type = event::entity_type::EMAIL_TEMPLATE,
            event.entity_id = %template.id(),
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            "テンプレート作成"
        );

        Ok(template)
    }

    /// テンプレートを更新する
    pub async fn update(
        &self,
        requester: &Requester,
        id: &EmailTemplateId,
        input: TemplateContentInput,
    ) -> Result<EmailTemplate, ApiError> {
        requester.require_admin()?;

        let (name, html_content) = validate_content(&input)?;

        let template = self
            .template_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

        let updated =
            template.with_content(name, input.description, html_content, self.clock.now());
        self.template_repository.update(&updated).await?;

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_UPDATED,
            event.entity_type = event::entity_type::EMAIL_TEMPLATE,
            event.entity_id = %id,
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            "テンプレート更新"
        );

        Ok(updated)
    }

    /// テンプレートを削除する
    pub async fn delete(
        &self,
        requester: &Requester,
        id: &EmailTemplateId,
    ) -> Result<(), ApiError> {
        requester.require_admin()?;

        if self.template_repository.find_by_id(id).await?.is_none() {
            return Err(ApiError::NotFound("Template not found".to_string()));
        }

        self.template_repository.delete(id).await?;

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_DELETED,
            event.entity_type = event::entity_type::EMAIL_TEMPLATE,
            event.entity_id = %id,
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            "テンプレート削除"
        );

        Ok(())
    }
}

/// 名前と HTML 本文の必須チェック
fn validate_content(input: &TemplateContentInput) -> Result<(TemplateName, String), ApiError> {
    if input.name.trim().is_empty() || input.html_content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Name and HTML content are required".to_string(),
        ));
    }
    let name = TemplateName::new(input.name.clone())?;
    Ok((name, input.html_content.clone()))
}
