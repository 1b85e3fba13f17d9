//! # 送信者アイデンティティ管理ユースケース
//!
//! ## 設計方針
//!
//! - 作成・トグル・削除は管理者のみ
//! - 削除は送信ログが参照している間はブロックする（監査証跡の参照先を守る）。
//!   許可行はストレージ層の ON DELETE CASCADE で連鎖削除される

use std::sync::Arc;

use mailgate_domain::{
    clock::Clock,
    identity::{DisplayName, SenderIdentity, SenderIdentityId},
    user::Email,
};
use mailgate_infra::repository::{
    EmailLogRepository,
    PermissionRepository,
    SenderIdentityRepository,
};
use mailgate_shared::{event_log::event, log_business_event};

use super::Requester;
use crate::error::ApiError;

/// アイデンティティ作成の入力
pub struct CreateIdentityInput {
    pub display_name:  String,
    pub email_address: String,
}

/// 送信者アイデンティティ管理ユースケース
pub struct IdentityUseCaseImpl {
    identity_repository:   Arc<dyn SenderIdentityRepository>,
    permission_repository: Arc<dyn PermissionRepository>,
    email_log_repository:  Arc<dyn EmailLogRepository>,
    clock:                 Arc<dyn Clock>,
}

impl IdentityUseCaseImpl {
    pub fn new(
        identity_repository: Arc<dyn SenderIdentityRepository>,
        permission_repository: Arc<dyn PermissionRepository>,
        email_log_repository: Arc<dyn EmailLogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity_repository,
            permission_repository,
            email_log_repository,
            clock,
        }
    }

    /// 全アイデンティティを取得する（管理画面向け）
    pub async fn list_all(&self, requester: &Requester) -> Result<Vec<SenderIdentity>, ApiError> {
        requester.require_admin()?;
        Ok(self.identity_repository.find_all().await?)
    }

    /// リクエスタが送信に使用できるアイデンティティを取得する（コンポーズ画面向け）
    ///
    /// 管理者はアクティブな全アイデンティティ、一般ユーザーは許可を持つ
    /// アクティブなアイデンティティのみ。
    pub async fn list_available(
        &self,
        requester: &Requester,
    ) -> Result<Vec<SenderIdentity>, ApiError> {
        let active = self.identity_repository.find_all_active().await?;

        if requester.is_admin {
            return Ok(active);
        }

        let granted_ids = self
            .permission_repository
            .find_identity_ids_for_user(&requester.user_id)
            .await?;
        Ok(active
            .into_iter()
            .filter(|identity| granted_ids.contains(identity.id()))
            .collect())
    }

    /// アイデンティティを作成する
    pub async fn create(
        &self,
        requester: &Requester,
        input: CreateIdentityInput,
    ) -> Result<SenderIdentity, ApiError> {
        requester.require_admin()?;

        let display_name = DisplayName::new(input.display_name)?;
        let email_address = Email::new(input.email_address)?;

        let identity = SenderIdentity::new(
            SenderIdentityId::new(),
            display_name,
            email_address,
            self.clock.now(),
        );
        self.identity_repository.insert(&identity).await?;

        log_business_event!(
            event.category = event::category::IDENTITY,
            event.action = event::action::IDENTITY_CREATED,
            event.entity_type = event::entity_type::SENDER_IDENTITY,
            event.entity_id = %identity.id(),
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            "送信者アイデンティティ作成"
        );

        Ok(identity)
    }

    /// アクティブ状態を変更する
    pub async fn set_active(
        &self,
        requester: &Requester,
        id: &SenderIdentityId,
        is_active: bool,
    ) -> Result<SenderIdentity, ApiError> {
        requester.require_admin()?;

        let identity = self
            .identity_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Sender identity not found.".to_string()))?;

        self.identity_repository.set_active(id, is_active).await?;

        log_business_event!(
            event.category = event::category::IDENTITY,
            event.action = event::action::IDENTITY_STATUS_CHANGED,
            event.entity_type = event::entity_type::SENDER_IDENTITY,
            event.entity_id = %id,
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            identity.is_active = is_active,
            "送信者アイデンティティの状態変更"
        );

        Ok(identity.with_active(is_active))
    }

    /// アイデンティティを削除する
    ///
    /// 送信ログが参照している間は `Conflict` でブロックする。
    pub async fn delete(
        &self,
        requester: &Requester,
        id: &SenderIdentityId,
    ) -> Result<(), ApiError> {
        requester.require_admin()?;

        if self.identity_repository.find_by_id(id).await?.is_none() {
            return Err(ApiError::NotFound("Sender identity not found.".to_string()));
        }

        let log_count = self.email_log_repository.count_for_identity(id).await?;
        if log_count > 0 {
            return Err(ApiError::Conflict(
                "Sender identity has send history and cannot be deleted".to_string(),
            ));
        }

        self.identity_repository.delete(id).await?;

        log_business_event!(
            event.category = event::category::IDENTITY,
            event.action = event::action::IDENTITY_DELETED,
            event.entity_type = event::entity_type::SENDER_IDENTITY,
            event.entity_id = %id,
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            "送信者アイデンティティ削除"
        );

        Ok(())
    }
}
