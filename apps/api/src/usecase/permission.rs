//! # 送信許可管理ユースケース
//!
//! ユーザー × 送信者アイデンティティの許可の付与・取り消しを行う。
//!
//! ## 設計方針
//!
//! - 付与・取り消しは管理者のみ
//! - 付与は check-then-insert。同時実行の狭い窓で重複行が生まれうるが、
//!   認可は存在のみを見るため正しさには影響しない（取り消しは全行削除）

use std::sync::Arc;

use mailgate_domain::{clock::Clock, identity::SenderIdentityId, user::UserId};
use mailgate_infra::repository::{
    PermissionRepository,
    SenderIdentityRepository,
    UserRepository,
};
use mailgate_shared::{event_log::event, log_business_event};

use super::Requester;
use crate::error::ApiError;

/// 送信許可管理ユースケース
pub struct PermissionUseCaseImpl {
    permission_repository: Arc<dyn PermissionRepository>,
    user_repository:       Arc<dyn UserRepository>,
    identity_repository:   Arc<dyn SenderIdentityRepository>,
    clock:                 Arc<dyn Clock>,
}

impl PermissionUseCaseImpl {
    pub fn new(
        permission_repository: Arc<dyn PermissionRepository>,
        user_repository: Arc<dyn UserRepository>,
        identity_repository: Arc<dyn SenderIdentityRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            permission_repository,
            user_repository,
            identity_repository,
            clock,
        }
    }

    /// ユーザーが許可を持つアイデンティティ ID の一覧を取得する
    pub async fn list_for_user(
        &self,
        requester: &Requester,
        user_id: &UserId,
    ) -> Result<Vec<SenderIdentityId>, ApiError> {
        requester.require_admin()?;
        Ok(self
            .permission_repository
            .find_identity_ids_for_user(user_id)
            .await?)
    }

    /// 許可を付与または取り消す
    pub async fn set_permission(
        &self,
        requester: &Requester,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
        granted: bool,
    ) -> Result<(), ApiError> {
        requester.require_admin()?;

        // 参照先の存在確認（存在しない対象への付与は誤操作）
        if self.user_repository.find_by_id(user_id).await?.is_none() {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        if self
            .identity_repository
            .find_by_id(sender_identity_id)
            .await?
            .is_none()
        {
            return Err(ApiError::NotFound("Sender identity not found.".to_string()));
        }

        if granted {
            self.permission_repository
                .grant(user_id, sender_identity_id, self.clock.now())
                .await?;
        } else {
            self.permission_repository
                .revoke(user_id, sender_identity_id)
                .await?;
        }

        let action = if granted {
            event::action::PERMISSION_GRANTED
        } else {
            event::action::PERMISSION_REVOKED
        };
        log_business_event!(
            event.category = event::category::USER,
            event.action = action,
            event.entity_type = event::entity_type::SENDER_IDENTITY,
            event.entity_id = %sender_identity_id,
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            permission.user_id = %user_id,
            "送信許可の変更"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use mailgate_domain::{
        clock::FixedClock,
        identity::{DisplayName, SenderIdentity},
        user::{Email, User, UserRole},
    };
    use mailgate_infra::mock::{
        MockPermissionRepository,
        MockSenderIdentityRepository,
        MockUserRepository,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn admin() -> Requester {
        Requester {
            user_id:  UserId::new(),
            is_admin: true,
        }
    }

    struct Fixture {
        permission_repo: MockPermissionRepository,
        user_repo:       MockUserRepository,
        identity_repo:   MockSenderIdentityRepository,
        usecase:         PermissionUseCaseImpl,
    }

    fn make_fixture() -> Fixture {
        let permission_repo = MockPermissionRepository::new();
        let user_repo = MockUserRepository::new();
        let identity_repo = MockSenderIdentityRepository::new();
        let usecase = PermissionUseCaseImpl::new(
            Arc::new(permission_repo.clone()),
            Arc::new(user_repo.clone()),
            Arc::new(identity_repo.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );
        Fixture {
            permission_repo,
            user_repo,
            identity_repo,
            usecase,
        }
    }

    fn seed_user_and_identity(fixture: &Fixture) -> (UserId, SenderIdentityId) {
        let user = User::new(
            UserId::new(),
            None,
            Email::new("user@example.com").unwrap(),
            UserRole::User,
            fixed_now(),
        );
        let identity = SenderIdentity::new(
            SenderIdentityId::new(),
            DisplayName::new("Support Desk").unwrap(),
            Email::new("support@example.com").unwrap(),
            fixed_now(),
        );
        fixture.user_repo.add_user(user.clone());
        fixture.identity_repo.add_identity(identity.clone());
        (user.id().clone(), identity.id().clone())
    }

    #[tokio::test]
    async fn test_付与後に許可行が存在する() {
        let fixture = make_fixture();
        let (user_id, identity_id) = seed_user_and_identity(&fixture);

        fixture
            .usecase
            .set_permission(&admin(), &user_id, &identity_id, true)
            .await
            .unwrap();

        assert!(
            fixture
                .permission_repo
                .exists(&user_id, &identity_id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_二重付与でも許可行は増えない() {
        // check-then-insert: 既存行があれば挿入しない
        let fixture = make_fixture();
        let (user_id, identity_id) = seed_user_and_identity(&fixture);

        fixture
            .usecase
            .set_permission(&admin(), &user_id, &identity_id, true)
            .await
            .unwrap();
        fixture
            .usecase
            .set_permission(&admin(), &user_id, &identity_id, true)
            .await
            .unwrap();

        assert_eq!(fixture.permission_repo.grant_count(&user_id, &identity_id), 1);
    }

    #[tokio::test]
    async fn test_取り消しで許可行が消える() {
        let fixture = make_fixture();
        let (user_id, identity_id) = seed_user_and_identity(&fixture);
        fixture
            .permission_repo
            .add_grant(user_id.clone(), identity_id.clone());

        fixture
            .usecase
            .set_permission(&admin(), &user_id, &identity_id, false)
            .await
            .unwrap();

        assert!(
            !fixture
                .permission_repo
                .exists(&user_id, &identity_id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_取り消しは重複行もすべて削除する() {
        // 同時実行の窓で生まれた重複行を想定する
        let fixture = make_fixture();
        let (user_id, identity_id) = seed_user_and_identity(&fixture);
        fixture
            .permission_repo
            .add_grant(user_id.clone(), identity_id.clone());
        fixture
            .permission_repo
            .add_grant(user_id.clone(), identity_id.clone());
        assert_eq!(fixture.permission_repo.grant_count(&user_id, &identity_id), 2);

        fixture
            .usecase
            .set_permission(&admin(), &user_id, &identity_id, false)
            .await
            .unwrap();

        assert_eq!(fixture.permission_repo.grant_count(&user_id, &identity_id), 0);
    }

    #[tokio::test]
    async fn test_重複行があっても認可の存在判定は変わらない() {
        // 重複は無害: exists は存在のみを見る
        let fixture = make_fixture();
        let (user_id, identity_id) = seed_user_and_identity(&fixture);
        fixture
            .permission_repo
            .add_grant(user_id.clone(), identity_id.clone());
        fixture
            .permission_repo
            .add_grant(user_id.clone(), identity_id.clone());

        assert!(
            fixture
                .permission_repo
                .exists(&user_id, &identity_id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_存在しないユーザーへの付与はnot_found() {
        let fixture = make_fixture();
        let (_, identity_id) = seed_user_and_identity(&fixture);

        let result = fixture
            .usecase
            .set_permission(&admin(), &UserId::new(), &identity_id, true)
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_存在しないアイデンティティへの付与はnot_found() {
        let fixture = make_fixture();
        let (user_id, _) = seed_user_and_identity(&fixture);

        let result = fixture
            .usecase
            .set_permission(&admin(), &user_id, &SenderIdentityId::new(), true)
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_一般ユーザーは許可を変更できない() {
        let fixture = make_fixture();
        let (user_id, identity_id) = seed_user_and_identity(&fixture);
        let requester = Requester {
            user_id:  UserId::new(),
            is_admin: false,
        };

        let result = fixture
            .usecase
            .set_permission(&requester, &user_id, &identity_id, true)
            .await;

        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }
}
