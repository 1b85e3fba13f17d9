//! # ユーザー管理ユースケース
//!
//! ## 設計方針
//!
//! - 招待・ロール変更・ステータス変更は管理者のみ
//! - **自己操作ガード**: 管理者は自分自身のロールを降格できず、
//!   自分自身を無効化できない。これは「最後の管理者を守る」一般則ではなく、
//!   自己操作のみを弾くガードであり、他ユーザーへの操作には影響しない

use std::sync::Arc;

use mailgate_domain::{
    clock::Clock,
    user::{Email, User, UserId, UserName, UserRole, UserStatus},
};
use mailgate_infra::repository::UserRepository;
use mailgate_shared::{event_log::event, log_business_event};

use super::Requester;
use crate::error::ApiError;

/// ユーザー招待の入力
pub struct InviteUserInput {
    pub email: String,
    pub name:  Option<String>,
    pub role:  UserRole,
}

/// ユーザー管理ユースケース
pub struct UserUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    clock:           Arc<dyn Clock>,
}

impl UserUseCaseImpl {
    pub fn new(user_repository: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repository,
            clock,
        }
    }

    /// 全ユーザーを取得する（管理画面向け）
    pub async fn list(&self, requester: &Requester) -> Result<Vec<User>, ApiError> {
        requester.require_admin()?;
        Ok(self.user_repository.find_all().await?)
    }

    /// ユーザーを招待する
    ///
    /// 1. メールアドレスの重複チェック
    /// 2. User ドメインオブジェクト作成（ステータスは Active）
    /// 3. users テーブルに挿入
    pub async fn invite(
        &self,
        requester: &Requester,
        input: InviteUserInput,
    ) -> Result<User, ApiError> {
        requester.require_admin()?;

        let email = Email::new(input.email)?;
        let name = input.name.map(UserName::new).transpose()?;

        // メールアドレスの重複チェック
        if self.user_repository.find_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let user = User::new(UserId::new(), name, email, input.role, self.clock.now());
        self.user_repository.insert(&user).await?;

        log_business_event!(
            event.category = event::category::USER,
            event.action = event::action::USER_INVITED,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %user.id(),
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            user.role = %user.role(),
            "ユーザー招待"
        );

        Ok(user)
    }

    /// ユーザーのロールを変更する
    ///
    /// 自己降格ガード: 管理者が自分自身のロールを非管理者に変更することは
    /// 拒否する。他ユーザーへのロール変更には影響しない。
    pub async fn update_role(
        &self,
        requester: &Requester,
        target_user_id: &UserId,
        new_role: UserRole,
    ) -> Result<User, ApiError> {
        requester.require_admin()?;

        // 自己降格ガード
        if target_user_id == &requester.user_id && new_role != UserRole::Admin {
            return Err(ApiError::BadRequest(
                "Cannot revoke your own admin status".to_string(),
            ));
        }

        let user = self
            .user_repository
            .find_by_id(target_user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        self.user_repository
            .update_role(target_user_id, new_role)
            .await?;

        log_business_event!(
            event.category = event::category::USER,
            event.action = event::action::USER_ROLE_CHANGED,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %target_user_id,
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            user.role = %new_role,
            "ユーザーロール変更"
        );

        Ok(user.with_role(new_role))
    }

    /// ユーザーのステータスを変更する
    ///
    /// 自己無効化ガード: 管理者が自分自身を無効化することは拒否する。
    pub async fn update_status(
        &self,
        requester: &Requester,
        target_user_id: &UserId,
        new_status: UserStatus,
    ) -> Result<User, ApiError> {
        requester.require_admin()?;

        // 自己無効化ガード
        if target_user_id == &requester.user_id && new_status != UserStatus::Active {
            return Err(ApiError::BadRequest(
                "Cannot disable your own account".to_string(),
            ));
        }

        let user = self
            .user_repository
            .find_by_id(target_user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        self.user_repository
            .update_status(target_user_id, new_status)
            .await?;

        log_business_event!(
            event.category = event::category::USER,
            event.action = event::action::USER_STATUS_CHANGED,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %target_user_id,
            event.actor_id = %requester.user_id,
            event.result = event::result::SUCCESS,
            user.status = %new_status,
            "ユーザーステータス変更"
        );

        Ok(user.with_status(new_status))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use mailgate_domain::clock::FixedClock;
    use mailgate_infra::mock::MockUserRepository;
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
        user_repo: MockUserRepository,
        usecase:   UserUseCaseImpl,
    }

    fn make_fixture() -> Fixture {
        let user_repo = MockUserRepository::new();
        let usecase = UserUseCaseImpl::new(
            Arc::new(user_repo.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );
        Fixture { user_repo, usecase }
    }

    fn add_admin_user(fixture: &Fixture) -> Requester {
        let user = User::new(
            UserId::new(),
            None,
            Email::new("admin@example.com").unwrap(),
            UserRole::Admin,
            fixed_now(),
        );
        fixture.user_repo.add_user(user.clone());
        Requester {
            user_id:  user.id().clone(),
            is_admin: true,
        }
    }

    #[tokio::test]
    async fn test_管理者はユーザーを招待できる() {
        let fixture = make_fixture();

        let user = fixture
            .usecase
            .invite(
                &admin(),
                InviteUserInput {
                    email: "invited@example.com".to_string(),
                    name:  Some("Invited User".to_string()),
                    role:  UserRole::User,
                },
            )
            .await
            .unwrap();

        assert_eq!(user.status(), UserStatus::Active);
        assert_eq!(fixture.user_repo.users().len(), 1);
    }

    #[tokio::test]
    async fn test_重複メールアドレスの招待はconflictになる() {
        let fixture = make_fixture();
        fixture
            .usecase
            .invite(
                &admin(),
                InviteUserInput {
                    email: "invited@example.com".to_string(),
                    name:  None,
                    role:  UserRole::User,
                },
            )
            .await
            .unwrap();

        let result = fixture
            .usecase
            .invite(
                &admin(),
                InviteUserInput {
                    email: "invited@example.com".to_string(),
                    name:  None,
                    role:  UserRole::User,
                },
            )
            .await;

        let Err(ApiError::Conflict(message)) = result else {
            panic!("Conflict であること");
        };
        assert_eq!(message, "User with this email already exists");
        assert_eq!(fixture.user_repo.users().len(), 1);
    }

    #[tokio::test]
    async fn test_一般ユーザーは招待できない() {
        let fixture = make_fixture();
        let requester = Requester {
            user_id:  UserId::new(),
            is_admin: false,
        };

        let result = fixture
            .usecase
            .invite(
                &requester,
                InviteUserInput {
                    email: "invited@example.com".to_string(),
                    name:  None,
                    role:  UserRole::User,
                },
            )
            .await;

        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    // 自己降格ガード

    #[tokio::test]
    async fn test_管理者は自分自身のロールを降格できない() {
        let fixture = make_fixture();
        let requester = add_admin_user(&fixture);

        let result = fixture
            .usecase
            .update_role(&requester, &requester.user_id, UserRole::User)
            .await;

        let Err(ApiError::BadRequest(message)) = result else {
            panic!("BadRequest であること");
        };
        assert_eq!(message, "Cannot revoke your own admin status");
        // ロールは変わらない
        assert_eq!(fixture.user_repo.users()[0].role(), UserRole::Admin);
    }

    #[tokio::test]
    async fn test_管理者は自分自身にadminを再設定できる() {
        // 降格でなければ自己操作でも通る
        let fixture = make_fixture();
        let requester = add_admin_user(&fixture);

        let result = fixture
            .usecase
            .update_role(&requester, &requester.user_id, UserRole::Admin)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_他ユーザーのロール変更は自己降格ガードの影響を受けない() {
        let fixture = make_fixture();
        let requester = add_admin_user(&fixture);
        let other = User::new(
            UserId::new(),
            None,
            Email::new("other@example.com").unwrap(),
            UserRole::Admin,
            fixed_now(),
        );
        fixture.user_repo.add_user(other.clone());

        let updated = fixture
            .usecase
            .update_role(&requester, other.id(), UserRole::User)
            .await
            .unwrap();

        assert_eq!(updated.role(), UserRole::User);
        assert_eq!(fixture.user_repo.users()[1].role(), UserRole::User);
    }

    #[tokio::test]
    async fn test_存在しないユーザーのロール変更はnot_found() {
        let fixture = make_fixture();

        let result = fixture
            .usecase
            .update_role(&admin(), &UserId::new(), UserRole::User)
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    // 自己無効化ガード

    #[tokio::test]
    async fn test_管理者は自分自身を無効化できない() {
        let fixture = make_fixture();
        let requester = add_admin_user(&fixture);

        let result = fixture
            .usecase
            .update_status(&requester, &requester.user_id, UserStatus::Disabled)
            .await;

        let Err(ApiError::BadRequest(message)) = result else {
            panic!("BadRequest であること");
        };
        assert_eq!(message, "Cannot disable your own account");
    }

    #[tokio::test]
    async fn test_他ユーザーは無効化できる() {
        let fixture = make_fixture();
        let requester = add_admin_user(&fixture);
        let other = User::new(
            UserId::new(),
            None,
            Email::new("other@example.com").unwrap(),
            UserRole::User,
            fixed_now(),
        );
        fixture.user_repo.add_user(other.clone());

        let updated = fixture
            .usecase
            .update_status(&requester, other.id(), UserStatus::Disabled)
            .await
            .unwrap();

        assert_eq!(updated.status(), UserStatus::Disabled);
    }
}
