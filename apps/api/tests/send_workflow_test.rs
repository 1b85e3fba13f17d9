//! 送信ワークフローの統合テスト
//!
//! モックリポジトリとモック配送ゲートウェイで送信ワークフロー全体を
//! 通し、結果契約とログ不変条件を検証する。
//!
//! 検証する不変条件:
//! - 拒否された送信（入力エラー・認可拒否）はログを 1 行も書かない
//! - 認可を通過して配送ゲートウェイに到達した呼び出しは、成功・失敗を
//!   問わず正確に 1 行のログを書く

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mailgate_api::{
    error::ApiError,
    usecase::{SendEmailInput, SendEmailUseCaseImpl, SendOutcome},
};
use mailgate_domain::{
    clock::FixedClock,
    identity::{DisplayName, SenderIdentity, SenderIdentityId},
    send_log::{ContentHash, DeliveryStatus},
    user::{Email, UserId},
};
use mailgate_infra::{
    mock::{
        MockEmailLogRepository,
        MockMailer,
        MockPermissionRepository,
        MockSenderIdentityRepository,
    },
    repository::{EmailLogRepository, PermissionRepository},
};
use pretty_assertions::assert_eq;

fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

struct Harness {
    identity_repo:   MockSenderIdentityRepository,
    permission_repo: MockPermissionRepository,
    log_repo:        MockEmailLogRepository,
    mailer:          MockMailer,
    usecase:         SendEmailUseCaseImpl,
}

impl Harness {
    fn new() -> Self {
        let identity_repo = MockSenderIdentityRepository::new();
        let permission_repo = MockPermissionRepository::new();
        let log_repo = MockEmailLogRepository::new();
        let mailer = MockMailer::new();
        let usecase = SendEmailUseCaseImpl::new(
            Arc::new(identity_repo.clone()),
            Arc::new(permission_repo.clone()),
            Arc::new(log_repo.clone()),
            Arc::new(mailer.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );
        Self {
            identity_repo,
            permission_repo,
            log_repo,
            mailer,
            usecase,
        }
    }

    /// アクティブ状態を指定してアイデンティティを登録する
    fn seed_identity(&self, is_active: bool) -> SenderIdentity {
        let identity = SenderIdentity::from_db(
            SenderIdentityId::new(),
            DisplayName::new("Support Desk").unwrap(),
            Email::new("support@example.com").unwrap(),
            is_active,
            fixed_now(),
        );
        self.identity_repo.add_identity(identity.clone());
        identity
    }
}

fn make_input(user_id: UserId, is_admin: bool, identity_id: SenderIdentityId) -> SendEmailInput {
    SendEmailInput {
        user_id,
        is_admin,
        sender_identity_id: identity_id,
        to: vec!["a@x.com".to_string()],
        cc: vec![],
        bcc: vec![],
        subject: "Hi".to_string(),
        html: "<p>hi</p>".to_string(),
        attachments: vec![],
    }
}

// --- シナリオ A: 管理者 + アクティブなアイデンティティ + 配送成功 ---

#[tokio::test]
async fn 管理者のアクティブな送信は成功しsentで記録される() {
    let harness = Harness::new();
    let identity = harness.seed_identity(true);

    let outcome = harness
        .usecase
        .send(make_input(UserId::new(), true, identity.id().clone()))
        .await
        .unwrap();

    let SendOutcome::Sent { message_id } = outcome else {
        panic!("Sent であること");
    };
    assert!(!message_id.is_empty());

    let logs = harness.log_repo.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].delivery_status(), DeliveryStatus::Sent);
    assert_eq!(logs[0].subject(), "Hi");
    assert_eq!(logs[0].recipients(), &["a@x.com".to_string()]);
    assert_eq!(logs[0].content_hash(), &ContentHash::of("<p>hi</p>"));
    assert_eq!(logs[0].sender_identity_id(), identity.id());
}

// --- シナリオ B: 許可なしの一般ユーザー → 拒否、ログ 0 行 ---

#[tokio::test]
async fn 許可のない一般ユーザーの送信は拒否されログは0行() {
    let harness = Harness::new();
    let identity = harness.seed_identity(true);

    let result = harness
        .usecase
        .send(make_input(UserId::new(), false, identity.id().clone()))
        .await;

    let Err(ApiError::Forbidden(message)) = result else {
        panic!("Forbidden であること");
    };
    assert_eq!(
        message,
        "Unauthorized: You do not have permission to use this sender identity."
    );
    assert_eq!(harness.log_repo.logs().len(), 0);
    assert_eq!(harness.mailer.sent_emails().len(), 0);
}

// --- シナリオ C: 許可ありの一般ユーザー + 非アクティブ → 拒否、ログ 0 行 ---

#[tokio::test]
async fn 非アクティブなアイデンティティへの送信は拒否されログは0行() {
    let harness = Harness::new();
    let identity = harness.seed_identity(false);
    let user_id = UserId::new();
    harness
        .permission_repo
        .add_grant(user_id.clone(), identity.id().clone());

    let result = harness
        .usecase
        .send(make_input(user_id, false, identity.id().clone()))
        .await;

    let Err(ApiError::Forbidden(message)) = result else {
        panic!("Forbidden であること");
    };
    assert_eq!(message, "Sender identity is inactive.");
    assert_eq!(harness.log_repo.logs().len(), 0);
}

// --- シナリオ D: トランスポート失敗 → failed で記録、否定結果 ---

#[tokio::test]
async fn トランスポート失敗は否定結果になりfailedで記録される() {
    let harness = Harness::new();
    let identity = harness.seed_identity(true);
    harness.mailer.set_failure("SMTP timeout");

    let outcome = harness
        .usecase
        .send(make_input(UserId::new(), true, identity.id().clone()))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SendOutcome::DeliveryFailed {
            error: "SMTP timeout".to_string(),
        }
    );

    let logs = harness.log_repo.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].delivery_status(), DeliveryStatus::Failed);
    assert_eq!(logs[0].error_message(), Some("SMTP timeout"));
}

// --- シナリオ E: 宛先なし → 認可前に拒否、ログ 0 行 ---

#[tokio::test]
async fn 宛先が空の送信は認可前に拒否されログは0行() {
    let harness = Harness::new();
    // アイデンティティは登録しない: 入力エラーが認可より先に返ることで
    // 認可リゾルバが呼ばれていないことを検証する
    let mut input = make_input(UserId::new(), true, SenderIdentityId::new());
    input.to = vec![];

    let result = harness.usecase.send(input).await;

    let Err(ApiError::BadRequest(message)) = result else {
        panic!("BadRequest であること");
    };
    assert_eq!(message, "At least one recipient is required");
    assert_eq!(harness.log_repo.logs().len(), 0);
    assert_eq!(harness.mailer.sent_emails().len(), 0);
}

// --- 認可プロパティ ---

#[tokio::test]
async fn 許可のない一般ユーザーはアクティブ状態に関わらず拒否される() {
    for is_active in [true, false] {
        let harness = Harness::new();
        let identity = harness.seed_identity(is_active);

        let result = harness
            .usecase
            .send(make_input(UserId::new(), false, identity.id().clone()))
            .await;

        let Err(ApiError::Forbidden(message)) = result else {
            panic!("Forbidden であること (is_active={is_active})");
        };
        assert!(
            message.starts_with("Unauthorized"),
            "is_active={is_active} でも Unauthorized 拒否: {message}"
        );
    }
}

#[tokio::test]
async fn 管理者はアクティブな場合のみ許可される() {
    // アクティブ → 許可
    let harness = Harness::new();
    let active = harness.seed_identity(true);
    let outcome = harness
        .usecase
        .send(make_input(UserId::new(), true, active.id().clone()))
        .await
        .unwrap();
    assert!(matches!(outcome, SendOutcome::Sent { .. }));

    // 非アクティブ → 拒否
    let harness = Harness::new();
    let inactive = harness.seed_identity(false);
    let result = harness
        .usecase
        .send(make_input(UserId::new(), true, inactive.id().clone()))
        .await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));
}

// --- ログ不変条件: ゲートウェイ到達 = 正確に 1 行 ---

#[tokio::test]
async fn 配送の成否に関わらずゲートウェイ到達ごとに正確に1行記録される() {
    let harness = Harness::new();
    let identity = harness.seed_identity(true);
    let user_id = UserId::new();
    harness
        .permission_repo
        .add_grant(user_id.clone(), identity.id().clone());

    // 1 回目: 成功
    harness
        .usecase
        .send(make_input(user_id.clone(), false, identity.id().clone()))
        .await
        .unwrap();
    assert_eq!(harness.log_repo.logs().len(), 1);

    // 2 回目: トランスポート失敗
    harness.mailer.set_failure("connection refused");
    harness
        .usecase
        .send(make_input(user_id.clone(), false, identity.id().clone()))
        .await
        .unwrap();
    assert_eq!(harness.log_repo.logs().len(), 2);

    // 3 回目: 認可拒否（許可を取り消し）→ 行数は増えない
    harness
        .permission_repo
        .revoke(&user_id, identity.id())
        .await
        .unwrap();
    let _ = harness
        .usecase
        .send(make_input(user_id, false, identity.id().clone()))
        .await;
    assert_eq!(harness.log_repo.logs().len(), 2);
}

// --- 永続化フォールト ---

#[tokio::test]
async fn ログ永続化の失敗は配送失敗と区別されるフォールトになる() {
    let harness = Harness::new();
    let identity = harness.seed_identity(true);
    harness.log_repo.set_insert_failure("storage unavailable");

    let result = harness
        .usecase
        .send(make_input(UserId::new(), true, identity.id().clone()))
        .await;

    // 配送失敗なら Ok(DeliveryFailed) になるところ、フォールトは Err で返る
    assert!(matches!(result, Err(ApiError::Database(_))));
}

// --- ハッシュの決定性（同一本文の 2 回送信は同一ハッシュ） ---

#[tokio::test]
async fn 同一本文の送信は同一のコンテンツハッシュで記録される() {
    let harness = Harness::new();
    let identity = harness.seed_identity(true);

    for _ in 0..2 {
        harness
            .usecase
            .send(make_input(UserId::new(), true, identity.id().clone()))
            .await
            .unwrap();
    }

    let logs = harness.log_repo.logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].content_hash(), logs[1].content_hash());
}

// --- 非管理者の履歴は自分の分のみ ---

#[tokio::test]
async fn 非管理者の履歴参照は自分の送信分のみ返す() {
    let harness = Harness::new();
    let identity = harness.seed_identity(true);
    let me = UserId::new();
    let someone_else = UserId::new();

    for user in [&me, &someone_else] {
        harness
            .usecase
            .send(make_input(user.clone(), true, identity.id().clone()))
            .await
            .unwrap();
    }

    let mine = harness.log_repo.find_recent_by_user(&me, 50).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(mine.iter().all(|log| log.user_id() == &me));

    let all = harness.log_repo.find_recent(50).await.unwrap();
    assert_eq!(all.len(), 2);
}
