//! # MailGate API サーバー
//!
//! 許可制の送信メールサービス。認証済みユーザーが組織共有の送信者
//! アイデンティティを通してメールを送信し、管理者がアイデンティティ・
//! ユーザー・許可・テンプレートを管理する。すべての送信試行は
//! `email_logs` に記録される。
//!
//! ## アクセス制御
//!
//! この API は内部ネットワークからのみアクセス可能とする。OAuth サインインと
//! セッション管理はフロントエンド側の外部コラボレータが担い、リクエストには
//! 認証済みのリクエスタコンテキスト（`requester_id` + `is_admin`）が付与される。
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Internet   │──X──│ MailGate API │─────│   Database   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!                             ↑                     │
//!                      内部ネットワークのみ          ↓
//!                             ↓              ┌──────────────┐
//!                      ┌──────────────┐      │ SMTP リレー  │
//!                      │  フロント/BFF │      └──────────────┘
//!                      └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `MAIL_BACKEND` | No | `smtp` / `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` | No | SMTP ホスト（デフォルト: `localhost`） |
//! | `SMTP_PORT` | No | SMTP ポート（デフォルト: `1025`） |
//! | `SMTP_USERNAME` | No | SMTP 認証ユーザー名 |
//! | `SMTP_PASSWORD` | No | SMTP 認証パスワード |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（Mailpit に送信）
//! MAIL_BACKEND=smtp cargo run -p mailgate-api
//!
//! # 本番環境
//! API_PORT=3001 DATABASE_URL=postgres://... cargo run -p mailgate-api --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use mailgate_api::{
    config::ApiConfig,
    handler::{
        EmailState,
        IdentityState,
        PermissionState,
        TemplateState,
        UserState,
        create_identity,
        create_template,
        delete_identity,
        delete_template,
        get_template,
        health_check,
        invite_user,
        list_email_logs,
        list_identities,
        list_permissions,
        list_templates,
        list_users,
        send_email,
        set_identity_active,
        set_permission,
        update_template,
        update_user_role,
        update_user_status,
    },
    usecase::{
        IdentityUseCaseImpl,
        PermissionUseCaseImpl,
        SendEmailUseCaseImpl,
        TemplateUseCaseImpl,
        UserUseCaseImpl,
    },
};
use mailgate_domain::clock::SystemClock;
use mailgate_infra::{
    db,
    mailer::{Mailer, NoopMailer, SmtpMailer},
    repository::{
        PostgresEmailLogRepository,
        PostgresPermissionRepository,
        PostgresSenderIdentityRepository,
        PostgresTemplateRepository,
        PostgresUserRepository,
    },
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// API サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mailgate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 設定読み込み
    let config = ApiConfig::from_env().expect("設定の読み込みに失敗しました");

    tracing::info!(
        "MailGate API サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("データベース接続に失敗しました");
    tracing::info!("データベースに接続しました");

    // 配送バックエンドを選択
    let mailer: Arc<dyn Mailer> = match config.mail.backend.as_str() {
        "smtp" => {
            tracing::info!(
                "SMTP 配送を使用します: {}:{}",
                config.mail.smtp_host,
                config.mail.smtp_port
            );
            Arc::new(SmtpMailer::new(
                &config.mail.smtp_host,
                config.mail.smtp_port,
                config.mail.credentials(),
            ))
        }
        _ => {
            tracing::info!("Noop 配送を使用します（メールは送信されません）");
            Arc::new(NoopMailer)
        }
    };

    let clock = Arc::new(SystemClock);

    // リポジトリを初期化
    let identity_repository = Arc::new(PostgresSenderIdentityRepository::new(pool.clone()));
    let permission_repository = Arc::new(PostgresPermissionRepository::new(pool.clone()));
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let email_log_repository = Arc::new(PostgresEmailLogRepository::new(pool.clone()));
    let template_repository = Arc::new(PostgresTemplateRepository::new(pool.clone()));

    // ユースケースと共有状態を初期化
    let send_usecase = SendEmailUseCaseImpl::new(
        identity_repository.clone(),
        permission_repository.clone(),
        email_log_repository.clone(),
        mailer,
        clock.clone(),
    );
    let email_state = Arc::new(EmailState {
        send_usecase,
        email_log_repository: email_log_repository.clone(),
    });

    let identity_usecase = IdentityUseCaseImpl::new(
        identity_repository.clone(),
        permission_repository.clone(),
        email_log_repository.clone(),
        clock.clone(),
    );
    let identity_state = Arc::new(IdentityState {
        usecase: identity_usecase,
    });

    let user_usecase = UserUseCaseImpl::new(user_repository.clone(), clock.clone());
    let user_state = Arc::new(UserState {
        usecase: user_usecase,
    });

    let permission_usecase = PermissionUseCaseImpl::new(
        permission_repository.clone(),
        user_repository.clone(),
        identity_repository.clone(),
        clock.clone(),
    );
    let permission_state = Arc::new(PermissionState {
        usecase: permission_usecase,
    });

    let template_usecase = TemplateUseCaseImpl::new(template_repository.clone(), clock);
    let template_state = Arc::new(TemplateState {
        usecase: template_usecase,
    });

    // ルーター構築
    let app = Router::new()
        .route("/health", get(health_check))
        // 送信ワークフロー
        .route("/api/emails/send", post(send_email))
        .route("/api/emails/logs", get(list_email_logs))
        .with_state(email_state)
        // 送信者アイデンティティ管理
        .merge(
            Router::new()
                .route("/api/identities", get(list_identities).post(create_identity))
                .route("/api/identities/{id}/active", axum::routing::patch(set_identity_active))
                .route("/api/identities/{id}", axum::routing::delete(delete_identity))
                .with_state(identity_state),
        )
        // ユーザー管理
        .merge(
            Router::new()
                .route("/api/users", get(list_users).post(invite_user))
                .route("/api/users/{id}/role", axum::routing::patch(update_user_role))
                .route("/api/users/{id}/status", axum::routing::patch(update_user_status))
                .with_state(user_state),
        )
        // 送信許可管理
        .merge(
            Router::new()
                .route("/api/users/{id}/permissions", get(list_permissions))
                .route(
                    "/api/users/{id}/permissions/{identity_id}",
                    axum::routing::put(set_permission),
                )
                .with_state(permission_state),
        )
        // テンプレート管理
        .merge(
            Router::new()
                .route("/api/templates", get(list_templates).post(create_template))
                .route(
                    "/api/templates/{id}",
                    get(get_template)
                        .patch(update_template)
                        .delete(delete_template),
                )
                .with_state(template_state),
        )
        .layer(TraceLayer::new_for_http());

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("アドレスのパースに失敗しました");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("MailGate API サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
