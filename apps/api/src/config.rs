//! # API サーバー設定
//!
//! 環境変数から API サーバーの設定を読み込む。

use std::env;

/// API サーバーの設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// メール配送設定
    pub mail: MailConfig,
}

/// メール配送の設定
///
/// `MAIL_BACKEND` 環境変数で配送バックエンドを切り替える:
/// - `smtp`: Mailpit（開発）/ SMTP リレー経由で送信
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// 配送バックエンド（"smtp" | "noop"）
    pub backend:       String,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:     String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:     u16,
    /// SMTP 認証ユーザー名（リレーが要求する場合のみ）
    pub smtp_username: Option<String>,
    /// SMTP 認証パスワード（リレーが要求する場合のみ）
    pub smtp_password: Option<String>,
}

impl ApiConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("API_PORT")
                .expect("API_PORT が設定されていません")
                .parse()
                .expect("API_PORT は有効なポート番号である必要があります"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL が設定されていません"),
            mail: MailConfig::from_env(),
        })
    }
}

impl MailConfig {
    /// 環境変数からメール配送設定を読み込む
    fn from_env() -> Self {
        Self {
            backend:       env::var("MAIL_BACKEND").unwrap_or_else(|_| "noop".to_string()),
            smtp_host:     env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port:     env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .expect("SMTP_PORT は有効なポート番号である必要があります"),
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
        }
    }

    /// 認証情報のペアを返す（両方設定されている場合のみ）
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.smtp_username, &self.smtp_password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        }
    }
}
