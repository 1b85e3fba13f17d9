//! Noop 配送実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 送信を無効化した環境やローカル動作確認で使用する。

use async_trait::async_trait;
use mailgate_domain::mail::{MailerError, OutboundEmail};

use super::{Mailer, generate_message_id};

/// Noop 配送ゲートウェイ（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError> {
        let message_id = generate_message_id(email);
        tracing::info!(
            from = %email.formatted_from(),
            to = ?email.to,
            subject = %email.subject,
            message_id = %message_id,
            "Noop: メール送信をスキップ"
        );
        Ok(message_id)
    }
}
