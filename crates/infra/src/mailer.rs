//! # 配送ゲートウェイ
//!
//! メール配送を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `Mailer` trait でトランスポートを抽象化
//! - **2 つの実装**: SMTP（lettre、Mailpit 開発・本番リレー）、Noop（送信無効時）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択
//! - **失敗の分類**: トランスポート失敗は `SendFailed`（呼び出し元がログに記録）、
//!   エンベロープ構築失敗は `InvalidEnvelope`（フォールトとして伝播）

mod noop;
mod smtp;

use async_trait::async_trait;
use mailgate_domain::mail::{MailerError, OutboundEmail};
pub use noop::NoopMailer;
pub use smtp::SmtpMailer;

/// メール配送トレイト
///
/// 送信ワークフローの配送ゲートウェイ。トランスポートの具体的な方法を
/// 抽象化する。SMTP / Noop の 2 実装を環境変数で切り替える。
#[async_trait]
pub trait Mailer: Send + Sync {
    /// エンベロープを配送し、生成したメッセージ ID を返す
    ///
    /// トランスポートの拒否・通信失敗は `MailerError::SendFailed` として
    /// 返る。これは想定内の結果であり、呼び出し元が送信ログに記録する。
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError>;
}

/// エンベロープの From ドメインからメッセージ ID を生成する
///
/// `<uuid@domain>` 形式。トランスポートが採番しない構成（Noop 等）でも
/// 送信ログと結果契約に一貫したメッセージ ID を持たせるため、
/// ゲートウェイ側で採番する。
pub(crate) fn generate_message_id(email: &OutboundEmail) -> String {
    let domain = email
        .from_address
        .split_once('@')
        .map_or("mailgate.invalid", |(_, domain)| domain);
    format!("<{}@{}>", uuid::Uuid::new_v4(), domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_email() -> OutboundEmail {
        OutboundEmail {
            from_display_name: "Support Desk".to_string(),
            from_address:      "support@example.com".to_string(),
            to:                vec!["a@x.com".to_string()],
            cc:                vec![],
            bcc:               vec![],
            subject:           "Hi".to_string(),
            html:              "<p>hi</p>".to_string(),
            attachments:       vec![],
        }
    }

    #[test]
    fn test_メッセージidはfromドメインを含む() {
        let id = generate_message_id(&make_email());

        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }

    #[test]
    fn test_メッセージidは呼び出しごとに異なる() {
        let email = make_email();

        assert_ne!(generate_message_id(&email), generate_message_id(&email));
    }
}
