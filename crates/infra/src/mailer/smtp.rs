//! SMTP 配送実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Attachment, Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use mailgate_domain::mail::{MailerError, OutboundEmail};

use super::{Mailer, generate_message_id};

/// SMTP 配送ゲートウェイ
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// Mailpit（開発）や SMTP リレー（本番）で使用する。
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// 新しい SMTP 配送インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `credentials`: 認証情報（リレーが要求する場合のみ）
    pub fn new(host: &str, port: u16, credentials: Option<(String, String)>) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);

        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Self {
            transport: builder.build(),
        }
    }
}

/// エンベロープからトランスポートメッセージを構築する
///
/// From ヘッダは `"DisplayName" <address>` 形式。宛先・CC・BCC は
/// それぞれ個別のヘッダエントリとして追加する。構築段階の失敗は
/// すべて `InvalidEnvelope`（トランスポート未到達のフォールト）。
fn build_message(email: &OutboundEmail, message_id: &str) -> Result<Message, MailerError> {
    let from: Mailbox = email
        .formatted_from()
        .parse()
        .map_err(|e| MailerError::InvalidEnvelope(format!("invalid from address: {e}")))?;

    let mut builder = Message::builder()
        .from(from)
        .subject(&email.subject)
        .message_id(Some(message_id.to_string()));

    for to in &email.to {
        let mailbox: Mailbox = to
            .parse()
            .map_err(|e| MailerError::InvalidEnvelope(format!("invalid to address: {e}")))?;
        builder = builder.to(mailbox);
    }
    for cc in &email.cc {
        let mailbox: Mailbox = cc
            .parse()
            .map_err(|e| MailerError::InvalidEnvelope(format!("invalid cc address: {e}")))?;
        builder = builder.cc(mailbox);
    }
    for bcc in &email.bcc {
        let mailbox: Mailbox = bcc
            .parse()
            .map_err(|e| MailerError::InvalidEnvelope(format!("invalid bcc address: {e}")))?;
        builder = builder.bcc(mailbox);
    }

    let html_part = SinglePart::builder()
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone());

    let message = if email.attachments.is_empty() {
        builder
            .singlepart(html_part)
            .map_err(|e| MailerError::InvalidEnvelope(format!("message build failed: {e}")))?
    } else {
        let mut multipart = MultiPart::mixed().singlepart(html_part);
        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                MailerError::InvalidEnvelope(format!(
                    "invalid attachment content type '{}': {e}",
                    attachment.content_type
                ))
            })?;
            // 内容は素通し（再エンコード・サイズ制限なし）
            multipart = multipart.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }
        builder
            .multipart(multipart)
            .map_err(|e| MailerError::InvalidEnvelope(format!("message build failed: {e}")))?
    };

    Ok(message)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError> {
        let message_id = generate_message_id(email);
        let message = build_message(email, &message_id)?;

        // トランスポートのエラーメッセージはそのまま保持する
        // （送信ログと結果契約に verbatim で載る）
        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::SendFailed(e.to_string()))?;

        Ok(message_id)
    }
}
