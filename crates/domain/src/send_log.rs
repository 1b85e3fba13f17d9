//! # 送信ログ
//!
//! 送信試行ごとに 1 件作成される監査証跡のドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`EmailLog`] | 送信ログ | 成功・失敗を問わず試行ごとに 1 件。作成後は不変 |
//! | [`DeliveryStatus`] | 配送ステータス | `sent` / `failed` の 2 値 |
//! | [`ContentHash`] | 本文ハッシュ | HTML 本文の SHA-256。本文そのものは保持しない |
//!
//! ## 設計方針
//!
//! - **append-only**: 更新・削除の操作をドメインモデルとして提供しない
//! - **本文の最小化**: 保存するのはハッシュのみ。完全性検証と重複検知には
//!   十分で、センシティブな本文の保持を避ける

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::IntoStaticStr;

use crate::{DomainError, identity::SenderIdentityId, user::UserId};

define_uuid_id! {
    /// 送信ログ ID（一意識別子）
    pub struct EmailLogId;
}

/// 配送ステータス
///
/// `email_logs` テーブルの `delivery_status` カラムに格納される値。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    /// トランスポートがメッセージを受理した
    Sent,
    /// トランスポートが拒否した、または通信に失敗した
    Failed,
}

/// HTML 本文のコンテンツハッシュ（値オブジェクト）
///
/// SHA-256 の小文字 16 進表現（64 文字）。同一入力は常に同一ハッシュになる。
/// 監査時の突き合わせと重複検知にのみ使用し、逆引きは想定しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// HTML 本文からハッシュを計算する
    pub fn of(html: &str) -> Self {
        let digest = Sha256::digest(html.as_bytes());
        Self(hex::encode(digest))
    }

    /// 保存済みのハッシュ文字列から復元する（データベースから取得時）
    pub fn from_hex(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::Validation(format!(
                "invalid content hash: {}",
                value
            )));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 送信ログエントリ
///
/// 配送ゲートウェイに到達した送信試行ごとに 1 件作成される。
/// 入力エラー・認可拒否で弾かれたリクエストは送信試行ではないため
/// ログを作成しない。
///
/// # 不変条件
///
/// - 作成後は一切変更されない（`with_*` メソッドを持たない）
/// - `error_message` は `delivery_status == Failed` の場合のみ意味を持つ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailLog {
    id:                 EmailLogId,
    user_id:            UserId,
    sender_identity_id: SenderIdentityId,
    recipients:         Vec<String>,
    subject:            String,
    content_hash:       ContentHash,
    delivery_status:    DeliveryStatus,
    error_message:      Option<String>,
    sent_at:            DateTime<Utc>,
}

impl EmailLog {
    /// 送信試行の結果を記録するエントリを作成する
    ///
    /// `content_hash` はこのコンストラクタ内で計算する。呼び出し元が
    /// ハッシュ計算を忘れる余地をなくすため、HTML 本文を直接受け取る。
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        user_id: UserId,
        sender_identity_id: SenderIdentityId,
        recipients: Vec<String>,
        subject: String,
        html: &str,
        delivery_status: DeliveryStatus,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EmailLogId::new(),
            user_id,
            sender_identity_id,
            recipients,
            subject,
            content_hash: ContentHash::of(html),
            delivery_status,
            error_message,
            sent_at: now,
        }
    }

    /// 既存のデータからエントリを復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: EmailLogId,
        user_id: UserId,
        sender_identity_id: SenderIdentityId,
        recipients: Vec<String>,
        subject: String,
        content_hash: ContentHash,
        delivery_status: DeliveryStatus,
        error_message: Option<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            sender_identity_id,
            recipients,
            subject,
            content_hash,
            delivery_status,
            error_message,
            sent_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &EmailLogId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn sender_identity_id(&self) -> &SenderIdentityId {
        &self.sender_identity_id
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn delivery_status(&self) -> DeliveryStatus {
        self.delivery_status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    // DeliveryStatus のテスト

    #[test]
    fn test_delivery_statusの文字列変換が正しい() {
        assert_eq!(DeliveryStatus::Sent.to_string(), "sent");
        assert_eq!(DeliveryStatus::Failed.to_string(), "failed");

        assert_eq!(
            DeliveryStatus::from_str("sent").unwrap(),
            DeliveryStatus::Sent
        );
        assert_eq!(
            DeliveryStatus::from_str("failed").unwrap(),
            DeliveryStatus::Failed
        );
        assert!(DeliveryStatus::from_str("bounced").is_err());
    }

    // ContentHash のテスト

    #[test]
    fn test_同一のhtmlは常に同一のハッシュになる() {
        let a = ContentHash::of("<p>hello</p>");
        let b = ContentHash::of("<p>hello</p>");

        assert_eq!(a, b);
    }

    #[test]
    fn test_異なるhtmlは異なるハッシュになる() {
        let a = ContentHash::of("<p>hello</p>");
        let b = ContentHash::of("<p>hello!</p>");

        assert_ne!(a, b);
    }

    #[test]
    fn test_ハッシュは64文字の小文字16進表現() {
        let hash = ContentHash::of("<p>hello</p>");

        assert_eq!(hash.as_str().len(), 64);
        assert!(
            hash.as_str()
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_空文字列のハッシュはsha256のテストベクタと一致する() {
        // SHA-256("") の既知の値
        assert_eq!(
            ContentHash::of("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_from_hexは不正な値を拒否する() {
        assert!(ContentHash::from_hex("abc").is_err());
        assert!(ContentHash::from_hex("z".repeat(64)).is_err());
        assert!(ContentHash::from_hex("a".repeat(64)).is_ok());
    }

    // EmailLog のテスト

    #[test]
    fn test_recordはハッシュを計算して本文を保持しない() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let log = EmailLog::record(
            UserId::new(),
            SenderIdentityId::new(),
            vec!["a@x.com".to_string()],
            "Hi".to_string(),
            "<p>hi</p>",
            DeliveryStatus::Sent,
            None,
            now,
        );

        assert_eq!(log.content_hash(), &ContentHash::of("<p>hi</p>"));
        assert_eq!(log.delivery_status(), DeliveryStatus::Sent);
        assert_eq!(log.error_message(), None);
        assert_eq!(log.sent_at(), now);
    }

    #[test]
    fn test_失敗記録はエラーメッセージを保持する() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let log = EmailLog::record(
            UserId::new(),
            SenderIdentityId::new(),
            vec!["a@x.com".to_string()],
            "Hi".to_string(),
            "<p>hi</p>",
            DeliveryStatus::Failed,
            Some("SMTP timeout".to_string()),
            now,
        );

        assert_eq!(log.delivery_status(), DeliveryStatus::Failed);
        assert_eq!(log.error_message(), Some("SMTP timeout"));
    }
}
