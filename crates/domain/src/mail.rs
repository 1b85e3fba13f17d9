//! # メール送信エンベロープ
//!
//! 配送ゲートウェイ（インフラ層の `Mailer`）に渡すエンベロープと、
//! 配送エラーのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **配送失敗は正常系**: トランスポートの拒否・タイムアウトは
//!   [`MailerError::SendFailed`] として返り、呼び出し元が送信ログに記録する
//! - **エンベロープ不正はフォールト**: 宛先アドレスのパース失敗など、
//!   トランスポートに到達する前の失敗は [`MailerError::InvalidEnvelope`]
//!   として区別する（送信試行ではないためログ対象外）
//! - **添付は素通し**: サイズ制限・再エンコードは行わない

use thiserror::Error;

use crate::identity::SenderIdentity;

/// 配送エラー
///
/// 配送ゲートウェイで発生するエラー。2 つのバリアントは
/// エラーハンドリング上まったく異なる扱いを受ける（モジュールドキュメント参照）。
#[derive(Debug, Error)]
pub enum MailerError {
    /// トランスポートがメッセージを拒否した、または通信に失敗した
    ///
    /// メッセージはトランスポートのエラーをそのまま保持する。
    /// 呼び出し元はこの文字列を送信ログの `error_message` に記録し、
    /// 結果としてそのまま利用者へ返す。
    #[error("{0}")]
    SendFailed(String),

    /// エンベロープからトランスポートメッセージを構築できなかった
    ///
    /// 送信元/宛先アドレスのパース失敗など。送信試行に到達していないため、
    /// 配送失敗ではなくシステムフォールトとして伝播する。
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
}

/// 添付ファイル
///
/// 内容はバイト列のまま素通しする（再エンコード・スキャンは範囲外）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// ファイル名
    pub filename:     String,
    /// 生のファイル内容
    pub content:      Vec<u8>,
    /// MIME タイプ（例: `application/pdf`）
    pub content_type: String,
}

/// 送信エンベロープ
///
/// 認可解決済みの送信者アイデンティティと利用者入力から組み立てられ、
/// 配送ゲートウェイに渡される。`to` が空でないことは
/// オーケストレータが保証する（ゲートウェイでは再検証しない）。
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    /// From ヘッダの表示名
    pub from_display_name: String,
    /// From ヘッダのアドレス
    pub from_address:      String,
    /// 宛先（非空）
    pub to:                Vec<String>,
    /// CC 宛先
    pub cc:                Vec<String>,
    /// BCC 宛先
    pub bcc:               Vec<String>,
    /// 件名
    pub subject:           String,
    /// HTML 本文
    pub html:              String,
    /// 添付ファイル
    pub attachments:       Vec<Attachment>,
}

impl OutboundEmail {
    /// 認可解決済みのアイデンティティと入力からエンベロープを組み立てる
    pub fn build(
        identity: &SenderIdentity,
        to: Vec<String>,
        cc: Vec<String>,
        bcc: Vec<String>,
        subject: String,
        html: String,
        attachments: Vec<Attachment>,
    ) -> Self {
        Self {
            from_display_name: identity.display_name().as_str().to_string(),
            from_address: identity.email_address().as_str().to_string(),
            to,
            cc,
            bcc,
            subject,
            html,
            attachments,
        }
    }

    /// From ヘッダを `"DisplayName" <address>` 形式で整形する
    pub fn formatted_from(&self) -> String {
        format!("\"{}\" <{}>", self.from_display_name, self.from_address)
    }
}

/// カンマ区切りの宛先文字列をアドレスのリストに分解する
///
/// 各トークンを trim し、空トークンは捨てる。アドレス構文の検証は
/// 行わない（配送ゲートウェイ呼び出し前の構造検証は呼び出し元の責務）。
pub fn parse_address_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{
        identity::{DisplayName, SenderIdentityId},
        user::Email,
    };

    fn make_identity() -> SenderIdentity {
        SenderIdentity::new(
            SenderIdentityId::new(),
            DisplayName::new("Support Desk").unwrap(),
            Email::new("support@example.com").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_fromヘッダは表示名とアドレスを整形する() {
        let email = OutboundEmail::build(
            &make_identity(),
            vec!["a@x.com".to_string()],
            vec![],
            vec![],
            "Hi".to_string(),
            "<p>hi</p>".to_string(),
            vec![],
        );

        assert_eq!(email.formatted_from(), "\"Support Desk\" <support@example.com>");
    }

    #[rstest]
    #[case("a@x.com", vec!["a@x.com"])]
    #[case("a@x.com, b@y.com", vec!["a@x.com", "b@y.com"])]
    #[case("  a@x.com ,,  b@y.com  ", vec!["a@x.com", "b@y.com"])]
    #[case("", vec![])]
    #[case(" , , ", vec![])]
    fn test_宛先文字列の分解(#[case] input: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_address_list(input), expected);
    }

    #[test]
    fn test_エンベロープはアイデンティティのfrom情報を引き継ぐ() {
        let identity = make_identity();
        let email = OutboundEmail::build(
            &identity,
            vec!["a@x.com".to_string()],
            vec![],
            vec![],
            "Hi".to_string(),
            "<p>hi</p>".to_string(),
            vec![],
        );

        assert_eq!(email.from_display_name, "Support Desk");
        assert_eq!(email.from_address, "support@example.com");
    }
}
