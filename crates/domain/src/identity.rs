//! # 送信者アイデンティティ
//!
//! 組織で共有される送信元（From アドレス）を表すエンティティを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`SenderIdentity`] | 送信者アイデンティティ | 組織所有の From アドレス。個人所有ではない |
//! | [`DisplayName`] | 表示名 | From ヘッダの `"DisplayName" <address>` に使用 |
//!
//! ## 設計方針
//!
//! - **不変性**: `display_name` と `email_address` は作成後変更不可。
//!   変更可能なのは `is_active` トグルのみ（管理者操作）
//! - **論理的な無効化**: 無効化されたアイデンティティは認可解決で
//!   一律 `Inactive` 拒否となる（管理者も例外ではない）

use chrono::{DateTime, Utc};

use crate::user::Email;

define_uuid_id! {
    /// 送信者アイデンティティ ID（一意識別子）
    pub struct SenderIdentityId;
}

define_validated_string! {
    /// 送信者表示名（値オブジェクト）
    ///
    /// From ヘッダに表示される名前。最低限の長さ制限のみ課す。
    pub struct DisplayName {
        label: "display name",
        max_length: 100,
    }
}

/// 送信者アイデンティティエンティティ
///
/// 組織が所有する共有 From アドレス。ユーザーは許可された
/// アイデンティティを通してのみメールを送信できる。
///
/// # 不変条件
///
/// - `display_name` / `email_address` は作成後不変
/// - 可変なのは `is_active` のみ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    id:            SenderIdentityId,
    display_name:  DisplayName,
    email_address: Email,
    is_active:     bool,
    created_at:    DateTime<Utc>,
}

impl SenderIdentity {
    /// 新しい送信者アイデンティティを作成する
    ///
    /// # 不変条件
    ///
    /// - 作成時は常にアクティブ
    pub fn new(
        id: SenderIdentityId,
        display_name: DisplayName,
        email_address: Email,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name,
            email_address,
            is_active: true,
            created_at: now,
        }
    }

    /// 既存のデータからアイデンティティを復元する（データベースから取得時）
    pub fn from_db(
        id: SenderIdentityId,
        display_name: DisplayName,
        email_address: Email,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name,
            email_address,
            is_active,
            created_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &SenderIdentityId {
        &self.id
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn email_address(&self) -> &Email {
        &self.email_address
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// アクティブ状態を変更した新しいインスタンスを返す
    pub fn with_active(self, is_active: bool) -> Self {
        Self { is_active, ..self }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[fixture]
    fn identity(now: DateTime<Utc>) -> SenderIdentity {
        SenderIdentity::new(
            SenderIdentityId::new(),
            DisplayName::new("Support Desk").unwrap(),
            Email::new("support@example.com").unwrap(),
            now,
        )
    }

    #[rstest]
    fn test_新規アイデンティティはアクティブ(identity: SenderIdentity) {
        assert!(identity.is_active());
    }

    #[rstest]
    fn test_無効化後の状態(identity: SenderIdentity) {
        let original = identity.clone();
        let sut = identity.with_active(false);

        let expected = SenderIdentity::from_db(
            original.id().clone(),
            original.display_name().clone(),
            original.email_address().clone(),
            false,
            original.created_at(),
        );
        assert_eq!(sut, expected);
        assert!(!sut.is_active());
    }

    #[rstest]
    fn test_再有効化できる(identity: SenderIdentity) {
        let sut = identity.with_active(false).with_active(true);

        assert!(sut.is_active());
    }

    #[test]
    fn test_表示名は空文字列を拒否する() {
        assert!(DisplayName::new("").is_err());
        assert!(DisplayName::new("   ").is_err());
    }

    #[test]
    fn test_表示名は前後の空白を除去する() {
        let name = DisplayName::new("  Support Desk  ").unwrap();
        assert_eq!(name.as_str(), "Support Desk");
    }
}
