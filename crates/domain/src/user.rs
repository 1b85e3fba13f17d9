//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`User`] | ユーザー | 管理者による招待で作成される送信操作の主体 |
//! | [`UserRole`] | ロール | 粗粒度の認可軸。`admin` は許可テーブルを全面バイパス |
//! | [`UserStatus`] | ユーザー状態 | アカウント無効化（退職/異動時の即時アクセス停止） |
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **不変性**: エンティティフィールドは基本的に不変、変更はメソッド経由
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mailgate_domain::user::{Email, User, UserId, UserRole};
//!
//! // 新規ユーザー作成（招待）
//! let user = User::new(
//!     UserId::new(),
//!     Some(mailgate_domain::user::UserName::new("Taro Yamada")?),
//!     Email::new("user@example.com")?,
//!     UserRole::User,
//!     chrono::Utc::now(),
//! );
//!
//! // ロール確認
//! assert!(!user.is_admin());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

define_uuid_id! {
    /// ユーザー ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    /// Newtype パターンで型安全性を確保。
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー表示名（値オブジェクト）
    ///
    /// 招待時に任意で設定する。空文字列は許可しない（未設定は `None` で表現）。
    pub struct UserName {
        label: "user name",
        max_length: 100,
    }
}

/// メールアドレス（値オブジェクト）
///
/// RFC 5322 に準拠した形式を要求する。
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `@` を含み、ローカル部・ドメイン部が空でない
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "email address is required".to_string(),
            ));
        }

        // 基本的な構造検証: local@domain の形式であること
        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "email address format is invalid".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "email address format is invalid".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "email address must be at most 255 characters".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーロール
///
/// 粗粒度の認可軸。`Admin` は送信許可テーブルを参照せず
/// すべてのアクティブな送信者アイデンティティを使用できる。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    /// 管理者（アイデンティティ・ユーザー・テンプレート管理が可能）
    Admin,
    /// 一般ユーザー（許可された送信者アイデンティティのみ使用可能）
    User,
}

impl UserRole {
    /// 管理者ロールか判定する
    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl std::str::FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(DomainError::Validation(format!("invalid user role: {}", s))),
        }
    }
}

/// ユーザーステータス
///
/// ユーザーの状態を表現する列挙型。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    /// アクティブ（送信操作が可能）
    Active,
    /// 無効化（ログイン・送信不可）
    Disabled,
}

impl std::str::FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            _ => Err(DomainError::Validation(format!(
                "invalid user status: {}",
                s
            ))),
        }
    }
}

/// ユーザーエンティティ
///
/// システムのユーザーを表現する。OAuth 認証は外部コラボレータに委譲され、
/// セッションから導出されたロールはリクエストごとに明示的に受け渡される
/// （グローバルセッション状態をドメイン層で参照しない）。
///
/// # 不変条件
///
/// - `email` はシステム内で一意
/// - `status` が `Disabled` の場合、送信操作不可
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:         UserId,
    name:       Option<UserName>,
    email:      Email,
    role:       UserRole,
    status:     UserStatus,
    created_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成する（招待）
    ///
    /// # 引数
    ///
    /// - `id`: ユーザー ID
    /// - `name`: 表示名（招待時は未設定でもよい）
    /// - `email`: メールアドレス
    /// - `role`: 初期ロール
    /// - `now`: 現在日時（呼び出し元から注入）
    ///
    /// # 不変条件
    ///
    /// - 作成時のステータスは `Active`
    pub fn new(
        id: UserId,
        name: Option<UserName>,
        email: Email,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            status: UserStatus::Active,
            created_at: now,
        }
    }

    /// 既存のデータからユーザーを復元する（データベースから取得時）
    pub fn from_db(
        id: UserId,
        name: Option<UserName>,
        email: Email,
        role: UserRole,
        status: UserStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            status,
            created_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> Option<&UserName> {
        self.name.as_ref()
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ビジネスロジックメソッド

    /// 管理者か判定する
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// ユーザーがアクティブか判定する
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// ロールを変更した新しいインスタンスを返す
    pub fn with_role(self, role: UserRole) -> Self {
        Self { role, ..self }
    }

    /// ステータスを変更した新しいインスタンスを返す
    pub fn with_status(self, status: UserStatus) -> Self {
        Self { status, ..self }
    }
}
