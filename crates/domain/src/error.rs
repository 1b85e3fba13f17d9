//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **HTTP ステータスへのマッピング**: API 層でステータスコードに変換可能
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 重複登録など |
//! | `Forbidden` | 403 Forbidden | 権限不足 |
//!
//! ## 使用例
//!
//! ```rust
//! use mailgate_domain::DomainError;
//!
//! fn validate_subject(subject: &str) -> Result<(), DomainError> {
//!     if subject.is_empty() {
//!         return Err(DomainError::Validation("Subject is required".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! fn find_identity(id: &str) -> Result<(), DomainError> {
//!     // データベースから検索...
//!     Err(DomainError::NotFound {
//!         entity_type: "SenderIdentity",
//!         id:          id.to_string(),
//!     })
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
///
/// # 設計判断
///
/// - `thiserror` を使用し、`std::error::Error` トレイトを自動実装
/// - 各バリアントに `#[error(...)]` で人間可読なメッセージを定義
/// - エラーメッセージは API 利用者に返るため英語で記述する
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 不正なメールアドレス形式
    #[error("validation error: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// 指定された ID のエンティティがデータベースに存在しない場合に使用する。
    /// `entity_type` にはエンティティの種類（"SenderIdentity", "User" など）を
    /// 指定し、エラーメッセージを具体的にする。
    ///
    /// # フィールド
    ///
    /// - `entity_type`: エンティティの種類（コンパイル時に決定される `&'static str`）
    /// - `id`: 検索に使用した識別子
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// エンティティの種類（"SenderIdentity", "User", "EmailTemplate" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー
    ///
    /// 既存データと矛盾する登録が要求された場合に使用する。
    /// 典型的には、登録済みメールアドレスでのユーザー招待時に発生する。
    #[error("conflict: {0}")]
    Conflict(String),

    /// 権限エラー
    ///
    /// ユーザーに操作の実行権限がない場合に使用する。
    /// 認証（Authentication）ではなく認可（Authorization）の失敗を表す。
    ///
    /// # 認証エラーとの違い
    ///
    /// - 認証エラー（401）: ユーザーが誰か不明
    /// - 認可エラー（403）: ユーザーは特定できたが、権限がない
    #[error("forbidden: {0}")]
    Forbidden(String),
}
