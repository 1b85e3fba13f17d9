//! # MailGate ドメイン層
//!
//! 送信ワークフローの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: SenderIdentity,
//!   EmailLog）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Email,
//!   ContentHash）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層（DB、SMTP）には一切依存しない。
//! これにより、送信認可や監査ログのビジネスロジックの純粋性が保たれる。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`user`] - ユーザーエンティティとロール
//! - [`identity`] - 送信者アイデンティティ
//! - [`mail`] - 送信エンベロープと配送エラー
//! - [`send_log`] - 送信ログ（append-only 監査証跡）
//! - [`template`] - メールテンプレート
//!
//! ## 使用例
//!
//! ```rust
//! use mailgate_domain::{DomainError, identity::SenderIdentityId};
//!
//! // 送信者アイデンティティ ID の生成
//! let identity_id = SenderIdentityId::new();
//!
//! // ドメインエラーの生成
//! let error = DomainError::NotFound {
//!     entity_type: "SenderIdentity",
//!     id:          identity_id.to_string(),
//! };
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod error;
pub mod identity;
pub mod mail;
pub mod send_log;
pub mod template;
pub mod user;

pub use error::DomainError;
