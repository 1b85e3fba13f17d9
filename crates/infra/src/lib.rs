//! # MailGate インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはリポジトリトレイトと配送ゲートウェイの具体的な実装を
//! 提供する。外部システムの詳細をカプセル化し、ドメイン層を
//! インフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理
//! - **リポジトリ実装**: ユーザー・アイデンティティ・許可・送信ログ・
//!   テンプレートの永続化
//! - **配送ゲートウェイ**: SMTP トランスポート（lettre）のラップ
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain
//!          ↘      ↓
//!            shared
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`mailer`] - 配送ゲートウェイ（SMTP / Noop）
//! - [`repository`] - リポジトリ実装
//! - [`mock`] - テスト用インメモリ実装（`test-utils` feature）

pub mod db;
pub mod error;
pub mod mailer;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::InfraError;
pub use mailer::Mailer;
