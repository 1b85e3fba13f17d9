//! # リポジトリ実装
//!
//! 永続化操作のトレイトと PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケース層はトレイトにのみ依存する
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計
//! - **明示的なクエリ関数**: ORM のリレーション解決は使わず、
//!   `find_by_id` / `exists` のような平坦な関数でデータレコードを返す

pub mod email_log_repository;
pub mod permission_repository;
pub mod sender_identity_repository;
pub mod template_repository;
pub mod user_repository;

pub use email_log_repository::{EmailLogRepository, PostgresEmailLogRepository};
pub use permission_repository::{PermissionRepository, PostgresPermissionRepository};
pub use sender_identity_repository::{
    PostgresSenderIdentityRepository,
    SenderIdentityRepository,
};
pub use template_repository::{PostgresTemplateRepository, TemplateRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
