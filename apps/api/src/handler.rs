//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲
//! - リクエスタコンテキスト（`requester_id` + `is_admin`）はセッションを
//!   終端する外部コラボレータが付与する前提の内部 API

pub mod email;
pub mod health;
pub mod identity;
pub mod permission;
pub mod template;
pub mod user;

pub use email::{EmailState, list_email_logs, send_email};
pub use health::health_check;
pub use identity::{
    IdentityState,
    create_identity,
    delete_identity,
    list_identities,
    set_identity_active,
};
pub use permission::{PermissionState, list_permissions, set_permission};
pub use template::{
    TemplateState,
    create_template,
    delete_template,
    get_template,
    list_templates,
    update_template,
};
pub use user::{UserState, invite_user, list_users, update_user_role, update_user_status};
