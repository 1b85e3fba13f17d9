//! # ビジネスイベントログの構造化ヘルパー
//!
//! ログを `jq` で効率的に調査できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`event.action`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作者 ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const EMAIL: &str = "email";
        pub const IDENTITY: &str = "identity";
        pub const USER: &str = "user";
        pub const TEMPLATE: &str = "template";
    }

    /// イベントアクション
    pub mod action {
        // 送信ワークフロー
        pub const EMAIL_SENT: &str = "email.sent";
        pub const EMAIL_FAILED: &str = "email.failed";

        // 送信者アイデンティティ管理
        pub const IDENTITY_CREATED: &str = "identity.created";
        pub const IDENTITY_STATUS_CHANGED: &str = "identity.status_changed";
        pub const IDENTITY_DELETED: &str = "identity.deleted";

        // ユーザー・権限管理
        pub const USER_INVITED: &str = "user.invited";
        pub const USER_ROLE_CHANGED: &str = "user.role_changed";
        pub const USER_STATUS_CHANGED: &str = "user.status_changed";
        pub const PERMISSION_GRANTED: &str = "permission.granted";
        pub const PERMISSION_REVOKED: &str = "permission.revoked";

        // テンプレート管理
        pub const TEMPLATE_CREATED: &str = "template.created";
        pub const TEMPLATE_UPDATED: &str = "template.updated";
        pub const TEMPLATE_DELETED: &str = "template.deleted";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const EMAIL_LOG: &str = "email_log";
        pub const SENDER_IDENTITY: &str = "sender_identity";
        pub const USER: &str = "user";
        pub const EMAIL_TEMPLATE: &str = "email_template";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}
