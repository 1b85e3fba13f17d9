//! # ユースケース層
//!
//! MailGate のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリと配送ゲートウェイを `Arc<dyn Trait>` で
//!   外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **明示的なリクエスタ**: グローバルセッション状態を参照せず、
//!   すべての操作が [`Requester`]（ユーザー ID + 管理者フラグ）を
//!   明示的な引数として受け取る。`is_admin` はリクエスト開始時点の
//!   セッションロールから一度だけ導出され、処理中に再導出しない
//!
//! ## モジュール構成
//!
//! - [`send_email`]: 送信ワークフロー（認可解決 → 配送 → ログ記録）
//! - [`identity`]: 送信者アイデンティティ管理
//! - [`user`]: ユーザー・ロール管理
//! - [`permission`]: 送信許可の付与・取り消し
//! - [`template`]: メールテンプレート管理

pub mod identity;
pub mod permission;
pub mod send_email;
pub mod template;
pub mod user;

pub use identity::IdentityUseCaseImpl;
use mailgate_domain::user::UserId;
pub use permission::PermissionUseCaseImpl;
pub use send_email::{SendEmailInput, SendEmailUseCaseImpl, SendOutcome};
pub use template::TemplateUseCaseImpl;
pub use user::UserUseCaseImpl;

use crate::error::ApiError;

/// 操作のリクエスタ（認証済みの呼び出し元）
///
/// `is_admin` はセッションを終端する外部コラボレータがリクエスト開始時に
/// 導出した値。処理途中のロール変更は進行中の判断に影響しない。
#[derive(Debug, Clone)]
pub struct Requester {
    pub user_id:  UserId,
    pub is_admin: bool,
}

impl Requester {
    /// 管理者権限を要求する
    ///
    /// 管理操作（アイデンティティ・ユーザー・許可・テンプレートの変更）の
    /// 入口で呼び出す。
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_adminは管理者を通す() {
        let requester = Requester {
            user_id:  UserId::new(),
            is_admin: true,
        };

        assert!(requester.require_admin().is_ok());
    }

    #[test]
    fn test_require_adminは一般ユーザーを拒否する() {
        let requester = Requester {
            user_id:  UserId::new(),
            is_admin: false,
        };

        assert!(matches!(
            requester.require_admin(),
            Err(ApiError::Forbidden(_))
        ));
    }
}
