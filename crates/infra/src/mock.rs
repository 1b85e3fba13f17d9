//! # テスト用モック実装
//!
//! ユースケーステストで使用するインメモリモックリポジトリとモック配送
//! ゲートウェイ。`test-utils` feature を有効にすることで、他クレートからも
//! 利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! mailgate-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailgate_domain::{
    identity::{SenderIdentity, SenderIdentityId},
    mail::{MailerError, OutboundEmail},
    send_log::EmailLog,
    template::{EmailTemplate, EmailTemplateId},
    user::{Email, User, UserId, UserRole, UserStatus},
};

use crate::{
    error::InfraError,
    mailer::{Mailer, generate_message_id},
    repository::{
        EmailLogRepository,
        PermissionRepository,
        SenderIdentityRepository,
        TemplateRepository,
        UserRepository,
    },
};

// ===== MockMailer =====

/// テスト用のモック配送ゲートウェイ
///
/// 送信されたエンベロープを記録する。`set_failure` でトランスポート失敗を、
/// `set_envelope_fault` でエンベロープ構築フォールトを再現できる。
#[derive(Clone, Default)]
pub struct MockMailer {
    sent:           Arc<Mutex<Vec<OutboundEmail>>>,
    failure:        Arc<Mutex<Option<String>>>,
    envelope_fault: Arc<Mutex<Option<String>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次回以降の送信をトランスポート失敗にする
    pub fn set_failure(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// 次回以降の送信をエンベロープ構築フォールトにする
    pub fn set_envelope_fault(&self, message: impl Into<String>) {
        *self.envelope_fault.lock().unwrap() = Some(message.into());
    }

    /// 記録された送信エンベロープを取得する
    pub fn sent_emails(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError> {
        if let Some(message) = self.envelope_fault.lock().unwrap().clone() {
            return Err(MailerError::InvalidEnvelope(message));
        }
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(MailerError::SendFailed(message));
        }

        self.sent.lock().unwrap().push(email.clone());
        Ok(generate_message_id(email))
    }
}

// ===== MockSenderIdentityRepository =====

#[derive(Clone, Default)]
pub struct MockSenderIdentityRepository {
    identities: Arc<Mutex<Vec<SenderIdentity>>>,
}

impl MockSenderIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_identity(&self, identity: SenderIdentity) {
        self.identities.lock().unwrap().push(identity);
    }

    pub fn identities(&self) -> Vec<SenderIdentity> {
        self.identities.lock().unwrap().clone()
    }
}

#[async_trait]
impl SenderIdentityRepository for MockSenderIdentityRepository {
    async fn insert(&self, identity: &SenderIdentity) -> Result<(), InfraError> {
        self.identities.lock().unwrap().push(identity.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SenderIdentityId,
    ) -> Result<Option<SenderIdentity>, InfraError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id() == id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<SenderIdentity>, InfraError> {
        Ok(self.identities.lock().unwrap().clone())
    }

    async fn find_all_active(&self) -> Result<Vec<SenderIdentity>, InfraError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.is_active())
            .cloned()
            .collect())
    }

    async fn set_active(
        &self,
        id: &SenderIdentityId,
        is_active: bool,
    ) -> Result<(), InfraError> {
        let mut identities = self.identities.lock().unwrap();
        if let Some(pos) = identities.iter().position(|i| i.id() == id) {
            let updated = identities[pos].clone().with_active(is_active);
            identities[pos] = updated;
        }
        Ok(())
    }

    async fn delete(&self, id: &SenderIdentityId) -> Result<(), InfraError> {
        self.identities.lock().unwrap().retain(|i| i.id() != id);
        Ok(())
    }
}

// ===== MockPermissionRepository =====

#[derive(Clone, Default)]
pub struct MockPermissionRepository {
    grants: Arc<Mutex<Vec<(UserId, SenderIdentityId)>>>,
}

impl MockPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_grant(&self, user_id: UserId, sender_identity_id: SenderIdentityId) {
        self.grants
            .lock()
            .unwrap()
            .push((user_id, sender_identity_id));
    }

    /// 重複許容の検証用に、一致する行数を返す
    pub fn grant_count(&self, user_id: &UserId, sender_identity_id: &SenderIdentityId) -> usize {
        self.grants
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, s)| u == user_id && s == sender_identity_id)
            .count()
    }
}

#[async_trait]
impl PermissionRepository for MockPermissionRepository {
    async fn exists(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<bool, InfraError> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .iter()
            .any(|(u, s)| u == user_id && s == sender_identity_id))
    }

    async fn grant(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
        _now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        let mut grants = self.grants.lock().unwrap();
        let present = grants
            .iter()
            .any(|(u, s)| u == user_id && s == sender_identity_id);
        if !present {
            grants.push((user_id.clone(), sender_identity_id.clone()));
        }
        Ok(())
    }

    async fn revoke(
        &self,
        user_id: &UserId,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<(), InfraError> {
        self.grants
            .lock()
            .unwrap()
            .retain(|(u, s)| !(u == user_id && s == sender_identity_id));
        Ok(())
    }

    async fn find_identity_ids_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SenderIdentityId>, InfraError> {
        let mut ids: Vec<SenderIdentityId> = self
            .grants
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, s)| s.clone())
            .collect();
        ids.dedup();
        Ok(ids)
    }
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn insert(&self, user: &User) -> Result<(), InfraError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id() == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, InfraError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update_role(&self, id: &UserId, role: UserRole) -> Result<(), InfraError> {
        let mut users = self.users.lock().unwrap();
        if let Some(pos) = users.iter().position(|u| u.id() == id) {
            let updated = users[pos].clone().with_role(role);
            users[pos] = updated;
        }
        Ok(())
    }

    async fn update_status(&self, id: &UserId, status: UserStatus) -> Result<(), InfraError> {
        let mut users = self.users.lock().unwrap();
        if let Some(pos) = users.iter().position(|u| u.id() == id) {
            let updated = users[pos].clone().with_status(status);
            users[pos] = updated;
        }
        Ok(())
    }
}

// ===== MockEmailLogRepository =====

/// テスト用のモック EmailLogRepository
///
/// `set_insert_failure` で永続化フォールト（監査保証の破れ）を再現できる。
#[derive(Clone, Default)]
pub struct MockEmailLogRepository {
    logs:           Arc<Mutex<Vec<EmailLog>>>,
    insert_failure: Arc<Mutex<Option<String>>>,
}

impl MockEmailLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次回以降の挿入を失敗させる
    pub fn set_insert_failure(&self, message: impl Into<String>) {
        *self.insert_failure.lock().unwrap() = Some(message.into());
    }

    /// 記録されたログを取得する
    pub fn logs(&self) -> Vec<EmailLog> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailLogRepository for MockEmailLogRepository {
    async fn insert(&self, log: &EmailLog) -> Result<(), InfraError> {
        if let Some(message) = self.insert_failure.lock().unwrap().clone() {
            return Err(InfraError::unexpected(message));
        }
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }

    async fn find_recent(&self, limit: i64) -> Result<Vec<EmailLog>, InfraError> {
        let mut logs = self.logs.lock().unwrap().clone();
        logs.sort_by_key(|l| std::cmp::Reverse(l.sent_at()));
        logs.truncate(limit as usize);
        Ok(logs)
    }

    async fn find_recent_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<EmailLog>, InfraError> {
        let mut logs: Vec<EmailLog> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id() == user_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| std::cmp::Reverse(l.sent_at()));
        logs.truncate(limit as usize);
        Ok(logs)
    }

    async fn count_for_identity(
        &self,
        sender_identity_id: &SenderIdentityId,
    ) -> Result<i64, InfraError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.sender_identity_id() == sender_identity_id)
            .count() as i64)
    }
}

// ===== MockTemplateRepository =====

#[derive(Clone, Default)]
pub struct MockTemplateRepository {
    templates: Arc<Mutex<Vec<EmailTemplate>>>,
}

impl MockTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&self, template: EmailTemplate) {
        self.templates.lock().unwrap().push(template);
    }

    pub fn templates(&self) -> Vec<EmailTemplate> {
        self.templates.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateRepository for MockTemplateRepository {
    async fn insert(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        self.templates.lock().unwrap().push(template.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &EmailTemplateId,
    ) -> Result<Option<EmailTemplate>, InfraError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id() == id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<EmailTemplate>, InfraError> {
        let mut templates = self.templates.lock().unwrap().clone();
        templates.sort_by_key(|t| std::cmp::Reverse(t.created_at()));
        Ok(templates)
    }

    async fn update(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        let mut templates = self.templates.lock().unwrap();
        if let Some(pos) = templates.iter().position(|t| t.id() == template.id()) {
            templates[pos] = template.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &EmailTemplateId) -> Result<(), InfraError> {
        self.templates.lock().unwrap().retain(|t| t.id() != id);
        Ok(())
    }
}
