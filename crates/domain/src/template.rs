//! # メールテンプレート
//!
//! 再利用可能な HTML テンプレートのエンティティを定義する。
//!
//! ## 設計方針
//!
//! - テンプレートは送信ワークフローの「本文の供給源」にすぎない。
//!   レンダリングエンジンは持たず、保存済み HTML をそのまま本文に流し込む
//! - 作成・更新・削除は管理者のみ。閲覧は全認証ユーザーが可能

use chrono::{DateTime, Utc};

use crate::user::UserId;

define_uuid_id! {
    /// メールテンプレート ID（一意識別子）
    pub struct EmailTemplateId;
}

define_validated_string! {
    /// テンプレート名（値オブジェクト）
    pub struct TemplateName {
        label: "template name",
        max_length: 100,
    }
}

/// メールテンプレートエンティティ
///
/// 管理者が作成・編集する再利用可能な HTML 本文。
///
/// # 不変条件
///
/// - `html_content` は空でない（ユースケース層で検証）
/// - `updated_at` は内容変更のたびに更新される
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    id:           EmailTemplateId,
    name:         TemplateName,
    description:  Option<String>,
    html_content: String,
    created_by:   UserId,
    created_at:   DateTime<Utc>,
    updated_at:   DateTime<Utc>,
}

impl EmailTemplate {
    /// 新しいテンプレートを作成する
    pub fn new(
        id: EmailTemplateId,
        name: TemplateName,
        description: Option<String>,
        html_content: String,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            html_content,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータからテンプレートを復元する（データベースから取得時）
    pub fn from_db(
        id: EmailTemplateId,
        name: TemplateName,
        description: Option<String>,
        html_content: String,
        created_by: UserId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            html_content,
            created_by,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &EmailTemplateId {
        &self.id
    }

    pub fn name(&self) -> &TemplateName {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn html_content(&self) -> &str {
        &self.html_content
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 内容を更新した新しいインスタンスを返す
    ///
    /// `updated_at` を更新時刻で置き換える。`created_by` と `created_at`
    /// は作成時のまま保持する。
    pub fn with_content(
        self,
        name: TemplateName,
        description: Option<String>,
        html_content: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            description,
            html_content,
            updated_at: now,
            ..self
        }
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
    fn template(now: DateTime<Utc>) -> EmailTemplate {
        EmailTemplate::new(
            EmailTemplateId::new(),
            TemplateName::new("Monthly Newsletter").unwrap(),
            Some("Sent on the first Monday".to_string()),
            "<h1>News</h1>".to_string(),
            UserId::new(),
            now,
        )
    }

    #[rstest]
    fn test_作成時はcreated_atとupdated_atが一致する(template: EmailTemplate) {
        assert_eq!(template.created_at(), template.updated_at());
    }

    #[rstest]
    fn test_内容更新後の状態(template: EmailTemplate) {
        let update_time = DateTime::from_timestamp(1_700_001_000, 0).unwrap();
        let original = template.clone();
        let new_name = TemplateName::new("Weekly Newsletter").unwrap();
        let sut = template.with_content(
            new_name.clone(),
            None,
            "<h1>Weekly</h1>".to_string(),
            update_time,
        );

        let expected = EmailTemplate::from_db(
            original.id().clone(),
            new_name,
            None,
            "<h1>Weekly</h1>".to_string(),
            original.created_by().clone(),
            original.created_at(),
            update_time,
        );
        assert_eq!(sut, expected);
    }

    #[rstest]
    fn test_更新でcreated_byは変わらない(template: EmailTemplate) {
        let update_time = DateTime::from_timestamp(1_700_001_000, 0).unwrap();
        let original_creator = template.created_by().clone();
        let sut = template.with_content(
            TemplateName::new("Renamed").unwrap(),
            None,
            "<p>x</p>".to_string(),
            update_time,
        );

        assert_eq!(sut.created_by(), &original_creator);
    }
}
