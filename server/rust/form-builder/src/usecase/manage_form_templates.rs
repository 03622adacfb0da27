use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::domain::entity::form_field::CreateFormField;
use crate::domain::entity::form_template::{
    CreateFormTemplate, FormTemplate, ReplaceFormFields, UpdateFormTemplate,
};
use crate::domain::repository::FormTemplateRepository;
use crate::domain::service::schema_service::SchemaGeneratorService;
use crate::domain::value_object::field_errors::FieldErrors;
use crate::domain::value_object::page::{Page, PageRequest};
use crate::usecase::has_caller;

#[derive(Debug, thiserror::Error)]
pub enum FormTemplateError {
    #[error("form template not found: {0}")]
    NotFound(Uuid),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("invalid page")]
    InvalidPage,
    #[error("authentication required")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for FormTemplateError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// テンプレートとフィールド定義の作成・全置換・並べ替え・削除を扱う。
pub struct ManageFormTemplatesUseCase {
    template_repo: Arc<dyn FormTemplateRepository>,
}

impl ManageFormTemplatesUseCase {
    pub fn new(template_repo: Arc<dyn FormTemplateRepository>) -> Self {
        Self { template_repo }
    }

    pub async fn list_templates(
        &self,
        page: PageRequest,
    ) -> Result<Page<FormTemplate>, FormTemplateError> {
        let (templates, total) = self.template_repo.find_all(&page).await?;
        if !page.is_valid_for(total) {
            return Err(FormTemplateError::InvalidPage);
        }
        Ok(Page::new(templates, total, &page))
    }

    pub async fn get_template(&self, id: Uuid) -> Result<FormTemplate, FormTemplateError> {
        self.template_repo
            .find_by_id(id)
            .await?
            .ok_or(FormTemplateError::NotFound(id))
    }

    pub async fn create_template(
        &self,
        input: CreateFormTemplate,
        created_by: &str,
    ) -> Result<FormTemplate, FormTemplateError> {
        if !has_caller(created_by) {
            return Err(FormTemplateError::Unauthorized);
        }
        input
            .validate()
            .map_err(|e| FormTemplateError::Validation(e.into()))?;

        let template = FormTemplate::new(
            input.name,
            input.description,
            created_by.to_string(),
            input.fields,
        );
        self.template_repo.create(&template).await?;

        tracing::info!(
            template_id = %template.id,
            field_count = template.fields.len(),
            created_by = %created_by,
            "form template created"
        );
        Ok(template)
    }

    /// 名前・説明を更新し、フィールドを全置換する。
    pub async fn update_template(
        &self,
        id: Uuid,
        input: UpdateFormTemplate,
        updated_by: &str,
    ) -> Result<FormTemplate, FormTemplateError> {
        if !has_caller(updated_by) {
            return Err(FormTemplateError::Unauthorized);
        }
        let mut template = self.get_template(id).await?;
        input
            .validate()
            .map_err(|e| FormTemplateError::Validation(e.into()))?;

        if let Some(name) = input.name {
            template.name = name;
        }
        if input.description.is_some() {
            template.description = input.description;
        }
        self.store_replacement(template, input.fields, updated_by).await
    }

    /// Destructive replace: every existing field (and any value recorded against it)
    /// is deleted and the list is rebuilt with positional order.
    pub async fn replace_fields(
        &self,
        id: Uuid,
        fields: Vec<CreateFormField>,
        updated_by: &str,
    ) -> Result<FormTemplate, FormTemplateError> {
        if !has_caller(updated_by) {
            return Err(FormTemplateError::Unauthorized);
        }
        let template = self.get_template(id).await?;
        let input = ReplaceFormFields { fields };
        input
            .validate()
            .map_err(|e| FormTemplateError::Validation(e.into()))?;
        self.store_replacement(template, input.fields, updated_by).await
    }

    async fn store_replacement(
        &self,
        mut template: FormTemplate,
        fields: Vec<CreateFormField>,
        updated_by: &str,
    ) -> Result<FormTemplate, FormTemplateError> {
        let removed = template.fields.len();
        template.replace_fields(fields);
        if !self.template_repo.replace(&template).await? {
            return Err(FormTemplateError::NotFound(template.id));
        }

        tracing::info!(
            template_id = %template.id,
            removed_fields = removed,
            field_count = template.fields.len(),
            updated_by = %updated_by,
            "form template fields replaced"
        );
        Ok(template)
    }

    pub async fn reorder_fields(
        &self,
        id: Uuid,
        field_ids: &[Uuid],
        updated_by: &str,
    ) -> Result<(), FormTemplateError> {
        if !has_caller(updated_by) {
            return Err(FormTemplateError::Unauthorized);
        }
        // 存在確認のみ。テンプレート外の ID はリポジトリ側で無視される。
        self.get_template(id).await?;
        let updated = self.template_repo.reorder_fields(id, field_ids).await?;

        tracing::info!(
            template_id = %id,
            requested = field_ids.len(),
            updated,
            "form fields reordered"
        );
        Ok(())
    }

    pub async fn delete_template(&self, id: Uuid, deleted_by: &str) -> Result<(), FormTemplateError> {
        if !has_caller(deleted_by) {
            return Err(FormTemplateError::Unauthorized);
        }
        if !self.template_repo.delete(id).await? {
            return Err(FormTemplateError::NotFound(id));
        }
        tracing::info!(template_id = %id, deleted_by = %deleted_by, "form template deleted");
        Ok(())
    }

    pub async fn get_template_schema(&self, id: Uuid) -> Result<serde_json::Value, FormTemplateError> {
        let template = self.get_template(id).await?;
        Ok(SchemaGeneratorService::generate_json_schema(&template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::form_template_repository::MockFormTemplateRepository;

    fn spec(label: &str) -> CreateFormField {
        CreateFormField {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn existing() -> FormTemplate {
        FormTemplate::new(
            "Onboarding".to_string(),
            Some("old".to_string()),
            "u1".to_string(),
            vec![spec("Name"), spec("Email")],
        )
    }

    #[tokio::test]
    async fn test_create_template_assigns_positional_order() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_create().times(1).returning(|_| Ok(()));

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let mut fields = vec![spec("Name"), spec("Email"), spec("Phone")];
        fields[0].order = Some(9);
        let input = CreateFormTemplate {
            name: "Onboarding".to_string(),
            description: None,
            fields,
        };

        let template = uc.create_template(input, "user-1").await.unwrap();
        let orders: Vec<u32> = template.fields.iter().map(|f| f.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(template.created_by, "user-1");
    }

    #[tokio::test]
    async fn test_create_template_blank_name_rejected_before_write() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_create().never();

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let input = CreateFormTemplate {
            name: String::new(),
            description: None,
            fields: vec![spec("Name")],
        };

        match uc.create_template(input, "user-1").await {
            Err(FormTemplateError::Validation(errors)) => assert!(errors.get("name").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_template_invalid_field_reported_with_index() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_create().never();

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let input = CreateFormTemplate {
            name: "Onboarding".to_string(),
            description: None,
            fields: vec![spec("Name"), spec("")],
        };

        match uc.create_template(input, "user-1").await {
            Err(FormTemplateError::Validation(errors)) => {
                assert!(errors.get("fields[1].label").is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_template_requires_caller() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_create().never();

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let input = CreateFormTemplate {
            name: "Onboarding".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            uc.create_template(input, "  ").await,
            Err(FormTemplateError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_replace_fields_not_found() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));
        mock.expect_replace().never();

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let id = Uuid::new_v4();
        match uc.replace_fields(id, vec![spec("Name")], "user-1").await {
            Err(FormTemplateError::NotFound(missing)) => assert_eq!(missing, id),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replace_fields_rebuilds_list() {
        let template = existing();
        let id = template.id;
        let old_ids: Vec<Uuid> = template.fields.iter().map(|f| f.id).collect();

        let mut mock = MockFormTemplateRepository::new();
        mock.expect_find_by_id()
            .withf(move |i| *i == id)
            .returning(move |_| Ok(Some(template.clone())));
        mock.expect_replace()
            .withf(|t| t.fields.len() == 1 && t.fields[0].label == "Phone")
            .times(1)
            .returning(|_| Ok(true));

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let updated = uc.replace_fields(id, vec![spec("Phone")], "user-1").await.unwrap();
        assert_eq!(updated.fields.len(), 1);
        assert_eq!(updated.fields[0].order, 0);
        assert!(!old_ids.contains(&updated.fields[0].id));
    }

    #[tokio::test]
    async fn test_replace_fields_invalid_type_rejected() {
        let template = existing();
        let id = template.id;

        let mut mock = MockFormTemplateRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(template.clone())));
        mock.expect_replace().never();

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let mut bad = spec("Gender");
        bad.field_type = Some("radio".to_string());
        match uc.replace_fields(id, vec![spec("Name"), bad], "user-1").await {
            Err(FormTemplateError::Validation(errors)) => {
                assert_eq!(
                    errors.get("fields[1].field_type"),
                    Some("\"radio\" is not a valid choice.")
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_template_keeps_name_when_absent() {
        let template = existing();
        let id = template.id;

        let mut mock = MockFormTemplateRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(template.clone())));
        mock.expect_replace().returning(|_| Ok(true));

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        let input = UpdateFormTemplate {
            name: None,
            description: Some("new".to_string()),
            fields: vec![spec("Name")],
        };
        let updated = uc.update_template(id, input, "user-1").await.unwrap();
        assert_eq!(updated.name, "Onboarding");
        assert_eq!(updated.description.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_reorder_fields_passes_ids_through() {
        let template = existing();
        let id = template.id;
        let ids = vec![template.fields[1].id, template.fields[0].id];
        let expected = ids.clone();

        let mut mock = MockFormTemplateRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(template.clone())));
        mock.expect_reorder_fields()
            .withf(move |tid, fids| *tid == id && fids == expected.as_slice())
            .times(1)
            .returning(|_, fids| Ok(fids.len() as u64));

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        uc.reorder_fields(id, &ids, "user-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_template_not_found() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_delete().returning(|_| Ok(false));

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        assert!(matches!(
            uc.delete_template(Uuid::new_v4(), "user-1").await,
            Err(FormTemplateError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_templates_invalid_page() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_find_all().returning(|_| Ok((vec![], 3)));

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        assert!(matches!(
            uc.list_templates(PageRequest::new(2, 10)).await,
            Err(FormTemplateError::InvalidPage)
        ));
    }

    #[tokio::test]
    async fn test_repository_failure_is_internal() {
        let mut mock = MockFormTemplateRepository::new();
        mock.expect_find_by_id()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let uc = ManageFormTemplatesUseCase::new(Arc::new(mock));
        match uc.get_template(Uuid::new_v4()).await {
            Err(FormTemplateError::Internal(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
