use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entity::form_field::FormField;
use crate::domain::entity::form_template::FormTemplate;
use crate::domain::repository::form_template_repository::FormTemplateRepository;
use crate::domain::value_object::page::PageRequest;

pub struct FormTemplatePostgresRepository {
    pool: PgPool,
}

impl FormTemplatePostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_fields(&self, template_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Vec<FormField>>> {
        let rows = sqlx::query_as::<_, FormFieldRow>(
            r#"SELECT id, template_id, label, field_type, placeholder, options, required, display_order
               FROM form_builder.form_fields
               WHERE template_id = ANY($1)
               ORDER BY template_id, display_order, id"#,
        )
        .bind(template_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<FormField>> = HashMap::new();
        for row in rows {
            grouped.entry(row.template_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

async fn insert_fields(tx: &mut Transaction<'_, Postgres>, fields: &[FormField]) -> anyhow::Result<()> {
    for field in fields {
        sqlx::query(
            r#"INSERT INTO form_builder.form_fields
               (id, template_id, label, field_type, placeholder, options, required, display_order)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(field.id)
        .bind(field.template_id)
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(&field.placeholder)
        .bind(field.options.as_ref().map(Json))
        .bind(field.required)
        .bind(i32::try_from(field.order).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl FormTemplateRepository for FormTemplatePostgresRepository {
    async fn find_all(&self, page: &PageRequest) -> anyhow::Result<(Vec<FormTemplate>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM form_builder.form_templates")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, FormTemplateRow>(
            r#"SELECT id, name, description, created_by, created_at, updated_at
               FROM form_builder.form_templates
               ORDER BY created_at DESC, id
               LIMIT $1 OFFSET $2"#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut fields = self.load_fields(&ids).await?;
        let templates = rows
            .into_iter()
            .map(|r| {
                let f = fields.remove(&r.id).unwrap_or_default();
                r.into_template(f)
            })
            .collect();
        Ok((templates, total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<FormTemplate>> {
        let row = sqlx::query_as::<_, FormTemplateRow>(
            r#"SELECT id, name, description, created_by, created_at, updated_at
               FROM form_builder.form_templates WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let fields = self.load_fields(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(row.into_template(fields)))
    }

    async fn create(&self, template: &FormTemplate) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO form_builder.form_templates
               (id, name, description, created_by, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.created_by)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&mut *tx)
        .await?;
        insert_fields(&mut tx, &template.fields).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace(&self, template: &FormTemplate) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"UPDATE form_builder.form_templates
               SET name = $2, description = $3, updated_at = $4
               WHERE id = $1"#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.updated_at)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        // 値は employee_field_values.field_id の ON DELETE CASCADE で消える
        sqlx::query("DELETE FROM form_builder.form_fields WHERE template_id = $1")
            .bind(template.id)
            .execute(&mut *tx)
            .await?;
        insert_fields(&mut tx, &template.fields).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn reorder_fields(&self, template_id: Uuid, field_ids: &[Uuid]) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for (i, field_id) in field_ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE form_builder.form_fields SET display_order = $1 WHERE id = $2 AND template_id = $3",
            )
            .bind(i32::try_from(i).unwrap_or(i32::MAX))
            .bind(field_id)
            .bind(template_id)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM form_builder.form_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct FormTemplateRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FormTemplateRow {
    fn into_template(self, fields: Vec<FormField>) -> FormTemplate {
        FormTemplate {
            id: self.id,
            name: self.name,
            description: self.description,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            fields,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FormFieldRow {
    id: Uuid,
    template_id: Uuid,
    label: String,
    field_type: String,
    placeholder: Option<String>,
    options: Option<Json<Vec<String>>>,
    required: bool,
    display_order: i32,
}

impl From<FormFieldRow> for FormField {
    fn from(row: FormFieldRow) -> Self {
        Self {
            id: row.id,
            template_id: row.template_id,
            label: row.label,
            // 未知の種別はテキスト扱い
            field_type: row.field_type.parse().unwrap_or_default(),
            placeholder: row.placeholder,
            options: row.options.map(|o| o.0),
            required: row.required,
            order: u32::try_from(row.display_order).unwrap_or(0),
        }
    }
}
