use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entity::record::{FieldValue, Record, RecordFilter};
use crate::domain::repository::record_repository::RecordRepository;
use crate::domain::value_object::page::PageRequest;

pub struct RecordPostgresRepository {
    pool: PgPool,
}

impl RecordPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_values(&self, record_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Vec<FieldValue>>> {
        let rows = sqlx::query_as::<_, FieldValueRow>(
            r#"SELECT v.id, v.employee_id, v.field_id, f.label, f.field_type, v.value
               FROM form_builder.employee_field_values v
               JOIN form_builder.form_fields f ON f.id = v.field_id
               WHERE v.employee_id = ANY($1)
               ORDER BY v.employee_id, f.display_order, f.id"#,
        )
        .bind(record_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<FieldValue>> = HashMap::new();
        for row in rows {
            grouped.entry(row.employee_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

/// ILIKE のワイルドカードをエスケープし、部分一致パターンにする。
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

async fn upsert_value(
    tx: &mut Transaction<'_, Postgres>,
    record_id: Uuid,
    value: &FieldValue,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"INSERT INTO form_builder.employee_field_values (id, employee_id, field_id, value)
           VALUES ($1, $2, $3, $4)
           ON CONFLICT ON CONSTRAINT uq_employee_field_values_employee_field
           DO UPDATE SET value = EXCLUDED.value"#,
    )
    .bind(value.id)
    .bind(record_id)
    .bind(value.field_id)
    .bind(&value.value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl RecordRepository for RecordPostgresRepository {
    async fn find_all(
        &self,
        filter: &RecordFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Record>, i64)> {
        let pattern = filter.search.as_deref().map(contains_pattern);

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM form_builder.employees e
               WHERE ($1::uuid IS NULL OR e.template_id = $1)
                 AND ($2::text IS NULL OR EXISTS (
                     SELECT 1 FROM form_builder.employee_field_values v
                     WHERE v.employee_id = e.id AND v.value ILIKE $2 ESCAPE '\'))"#,
        )
        .bind(filter.template_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, RecordRow>(
            r#"SELECT e.id, e.template_id, t.name AS template_name, e.created_by, e.created_at, e.updated_at
               FROM form_builder.employees e
               JOIN form_builder.form_templates t ON t.id = e.template_id
               WHERE ($1::uuid IS NULL OR e.template_id = $1)
                 AND ($2::text IS NULL OR EXISTS (
                     SELECT 1 FROM form_builder.employee_field_values v
                     WHERE v.employee_id = e.id AND v.value ILIKE $2 ESCAPE '\'))
               ORDER BY e.created_at DESC, e.id
               LIMIT $3 OFFSET $4"#,
        )
        .bind(filter.template_id)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut values = self.load_values(&ids).await?;
        let records = rows
            .into_iter()
            .map(|r| {
                let v = values.remove(&r.id).unwrap_or_default();
                r.into_record(v)
            })
            .collect();
        Ok((records, total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"SELECT e.id, e.template_id, t.name AS template_name, e.created_by, e.created_at, e.updated_at
               FROM form_builder.employees e
               JOIN form_builder.form_templates t ON t.id = e.template_id
               WHERE e.id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let values = self.load_values(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(row.into_record(values)))
    }

    async fn create(&self, record: &Record) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO form_builder.employees (id, template_id, created_by, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(record.id)
        .bind(record.template_id)
        .bind(&record.created_by)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await?;

        for value in &record.field_values {
            upsert_value(&mut tx, record.id, value).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_values(&self, record_id: Uuid, values: &[FieldValue]) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE form_builder.employees SET updated_at = now() WHERE id = $1")
            .bind(record_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for value in values {
            upsert_value(&mut tx, record_id, value).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM form_builder.employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    template_id: Uuid,
    template_name: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    fn into_record(self, field_values: Vec<FieldValue>) -> Record {
        Record {
            id: self.id,
            template_id: self.template_id,
            template_name: self.template_name,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            field_values,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FieldValueRow {
    id: Uuid,
    employee_id: Uuid,
    field_id: Uuid,
    label: String,
    field_type: String,
    value: Option<String>,
}

impl From<FieldValueRow> for FieldValue {
    fn from(row: FieldValueRow) -> Self {
        Self {
            id: row.id,
            record_id: row.employee_id,
            field_id: row.field_id,
            field_label: row.label,
            field_type: row.field_type.parse().unwrap_or_default(),
            value: row.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("alic"), "%alic%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
