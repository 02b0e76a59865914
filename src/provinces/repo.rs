use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Province (Intara) record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Province {
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Province {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Province>, sqlx::Error> {
        sqlx::query_as::<_, Province>(
            r#"
            SELECT id, name, description, latitude, longitude, created_at, updated_at
            FROM provinces
            ORDER BY name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: &str) -> Result<Option<Province>, sqlx::Error> {
        sqlx::query_as::<_, Province>(
            r#"
            SELECT id, name, description, latitude, longitude, created_at, updated_at
            FROM provinces
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> Result<Option<Province>, sqlx::Error> {
        sqlx::query_as::<_, Province>(
            r#"
            SELECT id, name, description, latitude, longitude, created_at, updated_at
            FROM provinces
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        id: &str,
        name: &str,
        description: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Province, sqlx::Error> {
        sqlx::query_as::<_, Province>(
            r#"
            INSERT INTO provinces (id, name, description, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, latitude, longitude, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(db)
        .await
    }

    /// Partial update; absent fields keep their stored values.
    pub async fn update(
        db: &PgPool,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Province>, sqlx::Error> {
        sqlx::query_as::<_, Province>(
            r#"
            UPDATE provinces
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, latitude, longitude, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(db)
        .await
    }

    /// Returns true when a row was deleted.
    pub async fn delete(db: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM provinces WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
