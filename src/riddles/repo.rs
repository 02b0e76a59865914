use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Difficulty scale for riddles, mirroring the `complexity_level` enum in
/// the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "complexity_level")]
pub enum ComplexityLevel {
    #[sqlx(rename = "LEVEL_1")]
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[sqlx(rename = "LEVEL_2")]
    #[serde(rename = "LEVEL_2")]
    Level2,
    #[sqlx(rename = "LEVEL_3")]
    #[serde(rename = "LEVEL_3")]
    Level3,
    #[sqlx(rename = "LEVEL_4")]
    #[serde(rename = "LEVEL_4")]
    Level4,
    #[sqlx(rename = "LEVEL_5")]
    #[serde(rename = "LEVEL_5")]
    Level5,
    #[sqlx(rename = "LEVEL_6")]
    #[serde(rename = "LEVEL_6")]
    Level6,
    #[sqlx(rename = "LEVEL_7")]
    #[serde(rename = "LEVEL_7")]
    Level7,
}

/// Riddle (igisakuzo) record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Riddle {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub hints: Vec<String>,
    pub complexity_level: ComplexityLevel,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Riddle {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Riddle>, sqlx::Error> {
        sqlx::query_as::<_, Riddle>(
            r#"
            SELECT id, question, answer, hints, complexity_level, created_at, updated_at
            FROM riddles
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: &str) -> Result<Option<Riddle>, sqlx::Error> {
        sqlx::query_as::<_, Riddle>(
            r#"
            SELECT id, question, answer, hints, complexity_level, created_at, updated_at
            FROM riddles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        id: &str,
        question: &str,
        answer: &str,
        hints: &[String],
        complexity_level: ComplexityLevel,
    ) -> Result<Riddle, sqlx::Error> {
        sqlx::query_as::<_, Riddle>(
            r#"
            INSERT INTO riddles (id, question, answer, hints, complexity_level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, question, answer, hints, complexity_level, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(question)
        .bind(answer)
        .bind(hints)
        .bind(complexity_level)
        .fetch_one(db)
        .await
    }

    /// Partial update; absent fields keep their stored values.
    pub async fn update(
        db: &PgPool,
        id: &str,
        question: Option<&str>,
        answer: Option<&str>,
        hints: Option<&[String]>,
        complexity_level: Option<ComplexityLevel>,
    ) -> Result<Option<Riddle>, sqlx::Error> {
        sqlx::query_as::<_, Riddle>(
            r#"
            UPDATE riddles
            SET question = COALESCE($2, question),
                answer = COALESCE($3, answer),
                hints = COALESCE($4, hints),
                complexity_level = COALESCE($5, complexity_level),
                updated_at = now()
            WHERE id = $1
            RETURNING id, question, answer, hints, complexity_level, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(question)
        .bind(answer)
        .bind(hints)
        .bind(complexity_level)
        .fetch_optional(db)
        .await
    }

    /// Returns true when a row was deleted.
    pub async fn delete(db: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM riddles WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
