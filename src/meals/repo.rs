use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Meal, MealChanges, NewMeal};
use crate::session::SessionId;

/// Durable meal table. Every query is filtered by the owning session.
#[async_trait]
pub trait MealStore: Send + Sync {
    /// All meals of the session in storage order.
    async fn list(&self, session: &SessionId) -> anyhow::Result<Vec<Meal>>;
    /// All meals of the session, latest `time` first.
    async fn list_by_time_desc(&self, session: &SessionId) -> anyhow::Result<Vec<Meal>>;
    async fn find(&self, session: &SessionId, id: Uuid) -> anyhow::Result<Option<Meal>>;
    async fn insert(&self, meal: NewMeal) -> anyhow::Result<Meal>;
    /// Returns the number of rows changed.
    async fn update(
        &self,
        session: &SessionId,
        id: Uuid,
        changes: &MealChanges,
    ) -> anyhow::Result<u64>;
    /// Returns the number of rows removed.
    async fn delete(&self, session: &SessionId, id: Uuid) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgMealStore {
    db: PgPool,
}

impl PgMealStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealStore for PgMealStore {
    async fn list(&self, session: &SessionId) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, session_id, name, description, "time", "include", created_at
            FROM meals
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session.as_str())
        .fetch_all(&self.db)
        .await
        .context("list meals")?;
        Ok(rows)
    }

    async fn list_by_time_desc(&self, session: &SessionId) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, session_id, name, description, "time", "include", created_at
            FROM meals
            WHERE session_id = $1
            ORDER BY "time" COLLATE "C" DESC
            "#,
        )
        .bind(session.as_str())
        .fetch_all(&self.db)
        .await
        .context("list meals by time")?;
        Ok(rows)
    }

    async fn find(&self, session: &SessionId, id: Uuid) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, session_id, name, description, "time", "include", created_at
            FROM meals
            WHERE id = $1 AND session_id = $2
            "#,
        )
        .bind(id)
        .bind(session.as_str())
        .fetch_optional(&self.db)
        .await
        .context("find meal")?;
        Ok(meal)
    }

    async fn insert(&self, meal: NewMeal) -> anyhow::Result<Meal> {
        let row = sqlx::query_as::<_, Meal>(
            r#"
            INSERT INTO meals (id, session_id, name, description, "time", "include")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, session_id, name, description, "time", "include", created_at
            "#,
        )
        .bind(meal.id)
        .bind(&meal.session_id)
        .bind(&meal.name)
        .bind(&meal.description)
        .bind(&meal.time)
        .bind(meal.include)
        .fetch_one(&self.db)
        .await
        .context("insert meal")?;
        Ok(row)
    }

    async fn update(
        &self,
        session: &SessionId,
        id: Uuid,
        changes: &MealChanges,
    ) -> anyhow::Result<u64> {
        // NULL binds mean "keep the stored value".
        let res = sqlx::query(
            r#"
            UPDATE meals
               SET name        = COALESCE($3, name),
                   description = COALESCE($4, description),
                   "time"      = COALESCE($5, "time"),
                   "include"   = COALESCE($6, "include")
             WHERE id = $1 AND session_id = $2
            "#,
        )
        .bind(id)
        .bind(session.as_str())
        .bind(changes.name.as_option().map(String::as_str))
        .bind(changes.description.as_option().map(String::as_str))
        .bind(changes.time.as_option().map(String::as_str))
        .bind(changes.include.as_option().copied())
        .execute(&self.db)
        .await
        .context("update meal")?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, session: &SessionId, id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"DELETE FROM meals WHERE id = $1 AND session_id = $2"#)
            .bind(id)
            .bind(session.as_str())
            .execute(&self.db)
            .await
            .context("delete meal")?;
        Ok(res.rows_affected())
    }
}
