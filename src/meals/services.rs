use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::meals::dto::{CreateMealRequest, Metrics};
use crate::meals::repo::MealStore;
use crate::meals::repo_types::{Meal, MealChanges, NewMeal, Patch};
use crate::session::SessionId;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 255;

fn validate_name(name: &str) -> Result<(), ApiError> {
    let n = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&n) {
        return Err(ApiError::validation(format!(
            "name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ApiError::validation(format!(
            "description must be at most {DESCRIPTION_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_changes(changes: &MealChanges) -> Result<(), ApiError> {
    if let Patch::Set(name) = &changes.name {
        validate_name(name)?;
    }
    if let Patch::Set(description) = &changes.description {
        validate_description(description)?;
    }
    Ok(())
}

/// Counts and longest on-diet streak over `meals` in the order given.
///
/// Callers pass meals latest-first; the streak resets on every off-diet meal.
pub fn compute_metrics(meals: &[Meal]) -> Metrics {
    let mut metrics = Metrics {
        recorded_meals: meals.len(),
        ..Metrics::default()
    };
    let mut streak = 0;
    for meal in meals {
        if meal.include {
            metrics.on_diet_meals += 1;
            streak += 1;
            metrics.best_sequence = metrics.best_sequence.max(streak);
        } else {
            metrics.off_diet_meals += 1;
            streak = 0;
        }
    }
    metrics
}

/// Session-scoped meal operations over an injected store.
#[derive(Clone)]
pub struct MealService {
    store: Arc<dyn MealStore>,
}

impl MealService {
    pub fn new(store: Arc<dyn MealStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, session: &SessionId) -> Result<Vec<Meal>, ApiError> {
        Ok(self.store.list(session).await?)
    }

    pub async fn get(&self, session: &SessionId, id: Uuid) -> Result<Option<Meal>, ApiError> {
        Ok(self.store.find(session, id).await?)
    }

    pub async fn create(
        &self,
        session: &SessionId,
        body: CreateMealRequest,
    ) -> Result<Meal, ApiError> {
        validate_name(&body.name)?;
        validate_description(&body.description)?;

        let meal = self
            .store
            .insert(NewMeal {
                id: Uuid::new_v4(),
                session_id: session.as_str().to_owned(),
                name: body.name,
                description: body.description,
                time: body.time,
                include: body.include,
            })
            .await?;
        Ok(meal)
    }

    /// Applies `changes` to the session's meal. Missing or foreign ids are a no-op.
    pub async fn update(
        &self,
        session: &SessionId,
        id: Uuid,
        changes: MealChanges,
    ) -> Result<(), ApiError> {
        validate_changes(&changes)?;
        if changes.is_empty() {
            return Ok(());
        }
        let rows = self.store.update(session, id, &changes).await?;
        debug!(%id, rows, "meal update applied");
        Ok(())
    }

    /// Missing or foreign ids are a no-op.
    pub async fn delete(&self, session: &SessionId, id: Uuid) -> Result<(), ApiError> {
        let rows = self.store.delete(session, id).await?;
        debug!(%id, rows, "meal delete applied");
        Ok(())
    }

    pub async fn metrics(&self, session: &SessionId) -> Result<Metrics, ApiError> {
        let meals = self.store.list_by_time_desc(session).await?;
        Ok(compute_metrics(&meals))
    }
}
