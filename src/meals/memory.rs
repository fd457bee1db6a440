use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::MealStore;
use super::repo_types::{Meal, MealChanges, NewMeal};
use crate::session::SessionId;

/// Process-local store. Insertion order is storage order.
#[derive(Default)]
pub struct MemoryMealStore {
    meals: RwLock<Vec<Meal>>,
}

#[async_trait]
impl MealStore for MemoryMealStore {
    async fn list(&self, session: &SessionId) -> anyhow::Result<Vec<Meal>> {
        let meals = self.meals.read().await;
        Ok(meals
            .iter()
            .filter(|m| m.session_id == session.as_str())
            .cloned()
            .collect())
    }

    async fn list_by_time_desc(&self, session: &SessionId) -> anyhow::Result<Vec<Meal>> {
        let mut rows = self.list(session).await?;
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(rows)
    }

    async fn find(&self, session: &SessionId, id: Uuid) -> anyhow::Result<Option<Meal>> {
        let meals = self.meals.read().await;
        Ok(meals
            .iter()
            .find(|m| m.id == id && m.session_id == session.as_str())
            .cloned())
    }

    async fn insert(&self, meal: NewMeal) -> anyhow::Result<Meal> {
        let mut meals = self.meals.write().await;
        anyhow::ensure!(
            meals.iter().all(|m| m.id != meal.id),
            "duplicate meal id {}",
            meal.id
        );
        let row = Meal {
            id: meal.id,
            session_id: meal.session_id,
            name: meal.name,
            description: meal.description,
            time: meal.time,
            include: meal.include,
            created_at: OffsetDateTime::now_utc(),
        };
        meals.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        session: &SessionId,
        id: Uuid,
        changes: &MealChanges,
    ) -> anyhow::Result<u64> {
        let mut meals = self.meals.write().await;
        match meals
            .iter_mut()
            .find(|m| m.id == id && m.session_id == session.as_str())
        {
            Some(meal) => {
                changes.apply_to(meal);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, session: &SessionId, id: Uuid) -> anyhow::Result<u64> {
        let mut meals = self.meals.write().await;
        let before = meals.len();
        meals.retain(|m| !(m.id == id && m.session_id == session.as_str()));
        Ok((before - meals.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meals::repo_types::Patch;

    fn session(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    fn new_meal(session_id: &str, name: &str, time: &str) -> NewMeal {
        NewMeal {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            name: name.into(),
            description: String::new(),
            time: time.into(),
            include: true,
        }
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_and_scopes_by_session() {
        let store = MemoryMealStore::default();
        store.insert(new_meal("a", "first", "2024-01-02")).await.unwrap();
        store.insert(new_meal("b", "other", "2024-01-01")).await.unwrap();
        store.insert(new_meal("a", "second", "2024-01-01")).await.unwrap();

        let names: Vec<_> = store
            .list(&session("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(store.list(&session("b")).await.unwrap().len(), 1);
        assert!(store.list(&session("c")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_by_time_desc_orders_latest_first() {
        let store = MemoryMealStore::default();
        store.insert(new_meal("a", "mid", "2024-01-02T12:00")).await.unwrap();
        store.insert(new_meal("a", "early", "2024-01-01T08:00")).await.unwrap();
        store.insert(new_meal("a", "late", "2024-01-03T20:00")).await.unwrap();

        let names: Vec<_> = store
            .list_by_time_desc(&session("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["late", "mid", "early"]);
    }

    #[tokio::test]
    async fn list_by_time_desc_compares_bytes() {
        let store = MemoryMealStore::default();
        store.insert(new_meal("a", "noon", "12:00")).await.unwrap();
        store.insert(new_meal("a", "one", "1:00")).await.unwrap();

        let names: Vec<_> = store
            .list_by_time_desc(&session("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["one", "noon"]);
    }

    #[tokio::test]
    async fn update_and_delete_ignore_foreign_sessions() {
        let store = MemoryMealStore::default();
        let meal = store.insert(new_meal("a", "Oats", "08:00")).await.unwrap();

        let changes = MealChanges {
            name: Patch::Set("Stolen".into()),
            ..Default::default()
        };
        assert_eq!(store.update(&session("b"), meal.id, &changes).await.unwrap(), 0);
        assert_eq!(store.delete(&session("b"), meal.id).await.unwrap(), 0);

        let kept = store.find(&session("a"), meal.id).await.unwrap().unwrap();
        assert_eq!(kept.name, "Oats");

        assert_eq!(store.update(&session("a"), meal.id, &changes).await.unwrap(), 1);
        assert_eq!(store.delete(&session("a"), meal.id).await.unwrap(), 1);
        assert!(store.find(&session("a"), meal.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = MemoryMealStore::default();
        let meal = new_meal("a", "Oats", "08:00");
        store.insert(meal.clone()).await.unwrap();
        assert!(store.insert(meal).await.is_err());
    }
}
