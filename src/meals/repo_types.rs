use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Meal record as stored and as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub session_id: String,
    pub name: String,
    pub description: String,
    /// Caller-supplied timestamp, kept verbatim.
    pub time: String,
    /// On-diet flag.
    pub include: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated input for an insert; the id is already assigned.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub id: Uuid,
    pub session_id: String,
    pub name: String,
    pub description: String,
    pub time: String,
    pub include: bool,
}

/// A field in a partial update: either left alone or replaced.
///
/// An absent JSON key deserializes to `Keep` through `#[serde(default)]`;
/// a present key must hold a valid `T` (explicit `null` is a type error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Patch::Keep => None,
            Patch::Set(v) => Some(v),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        T::deserialize(d).map(Patch::Set)
    }
}

/// Partial update of a meal. Doubles as the PUT request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealChanges {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub time: Patch<String>,
    #[serde(default)]
    pub include: Patch<bool>,
}

impl MealChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_keep()
            && self.description.is_keep()
            && self.time.is_keep()
            && self.include.is_keep()
    }

    /// Applies the `Set` fields to `meal` in place.
    pub fn apply_to(&self, meal: &mut Meal) {
        if let Patch::Set(v) = &self.name {
            meal.name = v.clone();
        }
        if let Patch::Set(v) = &self.description {
            meal.description = v.clone();
        }
        if let Patch::Set(v) = &self.time {
            meal.time = v.clone();
        }
        if let Patch::Set(v) = self.include {
            meal.include = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_keep_and_present_keys_set() {
        let changes: MealChanges = serde_json::from_str(r#"{"name":"Salad"}"#).unwrap();
        assert_eq!(changes.name, Patch::Set("Salad".to_string()));
        assert!(changes.description.is_keep());
        assert!(changes.time.is_keep());
        assert!(changes.include.is_keep());
        assert!(!changes.is_empty());

        let empty: MealChanges = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn explicit_null_is_rejected() {
        assert!(serde_json::from_str::<MealChanges>(r#"{"include":null}"#).is_err());
        assert!(serde_json::from_str::<MealChanges>(r#"{"name":null}"#).is_err());
    }

    #[test]
    fn apply_to_touches_only_set_fields() {
        let mut meal = Meal {
            id: Uuid::new_v4(),
            session_id: "s".into(),
            name: "Oats".into(),
            description: "breakfast".into(),
            time: "2024-01-01T08:00:00Z".into(),
            include: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let changes = MealChanges {
            include: Patch::Set(false),
            ..Default::default()
        };
        changes.apply_to(&mut meal);
        assert!(!meal.include);
        assert_eq!(meal.name, "Oats");
        assert_eq!(meal.description, "breakfast");
    }

    #[test]
    fn meal_serializes_created_at_as_rfc3339() {
        let meal = Meal {
            id: Uuid::nil(),
            session_id: "s".into(),
            name: "Oats".into(),
            description: String::new(),
            time: "08:00".into(),
            include: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&meal).unwrap();
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["include"], true);
        assert_eq!(json["session_id"], "s");
    }
}
