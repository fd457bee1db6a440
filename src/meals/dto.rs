use serde::{Deserialize, Serialize};

use crate::meals::repo_types::Meal;

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: String,
    pub description: String,
    pub time: String,
    #[serde(default = "default_include")]
    pub include: bool,
}

fn default_include() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct MealListResponse {
    pub meals: Vec<Meal>,
}

/// `meal` is `null` when nothing matches the id within the session.
#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub meal: Option<Meal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub recorded_meals: usize,
    pub on_diet_meals: usize,
    pub off_diet_meals: usize,
    pub best_sequence: usize,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub metrics: Metrics,
}
