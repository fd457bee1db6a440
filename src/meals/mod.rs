pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use memory::MemoryMealStore;
pub use repo::{MealStore, PgMealStore};
pub use services::MealService;

pub fn router() -> Router<AppState> {
    handlers::meal_routes()
}
