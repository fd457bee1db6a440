use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateMealRequest, MealListResponse, MealResponse, Metrics, MetricsResponse};
use super::repo_types::MealChanges;
use crate::{
    error::ApiError,
    session::{self, MaybeSession, ProvisionSession, RequireSession},
    state::AppState,
};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/metrics", get(get_metrics))
        .route(
            "/meals/:id",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
}

#[instrument(skip_all)]
pub async fn list_meals(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<MealListResponse>, ApiError> {
    let meals = match session {
        Some(s) => state.meals.list(&s).await?,
        None => Vec::new(),
    };
    Ok(Json(MealListResponse { meals }))
}

#[instrument(skip_all)]
pub async fn get_meal(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MealResponse>, ApiError> {
    let Path(id) = id?;
    let meal = match session {
        Some(s) => state.meals.get(&s, id).await?,
        None => None,
    };
    Ok(Json(MealResponse { meal }))
}

#[instrument(skip_all)]
pub async fn get_metrics(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<MetricsResponse>, ApiError> {
    let metrics = match session {
        Some(s) => state.meals.metrics(&s).await?,
        None => Metrics::default(),
    };
    Ok(Json(MetricsResponse { metrics }))
}

/// 201 with `Location`; hands out a session cookie when one was just issued.
#[instrument(skip_all)]
pub async fn create_meal(
    State(state): State<AppState>,
    ProvisionSession { session, issued }: ProvisionSession,
    body: Result<Json<CreateMealRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, HeaderMap), ApiError> {
    let Json(body) = body?;
    let meal = state.meals.create(&session, body).await?;
    info!(meal_id = %meal.id, issued_session = issued, "meal created");

    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(&format!("/meals/{}", meal.id)) {
        headers.insert(header::LOCATION, v);
    }
    let mut jar = CookieJar::new();
    if issued {
        jar = jar.add(session::session_cookie(&state.config.session, &session));
    }
    Ok((StatusCode::CREATED, jar, headers))
}

#[instrument(skip_all)]
pub async fn update_meal(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<MealChanges>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let Json(changes) = body?;
    state.meals.update(&session, id, changes).await?;
    info!(meal_id = %id, "meal updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn delete_meal(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if let Some(s) = session {
        state.meals.delete(&s, id).await?;
        info!(meal_id = %id, "meal deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
