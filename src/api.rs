use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::meal_log::MealLogError;
use crate::handlers::MealLogHandler;
use crate::services::response_extractor;

const MAX_BODY_BYTES: usize = 64 * 1024;
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub handler: Arc<MealLogHandler>,
    pub api_token: String,
}

#[derive(Deserialize)]
pub struct AuthQuery {
    token: Option<String>,
}

#[derive(Deserialize)]
pub struct DateQuery {
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct CustomMealRequest {
    name: String,
    calories: i64,
    protein: i64,
    date: Option<NaiveDate>,
}

/// Create the meal log API router
pub fn create_api_router(handler: Arc<MealLogHandler>, api_token: String) -> Router {
    let state = ApiState { handler, api_token };

    Router::new()
        .route(
            "/api/logs",
            get(get_day_summary)
                .post(add_custom_meal)
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .route(
            "/api/logs/:id",
            delete(delete_meal).layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .route(
            "/api/analyze",
            post(analyze_photo).layer(RequestBodyLimitLayer::new(MAX_IMAGE_BYTES)),
        )
        .route(
            "/api/parse",
            post(parse_response).layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Verify API token
fn verify_token(query: &AuthQuery, api_token: &str) -> Result<(), StatusCode> {
    if query.token.as_deref() == Some(api_token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Stored-file extension for an uploaded photo's content type
fn image_extension_for(headers: &HeaderMap) -> Option<&'static str> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn error_status(context: &str, e: anyhow::Error) -> StatusCode {
    match e.downcast_ref::<MealLogError>() {
        Some(MealLogError::InvalidMeal) => StatusCode::BAD_REQUEST,
        Some(MealLogError::NotFound(_)) => StatusCode::NOT_FOUND,
        None => {
            log::error!("{}: {:#}", context, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Meals and totals for one day (today unless `date` is given)
async fn get_day_summary(
    Query(query): Query<AuthQuery>,
    Query(date_query): Query<DateQuery>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, StatusCode> {
    verify_token(&query, &state.api_token)?;

    let summary = state
        .handler
        .day_summary(date_query.date.unwrap_or_else(today))
        .await
        .map_err(|e| error_status("Failed to load day summary", e))?;

    Ok((StatusCode::OK, Json(summary)))
}

async fn add_custom_meal(
    Query(query): Query<AuthQuery>,
    State(state): State<ApiState>,
    Json(request): Json<CustomMealRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    verify_token(&query, &state.api_token)?;

    let logged = state
        .handler
        .add_custom_meal(
            &request.name,
            request.calories,
            request.protein,
            request.date.unwrap_or_else(today),
        )
        .await
        .map_err(|e| error_status("Failed to add custom meal", e))?;

    Ok((StatusCode::CREATED, Json(logged)))
}

/// Analyze an uploaded meal photo (raw image body) and log it
async fn analyze_photo(
    Query(query): Query<AuthQuery>,
    Query(date_query): Query<DateQuery>,
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    verify_token(&query, &state.api_token)?;

    let extension = image_extension_for(&headers).ok_or(StatusCode::UNSUPPORTED_MEDIA_TYPE)?;
    if body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let logged = state
        .handler
        .analyze_image(&body, extension, date_query.date.unwrap_or_else(today))
        .await
        .map_err(|e| error_status("Failed to analyze image", e))?;

    Ok((StatusCode::CREATED, Json(logged)))
}

async fn delete_meal(
    Path(id): Path<i64>,
    Query(query): Query<AuthQuery>,
    State(state): State<ApiState>,
) -> Result<StatusCode, StatusCode> {
    verify_token(&query, &state.api_token)?;

    state
        .handler
        .delete_meal(id)
        .await
        .map_err(|e| error_status("Failed to delete meal", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Run the extractor on a raw AI response (plain-text body)
async fn parse_response(
    Query(query): Query<AuthQuery>,
    State(state): State<ApiState>,
    body: String,
) -> Result<impl IntoResponse, StatusCode> {
    verify_token(&query, &state.api_token)?;

    Ok((StatusCode::OK, Json(response_extractor::extract(&body))))
}
