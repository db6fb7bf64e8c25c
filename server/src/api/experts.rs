//! Expert directory endpoints.
//!
//! - GET /api/experts - Paginated list with search and category filters
//! - GET /api/experts/categories - Distinct categories
//! - GET /api/experts/:id - One expert with its calendar

use super::ApiResponse;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use expert_booking_core::{BookingError, Expert, ExpertId, ExpertQuery, Pagination};
use expert_booking_web::AppError;
use serde::{Deserialize, Serialize};

/// Query parameters for listing experts.
///
/// Paging values are taken leniently: anything that is not a positive
/// integer falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListExpertsQuery {
    /// Page number (1-indexed, default 1)
    pub page: Option<String>,
    /// Page size (default 5, max 100)
    pub limit: Option<String>,
    /// Case-insensitive name substring
    pub search: Option<String>,
    /// Exact category
    pub category: Option<String>,
}

impl ListExpertsQuery {
    fn into_query(self) -> ExpertQuery {
        let positive = |raw: Option<String>| {
            raw.and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
        };
        ExpertQuery::new(
            positive(self.page),
            positive(self.limit),
            self.search,
            self.category,
        )
    }
}

/// Response for listing experts.
#[derive(Debug, Serialize)]
pub struct ExpertListResponse {
    /// Always `true`
    pub success: bool,
    /// Experts on this page
    pub data: Vec<Expert>,
    /// Paging metadata
    pub pagination: Pagination,
}

/// List experts, newest first.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:5000/api/experts?page=2&limit=5&search=dr&category=Medical"
/// ```
pub async fn list_experts(
    State(state): State<AppState>,
    Query(params): Query<ListExpertsQuery>,
) -> Result<Json<ExpertListResponse>, AppError> {
    let query = params.into_query();
    let page = state
        .directory
        .list_experts(&query)
        .await
        .map_err(BookingError::from)?;

    Ok(Json(ExpertListResponse {
        success: true,
        data: page.experts,
        pagination: page.pagination,
    }))
}

/// Distinct expert categories, sorted.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let categories = state
        .directory
        .categories()
        .await
        .map_err(BookingError::from)?;
    Ok(Json(ApiResponse::ok(categories)))
}

/// One expert with its full calendar.
///
/// # Errors
///
/// - `404` unknown or malformed id
pub async fn get_expert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Expert>>, AppError> {
    let id: ExpertId = id.parse().map_err(|_| AppError::not_found("Expert"))?;
    let expert = state
        .directory
        .get_expert(id)
        .await
        .map_err(BookingError::from)?
        .ok_or_else(|| AppError::not_found("Expert"))?;
    Ok(Json(ApiResponse::ok(expert)))
}
