//! Public catalog endpoints.

use axum::{Json, Router, extract::State, routing::get};

use crate::content::CategoryGroup;
use crate::error::AppResult;
use crate::models::CategoryRef;
use crate::permissions::Subject;
use crate::state::AppState;

/// Create the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog", get(catalog))
        .route("/api/categories", get(categories))
}

/// Approved lessons grouped by category.
async fn catalog(
    State(state): State<AppState>,
    subject: Subject,
) -> AppResult<Json<Vec<CategoryGroup>>> {
    Ok(Json(state.content().catalog(&subject).await?))
}

/// The category directory contributors pick from.
async fn categories(State(state): State<AppState>) -> Json<Vec<CategoryRef>> {
    Json(
        state
            .content()
            .categories()
            .all()
            .into_iter()
            .cloned()
            .collect(),
    )
}
