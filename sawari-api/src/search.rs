use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use sawari_catalog::CabOffer;
use sawari_core::location::{resolve_location, ResolvedLocation};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search_cabs))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    pickup: String,
    drop: String,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    pickup: ResolvedLocation,
    drop: ResolvedLocation,
    offers: Vec<CabOffer>,
}

/// Resolve both endpoints of the trip, then price the route. Unknown but
/// resolvable routes still return the fallback fare list.
async fn search_cabs(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let pickup = resolve_location(state.resolver.as_ref(), &query.pickup).await?;
    let drop = resolve_location(state.resolver.as_ref(), &query.drop).await?;

    let offers = sawari_catalog::price_lookup(&pickup.name, &drop.name);
    tracing::debug!(pickup = %pickup.name, drop = %drop.name, count = offers.len(), "search priced");

    Ok(Json(SearchResponse {
        pickup,
        drop,
        offers,
    }))
}
