use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::{EstablishmentEntity, OfferEntity},
    schema::{establishments, offers},
    status::OfferStatus,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/offers",
        OpenApiRouter::new().routes(utoipa_axum::routes!(get_active_offers)),
    )
}

#[derive(Serialize, ToSchema)]
struct GetOfferRes {
    pub offer: OfferEntity,
    pub establishment: Option<EstablishmentEntity>,
}

/// List offers that are active and still have stock, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Offers"],
    responses(
        (status = 200, description = "List active offers", body = StdResponse<Vec<GetOfferRes>, String>)
    )
)]
async fn get_active_offers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let active_offers: Vec<OfferEntity> = offers::table
        .filter(offers::status.eq(OfferStatus::Active.as_str()))
        .filter(offers::current_stock.gt(0))
        .order_by(offers::created_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get offers")?;

    let establishment_ids: Vec<i32> = active_offers
        .iter()
        .map(|offer| offer.establishment_id)
        .collect();
    let sellers: Vec<EstablishmentEntity> = establishments::table
        .filter(establishments::id.eq_any(&establishment_ids))
        .get_results(conn)
        .await
        .context("Failed to get establishments")?;

    let by_id: HashMap<i32, EstablishmentEntity> =
        sellers.into_iter().map(|e| (e.id, e)).collect();

    let offers_with_sellers: Vec<GetOfferRes> = active_offers
        .into_iter()
        .map(|offer| GetOfferRes {
            establishment: by_id.get(&offer.establishment_id).cloned(),
            offer,
        })
        .collect();

    Ok(StdResponse {
        data: Some(offers_with_sellers),
        message: Some("Get active offers successfully"),
    })
}
