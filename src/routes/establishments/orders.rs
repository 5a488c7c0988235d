use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{Extension, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::{OfferEntity, OrderEntity},
    schema::{offers, orders},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/establishments/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_establishment_orders))
            .route_layer(axum::middleware::from_fn(
                middleware::establishments_authorization,
            )),
    )
}

#[derive(Serialize, ToSchema)]
struct GetEstablishmentOrderRes {
    pub order: OrderEntity,
    pub offer: Option<OfferEntity>,
}

/// Fetch all orders placed against the authenticated establishment's offers.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    responses(
        (status = 200, description = "List establishment orders", body = StdResponse<Vec<GetEstablishmentOrderRes>, String>)
    )
)]
async fn get_establishment_orders(
    State(state): State<AppState>,
    Extension(establishment_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let my_offers: Vec<OfferEntity> = offers::table
        .filter(offers::establishment_id.eq(establishment_id))
        .get_results(conn)
        .await
        .context("Failed to get offers")?;

    let offer_ids: Vec<i32> = my_offers.iter().map(|offer| offer.id).collect();
    let placed_orders: Vec<OrderEntity> = orders::table
        .filter(orders::offer_id.eq_any(&offer_ids))
        .order_by(orders::created_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get orders")?;

    let offers_by_id: HashMap<i32, OfferEntity> =
        my_offers.into_iter().map(|o| (o.id, o)).collect();

    let orders_with_offers: Vec<GetEstablishmentOrderRes> = placed_orders
        .into_iter()
        .map(|order| GetEstablishmentOrderRes {
            offer: offers_by_id.get(&order.offer_id).cloned(),
            order,
        })
        .collect();

    Ok(StdResponse {
        data: Some(orders_with_offers),
        message: Some("Get establishment orders successfully"),
    })
}
