use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::{EstablishmentEntity, OfferEntity, OrderEntity},
    schema::{establishments, offers, orders},
    service::orders::{CancelledOrder, CreatedOrder, NewOrder},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/consumers/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(cancel_order))
            .routes(utoipa_axum::routes!(get_my_orders))
            .route_layer(axum::middleware::from_fn(
                middleware::consumers_authorization,
            )),
    )
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReq {
    offer_id: i32,
    quantity: i32,
    method: String,
}

/// Reserve an offer for the authenticated consumer and settle the payment.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 200, description = "Created order successfully", body = StdResponse<CreatedOrder, String>)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(consumer_id): Extension<i32>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    match body.method.as_str() {
        "pix" | "card" | "cash" => {}
        other => {
            return Err(AppError::BadRequest(format!(
                "{other} is not a valid payment method"
            )));
        }
    }

    let created = crate::service::orders::create_order(
        &state,
        consumer_id,
        &NewOrder {
            offer_id: body.offer_id,
            quantity: body.quantity,
            method: body.method,
        },
    )
    .await?;

    Ok(StdResponse {
        data: Some(created),
        message: Some("Created order successfully"),
    })
}

/// Cancel a reserved or paid order belonging to the authenticated consumer.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Orders"],
    params(
        ("id" = i32, Path, description = "Order ID to cancel")
    ),
    responses(
        (status = 200, description = "Cancelled order successfully", body = StdResponse<CancelledOrder, String>)
    )
)]
async fn cancel_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(consumer_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    // Ownership gate; the order's consumer never changes, so this can sit
    // outside the cancellation transaction.
    let owned: i64 = orders::table
        .find(id)
        .filter(orders::consumer_id.eq(consumer_id))
        .count()
        .get_result(conn)
        .await
        .context("Failed to get order count")?;
    if owned == 0 {
        return Err(AppError::OrderNotFound);
    }

    let cancelled = crate::service::orders::cancel_order(&state, id).await?;

    Ok(StdResponse {
        data: Some(cancelled),
        message: Some("Cancelled order successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct GetOrderRes {
    pub order: OrderEntity,
    pub offer: Option<OfferEntity>,
    pub establishment: Option<EstablishmentEntity>,
}

/// Fetch all orders belonging to the authenticated consumer.
#[utoipa::path(
    get,
    path = "/my-orders",
    tags = ["Orders"],
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<GetOrderRes>, String>)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(consumer_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let my_orders: Vec<OrderEntity> = orders::table
        .filter(orders::consumer_id.eq(consumer_id))
        .order_by(orders::created_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get my orders")?;

    let offer_ids: Vec<i32> = my_orders.iter().map(|order| order.offer_id).collect();
    let ordered_offers: Vec<OfferEntity> = offers::table
        .filter(offers::id.eq_any(&offer_ids))
        .get_results(conn)
        .await
        .context("Failed to get offers")?;

    let establishment_ids: Vec<i32> = ordered_offers
        .iter()
        .map(|offer| offer.establishment_id)
        .collect();
    let sellers: Vec<EstablishmentEntity> = establishments::table
        .filter(establishments::id.eq_any(&establishment_ids))
        .get_results(conn)
        .await
        .context("Failed to get establishments")?;

    let offers_by_id: HashMap<i32, OfferEntity> =
        ordered_offers.into_iter().map(|o| (o.id, o)).collect();
    let sellers_by_id: HashMap<i32, EstablishmentEntity> =
        sellers.into_iter().map(|e| (e.id, e)).collect();

    let orders_with_details: Vec<GetOrderRes> = my_orders
        .into_iter()
        .map(|order| {
            let offer = offers_by_id.get(&order.offer_id).cloned();
            let establishment = offer
                .as_ref()
                .and_then(|offer| sellers_by_id.get(&offer.establishment_id).cloned());
            GetOrderRes {
                order,
                offer,
                establishment,
            }
        })
        .collect();

    Ok(StdResponse {
        data: Some(orders_with_details),
        message: Some("Get my orders successfully"),
    })
}
