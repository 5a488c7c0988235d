use anyhow::Context;
use chrono::Utc;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    aliases::DieselError,
    app_error::AppError,
    app_state::AppState,
    inventory,
    models::{
        CreateOrderEntity, CreatePaymentEntity, EstablishmentEntity, OfferEntity, OrderEntity,
        PaymentEntity,
    },
    pickup_code,
    schema::{establishments, offers, orders, payments},
    settlement::SettlementOutcome,
    status::{OrderEvent, OrderStatus, PaymentStatus},
};

/// Checkout request as the boundary receives it.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub offer_id: i32,
    pub quantity: i32,
    pub method: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct CreatedOrder {
    pub order: OrderEntity,
    pub payment: PaymentEntity,
    pub offer: OfferEntity,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PickupReceipt {
    pub order: OrderEntity,
    pub offer_title: String,
    pub establishment_name: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct CancelledOrder {
    pub order: OrderEntity,
    pub offer: OfferEntity,
    pub refunded_payment: Option<PaymentEntity>,
}

/// Reserve stock, settle and persist a new order as one atomic unit.
///
/// A `StorageConflict` (lost race or pickup-code collision) is retried once
/// with a fresh transaction; every other failure is terminal for the call.
pub async fn create_order(
    state: &AppState,
    consumer_id: i32,
    new_order: &NewOrder,
) -> Result<CreatedOrder, AppError> {
    match try_create_order(state, consumer_id, new_order).await {
        Err(AppError::StorageConflict) => try_create_order(state, consumer_id, new_order).await,
        other => other,
    }
}

async fn try_create_order(
    state: &AppState,
    consumer_id: i32,
    new_order: &NewOrder,
) -> Result<CreatedOrder, AppError> {
    if new_order.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let settlement = state.settlement.clone();
    let offer_id = new_order.offer_id;
    let quantity = new_order.quantity;
    let method = new_order.method.clone();

    let created = conn
        .transaction(move |conn| {
            Box::pin(async move {
                // Distinguishes a missing offer from an out-of-stock one.
                let offer_count: i64 = offers::table
                    .find(offer_id)
                    .count()
                    .get_result(conn)
                    .await
                    .context("Failed to get offer count")?;
                if offer_count == 0 {
                    return Err(AppError::OfferNotFound);
                }

                let offer = inventory::reserve(conn, offer_id, quantity).await?;

                // Frozen at creation time; later price edits must not touch it.
                let total_value = offer.sale_price * quantity as f32;
                let pickup_code = pickup_code::generate(consumer_id, offer_id, quantity, Utc::now());

                let order: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        consumer_id,
                        offer_id,
                        quantity,
                        total_value,
                        pickup_code,
                        status: OrderStatus::Reserved.as_str().into(),
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let provider_ref = match settlement.authorize(total_value, &method) {
                    SettlementOutcome::Approved { provider_ref } => provider_ref,
                    SettlementOutcome::Refused { reason } => {
                        return Err(AppError::SettlementRefused(reason));
                    }
                };

                let payment: PaymentEntity = diesel::insert_into(payments::table)
                    .values(CreatePaymentEntity {
                        order_id: order.id,
                        amount: total_value,
                        method,
                        status: PaymentStatus::Approved.as_str().into(),
                        provider_ref: Some(provider_ref),
                    })
                    .returning(PaymentEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create payment")?;

                let paid = OrderStatus::Reserved
                    .apply(OrderEvent::Pay)
                    .map_err(|err| AppError::Other(err.into()))?;

                let order: OrderEntity = diesel::update(
                    orders::table
                        .find(order.id)
                        .filter(orders::status.eq(OrderStatus::Reserved.as_str())),
                )
                .set(orders::status.eq(paid.as_str()))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to mark order as paid")?;

                Ok::<CreatedOrder, AppError>(CreatedOrder {
                    order,
                    payment,
                    offer,
                })
            })
        })
        .await?;

    tracing::info!(
        "Order #{} created for offer #{} (quantity {})",
        created.order.id,
        created.order.offer_id,
        created.order.quantity
    );

    Ok(created)
}

/// Redeem a pickup code: flip the order to picked-up exactly once and return
/// what the counter needs for display.
pub async fn validate_pickup(state: &AppState, code: &str) -> Result<PickupReceipt, AppError> {
    match try_validate_pickup(state, code).await {
        Err(AppError::StorageConflict) => try_validate_pickup(state, code).await,
        other => other,
    }
}

async fn try_validate_pickup(state: &AppState, code: &str) -> Result<PickupReceipt, AppError> {
    let code = pickup_code::normalize(code);

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let receipt = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order: OrderEntity = match orders::table
                    .filter(orders::pickup_code.eq(&code))
                    .get_result(conn)
                    .await
                {
                    Ok(order) => order,
                    Err(DieselError::NotFound) => return Err(AppError::CodeNotFound),
                    Err(err) => return Err(err.into()),
                };

                let status = order
                    .status
                    .parse::<OrderStatus>()
                    .map_err(|err| AppError::Other(err.into()))?;
                let picked_up = match status {
                    OrderStatus::PickedUp => return Err(AppError::AlreadyPickedUp),
                    OrderStatus::Cancelled => return Err(AppError::OrderCancelled),
                    status => status
                        .apply(OrderEvent::Pickup)
                        .map_err(|err| AppError::Other(err.into()))?,
                };

                // Guarded by the pre-image status; zero rows affected means a
                // concurrent redemption or cancellation got there first.
                let order: OrderEntity = match diesel::update(
                    orders::table
                        .find(order.id)
                        .filter(orders::status.eq(status.as_str())),
                )
                .set((
                    orders::status.eq(picked_up.as_str()),
                    orders::picked_up_at.eq(diesel::dsl::now),
                ))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await
                {
                    Ok(order) => order,
                    Err(DieselError::NotFound) => return Err(AppError::StorageConflict),
                    Err(err) => return Err(err.into()),
                };

                let offer: OfferEntity = offers::table
                    .find(order.offer_id)
                    .get_result(conn)
                    .await
                    .context("Failed to get offer")?;
                let establishment: EstablishmentEntity = establishments::table
                    .find(offer.establishment_id)
                    .get_result(conn)
                    .await
                    .context("Failed to get establishment")?;

                Ok::<PickupReceipt, AppError>(PickupReceipt {
                    order,
                    offer_title: offer.title,
                    establishment_name: establishment.name,
                })
            })
        })
        .await?;

    tracing::info!("Order #{} picked up", receipt.order.id);

    Ok(receipt)
}

/// Cancel a reserved or paid order: status flip, stock restitution and, for a
/// paid order, the refund, all in one transaction.
pub async fn cancel_order(state: &AppState, order_id: i32) -> Result<CancelledOrder, AppError> {
    match try_cancel_order(state, order_id).await {
        Err(AppError::StorageConflict) => try_cancel_order(state, order_id).await,
        other => other,
    }
}

async fn try_cancel_order(state: &AppState, order_id: i32) -> Result<CancelledOrder, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cancelled = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order: OrderEntity = match orders::table.find(order_id).get_result(conn).await {
                    Ok(order) => order,
                    Err(DieselError::NotFound) => return Err(AppError::OrderNotFound),
                    Err(err) => return Err(err.into()),
                };

                let status = order
                    .status
                    .parse::<OrderStatus>()
                    .map_err(|err| AppError::Other(err.into()))?;
                if status.is_terminal() {
                    return Err(AppError::InvalidState(order.status.clone()));
                }
                let next = status
                    .apply(OrderEvent::Cancel)
                    .map_err(|err| AppError::Other(err.into()))?;

                let order: OrderEntity = match diesel::update(
                    orders::table
                        .find(order.id)
                        .filter(orders::status.eq(status.as_str())),
                )
                .set(orders::status.eq(next.as_str()))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await
                {
                    Ok(order) => order,
                    Err(DieselError::NotFound) => return Err(AppError::StorageConflict),
                    Err(err) => return Err(err.into()),
                };

                let offer = inventory::release(conn, order.offer_id, order.quantity).await?;

                // Only a paid order has money to give back.
                let refunded_payment = if status == OrderStatus::Paid {
                    let payment: PaymentEntity = diesel::update(
                        payments::table
                            .filter(payments::order_id.eq(order.id))
                            .filter(payments::status.eq(PaymentStatus::Approved.as_str())),
                    )
                    .set(payments::status.eq(PaymentStatus::Refunded.as_str()))
                    .returning(PaymentEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to refund payment")?;
                    Some(payment)
                } else {
                    None
                };

                Ok::<CancelledOrder, AppError>(CancelledOrder {
                    order,
                    offer,
                    refunded_payment,
                })
            })
        })
        .await?;

    tracing::info!(
        "Order #{} cancelled, {} units returned to offer #{}",
        cancelled.order.id,
        cancelled.order.quantity,
        cancelled.offer.id
    );

    Ok(cancelled)
}
