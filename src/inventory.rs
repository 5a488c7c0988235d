//! Inventory ledger: the single writer of `offers.current_stock`.
//!
//! Both entry points take the caller's transaction connection, so the stock
//! effect commits or rolls back together with the rest of the operation.

use anyhow::Context;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    aliases::DieselError, app_error::AppError, models::OfferEntity, schema::offers,
    status::OfferStatus,
};

/// Atomically take `quantity` units from an offer's stock.
///
/// The check-and-decrement is a single conditional UPDATE guarded by the
/// pre-decrement value; when a concurrent caller consumed the stock first the
/// guard matches no row and the call fails without mutating anything.
pub async fn reserve(
    conn: &mut AsyncPgConnection,
    offer_id: i32,
    quantity: i32,
) -> Result<OfferEntity, AppError> {
    let updated = diesel::update(
        offers::table
            .find(offer_id)
            .filter(offers::current_stock.ge(quantity)),
    )
    .set(offers::current_stock.eq(offers::current_stock - quantity))
    .returning(OfferEntity::as_returning())
    .get_result(conn)
    .await;

    let offer: OfferEntity = match updated {
        Ok(offer) => offer,
        Err(DieselError::NotFound) => return Err(AppError::InsufficientStock),
        Err(err) => return Err(err.into()),
    };

    if offer.current_stock == 0 && offer.status == OfferStatus::Active.as_str() {
        let offer = diesel::update(offers::table.find(offer_id))
            .set(offers::status.eq(OfferStatus::SoldOut.as_str()))
            .returning(OfferEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to mark offer as sold out")?;
        return Ok(offer);
    }

    Ok(offer)
}

/// Return `quantity` units to an offer's stock.
///
/// The increment is unconditional; the `current_stock <= initial_stock` CHECK
/// rejects a double-release at the storage layer, which can only happen on a
/// programming error and surfaces as an internal failure.
pub async fn release(
    conn: &mut AsyncPgConnection,
    offer_id: i32,
    quantity: i32,
) -> Result<OfferEntity, AppError> {
    let offer: OfferEntity = diesel::update(offers::table.find(offer_id))
        .set(offers::current_stock.eq(offers::current_stock + quantity))
        .returning(OfferEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to release stock")?;

    if offer.current_stock > 0 && offer.status == OfferStatus::SoldOut.as_str() {
        let offer = diesel::update(offers::table.find(offer_id))
            .set(offers::status.eq(OfferStatus::Active.as_str()))
            .returning(OfferEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to reactivate offer")?;
        return Ok(offer);
    }

    Ok(offer)
}
