//! End-to-end order lifecycle tests against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to run these; without it every test skips early.
//! Each test seeds its own establishment and offer, so the suite is safe to
//! run in parallel against a shared database.

use std::sync::{Arc, Once};

use diesel::{Connection, ExpressionMethods, PgConnection, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pegaai_orderservice::{
    app_error::AppError,
    app_state::AppState,
    db,
    models::{
        CreateEstablishmentEntity, CreateOfferEntity, EstablishmentEntity, OfferEntity,
        OrderEntity, PaymentEntity,
    },
    schema::{establishments, offers, orders, payments},
    service::orders::{self as order_service, NewOrder},
    settlement::InstantApproval,
    status::OfferStatus,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static MIGRATE: Once = Once::new();

async fn test_state() -> Option<AppState> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;

    let migrate_url = url.clone();
    tokio::task::spawn_blocking(move || {
        MIGRATE.call_once(|| {
            let mut conn =
                PgConnection::establish(&migrate_url).expect("connect for migrations");
            conn.run_pending_migrations(MIGRATIONS)
                .expect("run migrations");
        });
    })
    .await
    .expect("migration task");

    let db_pool = db::create_pool(&url).await.expect("build pool");
    Some(AppState {
        db_pool,
        settlement: Arc::new(InstantApproval),
    })
}

async fn seed_offer(state: &AppState, initial_stock: i32, sale_price: f32) -> OfferEntity {
    let conn = &mut state.db_pool.get().await.expect("pool connection");

    let establishment: EstablishmentEntity = diesel::insert_into(establishments::table)
        .values(CreateEstablishmentEntity {
            name: "Padaria Horizonte".into(),
            address: Some("Rua das Flores, 123".into()),
        })
        .returning(EstablishmentEntity::as_returning())
        .get_result(conn)
        .await
        .expect("seed establishment");

    diesel::insert_into(offers::table)
        .values(CreateOfferEntity {
            establishment_id: establishment.id,
            title: "Caixa surpresa".into(),
            description: None,
            category: Some("Padaria".into()),
            original_price: sale_price * 2.0,
            sale_price,
            initial_stock,
            current_stock: initial_stock,
            pickup_window_start: "18:00".into(),
            pickup_window_end: "19:00".into(),
            status: OfferStatus::Active.as_str().into(),
        })
        .returning(OfferEntity::as_returning())
        .get_result(conn)
        .await
        .expect("seed offer")
}

async fn fetch_offer(state: &AppState, id: i32) -> OfferEntity {
    let conn = &mut state.db_pool.get().await.expect("pool connection");
    offers::table
        .find(id)
        .get_result(conn)
        .await
        .expect("fetch offer")
}

async fn fetch_order(state: &AppState, id: i32) -> OrderEntity {
    let conn = &mut state.db_pool.get().await.expect("pool connection");
    orders::table
        .find(id)
        .get_result(conn)
        .await
        .expect("fetch order")
}

async fn fetch_payment(state: &AppState, order_id: i32) -> PaymentEntity {
    let conn = &mut state.db_pool.get().await.expect("pool connection");
    payments::table
        .filter(payments::order_id.eq(order_id))
        .get_result(conn)
        .await
        .expect("fetch payment")
}

fn new_order(offer_id: i32, quantity: i32) -> NewOrder {
    NewOrder {
        offer_id,
        quantity,
        method: "pix".into(),
    }
}

#[tokio::test]
async fn checkout_scenario_settles_and_cancellation_restores_stock() {
    let Some(state) = test_state().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let offer = seed_offer(&state, 2, 10.0).await;

    let created = order_service::create_order(&state, 1, &new_order(offer.id, 1))
        .await
        .expect("first checkout succeeds");
    assert_eq!(created.order.total_value, 10.0);
    assert_eq!(created.order.status, "PAID");
    assert_eq!(created.order.pickup_code.len(), 8);
    assert_eq!(created.payment.status, "APPROVED");
    assert!(created.payment.provider_ref.is_some());
    assert_eq!(fetch_offer(&state, offer.id).await.current_stock, 1);

    let err = order_service::create_order(&state, 2, &new_order(offer.id, 2))
        .await
        .expect_err("second checkout exceeds stock");
    assert!(matches!(err, AppError::InsufficientStock));
    assert_eq!(fetch_offer(&state, offer.id).await.current_stock, 1);

    let cancelled = order_service::cancel_order(&state, created.order.id)
        .await
        .expect("cancellation succeeds");
    assert_eq!(cancelled.order.status, "CANCELLED");
    assert_eq!(cancelled.offer.current_stock, 2);
    let refunded = cancelled.refunded_payment.expect("paid order is refunded");
    assert_eq!(refunded.status, "REFUNDED");
    assert_eq!(fetch_payment(&state, created.order.id).await.status, "REFUNDED");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_never_oversell() {
    let Some(state) = test_state().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let offer = seed_offer(&state, 5, 8.0).await;

    let mut handles = Vec::new();
    for consumer in 0..6 {
        let state = state.clone();
        let offer_id = offer.id;
        handles.push(tokio::spawn(async move {
            order_service::create_order(&state, 100 + consumer, &new_order(offer_id, 1)).await
        }));
    }

    let mut successes = 0;
    let mut stock_failures = 0;
    for handle in handles {
        match handle.await.expect("join checkout task") {
            Ok(_) => successes += 1,
            Err(AppError::InsufficientStock) => stock_failures += 1,
            Err(err) => panic!("unexpected checkout error: {err}"),
        }
    }

    assert_eq!(successes, 5);
    assert_eq!(stock_failures, 1);

    let drained = fetch_offer(&state, offer.id).await;
    assert_eq!(drained.current_stock, 0);
    assert_eq!(drained.status, "SOLD_OUT");
}

#[tokio::test]
async fn pickup_succeeds_once_and_leaves_stock_alone() {
    let Some(state) = test_state().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let offer = seed_offer(&state, 3, 12.5).await;
    let created = order_service::create_order(&state, 7, &new_order(offer.id, 1))
        .await
        .expect("checkout succeeds");
    assert_eq!(fetch_offer(&state, offer.id).await.current_stock, 2);

    let receipt = order_service::validate_pickup(&state, &created.order.pickup_code)
        .await
        .expect("first redemption succeeds");
    assert_eq!(receipt.order.status, "PICKED_UP");
    assert!(receipt.order.picked_up_at.is_some());
    assert_eq!(receipt.offer_title, "Caixa surpresa");
    assert_eq!(receipt.establishment_name, "Padaria Horizonte");
    assert_eq!(fetch_offer(&state, offer.id).await.current_stock, 2);

    let err = order_service::validate_pickup(&state, &created.order.pickup_code)
        .await
        .expect_err("second redemption fails");
    assert!(matches!(err, AppError::AlreadyPickedUp));
    assert_eq!(fetch_offer(&state, offer.id).await.current_stock, 2);
}

#[tokio::test]
async fn pickup_codes_match_case_insensitively() {
    let Some(state) = test_state().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let offer = seed_offer(&state, 1, 5.0).await;
    let created = order_service::create_order(&state, 11, &new_order(offer.id, 1))
        .await
        .expect("checkout succeeds");

    let lowered = format!("  {}  ", created.order.pickup_code.to_lowercase());
    let receipt = order_service::validate_pickup(&state, &lowered)
        .await
        .expect("normalized code redeems");
    assert_eq!(receipt.order.id, created.order.id);
}

#[tokio::test]
async fn terminal_orders_cannot_be_cancelled() {
    let Some(state) = test_state().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let offer = seed_offer(&state, 4, 6.0).await;

    let picked_up = order_service::create_order(&state, 21, &new_order(offer.id, 1))
        .await
        .expect("checkout succeeds");
    order_service::validate_pickup(&state, &picked_up.order.pickup_code)
        .await
        .expect("redemption succeeds");
    let err = order_service::cancel_order(&state, picked_up.order.id)
        .await
        .expect_err("picked-up orders are final");
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(fetch_order(&state, picked_up.order.id).await.status, "PICKED_UP");

    let cancelled = order_service::create_order(&state, 22, &new_order(offer.id, 2))
        .await
        .expect("checkout succeeds");
    order_service::cancel_order(&state, cancelled.order.id)
        .await
        .expect("first cancellation succeeds");
    let stock_after_cancel = fetch_offer(&state, offer.id).await.current_stock;

    let err = order_service::cancel_order(&state, cancelled.order.id)
        .await
        .expect_err("cancelled orders are final");
    assert!(matches!(err, AppError::InvalidState(_)));
    // The failed second cancellation must not release stock again.
    assert_eq!(fetch_offer(&state, offer.id).await.current_stock, stock_after_cancel);
}

#[tokio::test]
async fn cancelled_codes_and_unknown_inputs_are_rejected() {
    let Some(state) = test_state().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let offer = seed_offer(&state, 2, 9.0).await;

    let err = order_service::create_order(&state, 31, &new_order(-1, 1))
        .await
        .expect_err("unknown offer");
    assert!(matches!(err, AppError::OfferNotFound));

    let err = order_service::create_order(&state, 31, &new_order(offer.id, 0))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = order_service::validate_pickup(&state, "00000000")
        .await
        .expect_err("unknown code");
    assert!(matches!(err, AppError::CodeNotFound));

    let err = order_service::cancel_order(&state, -1)
        .await
        .expect_err("unknown order");
    assert!(matches!(err, AppError::OrderNotFound));

    let created = order_service::create_order(&state, 31, &new_order(offer.id, 1))
        .await
        .expect("checkout succeeds");
    order_service::cancel_order(&state, created.order.id)
        .await
        .expect("cancellation succeeds");
    let err = order_service::validate_pickup(&state, &created.order.pickup_code)
        .await
        .expect_err("cancelled orders cannot be redeemed");
    assert!(matches!(err, AppError::OrderCancelled));
}
