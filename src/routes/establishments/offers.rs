use anyhow::{Context, Result};
use axum::{Extension, Json, extract::State, response::IntoResponse};
use diesel::{QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::{CreateOfferEntity, OfferEntity},
    schema::{establishments, offers},
    status::OfferStatus,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/establishments/offers",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_offer))
            .route_layer(axum::middleware::from_fn(
                middleware::establishments_authorization,
            )),
    )
}

#[derive(Deserialize, ToSchema)]
struct CreateOfferReq {
    title: String,
    description: Option<String>,
    category: Option<String>,
    original_price: f32,
    sale_price: f32,
    initial_stock: i32,
    pickup_window_start: String,
    pickup_window_end: String,
}

/// Publish a surplus offer for the authenticated establishment.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Offers"],
    request_body = CreateOfferReq,
    responses(
        (status = 200, description = "Created offer successfully", body = StdResponse<OfferEntity, String>)
    )
)]
async fn create_offer(
    State(state): State<AppState>,
    Extension(establishment_id): Extension<i32>,
    Json(body): Json<CreateOfferReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.sale_price >= body.original_price {
        return Err(AppError::BadRequest(
            "Sale price must be below the original price".into(),
        ));
    }
    if body.initial_stock < 1 {
        return Err(AppError::BadRequest("Initial stock must be at least 1".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let profile_count: i64 = establishments::table
        .find(establishment_id)
        .count()
        .get_result(conn)
        .await
        .context("Failed to get establishment count")?;
    if profile_count == 0 {
        return Err(AppError::BadRequest(
            "No establishment profile registered for this identity".into(),
        ));
    }

    let offer: OfferEntity = diesel::insert_into(offers::table)
        .values(CreateOfferEntity {
            establishment_id,
            title: body.title,
            description: body.description,
            category: body.category,
            original_price: body.original_price,
            sale_price: body.sale_price,
            initial_stock: body.initial_stock,
            current_stock: body.initial_stock,
            pickup_window_start: body.pickup_window_start,
            pickup_window_end: body.pickup_window_end,
            status: OfferStatus::Active.as_str().into(),
        })
        .returning(OfferEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create offer")?;

    Ok(StdResponse {
        data: Some(offer),
        message: Some("Created offer successfully"),
    })
}
