use anyhow::Result;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    service::orders::PickupReceipt,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/establishments/pickups",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(validate_pickup))
            .route_layer(axum::middleware::from_fn(
                middleware::establishments_authorization,
            )),
    )
}

#[derive(Deserialize, ToSchema)]
struct ValidatePickupReq {
    code: String,
}

/// Redeem a consumer's pickup code. Succeeds at most once per order.
#[utoipa::path(
    post,
    path = "/validate",
    tags = ["Pickups"],
    request_body = ValidatePickupReq,
    responses(
        (status = 200, description = "Order picked up successfully", body = StdResponse<PickupReceipt, String>)
    )
)]
async fn validate_pickup(
    State(state): State<AppState>,
    Json(body): Json<ValidatePickupReq>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = crate::service::orders::validate_pickup(&state, &body.code).await?;

    Ok(StdResponse {
        data: Some(receipt),
        message: Some("Order picked up successfully"),
    })
}
