use anyhow::{Context, Result};
use axum::{Json, extract::State, response::IntoResponse};
use diesel::SelectableHelper;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::{CreateEstablishmentEntity, EstablishmentEntity},
    schema::establishments,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/establishments/profile",
        OpenApiRouter::new().routes(utoipa_axum::routes!(create_profile)),
    )
}

#[derive(Deserialize, ToSchema)]
struct CreateProfileReq {
    name: String,
    address: Option<String>,
}

/// Register the display profile for a new establishment. Credentials live in
/// the identity service; only the profile shown to consumers is stored here.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Establishments"],
    request_body = CreateProfileReq,
    responses(
        (status = 200, description = "Created establishment profile successfully", body = StdResponse<EstablishmentEntity, String>)
    )
)]
async fn create_profile(
    State(state): State<AppState>,
    Json(body): Json<CreateProfileReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let establishment: EstablishmentEntity = diesel::insert_into(establishments::table)
        .values(CreateEstablishmentEntity {
            name: body.name,
            address: body.address,
        })
        .returning(EstablishmentEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create establishment")?;

    Ok(StdResponse {
        data: Some(establishment),
        message: Some("Created establishment profile successfully"),
    })
}
