//! Trusted-identity extraction.
//!
//! Authentication itself lives in an upstream identity service; by the time a
//! request reaches this service, the gateway has already resolved the caller
//! to a numeric id carried in a header. These layers only lift that id into a
//! request extension.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::app_error::AppError;

const CONSUMER_ID_HEADER: &str = "x-consumer-id";
const ESTABLISHMENT_ID_HEADER: &str = "x-establishment-id";

fn identity_from_header(req: &Request, header_name: &str) -> Result<i32, AppError> {
    req.headers()
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i32>().ok())
        .ok_or(AppError::Unauthorized)
}

pub async fn consumers_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    let consumer_id = identity_from_header(&req, CONSUMER_ID_HEADER)?;
    req.extensions_mut().insert(consumer_id);
    Ok(next.run(req).await)
}

pub async fn establishments_authorization(
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let establishment_id = identity_from_header(&req, ESTABLISHMENT_ID_HEADER)?;
    req.extensions_mut().insert(establishment_id);
    Ok(next.run(req).await)
}
