use super::AppState;
use super::identity::AuthenticatedCaller;
use super::response::ApiResponse;
use crate::domain::order::{Order, OrderLine};
use crate::domain::product::{Product, ProductId};
use crate::error::{AppError, Result};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::instrument;

/// One requested line as sent by clients.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[instrument(
    name = "handler::place_order",
    skip(state, caller, payload),
    fields(caller = %caller.0)
)]
pub async fn place_order(
    State(state): State<AppState>,
    caller: AuthenticatedCaller,
    payload: std::result::Result<Json<Vec<OrderLineRequest>>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Order>>)> {
    let Json(requested) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let lines = requested
        .iter()
        .map(|line| OrderLine::parse(&line.product_id, line.quantity))
        .collect::<Result<Vec<_>>>()?;

    let order = state.coordinator.place_order(caller.0, lines).await?;
    state.catalog.invalidate();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("order placed successfully", order)),
    ))
}

#[instrument(name = "handler::list_orders", skip(state, caller), fields(caller = %caller.0))]
pub async fn list_orders(
    State(state): State<AppState>,
    caller: AuthenticatedCaller,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = state.coordinator.orders_for(caller.0).await?;
    Ok(Json(ApiResponse::ok("orders retrieved", orders)))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = state.catalog.list().await?;
    Ok(Json(ApiResponse::ok("products listed", products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>> {
    let id: ProductId = id.parse()?;
    let product = state.catalog.product(id).await?;
    Ok(Json(ApiResponse::ok("product retrieved", product)))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
