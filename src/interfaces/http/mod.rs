//! HTTP transport: routing, caller identity and rate governance.

pub mod handlers;
pub mod identity;
pub mod rate_limit;
pub mod response;

use crate::application::catalog::ProductCatalog;
use crate::application::governor::RateGovernor;
use crate::application::orders::OrderPlacementCoordinator;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<OrderPlacementCoordinator>,
    pub catalog: Arc<ProductCatalog>,
}

impl AppState {
    pub fn new(coordinator: OrderPlacementCoordinator, catalog: ProductCatalog) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            catalog: Arc::new(catalog),
        }
    }
}

/// Builds the API router. The governor runs ahead of every route.
pub fn router(state: AppState, governor: RateGovernor) -> Router {
    Router::new()
        .route(
            "/api/orders",
            post(handlers::place_order).get(handlers::list_orders),
        )
        .route("/api/products", get(handlers::list_products))
        .route("/api/products/{id}", get(handlers::get_product))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(governor, rate_limit::govern))
        .with_state(state)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
