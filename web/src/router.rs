//! Router configuration.

use crate::handlers::{admin, analytics, catalog, health, orders, slots};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use kiosk_core::providers::KioskStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete router.
///
/// - `/health`, `/metrics`
/// - `/api/products`, `/api/orders` for the kiosk screen
/// - `/api/admin/...` for the back office (bearer session required)
pub fn build_router<S: KioskStore>(state: AppState<S>) -> Router {
    let admin_routes = Router::new()
        .route("/login", post(admin::login::<S>))
        .route("/logout", post(admin::logout::<S>))
        // Catalog
        .route("/products", get(admin::list_products::<S>).post(admin::create_product::<S>))
        .route(
            "/products/:id",
            patch(admin::update_product::<S>).delete(admin::delete_product::<S>),
        )
        .route("/products/:id/stock", put(admin::set_stock::<S>))
        .route("/products/:id/assignments", get(admin::product_assignments::<S>))
        .route("/products/:id/available/:size", get(admin::available_quantity::<S>))
        // Slots
        .route("/slots", get(slots::slot_map::<S>))
        .route(
            "/slots/:kind/:n",
            get(slots::slot_assignments::<S>)
                .put(slots::assign_spray::<S>)
                .post(slots::assign_bottle::<S>)
                .delete(slots::clear_slot::<S>),
        )
        .route("/slots/:kind/:n/products/:id", delete(slots::remove_assignment::<S>))
        // Reporting
        .route("/orders", get(analytics::order_ledger::<S>))
        .route("/heatmap", get(analytics::heatmap::<S>))
        .route("/analytics/sales", get(analytics::sales::<S>));

    let api_routes = Router::new()
        .route("/products", get(catalog::list_products::<S>))
        .route("/products/:id", get(catalog::get_product::<S>))
        .route("/orders/spray", post(orders::create_spray_order::<S>))
        .route("/orders/bottles", post(orders::create_bottle_order::<S>))
        .route("/orders/:id", get(orders::get_order::<S>))
        .route("/orders/:id/checkout", post(orders::checkout::<S>))
        .route("/orders/:id/verify", post(orders::verify_payment::<S>))
        .route("/orders/:id/fail", post(orders::fail_payment::<S>))
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(health::health_check::<S>))
        .route("/metrics", get(health::metrics::<S>))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(correlation_id_layer())
        .with_state(state)
}
