use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer. Orders are the only resource a standard user can
/// touch: they can place orders and list their own.
///
/// Access Control Strategy:
/// The router layer above this module attaches the `auth_middleware` built on
/// the `AuthUser` extractor, so requests without a valid bearer token are
/// rejected with 401 before any handler runs. The handlers additionally take
/// `AuthUser` themselves to stamp and scope by the resolved identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /orders — admins see every order; everyone else only rows
        // matching their own user id.
        // POST /orders — creates an order bound to the verified identity.
        // Client-supplied user_id/user_email are ignored.
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
}
