use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, guest, staff};
use crate::middleware::auth::{auth_middleware, require_admin, require_guest, require_staff};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Create role-specific governor layers
    let staff_governor = create_role_governor(RateLimitedRole::Staff);
    let guest_governor = create_role_governor(RateLimitedRole::Guest);
    // Create IP-based governor for public routes
    let public_governor = create_public_governor();

    // Public routes (with IP-based rate limiting)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Public catalogue and availability routes
    let public_routes = Router::new()
        .route("/accommodations", get(guest::list_accommodations))
        .route("/accommodations/{id}", get(guest::get_accommodation))
        .route("/availability", post(guest::check_availability))
        .layer(public_governor);

    // Guest routes (requires auth + guest role)
    // Rate limit: 100 requests per minute (base)
    let guest_routes = Router::new()
        .route("/bookings", post(guest::create_booking))
        .route("/bookings", get(guest::my_bookings))
        .route("/bookings/{id}", get(guest::my_booking))
        .route("/bookings/{id}/rebookings", post(guest::request_rebooking))
        .layer(guest_governor)
        .layer(middleware::from_fn(require_guest))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Staff routes (requires auth + staff role)
    // Rate limit: 500 requests per minute (5x base)
    let staff_routes = Router::new()
        // Booking management
        .route("/bookings", get(staff::list_bookings))
        .route("/bookings", post(staff::create_walkin_booking))
        .route("/bookings/{id}", get(staff::get_booking))
        .route("/bookings/{id}", put(staff::update_booking))
        .route("/bookings/{id}/status", put(staff::update_status))
        // Payments & refunds
        .route("/payments", post(staff::create_payment))
        .route("/payments/{id}", delete(staff::delete_payment))
        .route("/refunds", post(staff::create_refund))
        .route("/refunds/{id}", put(staff::update_refund))
        .route("/refunds/{id}", delete(staff::delete_refund))
        // Rebookings
        .route("/rebookings", get(staff::list_rebookings))
        .route("/rebookings", post(staff::create_rebooking))
        .route("/rebookings/{id}/approve", post(staff::approve_rebooking))
        .route("/rebookings/{id}/complete", post(staff::complete_rebooking))
        .route("/rebookings/{id}/cancel", post(staff::cancel_rebooking))
        .route("/rebookings/{id}/ledger", get(staff::rebooking_ledger))
        .layer(staff_governor)
        .layer(middleware::from_fn(require_staff))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    // No per-user rate limiter; the global IP limiter still applies
    let admin_routes = Router::new()
        // Accommodation & rate management
        .route("/accommodations", get(admin::list_accommodations))
        .route("/accommodations", post(admin::create_accommodation))
        .route("/accommodations/{id}", put(admin::update_accommodation))
        .route("/accommodations/{id}", delete(admin::delete_accommodation))
        // User management
        .route("/users", get(admin::list_all_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/users/{id}", delete(admin::delete_user))
        // Booking oversight
        .route("/bookings", get(admin::list_all_bookings))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/guest", guest_routes)
        .nest("/api/staff", staff_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
