//! Router assembly.
//!
//! Public routes and authenticated routes are built separately; the
//! authenticated group gets the bearer token middleware as a route layer,
//! then both are merged under shared tracing and CORS layers.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{config::Config, handlers, middleware, state::AppState};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn cors_layer(config: &Config) -> CorsLayer {
    match config.cors_allowed_origin.as_deref() {
        None => CorsLayer::permissive(),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                tracing::warn!(origin, "invalid CORS_ALLOWED_ORIGIN, cross-origin requests disabled");
                CorsLayer::new()
            }
        },
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/oauth/status", get(handlers::oauth::status))
        .route("/api/v1/oauth/{provider}", get(handlers::oauth::authorize))
        .route("/api/v1/categories", get(handlers::catalog::list_categories))
        .route("/api/v1/services", get(handlers::catalog::list_services))
        .route("/api/v1/services/{id}", get(handlers::catalog::get_service))
        .route(
            "/api/v1/services/{id}/availability",
            get(handlers::catalog::list_availability),
        )
        .route("/api/v1/content/faq", get(handlers::content::list_faq))
        .route("/api/v1/content/{slug}", get(handlers::content::get_page));

    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes + MULTIPART_OVERHEAD);
    let file_routes = Router::new()
        .route("/api/v1/files/avatar", post(handlers::files::upload_avatar))
        .route(
            "/api/v1/files/service",
            post(handlers::files::upload_service_image),
        )
        .route(
            "/api/v1/files/category-icon",
            post(handlers::files::upload_category_icon),
        )
        .layer(upload_limit);

    let admin_routes = Router::new()
        .route("/api/v1/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/v1/admin/users/{id}/role",
            put(handlers::admin::change_user_role),
        )
        .route(
            "/api/v1/admin/users/{id}/status",
            put(handlers::admin::change_user_status),
        )
        .route(
            "/api/v1/admin/categories",
            get(handlers::admin::list_categories).post(handlers::admin::create_category),
        )
        .route(
            "/api/v1/admin/categories/{id}",
            put(handlers::admin::update_category).delete(handlers::admin::delete_category),
        )
        .route("/api/v1/admin/analytics", get(handlers::admin::analytics))
        .route(
            "/api/v1/admin/schedule-requests",
            get(handlers::admin::list_schedule_requests),
        )
        .route("/api/v1/admin/settings", get(handlers::admin::list_settings))
        .route(
            "/api/v1/admin/settings/{key}",
            put(handlers::admin::update_setting),
        )
        .route(
            "/api/v1/admin/security-logs",
            get(handlers::admin::list_security_logs),
        )
        .route("/api/v1/admin/reports", get(handlers::admin::list_reports))
        .route(
            "/api/v1/admin/reports/{id}/resolve",
            post(handlers::admin::resolve_report),
        )
        .route(
            "/api/v1/admin/content/{slug}",
            put(handlers::admin::upsert_page),
        )
        .route(
            "/api/v1/admin/faqs",
            get(handlers::admin::list_faqs).post(handlers::admin::create_faq),
        )
        .route(
            "/api/v1/admin/faqs/{id}",
            put(handlers::admin::update_faq).delete(handlers::admin::delete_faq),
        );

    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))
        .route("/api/v1/users/me", put(handlers::auth::update_me))
        // Services
        .route("/api/v1/services", post(handlers::catalog::create_service))
        .route("/api/v1/services/mine", get(handlers::catalog::my_services))
        .route(
            "/api/v1/services/{id}",
            put(handlers::catalog::update_service).delete(handlers::catalog::delete_service),
        )
        .route(
            "/api/v1/services/{id}/availability",
            post(handlers::catalog::create_availability),
        )
        .route(
            "/api/v1/availability/{id}",
            delete(handlers::catalog::delete_availability),
        )
        // Schedule requests
        .route(
            "/api/v1/schedule-requests",
            post(handlers::schedule_requests::create).get(handlers::schedule_requests::list_mine),
        )
        .route(
            "/api/v1/schedule-requests/incoming",
            get(handlers::schedule_requests::list_incoming),
        )
        .route(
            "/api/v1/schedule-requests/{id}",
            get(handlers::schedule_requests::get),
        )
        .route(
            "/api/v1/schedule-requests/{id}/accept",
            post(handlers::schedule_requests::accept),
        )
        .route(
            "/api/v1/schedule-requests/{id}/reject",
            post(handlers::schedule_requests::reject),
        )
        .route(
            "/api/v1/schedule-requests/{id}/cancel",
            post(handlers::schedule_requests::cancel),
        )
        .route("/api/v1/bookings", get(handlers::schedule_requests::list_mine))
        // Notifications
        .route("/api/v1/notifications", get(handlers::notifications::list))
        .route(
            "/api/v1/notifications/unread-count",
            get(handlers::notifications::unread_count),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(handlers::notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            post(handlers::notifications::mark_read),
        )
        .route("/api/v1/reports", post(handlers::content::create_report))
        .merge(file_routes)
        .merge(admin_routes)
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let uploads = ServeDir::new(&state.config.upload_dir);
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(public_routes)
        .merge(authenticated_routes)
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

