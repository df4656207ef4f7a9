use crate::{
    auth, demo, handlers, // Import handler modules
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route(
            "/api/v1/jokes",
            get(handlers::list_jokes).post(handlers::create_joke),
        )
        .route("/api/v1/jokes/today", get(handlers::get_joke_of_the_day))
        .route(
            "/api/v1/jokes/{id}",
            get(handlers::get_joke)
                .put(handlers::update_joke)
                .delete(handlers::delete_joke),
        );
    if state.demo {
        router = router.merge(demo::routes());
    }

    router
        // Middleware Layers
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::access_guard,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state) // Pass the application state
}
