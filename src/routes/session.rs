use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Session Router Module
///
/// Introspection endpoints for signed-in clients. Sits behind the
/// authentication middleware layer like the rooms resource.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/me
        // The authenticated principal's profile.
        .route("/auth/me", get(handlers::get_session))
}
