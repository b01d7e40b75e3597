use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Rooms Router Module
///
/// The single resource this service manages. The router itself sits behind
/// the authentication middleware layer; the role split happens per handler:
///
/// - GET is open to any signed-in principal (`AuthUser`).
/// - POST/PUT/DELETE require the admin role (`AdminUser`), which rejects
///   with 403 after authentication has already succeeded — never collapsing
///   "who are you" (401) into "what can you do" (403).
pub fn room_routes() -> Router<AppState> {
    Router::new()
        // GET  /rooms — list all rooms, newest id first.
        // POST /rooms — create a room (admin only, validated payload).
        .route(
            "/rooms",
            get(handlers::list_rooms).post(handlers::create_room),
        )
        // PUT    /rooms/{id} — sparse update of the supplied fields (admin only).
        // DELETE /rooms/{id} — hard delete (admin only).
        .route(
            "/rooms/{id}",
            axum::routing::put(handlers::update_room).delete(handlers::delete_room),
        )
}
