use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. Everything here is either a liveness probe or part of the sign-in
/// surface — these are the only paths an anonymous caller can reach without
/// a 401.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Credential sign-in. Restricted to admin accounts; the repository
        // lookup itself filters on role.
        .route("/auth/login", post(handlers::login))
        // GET /auth/google
        // Entry point of the OAuth flow: redirects to Google's consent page.
        .route("/auth/google", get(handlers::google_login))
        // GET /auth/callback/google?code=...
        // Completion of the OAuth flow: code exchange, first-seen account
        // provisioning (role fixed to 'user'), session token issuance.
        .route("/auth/callback/google", get(handlers::google_callback))
}
