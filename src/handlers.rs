use crate::{
    AppState,
    auth::{AdminUser, AuthUser, issue_token},
    error::ApiError,
    models::{
        CreateRoomRequest, LoginRequest, LoginResponse, MessageResponse, Room, SessionUser,
        UpdateRoomRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Redirect,
};
use serde::Deserialize;

// --- Rooms ---

/// list_rooms
///
/// [Authenticated Route] Lists every room, newest id first. Read access is
/// open to any signed-in principal regardless of role; only mutations are
/// admin-gated.
#[utoipa::path(
    get,
    path = "/rooms",
    responses(
        (status = 200, description = "All rooms", body = [Room]),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn list_rooms(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let rooms = state
        .repo
        .list_rooms()
        .await
        .map_err(|e| ApiError::storage("Unable to load rooms.", e))?;

    Ok(Json(rooms))
}

/// create_room
///
/// [Admin Route] Creates a room. Validation collects every violation before
/// anything touches storage; a payload that fails validation inserts nothing.
///
/// *Note*: the created row is read back after the insert so the response
/// carries exactly what storage now holds, including the NUMERIC rounding of
/// the rate. Losing that read-back to a concurrent delete is a storage-level
/// failure — the write itself succeeded.
#[utoipa::path(
    post,
    path = "/rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Created", body = Room),
        (status = 400, description = "Validation errors"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Not an admin"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_room(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    // A body that does not parse is a caller mistake, not a server crash.
    let Json(payload) = payload.map_err(|_| ApiError::BadRequest("Invalid request body."))?;

    let room = payload.validate().map_err(ApiError::Validation)?;

    let created = state
        .repo
        .insert_room(room)
        .await
        .map_err(|e| ApiError::storage("Unable to create room.", e))?;

    let created = created.ok_or_else(|| {
        ApiError::storage("Unable to load created room.", sqlx::Error::RowNotFound)
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// update_room
///
/// [Admin Route] Sparse update: only the fields present in the payload are
/// validated and written; absent fields stay untouched. A payload that
/// validates to zero applicable fields is its own 400, distinct from
/// validation failure.
#[utoipa::path(
    put,
    path = "/rooms/{id}",
    params(("id" = i64, Path, description = "Room ID")),
    request_body = UpdateRoomRequest,
    responses(
        (status = 200, description = "Updated", body = Room),
        (status = 400, description = "Validation errors or empty update"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Room not found"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn update_room(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateRoomRequest>, JsonRejection>,
) -> Result<Json<Room>, ApiError> {
    if id == 0 {
        return Err(ApiError::BadRequest("Invalid room id."));
    }

    let Json(payload) = payload.map_err(|_| ApiError::BadRequest("Invalid request body."))?;

    let patch = payload.validate().map_err(ApiError::Validation)?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("No valid fields to update."));
    }

    match state.repo.update_room(id, patch).await {
        Ok(Some(room)) => Ok(Json(room)),
        // Covers both a missing row and an update whose read-back lost the
        // race against a concurrent delete.
        Ok(None) => Err(ApiError::NotFound("Room not found.")),
        Err(e) => Err(ApiError::storage("Unable to update room.", e)),
    }
}

/// delete_room
///
/// [Admin Route] Hard delete. Deleting the same id twice yields 200 then 404.
#[utoipa::path(
    delete,
    path = "/rooms/{id}",
    params(("id" = i64, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Room not found"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn delete_room(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if id == 0 {
        return Err(ApiError::BadRequest("Invalid room id."));
    }

    match state.repo.delete_room(id).await {
        Ok(true) => Ok(Json(MessageResponse {
            message: "Room removed.".to_string(),
        })),
        Ok(false) => Err(ApiError::NotFound("Room not found.")),
        Err(e) => Err(ApiError::storage("Unable to delete room.", e)),
    }
}

// --- Session ---

/// login
///
/// [Public Route] Credential sign-in. Reserved for administrators — regular
/// users come in through the OAuth flow — so the lookup itself is filtered to
/// admin rows. Unknown email, missing hash and wrong password are one
/// indistinguishable rejection.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .repo
        .find_admin_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::storage("Unable to sign in.", e))?
        .ok_or(ApiError::InvalidCredentials)?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = bcrypt::verify(&payload.password, hash)
        .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(user.id, &state.config.jwt_secret)?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// get_session
///
/// [Authenticated Route] The current principal's profile. The principal only
/// carries id/email/role, so the full profile (name, image) is re-read here.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current session", body = SessionUser),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SessionUser>, ApiError> {
    let profile = match state.repo.get_user(user.id).await {
        Ok(Some(profile)) => profile,
        _ => return Err(ApiError::Unauthenticated),
    };

    Ok(Json(profile.into()))
}

// --- Google OAuth ---

/// Shape of Google's token-endpoint response; only the access token is used.
#[derive(Deserialize)]
struct GoogleTokens {
    access_token: String,
}

/// The subset of Google's userinfo payload this service consumes.
#[derive(Deserialize)]
struct GoogleProfile {
    id: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

/// Query parameters Google sends back to the callback endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct OAuthCallback {
    pub code: String,
}

/// google_login
///
/// [Public Route] Redirects the browser to Google's consent screen. The
/// provider owns the whole consent/credential exchange; this service never
/// sees a Google password.
#[utoipa::path(
    get,
    path = "/auth/google",
    responses((status = 307, description = "Redirect to Google consent"))
)]
pub async fn google_login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let url = reqwest::Url::parse_with_params(
        "https://accounts.google.com/o/oauth2/v2/auth",
        &[
            ("client_id", state.config.google_client_id.as_str()),
            ("redirect_uri", state.config.google_redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
        ],
    )
    .map_err(|e| ApiError::Internal(format!("consent url construction failed: {e}")))?;

    Ok(Redirect::temporary(url.as_str()))
}

/// google_callback
///
/// [Public Route] Completes the OAuth flow: exchanges the authorization code,
/// fetches the user's profile, provisions a first-seen account with the fixed
/// `user` role, links the provider identity, and issues a session token.
///
/// *Invariant*: role is decided here (and only here) for OAuth accounts —
/// always `user`. An existing account keeps whatever role it already has; the
/// request can never pick its own.
#[utoipa::path(
    get,
    path = "/auth/callback/google",
    params(OAuthCallback),
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 500, description = "Exchange or storage failure")
    )
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallback>,
) -> Result<Json<LoginResponse>, ApiError> {
    let client = reqwest::Client::new();

    let tokens: GoogleTokens = client
        .post("https://oauth2.googleapis.com/token")
        .form(&[
            ("code", query.code.as_str()),
            ("client_id", state.config.google_client_id.as_str()),
            ("client_secret", state.config.google_client_secret.as_str()),
            ("redirect_uri", state.config.google_redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let profile: GoogleProfile = client
        .get("https://www.googleapis.com/oauth2/v2/userinfo")
        .bearer_auth(&tokens.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let user = match state
        .repo
        .get_user_by_email(&profile.email)
        .await
        .map_err(|e| ApiError::storage("Unable to sign in.", e))?
    {
        Some(user) => user,
        None => state
            .repo
            .create_oauth_user(&profile.email, profile.name.as_deref(), profile.picture.as_deref())
            .await
            .map_err(|e| ApiError::storage("Unable to sign in.", e))?,
    };

    state
        .repo
        .link_account(user.id, "google", &profile.id)
        .await
        .map_err(|e| ApiError::storage("Unable to sign in.", e))?;

    let token = issue_token(user.id, &state.config.jwt_secret)?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}
