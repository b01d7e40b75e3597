use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use innboard::{
    AppState,
    config::AppConfig,
    create_router,
    models::{NewRoom, Role, Room, RoomPatch, RoomStatus, User},
    repository::Repository,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// --- Mock Repository ---

// End-to-end mock: requests travel the real router (middleware, extractors,
// handlers) with only the persistence layer canned. The configured Env::Local
// lets tests authenticate with the x-user-id bypass header; the role of the
// resolved user drives the 401/403/200 matrix.
struct MockRepo {
    user_to_return: Option<User>,
    rooms_to_return: Vec<Room>,
    room_to_return: Option<Room>,
    delete_results: Mutex<Vec<bool>>,
}

impl Default for MockRepo {
    fn default() -> Self {
        MockRepo {
            user_to_return: None,
            rooms_to_return: vec![],
            room_to_return: Some(Room::default()),
            delete_results: Mutex::new(vec![true]),
        }
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn list_rooms(&self) -> Result<Vec<Room>, sqlx::Error> {
        Ok(self.rooms_to_return.clone())
    }
    async fn get_room(&self, _id: i64) -> Result<Option<Room>, sqlx::Error> {
        Ok(self.room_to_return.clone())
    }
    async fn insert_room(&self, _room: NewRoom) -> Result<Option<Room>, sqlx::Error> {
        Ok(self.room_to_return.clone())
    }
    async fn update_room(&self, _id: i64, _patch: RoomPatch) -> Result<Option<Room>, sqlx::Error> {
        Ok(self.room_to_return.clone())
    }
    async fn delete_room(&self, _id: i64) -> Result<bool, sqlx::Error> {
        let mut results = self.delete_results.lock().unwrap();
        if results.is_empty() {
            Ok(false)
        } else {
            Ok(results.remove(0))
        }
    }
    async fn get_user(&self, _id: i64) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }
    async fn get_user_by_email(&self, _email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }
    async fn find_admin_by_email(&self, _email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }
    async fn create_oauth_user(
        &self,
        _email: &str,
        _name: Option<&str>,
        _image: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        Ok(User::default())
    }
    async fn link_account(
        &self,
        _user_id: i64,
        _provider: &str,
        _provider_account_id: &str,
    ) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

// --- Test Utilities ---

fn user_with_role(role: Role) -> User {
    User {
        id: 2,
        email: "someone@example.com".to_string(),
        password_hash: None,
        name: None,
        role,
        image: None,
    }
}

fn build_app(repo: MockRepo) -> Router {
    let state = AppState {
        repo: Arc::new(repo),
        // Default config runs as Env::Local, enabling the x-user-id bypass.
        config: AppConfig::default(),
    };
    create_router(state)
}

/// Signed-in request: the bypass header resolves against the mock user table.
fn authed(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "2");
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn anonymous(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = build_app(MockRepo::default());

    let response = app
        .oneshot(anonymous(Method::GET, "/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthenticated_requests_get_401_everywhere() {
    let app = build_app(MockRepo::default());

    for (method, uri) in [
        (Method::GET, "/rooms"),
        (Method::POST, "/rooms"),
        (Method::PUT, "/rooms/1"),
        (Method::DELETE, "/rooms/1"),
        (Method::GET, "/auth/me"),
    ] {
        let response = app
            .clone()
            .oneshot(anonymous(method.clone(), uri))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should reject anonymous callers"
        );
        let body = body_json(response).await;
        assert_eq!(body["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_regular_user_can_read_but_not_mutate() {
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::User)),
        rooms_to_return: vec![Room::default()],
        ..MockRepo::default()
    });

    // GET succeeds for any signed-in principal.
    let response = app
        .clone()
        .oneshot(authed(Method::GET, "/rooms", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Mutations are forbidden regardless of payload validity.
    let valid_payload = json!({
        "name": "Suite 12",
        "roomType": "Deluxe",
        "nightlyRate": 199.99,
    });
    for (method, uri, body) in [
        (Method::POST, "/rooms", Some(valid_payload.clone())),
        (Method::PUT, "/rooms/1", Some(json!({ "name": "X" }))),
        (Method::DELETE, "/rooms/1", None),
    ] {
        let response = app
            .clone()
            .oneshot(authed(method.clone(), uri, body))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "{method} {uri} should be admin-only"
        );
        let body = body_json(response).await;
        assert_eq!(body["message"], "Forbidden: Admin access required");
    }
}

#[tokio::test]
async fn test_admin_create_room_returns_201_with_row() {
    let created = Room {
        id: 7,
        name: "Suite 12".to_string(),
        room_type: "Deluxe".to_string(),
        nightly_rate: 199.99,
        status: RoomStatus::Available,
        notes: None,
    };
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::Admin)),
        room_to_return: Some(created),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(authed(
            Method::POST,
            "/rooms",
            Some(json!({
                "name": "Suite 12",
                "roomType": "Deluxe",
                "nightlyRate": "199.99",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Suite 12");
    // The rate is a JSON number, never a string.
    assert_eq!(body["nightlyRate"], json!(199.99));
    assert_eq!(body["status"], "available");
}

#[tokio::test]
async fn test_admin_create_room_validation_errors_as_list() {
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::Admin)),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(authed(Method::POST, "/rooms", Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 3);
    assert!(errors.contains(&json!("Room name is required.")));
}

#[tokio::test]
async fn test_admin_update_with_no_valid_fields() {
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::Admin)),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(authed(Method::PUT, "/rooms/1", Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "No valid fields to update.");
}

#[tokio::test]
async fn test_admin_delete_twice_is_200_then_404() {
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::Admin)),
        delete_results: Mutex::new(vec![true]),
        ..MockRepo::default()
    });

    let response = app
        .clone()
        .oneshot(authed(Method::DELETE, "/rooms/7", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Room removed.");

    let response = app
        .oneshot(authed(Method::DELETE, "/rooms/7", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Room not found.");
}

#[tokio::test]
async fn test_non_numeric_room_id_is_client_error() {
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::Admin)),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(authed(Method::DELETE, "/rooms/abc", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_body_is_400_not_500() {
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::Admin)),
        ..MockRepo::default()
    });

    let request = Request::builder()
        .method(Method::POST)
        .uri("/rooms")
        .header("x-user-id", "2")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid request body.");
}

#[tokio::test]
async fn test_auth_me_returns_profile() {
    let app = build_app(MockRepo {
        user_to_return: Some(user_with_role(Role::User)),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(authed(Method::GET, "/auth/me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "someone@example.com");
    assert_eq!(body["role"], "user");
}
