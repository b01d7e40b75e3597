use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// RoomStatus
///
/// The closed set of occupancy states a room can be in. Stored as lowercase
/// text in the `rooms.status` column and serialized identically over the API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[ts(export)]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    /// Parses a raw payload value. Returns `None` for anything outside the
    /// enum, which validation reports as "Status is invalid."
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(RoomStatus::Available),
            "occupied" => Some(RoomStatus::Occupied),
            "maintenance" => Some(RoomStatus::Maintenance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

/// Room
///
/// A room record as the API exposes it. `nightly_rate` is always a JSON
/// number here; the NUMERIC column representation never leaks past the
/// repository (see `RoomRow`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub room_type: String,
    pub nightly_rate: f64,
    pub status: RoomStatus,
    pub notes: Option<String>,
}

/// RoomRow
///
/// Raw database row for `rooms`. The rate column is NUMERIC(10,2) and decodes
/// as a `Decimal`; `into_room` is the single place that coercion back to a
/// numeric API type happens, so a consumer can never observe a stringly typed
/// rate.
#[derive(Debug, Clone, FromRow)]
pub struct RoomRow {
    pub id: i64,
    pub name: String,
    pub room_type: String,
    pub nightly_rate: Decimal,
    pub status: RoomStatus,
    pub notes: Option<String>,
}

impl RoomRow {
    pub fn into_room(self) -> Room {
        Room {
            id: self.id,
            name: self.name,
            room_type: self.room_type,
            // NUMERIC(10,2) always fits in an f64.
            nightly_rate: self.nightly_rate.to_f64().unwrap_or(0.0),
            status: self.status,
            notes: self.notes,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateRoomRequest
///
/// Input payload for POST /rooms. Fields are optional at the serde layer so
/// that validation, not deserialization, reports what is missing — the caller
/// gets every violation at once instead of a single type error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateRoomRequest {
    pub name: Option<String>,
    pub room_type: Option<String>,
    /// Accepted as a JSON number or a numeric string; coerced during validation.
    #[ts(type = "number | string | null")]
    #[schema(value_type = Option<f64>)]
    pub nightly_rate: Option<Value>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Deserializes a field so that "key absent" (outer `None`) stays
/// distinguishable from "key present with value null" (`Some(None)`). A
/// sparse update must leave absent fields untouched while an explicit null
/// still goes through validation.
fn patch_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// UpdateRoomRequest
///
/// Partial-update payload for PUT /rooms/{id}. Every field is double-wrapped:
/// only keys actually present in the request are validated and applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateRoomRequest {
    #[serde(default, deserialize_with = "patch_field")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_field")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub room_type: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_field")]
    #[ts(type = "number | string | null")]
    #[schema(value_type = Option<f64>)]
    pub nightly_rate: Option<Option<Value>>,

    #[serde(default, deserialize_with = "patch_field")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub status: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_field")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

// --- Validated Write Payloads (Internal) ---

/// NewRoom
///
/// A fully validated create payload. Constructing one is only possible
/// through `CreateRoomRequest::validate`, so every insert the repository
/// performs already satisfies the field invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoom {
    pub name: String,
    pub room_type: String,
    pub nightly_rate: Decimal,
    pub status: RoomStatus,
    pub notes: Option<String>,
}

/// RoomPatch
///
/// The explicit per-field sparse update: `Some` means "write this column",
/// `None` means "leave it untouched". `notes` is nested because a present
/// null/blank clears the column to SQL NULL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub room_type: Option<String>,
    pub nightly_rate: Option<Decimal>,
    pub status: Option<RoomStatus>,
    pub notes: Option<Option<String>>,
}

impl RoomPatch {
    /// True when validation recognized no fields to apply.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.room_type.is_none()
            && self.nightly_rate.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

/// Coerces the lenient rate representations the form client sends (a JSON
/// number or a numeric string) and applies the rate invariant: finite and
/// strictly positive. Anything else is `None`.
fn coerce_rate(value: &Value) -> Option<Decimal> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if !number.is_finite() || number <= 0.0 {
        return None;
    }
    Decimal::from_f64(number)
}

/// Trims notes; blank or whitespace-only input becomes NULL rather than an
/// empty string.
fn normalize_notes(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl CreateRoomRequest {
    /// validate
    ///
    /// Evaluates every rule eagerly and collects ALL violations, so the
    /// caller sees the full list at once rather than one error per round
    /// trip. An absent (or null) `status` silently defaults to `available`,
    /// while a supplied-but-invalid one is rejected.
    pub fn validate(self) -> Result<NewRoom, Vec<String>> {
        let mut errors = Vec::new();

        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if name.is_none() {
            errors.push("Room name is required.".to_string());
        }

        let room_type = self
            .room_type
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if room_type.is_none() {
            errors.push("Room type is required.".to_string());
        }

        let nightly_rate = self.nightly_rate.as_ref().and_then(coerce_rate);
        if nightly_rate.is_none() {
            errors.push("Nightly rate must be a positive number.".to_string());
        }

        let status = match self.status.as_deref() {
            None => Some(RoomStatus::default()),
            Some(raw) => {
                let parsed = RoomStatus::parse(raw);
                if parsed.is_none() {
                    errors.push("Status is invalid.".to_string());
                }
                parsed
            }
        };

        let notes = normalize_notes(self.notes.as_deref());

        match (name, room_type, nightly_rate, status) {
            (Some(name), Some(room_type), Some(nightly_rate), Some(status))
                if errors.is_empty() =>
            {
                Ok(NewRoom {
                    name: name.to_string(),
                    room_type: room_type.to_string(),
                    nightly_rate,
                    status,
                    notes,
                })
            }
            _ => Err(errors),
        }
    }
}

impl UpdateRoomRequest {
    /// validate
    ///
    /// Sparse-update validation: only keys present in the payload are
    /// checked, each with the same rule as on create, and ALL violations are
    /// collected. An absent `status` is left untouched here — the
    /// create-time defaulting does not apply to updates.
    pub fn validate(self) -> Result<RoomPatch, Vec<String>> {
        let mut errors = Vec::new();
        let mut patch = RoomPatch::default();

        if let Some(value) = self.name {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(name) => patch.name = Some(name.to_string()),
                None => errors.push("Room name cannot be empty.".to_string()),
            }
        }

        if let Some(value) = self.room_type {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(room_type) => patch.room_type = Some(room_type.to_string()),
                None => errors.push("Room type cannot be empty.".to_string()),
            }
        }

        if let Some(value) = self.nightly_rate {
            match value.as_ref().and_then(coerce_rate) {
                Some(rate) => patch.nightly_rate = Some(rate),
                None => errors.push("Nightly rate must be a positive number.".to_string()),
            }
        }

        if let Some(value) = self.status {
            match value.as_deref().and_then(RoomStatus::parse) {
                Some(status) => patch.status = Some(status),
                None => errors.push("Status is invalid.".to_string()),
            }
        }

        if let Some(value) = self.notes {
            // A present notes key always applies; null or blank clears the column.
            patch.notes = Some(normalize_notes(value.as_deref()));
        }

        if errors.is_empty() { Ok(patch) } else { Err(errors) }
    }
}

// --- Identity Schemas ---

/// Role
///
/// The single authorization axis. Fixed at account creation: `user` for
/// first-seen OAuth identities, `admin` only via direct provisioning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// User
///
/// Canonical identity record from the `users` table. The password hash never
/// leaves the repository/auth boundary; `SessionUser` is the outward shape.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub image: Option<String>,
}

/// SessionUser
///
/// The profile a signed-in client sees (GET /auth/me, sign-in responses).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: Role,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        SessionUser {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            role: user.role,
        }
    }
}

/// LoginRequest
///
/// Credential sign-in payload (POST /auth/login). The password is only ever
/// compared against the stored salted hash, never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Output of both sign-in flows: the signed session token plus the resolved
/// profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// MessageResponse
///
/// Generic single-message body used by DELETE /rooms/{id} and error paths.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
