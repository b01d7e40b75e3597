use crate::models::{NewRoom, Room, RoomPatch, RoomRow, User};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. The handlers
/// interact with the data layer only through this trait, so tests can swap in
/// a mock and the route layer never mutates persisted state directly.
///
/// Every method returns a `Result` — a storage failure is a first-class
/// outcome that the route layer maps to a generic 500, never a swallowed
/// empty value.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Rooms ---
    // Full listing, newest id first.
    async fn list_rooms(&self) -> Result<Vec<Room>, sqlx::Error>;
    // Single-row read, used by the write read-backs.
    async fn get_room(&self, id: i64) -> Result<Option<Room>, sqlx::Error>;
    // Insert followed by a read-back of the generated id. `Ok(None)` means the
    // read-back lost a race against a concurrent delete.
    async fn insert_room(&self, room: NewRoom) -> Result<Option<Room>, sqlx::Error>;
    // Sparse update: writes only the fields the patch marks present.
    // `Ok(None)` covers both "no such row" and a read-back lost to a
    // concurrent delete; the route layer reports both as NotFound.
    async fn update_room(&self, id: i64, patch: RoomPatch) -> Result<Option<Room>, sqlx::Error>;
    // `Ok(false)` when no row matched.
    async fn delete_room(&self, id: i64) -> Result<bool, sqlx::Error>;

    // --- Users (session-provider edge) ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    /// Credential sign-in is restricted to admin rows; regular users only
    /// ever authenticate through OAuth.
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    /// First-seen OAuth identity provisioning. The role is fixed to `user`
    /// here; nothing reachable from a request can choose a different role.
    async fn create_oauth_user(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, sqlx::Error>;
    /// Records the external-provider linkage. Idempotent per provider identity.
    async fn link_account(
        &self,
        user_id: i64,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<(), sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL pool. Connections are acquired per statement and released when
/// the statement completes; nothing is held across requests.
pub struct PostgresRepository {
    pool: PgPool,
}

const ROOM_COLUMNS: &str = "id, name, room_type, nightly_rate, status, notes";
const USER_COLUMNS: &str = "id, email, password_hash, name, role, image";

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_rooms
    ///
    /// Newest-id-first listing. The `RoomRow` → `Room` mapping coerces the
    /// NUMERIC rate back into an f64 on every read.
    async fn list_rooms(&self) -> Result<Vec<Room>, sqlx::Error> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RoomRow::into_room).collect())
    }

    async fn get_room(&self, id: i64) -> Result<Option<Room>, sqlx::Error> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RoomRow::into_room))
    }

    /// insert_room
    ///
    /// INSERT followed by a separate read-back SELECT, so the response
    /// reflects exactly what the storage layer now holds (including the
    /// NUMERIC(10,2) rounding of the rate). The two statements are not
    /// wrapped in a transaction; a concurrent delete between them surfaces
    /// as `Ok(None)`.
    async fn insert_room(&self, room: NewRoom) -> Result<Option<Room>, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO rooms (name, room_type, nightly_rate, status, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&room.name)
        .bind(&room.room_type)
        .bind(room.nightly_rate)
        .bind(room.status)
        .bind(&room.notes)
        .fetch_one(&self.pool)
        .await?;

        self.get_room(id).await
    }

    /// update_room
    ///
    /// Builds the UPDATE from only the fields the patch marks present, using
    /// QueryBuilder for safe parameterization. Zero affected rows means the
    /// room does not exist. The read-back afterwards is, like on insert, not
    /// transactional — last-write-wins between concurrent writers.
    ///
    /// Callers must pass a non-empty patch; the route layer rejects empty
    /// ones before reaching here.
    async fn update_room(&self, id: i64, patch: RoomPatch) -> Result<Option<Room>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("UPDATE rooms SET ");
        let mut fields = builder.separated(", ");

        if let Some(name) = &patch.name {
            fields.push("name = ");
            fields.push_bind_unseparated(name);
        }
        if let Some(room_type) = &patch.room_type {
            fields.push("room_type = ");
            fields.push_bind_unseparated(room_type);
        }
        if let Some(rate) = patch.nightly_rate {
            fields.push("nightly_rate = ");
            fields.push_bind_unseparated(rate);
        }
        if let Some(status) = patch.status {
            fields.push("status = ");
            fields.push_bind_unseparated(status);
        }
        if let Some(notes) = &patch.notes {
            // `Some(None)` writes SQL NULL: a present-but-blank notes key
            // clears the column.
            fields.push("notes = ");
            fields.push_bind_unseparated(notes.as_deref());
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let affected = builder.build().execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Ok(None);
        }

        self.get_room(id).await
    }

    /// delete_room
    ///
    /// Hard delete; no soft-delete or versioning exists for rooms.
    async fn delete_room(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // --- Users ---

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND role = 'admin'"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// create_oauth_user
    ///
    /// Inserts the first-seen OAuth identity with the fixed `user` role and
    /// returns the stored row.
    async fn create_oauth_user(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, image, role) VALUES ($1, $2, $3, 'user') \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(image)
        .fetch_one(&self.pool)
        .await
    }

    /// link_account
    ///
    /// `ON CONFLICT DO NOTHING` against the (provider, provider_account_id)
    /// key makes repeat sign-ins idempotent.
    async fn link_account(
        &self,
        user_id: i64,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO accounts (user_id, type, provider, provider_account_id) \
             VALUES ($1, 'oauth', $2, $3) \
             ON CONFLICT (provider, provider_account_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(provider)
        .bind(provider_account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
