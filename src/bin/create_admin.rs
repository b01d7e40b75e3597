use sqlx::postgres::PgPoolOptions;
use std::env;

/// create_admin
///
/// Operational bootstrap tool: provisions (or promotes) an administrator
/// account. This is the only path that assigns the `admin` role — the OAuth
/// flow always provisions plain `user` accounts, and no API request can
/// change a role.
///
/// Usage: create_admin <email> <password>
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    let (email, password) = match (args.next(), args.next()) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            eprintln!("Usage: create_admin <email> <password>");
            eprintln!("Example: create_admin admin@example.com mypassword");
            std::process::exit(1);
        }
    };

    let db_url = env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let password_hash =
        bcrypt::hash(&password, bcrypt::DEFAULT_COST).expect("Failed to hash password");

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&pool)
        .await
        .expect("Failed to query users. Has the schema been applied?");

    match existing {
        Some(id) => {
            sqlx::query("UPDATE users SET password_hash = $1, role = 'admin' WHERE id = $2")
                .bind(&password_hash)
                .bind(id)
                .execute(&pool)
                .await
                .expect("Failed to update user");
            println!("User {email} already existed; password reset and promoted to admin.");
        }
        None => {
            sqlx::query("INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'admin')")
                .bind(&email)
                .bind(&password_hash)
                .execute(&pool)
                .await
                .expect("Failed to insert user");
            println!("Admin {email} created.");
        }
    }
}
