use crate::database_ops::db::Db;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<UserRow, sqlx::Error> {
    Ok(UserRow {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new user. Returns `None` when the email is already registered.
pub async fn insert_user(db: &Db, email: &str, password_hash: &str) -> Result<Option<UserRow>> {
    let row = sqlx::query(
        "INSERT INTO users (email, password_hash, created_at)
         VALUES ($1, $2, NOW())
         ON CONFLICT (email) DO NOTHING
         RETURNING id, email, password_hash, created_at",
    )
    .bind(email)
    .bind(password_hash)
    .fetch_optional(&db.pool)
    .await?;
    row.as_ref().map(user_from_row).transpose().map_err(Into::into)
}

pub async fn find_by_email(db: &Db, email: &str) -> Result<Option<UserRow>> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(&db.pool)
    .await?;
    row.as_ref().map(user_from_row).transpose().map_err(Into::into)
}

pub async fn find_by_id(db: &Db, id: i64) -> Result<Option<UserRow>> {
    let row = sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&db.pool)
        .await?;
    row.as_ref().map(user_from_row).transpose().map_err(Into::into)
}
