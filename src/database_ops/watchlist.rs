use crate::database_ops::db::Db;
use anyhow::Result;
use tracing::warn;

/// Add a game to a user's watchlist. Re-adding is a no-op.
pub async fn add(db: &Db, user_id: i64, app_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO watchlist (user_id, app_id, added_at)
         VALUES ($1, $2, NOW())
         ON CONFLICT (user_id, app_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(app_id)
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Remove a watchlist entry. Returns whether a row was deleted.
pub async fn remove(db: &Db, user_id: i64, app_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND app_id = $2")
        .bind(user_id)
        .bind(app_id)
        .execute(&db.pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Watched app ids in the order they were added.
///
/// A failed read degrades to an empty list rather than an error: the
/// watchlist is decoration on the profile page and must not take it down.
/// This is the one store read with that policy.
pub async fn watched_app_ids(db: &Db, user_id: i64) -> Vec<i64> {
    let fetched: Result<Vec<i64>, sqlx::Error> = sqlx::query_scalar(
        "SELECT app_id FROM watchlist WHERE user_id = $1 ORDER BY added_at ASC, app_id ASC",
    )
    .bind(user_id)
    .fetch_all(&db.pool)
    .await;
    match fetched {
        Ok(ids) => ids,
        Err(e) => {
            warn!(user_id, error = %e, "watchlist read failed; serving empty list");
            Vec::new()
        }
    }
}
