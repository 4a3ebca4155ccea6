use crate::database_ops::db::Db;
use anyhow::Result;

/// App ids the price collector should visit, oldest first.
pub async fn active_tracked_ids(db: &Db) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT app_id
         FROM games_to_track
         WHERE status = 'active' AND is_free_to_play = FALSE
         ORDER BY added_at",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(ids)
}

pub async fn is_tracked(db: &Db, app_id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT app_id FROM games_to_track WHERE app_id = $1")
        .bind(app_id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(found.is_some())
}

/// Record that an already-tracked game showed up in the top sellers again.
pub async fn touch_last_seen(db: &Db, app_id: i64) -> Result<()> {
    sqlx::query("UPDATE games_to_track SET last_seen_in_top = NOW() WHERE app_id = $1")
        .bind(app_id)
        .execute(&db.pool)
        .await?;
    Ok(())
}

pub async fn insert_tracked(db: &Db, app_id: i64, source: &str, is_free: bool) -> Result<()> {
    sqlx::query(
        "INSERT INTO games_to_track (app_id, source, is_free_to_play, status, added_at, last_seen_in_top)
         VALUES ($1, $2, $3, 'active', NOW(), NOW())
         ON CONFLICT (app_id) DO UPDATE SET last_seen_in_top = NOW()",
    )
    .bind(app_id)
    .bind(source)
    .bind(is_free)
    .execute(&db.pool)
    .await?;
    Ok(())
}
