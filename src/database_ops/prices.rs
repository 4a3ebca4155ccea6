use crate::database_ops::db::Db;
use crate::database_ops::games::{self, GameRow, GAME_COLUMNS};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

/// Trailing window for the historical-low computation.
pub const HISTORICAL_LOW_WINDOW_DAYS: i32 = 90;

/// The newest observation for one game.
#[derive(Debug, Clone)]
pub struct LatestPrice {
    pub currency: Option<String>,
    pub initial_minor: i64,
    pub final_minor: i64,
    pub discount_percent: i32,
    pub checked_at: DateTime<Utc>,
}

/// One game joined with its newest observation and trailing-window low,
/// exactly what the display assembler needs.
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub game: GameRow,
    pub latest: Option<LatestPrice>,
    pub low_minor_90d: Option<i64>,
}

/// One point of a price series, minor currency units.
#[derive(Debug, Clone, Copy)]
pub struct PricePoint {
    pub at: DateTime<Utc>,
    pub final_minor: i64,
}

/// A new observation appended by the collector. `checked_at` is assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewObservation {
    pub app_id: i64,
    pub currency: Option<String>,
    pub initial_minor: i64,
    pub final_minor: i64,
    pub discount_percent: i32,
}

// Newest observation per game plus the windowed minimum, joined in one round
// trip. Equal timestamps resolve by the larger insertion id so repeated reads
// agree on which row is "latest".
fn catalog_query(filter: &str) -> String {
    format!(
        "WITH latest AS (
             SELECT DISTINCT ON (app_id)
                 app_id, currency, initial_price, final_price, discount_percent, checked_at
             FROM price_history
             ORDER BY app_id, checked_at DESC, id DESC
         ),
         low_window AS (
             SELECT app_id, MIN(final_price) AS low_minor
             FROM price_history
             WHERE final_price IS NOT NULL
               AND checked_at >= NOW() - make_interval(days => $1)
             GROUP BY app_id
         )
         SELECT {GAME_COLUMNS},
                l.currency, l.initial_price, l.final_price, l.discount_percent, l.checked_at,
                lw.low_minor
         FROM games g
         LEFT JOIN latest l ON l.app_id = g.app_id
         LEFT JOIN low_window lw ON lw.app_id = g.app_id
         {filter}
         ORDER BY g.app_id"
    )
}

fn catalog_row(row: &PgRow) -> Result<CatalogRow, sqlx::Error> {
    let game = games::game_from_row(row)?;
    let checked_at: Option<DateTime<Utc>> = row.try_get("checked_at")?;
    let latest = checked_at.map(|checked_at| {
        Ok::<_, sqlx::Error>(LatestPrice {
            currency: row.try_get("currency")?,
            initial_minor: row.try_get::<Option<i64>, _>("initial_price")?.unwrap_or(0),
            final_minor: row.try_get::<Option<i64>, _>("final_price")?.unwrap_or(0),
            discount_percent: row
                .try_get::<Option<i32>, _>("discount_percent")?
                .unwrap_or(0),
            checked_at,
        })
    });
    Ok(CatalogRow {
        game,
        latest: latest.transpose()?,
        low_minor_90d: row.try_get("low_minor")?,
    })
}

/// Every game with its latest observation and 90-day low, app id ascending.
pub async fn fetch_catalog_rows(db: &Db) -> Result<Vec<CatalogRow>> {
    let rows = sqlx::query(&catalog_query(""))
        .bind(HISTORICAL_LOW_WINDOW_DAYS)
        .fetch_all(&db.pool)
        .await?;
    rows.iter()
        .map(|r| catalog_row(r).map_err(Into::into))
        .collect()
}

/// Single-game variant of [`fetch_catalog_rows`].
pub async fn fetch_catalog_row(db: &Db, app_id: i64) -> Result<Option<CatalogRow>> {
    let row = sqlx::query(&catalog_query("WHERE g.app_id = $2"))
        .bind(HISTORICAL_LOW_WINDOW_DAYS)
        .bind(app_id)
        .fetch_optional(&db.pool)
        .await?;
    row.as_ref().map(catalog_row).transpose().map_err(Into::into)
}

/// Bulk variant for an explicit id set (watchlist reads).
pub async fn fetch_catalog_rows_by_ids(db: &Db, app_ids: &[i64]) -> Result<Vec<CatalogRow>> {
    if app_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query(&catalog_query("WHERE g.app_id = ANY($2)"))
        .bind(HISTORICAL_LOW_WINDOW_DAYS)
        .bind(app_ids)
        .fetch_all(&db.pool)
        .await?;
    rows.iter()
        .map(|r| catalog_row(r).map_err(Into::into))
        .collect()
}

/// Games whose newest observation carries a discount.
pub async fn fetch_deal_rows(db: &Db) -> Result<Vec<CatalogRow>> {
    let rows = sqlx::query(&catalog_query("WHERE l.discount_percent > 0"))
        .bind(HISTORICAL_LOW_WINDOW_DAYS)
        .fetch_all(&db.pool)
        .await?;
    rows.iter()
        .map(|r| catalog_row(r).map_err(Into::into))
        .collect()
}

/// The `limit` most recent observations for one game, returned oldest first
/// for the trend window.
pub async fn fetch_recent_series(db: &Db, app_id: i64, limit: i64) -> Result<Vec<PricePoint>> {
    let rows = sqlx::query(
        "SELECT checked_at, final_price
         FROM (
             SELECT id, checked_at, final_price
             FROM price_history
             WHERE app_id = $1 AND final_price IS NOT NULL
             ORDER BY checked_at DESC, id DESC
             LIMIT $2
         ) recent
         ORDER BY checked_at ASC, id ASC",
    )
    .bind(app_id)
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    rows.iter().map(series_point).collect()
}

/// Full-retention ascending history for charting.
pub async fn fetch_full_history(db: &Db, app_id: i64) -> Result<Vec<PricePoint>> {
    let rows = sqlx::query(
        "SELECT checked_at, final_price
         FROM price_history
         WHERE app_id = $1
         ORDER BY checked_at ASC, id ASC",
    )
    .bind(app_id)
    .fetch_all(&db.pool)
    .await?;
    rows.iter().map(series_point).collect()
}

fn series_point(row: &PgRow) -> Result<PricePoint> {
    Ok(PricePoint {
        at: row.try_get("checked_at")?,
        final_minor: row.try_get::<Option<i64>, _>("final_price")?.unwrap_or(0),
    })
}

pub async fn insert_observation(db: &Db, obs: &NewObservation) -> Result<()> {
    sqlx::query(
        "INSERT INTO price_history (app_id, currency, initial_price, final_price, discount_percent)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(obs.app_id)
    .bind(&obs.currency)
    .bind(obs.initial_minor)
    .bind(obs.final_minor)
    .bind(obs.discount_percent)
    .execute(&db.pool)
    .await?;
    Ok(())
}
