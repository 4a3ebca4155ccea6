use crate::database_ops::db::Db;
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::Row;

/// One row of the `games` table as the query layer consumes it.
///
/// The JSONB metadata columns are normalized to plain string lists here, at
/// the read boundary, so nothing downstream ever sees the raw polymorphic
/// shapes the storefront returns.
#[derive(Debug, Clone)]
pub struct GameRow {
    pub app_id: i64,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub header_image_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub metacritic_score: Option<i32>,
    pub recommendation_count: Option<i64>,
    pub platform_windows: Option<bool>,
    pub platform_mac: Option<bool>,
    pub platform_linux: Option<bool>,
    pub genres: Vec<String>,
    pub publishers: Vec<String>,
    pub developers: Vec<String>,
}

pub const GAME_COLUMNS: &str = "g.app_id, g.name, g.short_description, g.header_image_url, \
     g.release_date, g.metacritic_score, g.recommendation_count, \
     g.platform_windows, g.platform_mac, g.platform_linux, \
     g.genres, g.publishers, g.developers";

/// Decode the `games` columns out of a joined row.
pub fn game_from_row(row: &PgRow) -> Result<GameRow, sqlx::Error> {
    let genres: Option<Value> = row.try_get("genres")?;
    let publishers: Option<Value> = row.try_get("publishers")?;
    let developers: Option<Value> = row.try_get("developers")?;
    Ok(GameRow {
        app_id: row.try_get("app_id")?,
        name: row.try_get("name")?,
        short_description: row.try_get("short_description")?,
        header_image_url: row.try_get("header_image_url")?,
        release_date: row.try_get("release_date")?,
        metacritic_score: row.try_get("metacritic_score")?,
        recommendation_count: row.try_get("recommendation_count")?,
        platform_windows: row.try_get("platform_windows")?,
        platform_mac: row.try_get("platform_mac")?,
        platform_linux: row.try_get("platform_linux")?,
        genres: genre_names(genres.as_ref()),
        publishers: string_list(publishers.as_ref()),
        developers: string_list(developers.as_ref()),
    })
}

/// Genre entries arrive either as `{"id": .., "description": "RPG"}` objects
/// (storefront appdetails shape) or as plain strings (older rows). Entries of
/// any other shape are dropped.
pub fn genre_names(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Publisher/developer columns: keep string entries, drop anything else.
pub fn string_list(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|entry| entry.as_str().map(str::to_string))
        .collect()
}

pub async fn game_exists(db: &Db, app_id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT app_id FROM games WHERE app_id = $1")
        .bind(app_id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(found.is_some())
}

/// Full metadata payload the collector writes per scrape.
#[derive(Debug, Clone)]
pub struct GameUpsert {
    pub app_id: i64,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub header_image_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub metacritic_score: Option<i32>,
    pub recommendation_count: Option<i64>,
    pub platform_windows: bool,
    pub platform_mac: bool,
    pub platform_linux: bool,
    pub genres: Value,
    pub publishers: Value,
    pub developers: Value,
}

pub async fn upsert_game(db: &Db, game: &GameUpsert) -> Result<()> {
    sqlx::query(
        "INSERT INTO games (app_id, name, short_description, header_image_url, release_date,
                            metacritic_score, recommendation_count,
                            platform_windows, platform_mac, platform_linux,
                            genres, publishers, developers, last_updated)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW())
         ON CONFLICT (app_id) DO UPDATE SET
             name = EXCLUDED.name,
             short_description = EXCLUDED.short_description,
             header_image_url = EXCLUDED.header_image_url,
             release_date = EXCLUDED.release_date,
             metacritic_score = EXCLUDED.metacritic_score,
             recommendation_count = EXCLUDED.recommendation_count,
             platform_windows = EXCLUDED.platform_windows,
             platform_mac = EXCLUDED.platform_mac,
             platform_linux = EXCLUDED.platform_linux,
             genres = EXCLUDED.genres,
             publishers = EXCLUDED.publishers,
             developers = EXCLUDED.developers,
             last_updated = NOW()",
    )
    .bind(game.app_id)
    .bind(&game.name)
    .bind(&game.short_description)
    .bind(&game.header_image_url)
    .bind(game.release_date)
    .bind(game.metacritic_score)
    .bind(game.recommendation_count)
    .bind(game.platform_windows)
    .bind(game.platform_mac)
    .bind(game.platform_linux)
    .bind(&game.genres)
    .bind(&game.publishers)
    .bind(&game.developers)
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Name-only stub written by the list sync; the price collector fills in the
/// rest on its next pass.
pub async fn upsert_game_stub(db: &Db, app_id: i64, name: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO games (app_id, name, last_updated)
         VALUES ($1, $2, NOW())
         ON CONFLICT (app_id) DO UPDATE SET
             name = EXCLUDED.name,
             last_updated = NOW()",
    )
    .bind(app_id)
    .bind(name)
    .execute(&db.pool)
    .await?;
    Ok(())
}
