use crate::database_ops::games::GameRow;
use crate::database_ops::prices::{CatalogRow, LatestPrice};
use crate::pricing::forecast::Forecast;
use crate::pricing::grade::{self, PriceGrade};
use chrono::NaiveDate;
use serde::Serialize;

/// Outward-facing record for one game.
///
/// Every optional source field is substituted with a documented default here
/// so callers never special-case absence: missing prices are zero, a missing
/// historical low falls back to the current price, a missing forecast reads
/// stable, missing metadata strings are empty. Only `release_date` and
/// `metacritic_score` stay null when unknown.
#[derive(Debug, Clone, Serialize)]
pub struct GameDisplay {
    pub id: String,
    pub name: String,
    pub header_image: String,
    pub release_date: Option<NaiveDate>,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub genres: Vec<String>,
    pub platforms: Platforms,
    pub current_price: f64,
    pub original_price: f64,
    pub discount_percent: i32,
    pub historical_low: f64,
    pub price_grade: PriceGrade,
    pub forecast: Forecast,
    pub short_description: String,
    pub metacritic_score: Option<i32>,
    pub recommendation_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Platforms {
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
}

/// Integer minor units to display major units.
fn major_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Build the display record for one game from its metadata row, newest
/// observation, windowed low, and (optionally) a precomputed forecast.
///
/// List views skip the forecast for throughput and let it default to stable;
/// the detail view passes one computed from real history.
pub fn assemble(
    game: GameRow,
    latest: Option<&LatestPrice>,
    low_minor: Option<i64>,
    forecast: Option<Forecast>,
) -> GameDisplay {
    let current_price = latest.map(|l| major_units(l.final_minor)).unwrap_or(0.0);
    let original_price = latest.map(|l| major_units(l.initial_minor)).unwrap_or(0.0);
    let discount_percent = latest.map(|l| l.discount_percent).unwrap_or(0);
    // No observation inside the window: the current price is the only low we know.
    let historical_low = low_minor.map(major_units).unwrap_or(current_price);
    let price_grade = grade::grade(current_price, historical_low);

    GameDisplay {
        id: game.app_id.to_string(),
        name: game.name.unwrap_or_else(|| "Unknown".to_string()),
        header_image: game.header_image_url.unwrap_or_default(),
        release_date: game.release_date,
        developers: game.developers,
        publishers: game.publishers,
        genres: game.genres,
        platforms: Platforms {
            windows: game.platform_windows.unwrap_or(false),
            mac: game.platform_mac.unwrap_or(false),
            linux: game.platform_linux.unwrap_or(false),
        },
        current_price,
        original_price,
        discount_percent,
        historical_low,
        price_grade,
        forecast: forecast.unwrap_or(Forecast::Stable),
        short_description: game.short_description.unwrap_or_default(),
        metacritic_score: game.metacritic_score,
        recommendation_count: game.recommendation_count.unwrap_or(0),
    }
}

/// Convenience over a joined catalog row.
pub fn assemble_row(row: CatalogRow, forecast: Option<Forecast>) -> GameDisplay {
    assemble(row.game, row.latest.as_ref(), row.low_minor_90d, forecast)
}
