use crate::database_ops::db::Db;
use crate::database_ops::prices;
use crate::pricing::display::{self, GameDisplay};
use crate::pricing::forecast;
use anyhow::Result;
use serde::Serialize;

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: i64 = 24;
/// Default upper price bound; high enough to pass everything observed.
pub const DEFAULT_PRICE_MAX: f64 = 1000.0;
/// How much history feeds the detail-view trend.
pub const DETAIL_TREND_DEPTH: i64 = 90;

/// Filter criteria for a catalog listing. The defaults are pass-through:
/// they select every game.
#[derive(Debug, Clone)]
pub struct CatalogFilters {
    pub search: Option<String>,
    pub discount_min: i32,
    pub price_min: f64,
    pub price_max: f64,
    pub page: i64,
    pub page_size: i64,
}

impl Default for CatalogFilters {
    fn default() -> Self {
        Self {
            search: None,
            discount_min: 0,
            price_min: 0.0,
            price_max: DEFAULT_PRICE_MAX,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of display records plus pagination metadata.
#[derive(Debug, Serialize)]
pub struct Page {
    pub games: Vec<GameDisplay>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Whether one record passes every filter predicate.
///
/// A record with no observation has a current price of zero: it is excluded
/// by `price_min > 0` but never by `price_max` — absent price data is not
/// penalized, the same policy the grader applies.
fn matches(record: &GameDisplay, filters: &CatalogFilters) -> bool {
    if record.discount_percent < filters.discount_min {
        return false;
    }
    if record.current_price < filters.price_min {
        return false;
    }
    if record.current_price > filters.price_max {
        return false;
    }
    if let Some(raw) = &filters.search {
        let needle = raw.trim().to_lowercase();
        if !needle.is_empty() {
            let name_hit = record.name.to_lowercase().contains(&needle);
            let genre_hit = record
                .genres
                .iter()
                .any(|g| g.to_lowercase().contains(&needle));
            if !name_hit && !genre_hit {
                return false;
            }
        }
    }
    true
}

/// The stock price ceiling is a no-op filter: when the caller left it at the
/// default, stretch it to cover the priciest observed game instead of
/// silently clipping expensive titles. An explicitly lowered ceiling is kept
/// as given.
fn widen_default_ceiling(filters: &CatalogFilters, records: &[GameDisplay]) -> CatalogFilters {
    let mut filters = filters.clone();
    if filters.price_max == DEFAULT_PRICE_MAX {
        let observed_max = records
            .iter()
            .map(|r| r.current_price)
            .fold(0.0_f64, f64::max);
        filters.price_max = filters.price_max.max(observed_max);
    }
    filters
}

/// Slice one page out of the filtered set and derive its metadata. The total
/// counts the whole filtered set, not the slice.
fn paginate(records: Vec<GameDisplay>, page: i64, per_page: i64) -> Page {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = records.len() as i64;
    let total_pages = ((total + per_page - 1) / per_page).max(1);
    let offset = (page - 1) * per_page;
    let games: Vec<GameDisplay> = records
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();
    Page {
        games,
        page,
        per_page,
        total,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

/// List games matching `filters`: one bulk fetch of latest prices and
/// windowed lows, then filtering and pagination over that same set. Order is
/// ascending app id throughout, so pages are stable between requests.
pub async fn list(db: &Db, filters: &CatalogFilters) -> Result<Page> {
    let rows = prices::fetch_catalog_rows(db).await?;
    let records: Vec<GameDisplay> = rows
        .into_iter()
        .map(|row| display::assemble_row(row, None))
        .collect();
    let filters = widen_default_ceiling(filters, &records);
    let filtered: Vec<GameDisplay> = records
        .into_iter()
        .filter(|record| matches(record, &filters))
        .collect();
    Ok(paginate(filtered, filters.page, filters.page_size))
}

/// Detail view for one game; the trend is computed from up to
/// [`DETAIL_TREND_DEPTH`] recent observations. `None` when the app id is
/// unknown.
pub async fn detail(db: &Db, app_id: i64) -> Result<Option<GameDisplay>> {
    let Some(row) = prices::fetch_catalog_row(db, app_id).await? else {
        return Ok(None);
    };
    let series = prices::fetch_recent_series(db, app_id, DETAIL_TREND_DEPTH).await?;
    let points: Vec<_> = series
        .iter()
        .map(|p| (p.at, p.final_minor as f64 / 100.0))
        .collect();
    let trend = forecast::forecast(&points);
    Ok(Some(display::assemble_row(row, Some(trend))))
}

/// A point of the charting series, major units.
#[derive(Debug, Serialize)]
pub struct SeriesPoint {
    pub date: chrono::DateTime<chrono::Utc>,
    pub price: f64,
}

/// Full ascending price series for one game. Full retention, unlike the
/// 90-day low window.
pub async fn price_series(db: &Db, app_id: i64) -> Result<Vec<SeriesPoint>> {
    let history = prices::fetch_full_history(db, app_id).await?;
    Ok(history
        .into_iter()
        .map(|p| SeriesPoint {
            date: p.at,
            price: p.final_minor as f64 / 100.0,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::forecast::Forecast;
    use crate::pricing::grade::PriceGrade;
    use crate::pricing::display::Platforms;

    fn record(id: i64, name: &str, price: f64, discount: i32, genres: &[&str]) -> GameDisplay {
        GameDisplay {
            id: id.to_string(),
            name: name.to_string(),
            header_image: String::new(),
            release_date: None,
            developers: Vec::new(),
            publishers: Vec::new(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            platforms: Platforms {
                windows: true,
                mac: false,
                linux: false,
            },
            current_price: price,
            original_price: price,
            discount_percent: discount,
            historical_low: price,
            price_grade: PriceGrade::APlus,
            forecast: Forecast::Stable,
            short_description: String::new(),
            metacritic_score: None,
            recommendation_count: 0,
        }
    }

    #[test]
    fn default_filters_pass_everything() {
        let filters = CatalogFilters::default();
        assert!(matches(&record(1, "Portal", 9.99, 0, &["Puzzle"]), &filters));
        assert!(matches(&record(2, "Free", 0.0, 0, &[]), &filters));
    }

    #[test]
    fn discount_floor_excludes_shallow_discounts() {
        let filters = CatalogFilters {
            discount_min: 50,
            ..CatalogFilters::default()
        };
        assert!(matches(&record(1, "A", 10.0, 50, &[]), &filters));
        assert!(!matches(&record(2, "B", 10.0, 49, &[]), &filters));
    }

    #[test]
    fn missing_observation_fails_price_floor_but_passes_ceiling() {
        let unpriced = record(1, "A", 0.0, 0, &[]);

        let floor = CatalogFilters {
            price_min: 0.01,
            ..CatalogFilters::default()
        };
        assert!(!matches(&unpriced, &floor));

        let ceiling = CatalogFilters {
            price_max: 5.0,
            ..CatalogFilters::default()
        };
        assert!(matches(&unpriced, &ceiling));
        assert!(!matches(&record(2, "B", 6.0, 0, &[]), &ceiling));
    }

    #[test]
    fn search_matches_name_or_genre_case_insensitively() {
        let game = record(1, "The Witcher 3", 29.99, 0, &["RPG", "Open World"]);

        let by_name = CatalogFilters {
            search: Some("witcher".to_string()),
            ..CatalogFilters::default()
        };
        assert!(matches(&game, &by_name));

        let by_genre = CatalogFilters {
            search: Some("rpg".to_string()),
            ..CatalogFilters::default()
        };
        assert!(matches(&game, &by_genre));

        let miss = CatalogFilters {
            search: Some("racing".to_string()),
            ..CatalogFilters::default()
        };
        assert!(!matches(&game, &miss));

        let blank = CatalogFilters {
            search: Some("   ".to_string()),
            ..CatalogFilters::default()
        };
        assert!(matches(&game, &blank));
    }

    #[test]
    fn default_ceiling_stretches_to_the_priciest_game() {
        let records = vec![
            record(1, "Bundle", 1200.0, 0, &[]),
            record(2, "Cheap", 10.0, 0, &[]),
        ];
        let widened = widen_default_ceiling(&CatalogFilters::default(), &records);
        assert!(matches(&records[0], &widened));

        // an explicit ceiling is honored as given
        let explicit = CatalogFilters {
            price_max: 500.0,
            ..CatalogFilters::default()
        };
        let kept = widen_default_ceiling(&explicit, &records);
        assert_eq!(kept.price_max, 500.0);
        assert!(!matches(&records[0], &kept));
    }

    #[test]
    fn empty_set_still_reports_one_page() {
        let page = paginate(Vec::new(), 1, 24);
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_prev);
        assert!(page.games.is_empty());
    }

    #[test]
    fn fifty_records_at_twenty_four_per_page() {
        let records: Vec<GameDisplay> =
            (1..=50).map(|i| record(i, "G", 10.0, 0, &[])).collect();

        let first = paginate(records.clone(), 1, 24);
        assert_eq!(first.total, 50);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.games.len(), 24);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let last = paginate(records, 3, 24);
        assert_eq!(last.games.len(), 2);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn page_past_the_end_is_empty_but_keeps_totals() {
        let records: Vec<GameDisplay> =
            (1..=5).map(|i| record(i, "G", 10.0, 0, &[])).collect();
        let page = paginate(records, 4, 5);
        assert!(page.games.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn nonsense_page_numbers_are_floored_to_one() {
        let records: Vec<GameDisplay> =
            (1..=3).map(|i| record(i, "G", 10.0, 0, &[])).collect();
        let page = paginate(records, 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.games.len(), 1);
    }
}
