use crate::database_ops::db::Db;
use crate::database_ops::prices;
use crate::pricing::display::{self, GameDisplay};
use anyhow::Result;

/// Every game whose newest observation carries a discount, steepest cut
/// first. No pagination.
pub async fn list(db: &Db) -> Result<Vec<GameDisplay>> {
    let rows = prices::fetch_deal_rows(db).await?;
    let mut records: Vec<GameDisplay> = rows
        .into_iter()
        .map(|row| display::assemble_row(row, None))
        .collect();
    sort_by_discount(&mut records);
    Ok(records)
}

/// Discount percent descending. The sort is stable and the input arrives in
/// ascending app id order, so equal discounts keep that order — the same
/// deterministic secondary key the catalog uses.
pub fn sort_by_discount(records: &mut [GameDisplay]) {
    records.sort_by(|a, b| b.discount_percent.cmp(&a.discount_percent));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::display::Platforms;
    use crate::pricing::forecast::Forecast;
    use crate::pricing::grade::PriceGrade;

    fn deal(id: i64, discount: i32) -> GameDisplay {
        GameDisplay {
            id: id.to_string(),
            name: format!("game-{id}"),
            header_image: String::new(),
            release_date: None,
            developers: Vec::new(),
            publishers: Vec::new(),
            genres: Vec::new(),
            platforms: Platforms {
                windows: true,
                mac: false,
                linux: false,
            },
            current_price: 10.0,
            original_price: 20.0,
            discount_percent: discount,
            historical_low: 10.0,
            price_grade: PriceGrade::APlus,
            forecast: Forecast::Stable,
            short_description: String::new(),
            metacritic_score: None,
            recommendation_count: 0,
        }
    }

    #[test]
    fn deepest_discount_first() {
        let mut records = vec![deal(1, 10), deal(2, 75), deal(3, 40)];
        sort_by_discount(&mut records);
        let discounts: Vec<i32> = records.iter().map(|r| r.discount_percent).collect();
        assert_eq!(discounts, vec![75, 40, 10]);
    }

    #[test]
    fn order_is_non_increasing() {
        let mut records = vec![deal(5, 30), deal(1, 90), deal(9, 30), deal(2, 55)];
        sort_by_discount(&mut records);
        for pair in records.windows(2) {
            assert!(pair[0].discount_percent >= pair[1].discount_percent);
        }
    }

    #[test]
    fn equal_discounts_keep_app_id_order() {
        // input is app-id ascending, as the store returns it
        let mut records = vec![deal(3, 50), deal(7, 50), deal(11, 50)];
        sort_by_discount(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "7", "11"]);
    }
}
