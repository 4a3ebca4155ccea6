use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-term price trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Forecast {
    Rising,
    Falling,
    Stable,
}

/// How many of the newest observations the trend looks at.
pub const TREND_WINDOW: usize = 7;

/// Percent change beyond which a trend stops being "stable".
const TREND_BAND_PERCENT: f64 = 5.0;

/// Classify the trend of a price series (major units, any length).
///
/// Only the newest [`TREND_WINDOW`] points matter, however much history the
/// caller supplies. Fewer than two points, or a zero first price, reads as
/// stable.
pub fn forecast(series: &[(DateTime<Utc>, f64)]) -> Forecast {
    if series.len() < 2 {
        return Forecast::Stable;
    }

    let start = series.len().saturating_sub(TREND_WINDOW);
    let mut window: Vec<&(DateTime<Utc>, f64)> = series[start..].iter().collect();
    window.sort_by_key(|point| point.0);

    let first = window[0].1;
    let last = window[window.len() - 1].1;
    if first == 0.0 {
        return Forecast::Stable;
    }

    let change_percent = (last - first) / first * 100.0;
    if change_percent < -TREND_BAND_PERCENT {
        Forecast::Falling
    } else if change_percent > TREND_BAND_PERCENT {
        Forecast::Rising
    } else {
        Forecast::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(n)
    }

    #[test]
    fn short_series_is_stable() {
        assert_eq!(forecast(&[]), Forecast::Stable);
        assert_eq!(forecast(&[(day(0), 19.99)]), Forecast::Stable);
    }

    #[test]
    fn six_percent_drop_is_falling() {
        assert_eq!(forecast(&[(day(0), 100.0), (day(1), 94.0)]), Forecast::Falling);
    }

    #[test]
    fn six_percent_rise_is_rising() {
        assert_eq!(forecast(&[(day(0), 100.0), (day(1), 106.0)]), Forecast::Rising);
    }

    #[test]
    fn three_percent_move_is_stable() {
        assert_eq!(forecast(&[(day(0), 100.0), (day(1), 103.0)]), Forecast::Stable);
        assert_eq!(forecast(&[(day(0), 100.0), (day(1), 97.0)]), Forecast::Stable);
    }

    #[test]
    fn exactly_five_percent_stays_stable() {
        assert_eq!(forecast(&[(day(0), 100.0), (day(1), 105.0)]), Forecast::Stable);
        assert_eq!(forecast(&[(day(0), 100.0), (day(1), 95.0)]), Forecast::Stable);
    }

    #[test]
    fn only_the_newest_seven_points_count() {
        // big drop eight points ago is outside the window; within the window
        // the price is flat
        let mut series = vec![(day(0), 400.0)];
        for n in 1..=7 {
            series.push((day(n), 100.0));
        }
        assert_eq!(forecast(&series), Forecast::Stable);

        // and a drop inside the window is seen
        let mut series = vec![(day(0), 400.0)];
        for n in 1..=6 {
            series.push((day(n), 100.0));
        }
        series.push((day(7), 90.0));
        assert_eq!(forecast(&series), Forecast::Falling);
    }

    #[test]
    fn zero_first_price_is_stable() {
        assert_eq!(forecast(&[(day(0), 0.0), (day(1), 10.0)]), Forecast::Stable);
    }

    #[test]
    fn unsorted_window_is_ordered_by_timestamp() {
        // newest-first input still compares oldest vs newest
        assert_eq!(forecast(&[(day(1), 94.0), (day(0), 100.0)]), Forecast::Falling);
    }
}
