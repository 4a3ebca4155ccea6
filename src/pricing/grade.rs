use serde::{Deserialize, Serialize};
use std::fmt;

/// Deal-quality grade for a current price relative to its historical low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl PriceGrade {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceGrade::APlus => "A+",
            PriceGrade::A => "A",
            PriceGrade::BPlus => "B+",
            PriceGrade::B => "B",
            PriceGrade::CPlus => "C+",
            PriceGrade::C => "C",
            PriceGrade::D => "D",
            PriceGrade::F => "F",
        }
    }
}

impl fmt::Display for PriceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade a current price (major units) against the historical low.
///
/// A current price of zero means "no observation yet" and is graded
/// best-case on purpose: games without price data must not sink to the
/// bottom of a listing. Threshold boundaries are inclusive, so a ratio of
/// exactly 1.10 still earns the A.
pub fn grade(current: f64, historical_low: f64) -> PriceGrade {
    if current == 0.0 {
        return PriceGrade::APlus;
    }
    if current <= historical_low {
        return PriceGrade::APlus;
    }

    let ratio = if historical_low > 0.0 {
        current / historical_low
    } else {
        1.0
    };

    match ratio {
        r if r <= 1.10 => PriceGrade::A,
        r if r <= 1.20 => PriceGrade::BPlus,
        r if r <= 1.30 => PriceGrade::B,
        r if r <= 1.50 => PriceGrade::CPlus,
        r if r <= 1.80 => PriceGrade::C,
        r if r <= 2.00 => PriceGrade::D,
        _ => PriceGrade::F,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_price_is_top_grade() {
        assert_eq!(grade(0.0, 0.0), PriceGrade::APlus);
        assert_eq!(grade(0.0, 9.99), PriceGrade::APlus);
        assert_eq!(grade(0.0, 100.0), PriceGrade::APlus);
    }

    #[test]
    fn at_or_below_historical_low_is_top_grade() {
        assert_eq!(grade(10.0, 10.0), PriceGrade::APlus);
        assert_eq!(grade(8.5, 10.0), PriceGrade::APlus);
    }

    #[test]
    fn ratio_thresholds_are_inclusive_on_the_better_side() {
        // exactly at each boundary, the better grade wins
        assert_eq!(grade(11.0, 10.0), PriceGrade::A); // ratio 1.10
        assert_eq!(grade(12.0, 10.0), PriceGrade::BPlus); // 1.20
        assert_eq!(grade(13.0, 10.0), PriceGrade::B); // 1.30
        assert_eq!(grade(15.0, 10.0), PriceGrade::CPlus); // 1.50
        assert_eq!(grade(18.0, 10.0), PriceGrade::C); // 1.80
        assert_eq!(grade(20.0, 10.0), PriceGrade::D); // 2.00
        assert_eq!(grade(20.01, 10.0), PriceGrade::F);
    }

    #[test]
    fn grades_never_improve_as_ratio_grows() {
        let low = 10.0;
        let order = [
            PriceGrade::APlus,
            PriceGrade::A,
            PriceGrade::BPlus,
            PriceGrade::B,
            PriceGrade::CPlus,
            PriceGrade::C,
            PriceGrade::D,
            PriceGrade::F,
        ];
        let rank = |g: PriceGrade| order.iter().position(|o| *o == g).unwrap();

        let mut prev = rank(grade(low, low));
        for step in 1..=120 {
            let current = low + step as f64 * 0.1;
            let now = rank(grade(current, low));
            assert!(now >= prev, "grade improved as price rose: {current}");
            prev = now;
        }
    }

    #[test]
    fn zero_low_with_nonzero_price_grades_a() {
        // ratio falls back to 1 when no meaningful low exists
        assert_eq!(grade(5.0, 0.0), PriceGrade::A);
    }
}
