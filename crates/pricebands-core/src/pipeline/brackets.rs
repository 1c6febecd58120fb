use serde::Serialize;

use crate::pipeline::money::Money;
use crate::{PipelineError, PipelineResult};

pub const BAND_COUNT: usize = 5;

pub const DEFAULT_UPPER_BOUNDS: [i64; BAND_COUNT - 1] = [2_000_000, 2_500_000, 3_500_000, 5_000_000];

/// Per-sale liability rates by band, lowest band first.
pub const DEFAULT_RATES: [f64; BAND_COUNT] = [0.0, 2_500.0, 3_500.0, 5_000.0, 7_500.0];

/// Position of a value band, `0` (cheapest) to `BAND_COUNT - 1` (unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ValueBracket(usize);

impl ValueBracket {
    pub const TOP: ValueBracket = ValueBracket(BAND_COUNT - 1);

    pub fn all() -> impl Iterator<Item = ValueBracket> {
        (0..BAND_COUNT).map(ValueBracket)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Five half-open bands `[lower, upper)`; the last band is unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTable {
    upper_bounds: [Money; BAND_COUNT - 1],
    labels: [String; BAND_COUNT],
}

impl Default for BracketTable {
    fn default() -> Self {
        Self::from_bounds([
            Money::from_pounds(DEFAULT_UPPER_BOUNDS[0]),
            Money::from_pounds(DEFAULT_UPPER_BOUNDS[1]),
            Money::from_pounds(DEFAULT_UPPER_BOUNDS[2]),
            Money::from_pounds(DEFAULT_UPPER_BOUNDS[3]),
        ])
    }
}

impl BracketTable {
    /// Bounds are whole pounds: exactly four, positive, strictly increasing.
    pub fn new(upper_bounds: &[i64]) -> PipelineResult<Self> {
        let field = "brackets.upper_bounds";
        let Ok(bounds) = <[i64; BAND_COUNT - 1]>::try_from(upper_bounds) else {
            return Err(PipelineError::configuration_invalid(
                field,
                &format!(
                    "expected exactly {} upper bounds, got {}",
                    BAND_COUNT - 1,
                    upper_bounds.len()
                ),
            ));
        };
        if bounds[0] <= 0 {
            return Err(PipelineError::configuration_invalid(
                field,
                "bounds must be positive",
            ));
        }
        if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PipelineError::configuration_invalid(
                field,
                "bounds must be strictly increasing",
            ));
        }
        if bounds.iter().any(|bound| bound.checked_mul(100).is_none()) {
            return Err(PipelineError::configuration_invalid(field, "bound is too large"));
        }

        Ok(Self::from_bounds(bounds.map(Money::from_pounds)))
    }

    fn from_bounds(upper_bounds: [Money; BAND_COUNT - 1]) -> Self {
        let labels = std::array::from_fn(|index| band_label(&upper_bounds, index));
        Self {
            upper_bounds,
            labels,
        }
    }

    pub fn classify(&self, price: Money) -> ValueBracket {
        let index = self
            .upper_bounds
            .iter()
            .position(|upper| price < *upper)
            .unwrap_or(BAND_COUNT - 1);
        ValueBracket(index)
    }

    pub fn label(&self, bracket: ValueBracket) -> &str {
        &self.labels[bracket.index()]
    }

    pub fn labels(&self) -> &[String; BAND_COUNT] {
        &self.labels
    }

    pub fn upper_bounds(&self) -> &[Money; BAND_COUNT - 1] {
        &self.upper_bounds
    }
}

/// Linear liability estimate: Σ(band count × band rate). The lowest band is
/// always rated zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: [Money; BAND_COUNT],
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES.map(pounds_to_money),
        }
    }
}

impl RateTable {
    pub fn new(rates: &[f64]) -> PipelineResult<Self> {
        let field = "liability.rates";
        let Ok(rates) = <[f64; BAND_COUNT]>::try_from(rates) else {
            return Err(PipelineError::configuration_invalid(
                field,
                &format!("expected exactly {BAND_COUNT} rates, got {}", rates.len()),
            ));
        };
        if rates
            .iter()
            .any(|rate| !rate.is_finite() || *rate < 0.0 || *rate > 1e12)
        {
            return Err(PipelineError::configuration_invalid(
                field,
                "rates must be finite, non-negative amounts",
            ));
        }
        if rates[0] != 0.0 {
            return Err(PipelineError::configuration_invalid(
                field,
                "the lowest band carries no liability; its rate must be 0",
            ));
        }
        Ok(Self {
            rates: rates.map(pounds_to_money),
        })
    }

    pub fn rate(&self, bracket: ValueBracket) -> Money {
        self.rates[bracket.index()]
    }

    /// Saturates at `i64::MAX` pence rather than wrapping.
    pub fn liability(&self, counts: &[u64; BAND_COUNT]) -> Money {
        counts
            .iter()
            .zip(self.rates.iter())
            .fold(Money::ZERO, |total, (count, rate)| {
                total.saturating_add(rate.saturating_times(*count))
            })
    }
}

fn pounds_to_money(pounds: f64) -> Money {
    Money::from_pence((pounds * 100.0).round() as i64)
}

fn band_label(upper_bounds: &[Money; BAND_COUNT - 1], index: usize) -> String {
    if index == BAND_COUNT - 1 {
        return format!("{}+", compact_pounds(upper_bounds[BAND_COUNT - 2]));
    }
    let lower = if index == 0 {
        Money::ZERO
    } else {
        upper_bounds[index - 1]
    };
    format!(
        "{} - {}",
        compact_pounds(lower),
        compact_pounds(upper_bounds[index])
    )
}

/// `£0`, `£750k`, `£2m`, `£2.5m`.
fn compact_pounds(amount: Money) -> String {
    let pounds = amount.pence() / 100;
    if pounds >= 1_000_000 {
        let millions = format!("{:.2}", pounds as f64 / 1_000_000.0);
        let trimmed = millions.trim_end_matches('0').trim_end_matches('.');
        return format!("£{trimmed}m");
    }
    if pounds >= 1_000 && pounds % 1_000 == 0 {
        return format!("£{}k", pounds / 1_000);
    }
    format!("£{pounds}")
}

#[cfg(test)]
mod tests {
    use super::{BracketTable, RateTable, ValueBracket};
    use crate::pipeline::money::Money;

    #[test]
    fn default_labels_match_published_band_names() {
        let table = BracketTable::default();
        assert_eq!(
            table.labels().to_vec(),
            vec!["£0 - £2m", "£2m - £2.5m", "£2.5m - £3.5m", "£3.5m - £5m", "£5m+"]
        );
    }

    #[test]
    fn lower_bounds_are_inclusive_and_upper_bounds_exclusive() {
        let table = BracketTable::default();
        let cases = [
            (Money::ZERO, 0),
            (Money::from_pence(199_999_999), 0),
            (Money::from_pounds(2_000_000), 1),
            (Money::from_pounds(2_499_999), 1),
            (Money::from_pounds(2_500_000), 2),
            (Money::from_pounds(3_500_000), 3),
            (Money::from_pence(499_999_999), 3),
            (Money::from_pounds(5_000_000), 4),
            (Money::from_pounds(90_000_000), 4),
        ];
        for (price, expected) in cases {
            assert_eq!(table.classify(price).index(), expected, "price {price}");
        }
    }

    #[test]
    fn every_price_lands_in_exactly_one_band() {
        let table = BracketTable::default();
        for pounds in (0..6_000_000).step_by(250_000) {
            let bracket = table.classify(Money::from_pounds(pounds));
            let matching = ValueBracket::all().filter(|candidate| *candidate == bracket).count();
            assert_eq!(matching, 1);
        }
    }

    #[test]
    fn malformed_bounds_are_configuration_errors() {
        for bounds in [
            vec![2_000_000, 2_500_000, 3_500_000],
            vec![2_000_000, 2_000_000, 3_500_000, 5_000_000],
            vec![0, 2_500_000, 3_500_000, 5_000_000],
            vec![5_000_000, 3_500_000, 2_500_000, 2_000_000],
        ] {
            let result = BracketTable::new(&bounds);
            assert!(result.is_err());
            if let Err(error) = result {
                assert_eq!(error.code, "configuration_invalid");
            }
        }
    }

    #[test]
    fn custom_bounds_produce_matching_labels() {
        let table = BracketTable::new(&[750_000, 1_000_000, 1_250_000, 2_000_000]);
        assert!(table.is_ok());
        if let Ok(table) = table {
            assert_eq!(table.labels()[0], "£0 - £750k");
            assert_eq!(table.labels()[2], "£1m - £1.25m");
            assert_eq!(table.labels()[4], "£2m+");
        }
    }

    #[test]
    fn liability_sums_rated_band_counts() {
        let rates = RateTable::default();
        let liability = rates.liability(&[10, 2, 1, 0, 3]);
        assert_eq!(liability, Money::from_pounds(2 * 2_500 + 3_500 + 3 * 7_500));
    }

    #[test]
    fn liability_at_the_rate_ceiling_saturates_instead_of_overflowing() {
        let result = RateTable::new(&[0.0, 0.0, 0.0, 0.0, 1e12]);
        assert!(result.is_ok());
        if let Ok(rates) = result {
            assert_eq!(
                rates.liability(&[0, 0, 0, 0, 1]),
                Money::from_pounds(1_000_000_000_000)
            );
            assert_eq!(
                rates.liability(&[0, 0, 0, 0, 100_000]),
                Money::from_pence(i64::MAX)
            );
            assert_eq!(
                rates.liability(&[0, 0, 0, 0, u64::MAX]),
                Money::from_pence(i64::MAX)
            );
        }
    }

    #[test]
    fn malformed_rates_are_configuration_errors() {
        assert!(RateTable::new(&[0.0, 1.0, 2.0, 3.0]).is_err());
        assert!(RateTable::new(&[0.0, -1.0, 2.0, 3.0, 4.0]).is_err());
        assert!(RateTable::new(&[0.0, f64::NAN, 2.0, 3.0, 4.0]).is_err());
        assert!(RateTable::new(&[1.0, 1.0, 2.0, 3.0, 4.0]).is_err());
        assert!(RateTable::new(&[0.0, 1.0, 2.0, 3.0, 4.0]).is_ok());
    }
}
