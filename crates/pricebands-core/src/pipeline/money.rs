use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Serialize, Serializer};

const PENCE_PER_POUND: i64 = 100;

/// Currency amount held as whole pence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_pence(pence: i64) -> Self {
        Self(pence)
    }

    pub const fn from_pounds(pounds: i64) -> Self {
        Self(pounds * PENCE_PER_POUND)
    }

    pub const fn pence(self) -> i64 {
        self.0
    }

    pub fn as_pounds_f64(self) -> f64 {
        self.0 as f64 / PENCE_PER_POUND as f64
    }

    /// Parses `1250000`, `1,250,000`, `£1250000.50`; at most two decimal places.
    pub fn parse_pounds(value: &str) -> Option<Self> {
        let cleaned = value
            .trim()
            .trim_start_matches('£')
            .replace(',', "");
        if cleaned.is_empty() {
            return None;
        }

        let (whole, fractional) = match cleaned.split_once('.') {
            Some((whole, fractional)) => (whole, fractional),
            None => (cleaned.as_str(), ""),
        };
        if whole.is_empty() || !whole.chars().all(|character| character.is_ascii_digit()) {
            return None;
        }
        if fractional.len() > 2 || !fractional.chars().all(|character| character.is_ascii_digit())
        {
            return None;
        }

        let pounds = whole.parse::<i64>().ok()?;
        let pence = match fractional.len() {
            0 => 0,
            1 => fractional.parse::<i64>().ok()? * 10,
            _ => fractional.parse::<i64>().ok()?,
        };
        pounds
            .checked_mul(PENCE_PER_POUND)
            .and_then(|value| value.checked_add(pence))
            .map(Self)
    }

    /// Scales by a factor, rounding to the nearest penny. A factor of exactly
    /// one returns the amount untouched.
    pub fn scale(self, factor: f64) -> Self {
        if factor == 1.0 {
            return self;
        }
        Self((self.0 as f64 * factor).round() as i64)
    }

    /// This amount repeated `count` times, pinned at `i64::MAX` pence.
    pub fn saturating_times(self, count: u64) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self(self.0.saturating_mul(count))
    }

    pub const fn saturating_add(self, rhs: Money) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Share `index` of this amount divided into `divisor` parts. The first
    /// `pence % divisor` shares carry one extra penny so `divisor` consecutive
    /// shares always sum back to the original.
    pub fn share(self, divisor: usize, index: usize) -> Self {
        if divisor <= 1 {
            return self;
        }
        let divisor = divisor as i64;
        let base = self.0.div_euclid(divisor);
        let remainder = self.0.rem_euclid(divisor);
        let slot = (index as i64) % divisor;
        if slot < remainder {
            Self(base + 1)
        } else {
            Self(base)
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let absolute = self.0.unsigned_abs();
        let pounds = absolute / PENCE_PER_POUND as u64;
        let pence = absolute % PENCE_PER_POUND as u64;
        if pence == 0 {
            write!(formatter, "{sign}{pounds}")
        } else {
            write!(formatter, "{sign}{pounds}.{pence:02}")
        }
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_pounds_f64())
    }
}
