//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Converted amounts are stored to 2 decimal places
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts, plus the frozen rate

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places a stored converted amount carries.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative
/// errors across many conversions.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal) -> Decimal {
    (amount * rate)
        .round_dp_with_strategy(AMOUNT_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}

/// An immutable conversion captured at submission time.
///
/// Once written onto an expense the snapshot is never recomputed; a later
/// change in the live rate does not alter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSnapshot {
    /// The amount in the company's default currency.
    pub converted_amount: Decimal,
    /// The rate used (1 source = rate target).
    pub rate: Decimal,
    /// When the rate was obtained.
    pub timestamp: DateTime<Utc>,
}

impl ConversionSnapshot {
    /// Builds a snapshot from an amount and a quoted rate.
    #[must_use]
    pub fn from_rate(amount: Decimal, rate: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            converted_amount: convert_amount(amount, rate),
            rate,
            timestamp,
        }
    }

    /// Identity snapshot for same-currency submissions (rate = 1).
    #[must_use]
    pub fn identity(amount: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self::from_rate(amount, Decimal::ONE, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_amount() {
        // 100 EUR * 1.10 = 110.00 USD
        assert_eq!(convert_amount(dec!(100), dec!(1.10)), dec!(110.00));
    }

    #[test]
    fn test_convert_rounds_to_two_places() {
        // 123.45 * 1.2345 = 152.399025 -> 152.40
        assert_eq!(convert_amount(dec!(123.45), dec!(1.2345)), dec!(152.40));
    }

    #[test]
    fn test_bankers_rounding() {
        // Round half to even at the cent: 0.125 -> 0.12, 0.135 -> 0.14
        assert_eq!(convert_amount(dec!(0.125), Decimal::ONE), dec!(0.12));
        assert_eq!(convert_amount(dec!(0.135), Decimal::ONE), dec!(0.14));
    }

    #[test]
    fn test_identity_snapshot() {
        let now = Utc::now();
        let snapshot = ConversionSnapshot::identity(dec!(42.5), now);
        assert_eq!(snapshot.rate, Decimal::ONE);
        assert_eq!(snapshot.converted_amount, dec!(42.50));
        assert_eq!(snapshot.timestamp, now);
    }

    #[test]
    fn test_from_rate_snapshot() {
        let now = Utc::now();
        let snapshot = ConversionSnapshot::from_rate(dec!(100), dec!(1.1021), now);
        assert_eq!(snapshot.converted_amount, dec!(110.21));
        assert_eq!(snapshot.rate, dec!(1.1021));
    }
}
