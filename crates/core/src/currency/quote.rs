//! Cached exchange-rate quotes.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cached spot quote for a currency pair.
///
/// Quotes are append-only: a pair accumulates quotes over time and old
/// entries are never overwritten, so historical conversions stay
/// reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuote {
    /// Source currency code.
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// Exchange rate (1 `from_currency` = rate `to_currency`).
    pub rate: Decimal,
    /// When the quote was fetched from the provider.
    pub fetched_at: DateTime<Utc>,
}

impl RateQuote {
    /// Creates a new quote.
    #[must_use]
    pub const fn new(
        from_currency: String,
        to_currency: String,
        rate: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from_currency,
            to_currency,
            rate,
            fetched_at,
        }
    }

    /// Returns true if the quote is still reusable at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) <= window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote_at(fetched_at: DateTime<Utc>) -> RateQuote {
        RateQuote::new("EUR".to_string(), "USD".to_string(), dec!(1.10), fetched_at)
    }

    #[test]
    fn test_fresh_within_window() {
        let now = Utc::now();
        let quote = quote_at(now - Duration::minutes(30));
        assert!(quote.is_fresh_at(now, Duration::hours(1)));
    }

    #[test]
    fn test_stale_past_window() {
        let now = Utc::now();
        let quote = quote_at(now - Duration::minutes(61));
        assert!(!quote.is_fresh_at(now, Duration::minutes(60)));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc::now();
        let quote = quote_at(now - Duration::hours(1));
        assert!(quote.is_fresh_at(now, Duration::hours(1)));
    }
}
