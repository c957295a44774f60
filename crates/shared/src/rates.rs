//! Spot exchange-rate provider contract and HTTP implementation.
//!
//! The engine consumes rates through the [`RateSource`] trait; retry policy
//! is the caller's responsibility, not the provider's.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from a spot-rate provider.
#[derive(Debug, Error)]
pub enum RateSourceError {
    /// The provider could not be reached or returned a failure status.
    #[error("rate provider request failed: {0}")]
    Transport(String),

    /// The provider answered but did not include the requested rate.
    #[error("rate provider returned no rate for {from}/{to}")]
    MissingRate {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
    },

    /// The provider returned a rate that is zero or negative.
    #[error("rate provider returned a non-positive rate for {from}/{to}")]
    NonPositiveRate {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
    },
}

/// Provider of spot exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the current spot rate (1 `from` = rate `to`).
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or has no rate for
    /// the pair. No retry is built in.
    async fn spot_rate(&self, from: &str, to: &str) -> Result<Decimal, RateSourceError>;
}

/// Response body of the rate provider's `/latest` endpoint.
#[derive(Debug, serde::Deserialize)]
struct LatestRatesBody {
    rates: HashMap<String, Decimal>,
}

/// HTTP spot-rate provider.
///
/// Expects an exchangerate.host-compatible API:
/// `GET {base}/latest?base=EUR&symbols=USD` returning
/// `{"rates": {"USD": 1.1021}}`.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateSource {
    /// Creates a provider against the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn spot_rate(&self, from: &str, to: &str) -> Result<Decimal, RateSourceError> {
        let url = format!(
            "{}/latest?base={from}&symbols={to}",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RateSourceError::Transport(e.to_string()))?;

        let body: LatestRatesBody = response
            .json()
            .await
            .map_err(|e| RateSourceError::Transport(e.to_string()))?;

        let rate = body
            .rates
            .get(to)
            .copied()
            .ok_or_else(|| RateSourceError::MissingRate {
                from: from.to_string(),
                to: to.to_string(),
            })?;

        if rate <= Decimal::ZERO {
            return Err(RateSourceError::NonPositiveRate {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_latest_body_parses_numeric_rates() {
        let body: LatestRatesBody =
            serde_json::from_str(r#"{"base":"EUR","rates":{"USD":1.1021,"GBP":0.8433}}"#).unwrap();
        assert_eq!(body.rates.get("USD"), Some(&dec!(1.1021)));
        assert_eq!(body.rates.get("GBP"), Some(&dec!(0.8433)));
    }

    #[test]
    fn test_latest_body_missing_symbol() {
        let body: LatestRatesBody = serde_json::from_str(r#"{"rates":{"USD":1.1}}"#).unwrap();
        assert!(body.rates.get("JPY").is_none());
    }

    #[test]
    fn test_error_display() {
        let err = RateSourceError::MissingRate {
            from: "EUR".to_string(),
            to: "USD".to_string(),
        };
        assert!(err.to_string().contains("EUR/USD"));

        let err = RateSourceError::NonPositiveRate {
            from: "EUR".to_string(),
            to: "USD".to_string(),
        };
        assert!(err.to_string().contains("non-positive"));
    }
}
