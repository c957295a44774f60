//! Exchange-rate quote cache and the currency converter service.
//!
//! The cache is a persisted, append-only store: a miss appends a fresh
//! quote, a hit reuses the stored one, and nothing is ever overwritten,
//! so historical conversions remain reproducible across restarts.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use spesa_core::currency::{ConversionSnapshot, RateQuote};
use spesa_core::workflow::WorkflowError;
use spesa_shared::rates::{RateSource, RateSourceError};

use crate::entities::exchange_rate_quotes;

/// Errors from the rate cache and converter.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    /// No fresh cached quote and the external source failed.
    #[error("No exchange rate available for {from}/{to}")]
    Unavailable {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
        /// The provider failure that exhausted the lookup.
        #[source]
        source: RateSourceError,
    },

    /// The external source returned a rate that is zero or negative.
    #[error("Rate source returned a non-positive rate for {from}/{to}")]
    NonPositiveRate {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<RateError> for WorkflowError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Unavailable { from, to, .. }
            | RateError::NonPositiveRate { from, to } => Self::RateUnavailable { from, to },
            RateError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Repository over the append-only quote store.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the newest cached quote for a currency pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn latest_quote(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Option<exchange_rate_quotes::Model>, RateError> {
        let quote = exchange_rate_quotes::Entity::find()
            .filter(exchange_rate_quotes::Column::FromCurrency.eq(from))
            .filter(exchange_rate_quotes::Column::ToCurrency.eq(to))
            .order_by_desc(exchange_rate_quotes::Column::FetchedAt)
            .one(&self.db)
            .await?;

        Ok(quote)
    }

    /// Appends a new quote keyed by (from, to, fetched_at).
    ///
    /// Existing rows are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append_quote(
        &self,
        from: &str,
        to: &str,
        rate: Decimal,
        source: &str,
        fetched_at: chrono::DateTime<Utc>,
    ) -> Result<exchange_rate_quotes::Model, RateError> {
        let quote = exchange_rate_quotes::ActiveModel {
            id: Set(Uuid::new_v4()),
            from_currency: Set(from.to_string()),
            to_currency: Set(to.to_string()),
            rate: Set(rate),
            source: Set(source.to_string()),
            fetched_at: Set(fetched_at.into()),
            created_at: Set(Utc::now().into()),
        };

        let inserted = quote.insert(&self.db).await?;
        Ok(inserted)
    }

    /// Lists the quote history for a currency pair, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_quotes(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<exchange_rate_quotes::Model>, RateError> {
        let quotes = exchange_rate_quotes::Entity::find()
            .filter(exchange_rate_quotes::Column::FromCurrency.eq(from))
            .filter(exchange_rate_quotes::Column::ToCurrency.eq(to))
            .order_by_desc(exchange_rate_quotes::Column::FetchedAt)
            .all(&self.db)
            .await?;

        Ok(quotes)
    }
}

/// Converts a stored quote row into the core quote type.
#[must_use]
pub fn quote_from_model(model: &exchange_rate_quotes::Model) -> RateQuote {
    RateQuote::new(
        model.from_currency.clone(),
        model.to_currency.clone(),
        model.rate,
        model.fetched_at.with_timezone(&Utc),
    )
}

/// Produces immutable conversion snapshots at submission time.
///
/// Lookup order: identity for same-currency pairs, then a cached quote
/// within the freshness window, then the external source (appending the
/// fetched quote to the cache).
#[derive(Clone)]
pub struct CurrencyConverter {
    rates: ExchangeRateRepository,
    source: Arc<dyn RateSource>,
    freshness: Duration,
}

impl CurrencyConverter {
    /// Provider label recorded on appended quotes.
    const SOURCE_LABEL: &'static str = "spot";

    /// Creates a converter with the given freshness window in seconds.
    #[must_use]
    pub fn new(db: DatabaseConnection, source: Arc<dyn RateSource>, freshness_secs: u64) -> Self {
        Self {
            rates: ExchangeRateRepository::new(db),
            source,
            freshness: Duration::seconds(i64::try_from(freshness_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Freezes a conversion for `amount` from `from` into `to`.
    ///
    /// # Errors
    ///
    /// Returns `RateError::Unavailable` when there is no fresh cached
    /// quote and the external source fails; the caller aborts submission
    /// and nothing about the expense changes.
    pub async fn convert(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<ConversionSnapshot, RateError> {
        let now = Utc::now();

        if from == to {
            return Ok(ConversionSnapshot::identity(amount, now));
        }

        if let Some(model) = self.rates.latest_quote(from, to).await? {
            let quote = quote_from_model(&model);
            if quote.is_fresh_at(now, self.freshness) {
                return Ok(ConversionSnapshot::from_rate(
                    amount,
                    quote.rate,
                    quote.fetched_at,
                ));
            }
        }

        let rate = self
            .source
            .spot_rate(from, to)
            .await
            .map_err(|source| RateError::Unavailable {
                from: from.to_string(),
                to: to.to_string(),
                source,
            })?;

        if rate <= Decimal::ZERO {
            return Err(RateError::NonPositiveRate {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let quote = self
            .rates
            .append_quote(from, to, rate, Self::SOURCE_LABEL, now)
            .await?;

        Ok(ConversionSnapshot::from_rate(
            amount,
            rate,
            quote.fetched_at.with_timezone(&Utc),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_from_model() {
        let now = Utc::now();
        let model = exchange_rate_quotes::Model {
            id: Uuid::new_v4(),
            from_currency: "EUR".to_string(),
            to_currency: "USD".to_string(),
            rate: dec!(1.10),
            source: "spot".to_string(),
            fetched_at: now.into(),
            created_at: now.into(),
        };

        let quote = quote_from_model(&model);
        assert_eq!(quote.from_currency, "EUR");
        assert_eq!(quote.to_currency, "USD");
        assert_eq!(quote.rate, dec!(1.10));
        assert_eq!(quote.fetched_at, now);
    }

    #[test]
    fn test_rate_error_maps_to_workflow_error() {
        let err: WorkflowError = RateError::Unavailable {
            from: "EUR".to_string(),
            to: "USD".to_string(),
            source: RateSourceError::Transport("timeout".to_string()),
        }
        .into();
        assert!(matches!(err, WorkflowError::RateUnavailable { .. }));

        let err: WorkflowError = RateError::NonPositiveRate {
            from: "EUR".to_string(),
            to: "USD".to_string(),
        }
        .into();
        assert!(matches!(err, WorkflowError::RateUnavailable { .. }));
    }
}
