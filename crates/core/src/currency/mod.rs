//! Currency conversion arithmetic and quote freshness.
//!
//! The conversion snapshot frozen at submission time is built from these
//! pure pieces; the cache and provider plumbing live in the persistence
//! layer.

pub mod conversion;
pub mod quote;

pub use conversion::{convert_amount, ConversionSnapshot, AMOUNT_DECIMAL_PLACES};
pub use quote::RateQuote;
