//! Shared configuration, errors, and collaborator contracts for Spesa.
//!
//! This crate sits at the bottom of the workspace and provides:
//! - Configuration management
//! - Application-wide error types
//! - Contracts for external collaborators (spot-rate provider,
//!   notification dispatcher) together with the shipped implementations

pub mod config;
pub mod error;
pub mod notify;
pub mod rates;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use notify::{Notifier, TracingNotifier, WorkflowEvent};
pub use rates::{HttpRateSource, RateSource, RateSourceError};
