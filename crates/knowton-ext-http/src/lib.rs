//! # KnowTon Ext Http
//!
//! HTTP client for the external valuation oracle.
//!
//! [`HttpValuationOracle`] implements [`knowton_traits::ValuationOracle`]
//! against the oracle adapter service:
//!
//! - `POST {base_url}/api/v1/oracle/valuation` with a JSON
//!   [`ValuationRequest`](knowton_traits::ValuationRequest)
//! - `GET {base_url}/health` for reachability checks
//!
//! Transport failures are classified into retryable and non-retryable
//! [`TraitError`](knowton_traits::TraitError) variants.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod oracle;

pub use oracle::{HttpValuationOracle, HEALTH_PATH, VALUATION_PATH};
