//! Pure computation core of the ETF recommendation pipeline.
//!
//! Data flows: cleaned ETF metrics → [`scoring`] → ranked universe →
//! (client risk profile → [`profile`] → bucket weights) → [`allocation`] →
//! client portfolio → [`projection`]. Every stage is a synchronous,
//! side-effect-free transform over in-memory records; CSV exchange, logging
//! and presentation live in the CLI crate.

pub mod allocation;
pub mod error;
pub mod profile;
pub mod projection;
pub mod scoring;
pub mod types;
pub mod weights;

pub use error::AdvisorError;
pub use types::*;

/// Standard result type for all advisor operations
pub type AdvisorResult<T> = Result<T, AdvisorError>;
