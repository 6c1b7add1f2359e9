//! Pool Verifier - Pre-settlement swap verification for constant product pools
//!
//! Decides accept/reject for a candidate swap given a pool's configuration, a
//! reserve snapshot and (optionally) a TWAP oracle reading. Checks run in a
//! fixed order and stop at the first rejection:
//!
//! 1. chain identity present (otherwise verification is disabled)
//! 2. output values: non-zero output, below reserves, recipient is not a token
//! 3. slippage bound (only when requested)
//! 4. liquidity after adding the system fee to non-security out-amounts
//! 5. oracle mitigation (when enabled and both oracle readings are present)
//!
//! Nothing here mutates pool state; the same inputs always give the same
//! answer.

pub mod api;
pub mod config;
pub mod error;
pub mod mitigation;
pub mod oracle;
pub mod pool;
pub mod types;

/// Re-export the arithmetic used by the verifier
pub use swap_math::{self, calculate_output_amount, integer_sqrt, Amount, MathError};

pub use api::{handle, handle_json, Status, VerifyRequest, VerifyResponse};
pub use config::VerifierConfig;
pub use error::{ConfigError, VerifyError};
pub use mitigation::{amount_diff, slice_curve, slice_factor, verify_mitigation, MitigationReport, SideReport};
pub use oracle::{consult_oracle, verify_swap_with_oracle, OracleOutcome, OraclePolicy, PriceOracle, UnavailablePolicy};
pub use pool::{fee_adjusted_out, MitigationStatus, Pool, PoolConfig, VerificationReport};
pub use types::{Identifier, OracleReading, Reserves, Side, Slope, SwapCandidate, VerifyOptions};
