//! Rejection reasons and configuration errors

use swap_math::{Amount, MathError};
use thiserror::Error;

use crate::types::{Identifier, Side};

/// Why a candidate swap was rejected
///
/// Every variant is terminal for the call. Variants carry the side and the
/// computed values so a blocked trade can be audited from the error alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Transaction has insufficient output amount")]
    InsufficientOutputAmount,

    #[error("Reserve has insufficient liquidity on {side}: amount out {amount_out}, reserve {reserve}")]
    InsufficientLiquidity {
        side: Side,
        amount_out: Amount,
        reserve: Amount,
    },

    #[error("Invalid recipient {recipient}: recipient is a pool token")]
    InvalidRecipient { recipient: Identifier },

    #[error("Max slippage exceeded on {side}: amount out {amount_out}, limit {amount_out_limit}")]
    SlippageExceeded {
        side: Side,
        amount_out: Amount,
        amount_out_limit: Amount,
    },

    #[error("Missing oracle reading for {side}")]
    MissingOracleReading { side: Side },

    #[error("Out value deviation undefined on {side}: trade {trade_amount}, oracle {oracle_amount}")]
    NegativeOrZeroDeviation {
        side: Side,
        trade_amount: Amount,
        oracle_amount: Amount,
    },

    #[error(
        "Out value too far from oracle on {side}: trade {trade_amount}, oracle {oracle_amount}, \
         deviation {amount_diff}% exceeds allowed {allowed_diff}% \
         (slice factor {slice_factor}, slice curve {slice_curve})"
    )]
    OutOfOracleTolerance {
        side: Side,
        trade_amount: Amount,
        oracle_amount: Amount,
        amount_diff: u32,
        allowed_diff: u32,
        slice_factor: u32,
        slice_curve: u32,
    },

    /// Only raised when the oracle policy rejects on unavailability
    #[error("Oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    #[error(transparent)]
    Math(#[from] MathError),
}

impl VerifyError {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            VerifyError::InsufficientOutputAmount => "INSUFFICIENT_OUTPUT_AMOUNT",
            VerifyError::InsufficientLiquidity { .. } => "INSUFFICIENT_LIQUIDITY",
            VerifyError::InvalidRecipient { .. } => "INVALID_RECIPIENT",
            VerifyError::SlippageExceeded { .. } => "SLIPPAGE_EXCEEDED",
            VerifyError::MissingOracleReading { .. } => "MISSING_ORACLE_READING",
            VerifyError::NegativeOrZeroDeviation { .. } => "NEGATIVE_OR_ZERO_DEVIATION",
            VerifyError::OutOfOracleTolerance { .. } => "OUT_OF_ORACLE_TOLERANCE",
            VerifyError::OracleUnavailable { .. } => "ORACLE_UNAVAILABLE",
            VerifyError::Math(MathError::Underflow) => "UNDERFLOW",
            VerifyError::Math(MathError::DivisionByZero) => "DIVISION_BY_ZERO",
            VerifyError::Math(MathError::Overflow) => "OVERFLOW",
            VerifyError::Math(MathError::InvalidNumber(_)) => "INVALID_NUMBER",
        }
    }

    /// Pool side the rejection refers to, if any
    pub fn side(&self) -> Option<Side> {
        match self {
            VerifyError::InsufficientLiquidity { side, .. }
            | VerifyError::SlippageExceeded { side, .. }
            | VerifyError::MissingOracleReading { side }
            | VerifyError::NegativeOrZeroDeviation { side, .. }
            | VerifyError::OutOfOracleTolerance { side, .. } => Some(*side),
            _ => None,
        }
    }
}

/// Invalid pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Pool tokens must differ, both are {0}")]
    IdenticalTokens(Identifier),

    #[error("Price tolerance threshold must be within 0..=100, got {0}")]
    ThresholdOutOfRange(u32),

    #[error("System fee rate must be within 0..=1000 per mille, got {0}")]
    FeeRateOutOfRange(u32),

    #[error("{0} is marked as a security but the pool is not a security pool")]
    SecurityTokenOnStandardPool(Side),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "INVALID_POOL_CONFIG"
    }
}
