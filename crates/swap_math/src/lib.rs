//! Swap Math - Exact fixed-point arithmetic for pool verification
//!
//! Token amounts are non-negative integers of unbounded magnitude, scaled by
//! the token's decimals (18 for most ERC-20 style tokens). No floating point
//! is used anywhere in this crate: every division truncates toward zero and
//! every subtraction that could go negative is checked.

pub mod amount;
pub mod constant_product;
pub mod sqrt;

pub use amount::Amount;
pub use constant_product::calculate_output_amount;
pub use sqrt::integer_sqrt;

use thiserror::Error;

/// Per-mille scale (1000 = 100%) used for fee rates
pub const FEE_SCALE: u32 = 1_000;

/// Percentage scale (100 = 100%) used for slice factors and deviations
pub const PERCENT: u32 = 100;

/// Default number of decimals for token amounts
pub const DEFAULT_DECIMALS: u32 = 18;

/// Error types for fixed-point operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// Subtraction result would be negative
    #[error("Math error - underflow")]
    Underflow,
    /// Divisor is zero
    #[error("Math error - division by zero")]
    DivisionByZero,
    /// Value does not fit the requested primitive type
    #[error("Math error - overflow")]
    Overflow,
    /// Text is not a non-negative base-10 number
    #[error("Math error - invalid number: {0:?}")]
    InvalidNumber(String),
}
