//! Constant product AMM math (x·y=k) with a per-mille input fee

use crate::{Amount, MathError, FEE_SCALE};

/// Output amount for selling `amount_in` into a constant product pool
///
/// With fee on input:
/// - Δin_fee = Δin · (1000 - fee)
/// - Δout = Δin_fee · y0 / (x0 · 1000 + Δin_fee)
///
/// # Arguments
/// * `amount_in` - Amount of the input token
/// * `reserve_in` - Current reserve of the input token
/// * `reserve_out` - Current reserve of the output token
/// * `fee_per_mille` - Fee removed from the input, in parts per thousand
///
/// # Returns
/// * Truncated output amount
/// * `MathError::Underflow` if the fee exceeds 1000‰
/// * `MathError::DivisionByZero` if both `reserve_in` and `amount_in` are zero
pub fn calculate_output_amount(
    amount_in: &Amount,
    reserve_in: &Amount,
    reserve_out: &Amount,
    fee_per_mille: u32,
) -> Result<Amount, MathError> {
    let scale = Amount::from(FEE_SCALE);
    let fee_multiplier = scale.checked_sub(&Amount::from(fee_per_mille))?;

    let amount_in_with_fee = amount_in * &fee_multiplier;
    let numerator = &amount_in_with_fee * reserve_out;
    let denominator = reserve_in * &scale + &amount_in_with_fee;

    numerator.checked_div(&denominator)
}
