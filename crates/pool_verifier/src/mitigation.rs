//! Oracle-deviation mitigation (TWAP-based volatility mitigator)
//!
//! A trade is compared side by side against the oracle's estimate of the same
//! trade. The allowed deviation shrinks as the trade takes a larger slice of
//! the post-trade reserve:
//!
//! - slice factor = share of the final reserve consumed by the trade, 0..=100
//! - slice curve = slice factor · ⌊√slice factor⌋, clamped to the pool's
//!   price tolerance threshold
//! - allowed deviation = 100 - slice curve
//!
//! A side is exempt when the opposite side has no input, since nothing can
//! flow out of it.

use log::debug;
use serde::{Deserialize, Serialize};
use swap_math::{integer_sqrt, Amount, MathError, PERCENT};

use crate::error::VerifyError;
use crate::types::{Side, SwapCandidate};

/// Per-side outcome of a mitigation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideReport {
    pub side: Side,
    pub slice_factor: u32,
    pub slice_curve: u32,
    /// `None` when the deviation is undefined on an exempt side
    pub amount_diff: Option<u32>,
    pub allowed_diff: u32,
    pub exempt: bool,
}

/// Values computed by a passing mitigation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationReport {
    pub token0: SideReport,
    pub token1: SideReport,
}

/// Percentage of the final reserve taken by `amount_out`
///
/// `100 - ⌊100 · (reserve_final - amount_out) / reserve_final⌋` when the
/// reserve still exceeds the out-amount, otherwise 100.
pub fn slice_factor(reserve_final: &Amount, amount_out: &Amount) -> Result<u32, MathError> {
    if reserve_final <= amount_out {
        return Ok(PERCENT);
    }

    let hundred = Amount::from(PERCENT);
    let remaining = (&hundred * reserve_final.checked_sub(amount_out)?).checked_div(reserve_final)?;
    hundred.checked_sub(&remaining)?.to_u32()
}

/// Symmetric percentage deviation between two out-amounts
///
/// `100 · |a - b| / ⌊(a + b) / 2⌋`. Fails with `DivisionByZero` when the
/// average truncates to zero (e.g. readings 0 and 1).
pub fn amount_diff(oracle_amount: &Amount, trade_amount: &Amount) -> Result<u32, MathError> {
    if oracle_amount == trade_amount {
        return Ok(0);
    }

    let (bigger, smaller) = if oracle_amount > trade_amount {
        (oracle_amount, trade_amount)
    } else {
        (trade_amount, oracle_amount)
    };

    let average = (bigger + smaller).checked_div(&Amount::from(2u32))?;
    (Amount::from(PERCENT) * bigger.checked_sub(smaller)?)
        .checked_div(&average)?
        .to_u32()
}

/// Tolerance curve value for a slice factor, clamped to `threshold`
pub fn slice_curve(slice_factor: u32, threshold: u32) -> u32 {
    let factor = Amount::from(slice_factor);
    let curve = integer_sqrt(&factor) * &factor;

    match curve.to_u32() {
        Ok(curve) if curve <= threshold => curve,
        _ => threshold,
    }
}

struct SideInputs<'a> {
    side: Side,
    trade_amount: &'a Amount,
    oracle_amount: &'a Amount,
    slice_factor: u32,
    amount_diff: Option<u32>,
    exempt: bool,
}

fn prepare_side<'a>(
    candidate: &'a SwapCandidate,
    side: Side,
    reserve_final: &Amount,
) -> Result<SideInputs<'a>, VerifyError> {
    let oracle_amount = candidate
        .oracle_amount_out(side)
        .reading()
        .ok_or(VerifyError::MissingOracleReading { side })?;
    let trade_amount = candidate.amount_out(side);
    let exempt = candidate.amount_in(side.opposite()).is_zero();

    let amount_diff = match amount_diff(oracle_amount, trade_amount) {
        Ok(diff) => Some(diff),
        // Exemption wins over the zero-average division fault
        Err(MathError::DivisionByZero) if exempt => None,
        Err(MathError::DivisionByZero) => {
            return Err(VerifyError::NegativeOrZeroDeviation {
                side,
                trade_amount: trade_amount.clone(),
                oracle_amount: oracle_amount.clone(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    Ok(SideInputs {
        side,
        trade_amount,
        oracle_amount,
        slice_factor: slice_factor(reserve_final, trade_amount)?,
        amount_diff,
        exempt,
    })
}

fn check_side(inputs: SideInputs<'_>, threshold: u32) -> Result<SideReport, VerifyError> {
    let slice_curve = slice_curve(inputs.slice_factor, threshold);
    let allowed_diff = PERCENT.checked_sub(slice_curve).ok_or(MathError::Underflow)?;

    debug!(
        "mitigation {}: slice_factor={} slice_curve={} amount_diff={:?} allowed={} exempt={}",
        inputs.side, inputs.slice_factor, slice_curve, inputs.amount_diff, allowed_diff, inputs.exempt
    );

    if let Some(diff) = inputs.amount_diff {
        if diff > allowed_diff && !inputs.exempt {
            return Err(VerifyError::OutOfOracleTolerance {
                side: inputs.side,
                trade_amount: inputs.trade_amount.clone(),
                oracle_amount: inputs.oracle_amount.clone(),
                amount_diff: diff,
                allowed_diff,
                slice_factor: inputs.slice_factor,
                slice_curve,
            });
        }
    }

    Ok(SideReport {
        side: inputs.side,
        slice_factor: inputs.slice_factor,
        slice_curve,
        amount_diff: inputs.amount_diff,
        allowed_diff,
        exempt: inputs.exempt,
    })
}

/// Reject trades priced too far from the oracle for their size
///
/// `reserve0_final`/`reserve1_final` are the reserves after removing the
/// fee-inclusive out-amounts. Deviations are established for both sides
/// before either side's tolerance is checked.
pub fn verify_mitigation(
    candidate: &SwapCandidate,
    reserve0_final: &Amount,
    reserve1_final: &Amount,
    price_tolerance_threshold: u32,
) -> Result<MitigationReport, VerifyError> {
    let side0 = prepare_side(candidate, Side::Token0, reserve0_final)?;
    let side1 = prepare_side(candidate, Side::Token1, reserve1_final)?;

    Ok(MitigationReport {
        token0: check_side(side0, price_tolerance_threshold)?,
        token1: check_side(side1, price_tolerance_threshold)?,
    })
}
