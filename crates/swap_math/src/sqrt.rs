//! Integer square root (Babylonian / Newton iteration)

use num_bigint::BigUint;

use crate::Amount;

/// Largest integer `y` such that `y * y <= value`
///
/// Newton's method seeded at `(value + 1) / 2`. From that seed the iterate
/// decreases monotonically and its excess over the root at least halves each
/// step, so `bits(value) + 2` iterations always reach the fixed point; the
/// bound only guards against an infinite loop.
pub fn integer_sqrt(value: &Amount) -> Amount {
    if value.is_zero() {
        return Amount::zero();
    }

    let v = value.as_biguint();
    let two = BigUint::from(2u32);

    let mut y = v.clone();
    let mut z = (v + 1u32) / &two;

    for _ in 0..v.bits() + 2 {
        if z >= y {
            break;
        }
        y = z;
        z = (v / &y + &y) / &two;
    }

    Amount::from(y)
}
