//! Non-negative arbitrary-precision token amounts

use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MathError;

/// Token amount (or any non-negative quantity derived from one)
///
/// Ordering follows the integer value, so `<`, `>`, `==`, `min` and `max`
/// come from the derived `PartialOrd`/`Ord` impls.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `10^exp`, the fixed-point base for `exp` decimals
    pub fn pow10(exp: u32) -> Self {
        Self(BigUint::from(10u32).pow(exp))
    }

    /// Subtract, failing with `Underflow` instead of going negative
    pub fn checked_sub(&self, rhs: &Amount) -> Result<Amount, MathError> {
        if self.0 < rhs.0 {
            return Err(MathError::Underflow);
        }
        Ok(Self(&self.0 - &rhs.0))
    }

    /// Truncating division, failing with `DivisionByZero`
    pub fn checked_div(&self, rhs: &Amount) -> Result<Amount, MathError> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self(&self.0 / &rhs.0))
    }

    pub fn gte(&self, other: &Amount) -> bool {
        self >= other
    }

    pub fn lte(&self, other: &Amount) -> bool {
        self <= other
    }

    pub fn to_u32(&self) -> Result<u32, MathError> {
        self.0.to_u32().ok_or(MathError::Overflow)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Expand a human-readable decimal ("1.5") into a fixed-point integer
    /// with `decimals` fractional digits. Extra fractional digits are
    /// truncated.
    pub fn from_decimal_str(text: &str, decimals: u32) -> Result<Amount, MathError> {
        let invalid = || MathError::InvalidNumber(text.to_string());

        let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let decimals = decimals as usize;
        let kept = &frac[..frac.len().min(decimals)];

        let mut digits = String::with_capacity(whole.len() + decimals + 1);
        digits.push_str(if whole.is_empty() { "0" } else { whole });
        digits.push_str(kept);
        digits.extend(std::iter::repeat('0').take(decimals - kept.len()));

        digits.parse::<BigUint>().map(Self).map_err(|_| invalid())
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for Amount {
    type Err = MathError;

    /// Parse a base-10 integer (already scaled to the token's decimals)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MathError::InvalidNumber(s.to_string()));
        }
        s.parse::<BigUint>()
            .map(Self)
            .map_err(|_| MathError::InvalidNumber(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Amount> for Amount {
            type Output = Amount;
            fn $method(self, rhs: Amount) -> Amount {
                Amount(self.0.$method(rhs.0))
            }
        }

        impl<'a> $imp<&'a Amount> for Amount {
            type Output = Amount;
            fn $method(self, rhs: &'a Amount) -> Amount {
                Amount(self.0.$method(&rhs.0))
            }
        }

        impl<'a> $imp<Amount> for &'a Amount {
            type Output = Amount;
            fn $method(self, rhs: Amount) -> Amount {
                Amount((&self.0).$method(rhs.0))
            }
        }

        impl<'a, 'b> $imp<&'b Amount> for &'a Amount {
            type Output = Amount;
            fn $method(self, rhs: &'b Amount) -> Amount {
                Amount((&self.0).$method(&rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Mul, mul);

// Amounts travel as base-10 strings: 18-decimal values overflow every JSON
// number type.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or base-10 integer string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Amount, E> {
                Ok(Amount::from(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Amount, E> {
                u64::try_from(value)
                    .map(Amount::from)
                    .map_err(|_| E::custom(format!("negative amount: {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Amount, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
