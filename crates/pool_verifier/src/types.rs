//! Swap candidate and supporting value types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use swap_math::{Amount, MathError};

/// Opaque identifier for a token, account or pool address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pool side a check or rejection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Token0,
    Token1,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Token0 => Side::Token1,
            Side::Token1 => Side::Token0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Token0 => f.write_str("token0"),
            Side::Token1 => f.write_str("token1"),
        }
    }
}

/// Oracle estimate of an out-amount
///
/// `NotConsulted` and `Reading(0)` are different things: the first means no
/// opinion is available, the second is an oracle saying a zero input yields
/// zero output. On the wire this is `null`/absent vs. a number string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Amount>", into = "Option<Amount>")]
pub enum OracleReading {
    #[default]
    NotConsulted,
    Reading(Amount),
}

impl OracleReading {
    pub fn reading(&self) -> Option<&Amount> {
        match self {
            OracleReading::Reading(amount) => Some(amount),
            OracleReading::NotConsulted => None,
        }
    }

    pub fn is_consulted(&self) -> bool {
        matches!(self, OracleReading::Reading(_))
    }
}

impl From<Option<Amount>> for OracleReading {
    fn from(value: Option<Amount>) -> Self {
        value.map_or(OracleReading::NotConsulted, OracleReading::Reading)
    }
}

impl From<OracleReading> for Option<Amount> {
    fn from(value: OracleReading) -> Self {
        match value {
            OracleReading::Reading(amount) => Some(amount),
            OracleReading::NotConsulted => None,
        }
    }
}

impl From<Amount> for OracleReading {
    fn from(amount: Amount) -> Self {
        OracleReading::Reading(amount)
    }
}

/// Slippage tolerance as a non-negative rational, in per-mille
///
/// Parsed from decimal text ("0.5") or a fraction ("1/3").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slope {
    numerator: Amount,
    denominator: Amount,
}

impl Slope {
    pub fn new(numerator: impl Into<Amount>, denominator: impl Into<Amount>) -> Result<Self, MathError> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self { numerator: numerator.into(), denominator })
    }

    pub fn zero() -> Self {
        Self { numerator: Amount::zero(), denominator: Amount::from(1u32) }
    }

    /// Slope in the `10^decimals` fixed-point base, truncated
    pub fn scaled(&self, decimals: u32) -> Result<Amount, MathError> {
        (&self.numerator * Amount::pow10(decimals)).checked_div(&self.denominator)
    }
}

impl Default for Slope {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Slope {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((numerator, denominator)) = s.split_once('/') {
            return Slope::new(numerator.trim().parse::<Amount>()?, denominator.trim().parse::<Amount>()?);
        }

        let places = s.split_once('.').map_or(0, |(_, frac)| frac.len());
        let places = u32::try_from(places).map_err(|_| MathError::InvalidNumber(s.to_string()))?;
        Slope::new(Amount::from_decimal_str(s, places)?, Amount::pow10(places))
    }
}

impl TryFrom<String> for Slope {
    type Error = MathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Slope> for String {
    fn from(value: Slope) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == Amount::from(1u32) {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Pool balances before the candidate swap settles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve0: Amount,
    pub reserve1: Amount,
}

impl Reserves {
    pub fn new(reserve0: impl Into<Amount>, reserve1: impl Into<Amount>) -> Self {
        Self { reserve0: reserve0.into(), reserve1: reserve1.into() }
    }

    pub fn get(&self, side: Side) -> &Amount {
        match side {
            Side::Token0 => &self.reserve0,
            Side::Token1 => &self.reserve1,
        }
    }
}

/// Trade under review
///
/// Exactly one side is expected to flow in; zero on either side is
/// tolerated by every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapCandidate {
    #[serde(default)]
    pub amount0_in: Amount,
    #[serde(default)]
    pub amount1_in: Amount,
    #[serde(default)]
    pub amount0_out: Amount,
    #[serde(default)]
    pub amount1_out: Amount,
    #[serde(default)]
    pub oracle_amount0_out: OracleReading,
    #[serde(default)]
    pub oracle_amount1_out: OracleReading,
    pub recipient: Identifier,
    #[serde(default)]
    pub slope: Slope,
}

impl SwapCandidate {
    /// Token1 flows in, token0 flows out
    pub fn sell_token1(amount1_in: impl Into<Amount>, amount0_out: impl Into<Amount>, recipient: impl Into<Identifier>) -> Self {
        Self {
            amount0_in: Amount::zero(),
            amount1_in: amount1_in.into(),
            amount0_out: amount0_out.into(),
            amount1_out: Amount::zero(),
            oracle_amount0_out: OracleReading::NotConsulted,
            oracle_amount1_out: OracleReading::NotConsulted,
            recipient: recipient.into(),
            slope: Slope::zero(),
        }
    }

    /// Token0 flows in, token1 flows out
    pub fn sell_token0(amount0_in: impl Into<Amount>, amount1_out: impl Into<Amount>, recipient: impl Into<Identifier>) -> Self {
        Self {
            amount0_in: amount0_in.into(),
            amount1_in: Amount::zero(),
            amount0_out: Amount::zero(),
            amount1_out: amount1_out.into(),
            oracle_amount0_out: OracleReading::NotConsulted,
            oracle_amount1_out: OracleReading::NotConsulted,
            recipient: recipient.into(),
            slope: Slope::zero(),
        }
    }

    pub fn with_oracle(mut self, oracle_amount0_out: impl Into<OracleReading>, oracle_amount1_out: impl Into<OracleReading>) -> Self {
        self.oracle_amount0_out = oracle_amount0_out.into();
        self.oracle_amount1_out = oracle_amount1_out.into();
        self
    }

    pub fn with_slope(mut self, slope: Slope) -> Self {
        self.slope = slope;
        self
    }

    /// True exactly when both oracle readings are populated
    pub fn can_consult_oracle(&self) -> bool {
        self.oracle_amount0_out.is_consulted() && self.oracle_amount1_out.is_consulted()
    }

    pub fn amount_in(&self, side: Side) -> &Amount {
        match side {
            Side::Token0 => &self.amount0_in,
            Side::Token1 => &self.amount1_in,
        }
    }

    pub fn amount_out(&self, side: Side) -> &Amount {
        match side {
            Side::Token0 => &self.amount0_out,
            Side::Token1 => &self.amount1_out,
        }
    }

    pub fn oracle_amount_out(&self, side: Side) -> &OracleReading {
        match side {
            Side::Token0 => &self.oracle_amount0_out,
            Side::Token1 => &self.oracle_amount1_out,
        }
    }
}

/// Optional checks requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    #[serde(default)]
    pub check_slippage: bool,
}

impl VerifyOptions {
    pub fn with_slippage() -> Self {
        Self { check_slippage: true }
    }
}
