//! Price oracle consultation
//!
//! The oracle is an external service: it may be slow, fail or refuse the
//! pair. None of that is a rejection by itself. What happens instead is a
//! policy decision carried by [`OraclePolicy`].

use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use swap_math::Amount;
use tokio::time::timeout;

use crate::error::VerifyError;
use crate::pool::{Pool, PoolConfig, VerificationReport};
use crate::types::{Identifier, OracleReading, SwapCandidate, VerifyOptions};

/// TWAP oracle service boundary
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Whether the oracle has enough observations to price the pair
    async fn can_consult(&self, token_a: &Identifier, token_b: &Identifier) -> anyhow::Result<bool>;

    /// Oracle estimate of the output for selling `amount_in` of `token_from`
    async fn consult(&self, token_from: &Identifier, amount_in: &Amount, token_to: &Identifier) -> anyhow::Result<Amount>;
}

/// What to do when the oracle cannot be consulted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailablePolicy {
    /// Skip mitigation and let the remaining checks decide
    #[default]
    Skip,
    /// Reject the swap with `OracleUnavailable`
    Reject,
}

fn default_timeout_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePolicy {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub on_unavailable: UnavailablePolicy,
}

impl Default for OraclePolicy {
    fn default() -> Self {
        Self { timeout_ms: default_timeout_ms(), on_unavailable: UnavailablePolicy::Skip }
    }
}

impl OraclePolicy {
    pub fn new(timeout: Duration, on_unavailable: UnavailablePolicy) -> Self {
        Self {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            on_unavailable,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    Consulted,
    Unavailable { reason: String },
}

async fn consult_side<O: PriceOracle + ?Sized>(
    oracle: &O,
    token_from: &Identifier,
    amount_in: &Amount,
    token_to: &Identifier,
) -> anyhow::Result<Amount> {
    // Nothing flows in, so nothing can flow out of the other side
    if amount_in.is_zero() {
        return Ok(Amount::zero());
    }
    oracle.consult(token_from, amount_in, token_to).await
}

async fn lookup_readings<O: PriceOracle + ?Sized>(
    oracle: &O,
    config: &PoolConfig,
    amount0_in: &Amount,
    amount1_in: &Amount,
) -> anyhow::Result<Option<(Amount, Amount)>> {
    if !oracle.can_consult(&config.token0, &config.token1).await? {
        return Ok(None);
    }
    let token0_out = consult_side(oracle, &config.token1, amount1_in, &config.token0);
    let token1_out = consult_side(oracle, &config.token0, amount0_in, &config.token1);
    Ok(Some(future::try_join(token0_out, token1_out).await?))
}

/// Fill both oracle readings on `candidate`
///
/// The token0 reading prices `amount1_in` of token1 and vice versa. Both
/// consultations run concurrently under one timeout. On any failure the
/// readings are cleared to `NotConsulted` and the policy decides between
/// skipping and rejecting.
pub async fn consult_oracle<O: PriceOracle + ?Sized>(
    oracle: &O,
    config: &PoolConfig,
    candidate: &mut SwapCandidate,
    policy: &OraclePolicy,
) -> Result<OracleOutcome, VerifyError> {
    let lookup = lookup_readings(oracle, config, &candidate.amount0_in, &candidate.amount1_in);
    let result = timeout(policy.timeout(), lookup).await;
    let reason = match result {
        Ok(Ok(Some((oracle_amount0_out, oracle_amount1_out)))) => {
            debug!("oracle readings: token0={} token1={}", oracle_amount0_out, oracle_amount1_out);
            candidate.oracle_amount0_out = OracleReading::Reading(oracle_amount0_out);
            candidate.oracle_amount1_out = OracleReading::Reading(oracle_amount1_out);
            return Ok(OracleOutcome::Consulted);
        }
        Ok(Ok(None)) => format!("oracle cannot consult {}/{}", config.token0, config.token1),
        Ok(Err(e)) => format!("oracle error: {e:#}"),
        Err(_) => format!("oracle timed out after {} ms", policy.timeout_ms),
    };

    candidate.oracle_amount0_out = OracleReading::NotConsulted;
    candidate.oracle_amount1_out = OracleReading::NotConsulted;

    match policy.on_unavailable {
        UnavailablePolicy::Skip => {
            warn!("{}; skipping mitigation", reason);
            Ok(OracleOutcome::Unavailable { reason })
        }
        UnavailablePolicy::Reject => Err(VerifyError::OracleUnavailable { reason }),
    }
}

/// Consult the oracle, then run the full verification
///
/// Pools without a chain identity are reported as disabled without touching
/// the oracle. Dropping the returned future abandons the oracle call; there
/// is nothing else to undo.
pub async fn verify_swap_with_oracle<O: PriceOracle + ?Sized>(
    pool: &Pool,
    candidate: &mut SwapCandidate,
    oracle: &O,
    policy: &OraclePolicy,
    options: VerifyOptions,
) -> Result<VerificationReport, VerifyError> {
    if pool.config().chain_id.is_some() {
        consult_oracle(oracle, pool.config(), candidate, policy).await?;
    }
    pool.verify_swap_report(candidate, options)
}
