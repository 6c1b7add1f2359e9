//! Request/response shape for library, RPC or CLI callers

use log::info;
use serde::{Deserialize, Serialize};

use crate::pool::{Pool, PoolConfig, VerificationReport};
use crate::types::{Reserves, SwapCandidate, VerifyOptions};

/// One verification: pool, a reserve snapshot and the trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub pool: PoolConfig,
    pub reserves: Reserves,
    pub candidate: SwapCandidate,
    #[serde(default)]
    pub options: VerifyOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<VerificationReport>,
}

impl VerifyResponse {
    pub fn success(report: VerificationReport) -> Self {
        Self { status: Status::Success, code: None, message: None, report: Some(report) }
    }

    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            code: Some(code.to_string()),
            message: Some(message.into()),
            report: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Verify a request whose oracle readings are already attached
pub fn handle(request: VerifyRequest) -> VerifyResponse {
    let pool = match Pool::new(request.pool, request.reserves) {
        Ok(pool) => pool,
        Err(e) => return VerifyResponse::failure(e.code(), e.to_string()),
    };

    match pool.verify_swap_report(&request.candidate, request.options) {
        Ok(report) => VerifyResponse::success(report),
        Err(e) => {
            info!("swap rejected [{}]: {}", e.code(), e);
            VerifyResponse::failure(e.code(), e.to_string())
        }
    }
}

/// JSON in, JSON out; malformed requests become `INVALID_REQUEST` failures
pub fn handle_json(body: &str) -> serde_json::Result<String> {
    let response = match serde_json::from_str::<VerifyRequest>(body) {
        Ok(request) => handle(request),
        Err(e) => VerifyResponse::failure("INVALID_REQUEST", e.to_string()),
    };
    serde_json::to_string(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn request(recipient: &str) -> Value {
        json!({
            "pool": {
                "token0": "X",
                "token1": "Y",
                "chain_id": 1,
                "system_fee_rate_per_mille": 10,
                "price_tolerance_threshold": 98
            },
            "reserves": { "reserve0": "1000000", "reserve1": "1000000" },
            "candidate": {
                "amount1_in": "1000",
                "amount0_out": "989",
                "oracle_amount0_out": "989",
                "oracle_amount1_out": "0",
                "recipient": recipient
            }
        })
    }

    #[test]
    fn test_success_response() {
        let body = handle_json(&request("alice").to_string()).unwrap();
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["status"], "success");
        assert_eq!(response["report"]["mitigation"]["status"], "checked");
        assert_eq!(response["report"]["final_reserves"]["reserve0"], "999002");
        assert!(response.get("code").is_none());
    }

    #[test]
    fn test_failure_response() {
        let body = handle_json(&request("X").to_string()).unwrap();
        let response: VerifyResponse = serde_json::from_str(&body).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.code.as_deref(), Some("INVALID_RECIPIENT"));
        assert!(response.message.unwrap().contains("X"));
    }

    #[test]
    fn test_invalid_config_and_request() {
        let mut bad_pool = request("alice");
        bad_pool["pool"]["token1"] = json!("X");
        let request: VerifyRequest = serde_json::from_value(bad_pool).unwrap();
        assert_eq!(handle(request).code.as_deref(), Some("INVALID_POOL_CONFIG"));

        let body = handle_json("{ not json").unwrap();
        assert!(body.contains("INVALID_REQUEST"));
    }
}
