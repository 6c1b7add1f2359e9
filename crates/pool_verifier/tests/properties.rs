//! Property tests for the mitigation curve and the full check pipeline

use pool_verifier::*;
use proptest::prelude::*;

fn amt(v: u64) -> Amount {
    Amount::from(v)
}

proptest! {
    #[test]
    fn prop_slice_factor_saturates(reserve in 1u64.., extra in 0u64..1_000_000) {
        let out = amt(reserve) + amt(extra);
        prop_assert_eq!(slice_factor(&amt(reserve), &out).unwrap(), 100);
    }

    #[test]
    fn prop_slice_factor_bounded_for_partial_trades(reserve in 2u64.., out_seed in any::<u64>()) {
        let out = 1 + out_seed % (reserve - 1);
        let factor = slice_factor(&amt(reserve), &amt(out)).unwrap();
        prop_assert!(factor > 0 && factor <= 100);
    }

    #[test]
    fn prop_slice_factor_monotonic(reserve in 1u64..10_000_000, a in any::<u64>(), b in any::<u64>()) {
        let (x, y) = (a % reserve, b % reserve);
        let (small, large) = (x.min(y), x.max(y));
        let f_small = slice_factor(&amt(reserve), &amt(small)).unwrap();
        let f_large = slice_factor(&amt(reserve), &amt(large)).unwrap();
        prop_assert!(f_small <= f_large);
    }

    #[test]
    fn prop_amount_diff_symmetric(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(amount_diff(&amt(a), &amt(b)), amount_diff(&amt(b), &amt(a)));
        prop_assert_eq!(amount_diff(&amt(a), &amt(a)), Ok(0));
    }

    #[test]
    fn prop_slice_curve_within_threshold(factor in 0u32..=100, threshold in 0u32..=100) {
        let curve = slice_curve(factor, threshold);
        prop_assert!(curve <= threshold);
    }

    #[test]
    fn prop_oracle_matching_trade_always_passes(
        reserve0 in 1_000u64..1_000_000_000_000,
        reserve1 in 1_000u64..1_000_000_000_000,
        amount1_in in 1u64..1_000_000_000,
        fee in 0u32..=30,
        threshold in 0u32..=100,
    ) {
        let config = PoolConfig::new("X", "Y", Some(1), fee, threshold);
        let pool = Pool::new(config, Reserves::new(reserve0, reserve1)).unwrap();
        let amount0_out = calculate_output_amount(&amt(amount1_in), &amt(reserve1), &amt(reserve0), fee).unwrap();
        let candidate = SwapCandidate::sell_token1(amount1_in, amount0_out.clone(), "recipient")
            .with_oracle(amount0_out, Amount::zero());

        match pool.verify_swap(&candidate, VerifyOptions::default()) {
            Ok(()) => {}
            // liquidity/output gates may legitimately reject; mitigation never may
            Err(VerifyError::InsufficientOutputAmount) | Err(VerifyError::InsufficientLiquidity { .. }) => {}
            Err(e) => prop_assert!(false, "unexpected rejection: {}", e),
        }
    }
}
