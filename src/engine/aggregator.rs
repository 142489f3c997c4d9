//! Statistics aggregator: folds an attribution into the pool's counters.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use log::warn;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::{
    db::models::{Pool, Token, VolumeStats},
    engine::{
        attribution::Attribution,
        normalize::{NormalizedEvent, Operation},
    },
    error::EngineResult,
    oracle::PriceOracle,
    utils::{amount_to_usd, clamp_non_negative, vectors},
};

/// Applies attributed events to pool state, pricing volume in USD.
#[derive(Clone)]
pub struct StatisticsAggregator {
    oracle: Arc<dyn PriceOracle>,
}

impl StatisticsAggregator {
    pub fn new(oracle: Arc<dyn PriceOracle>) -> Self {
        Self { oracle }
    }

    /// Apply one event to `pool`.
    ///
    /// `tokens` must be the pool's tokens in pool order; their prices are
    /// refreshed in place. Returns the per-token prices used for volume
    /// (zero where the oracle had no price).
    pub fn apply(
        &self,
        pool: &mut Pool,
        tokens: &mut [Token],
        event: &NormalizedEvent,
        attribution: &Attribution,
        block_number: u64,
        block_timestamp: u64,
    ) -> EngineResult<Vec<BigDecimal>> {
        // 1. Reserves and LP supply
        apply_reserve_delta(pool, &event.delta_reserves, &event.delta_lp);

        // 2. Prices
        let volume_prices = self.refresh_prices(pool, tokens, block_number)?;

        // 3. Liquidity in USD at last-known prices
        update_liquidity_usd(pool, tokens);

        // 4. Volume counters
        let increment = volume_increment(attribution, tokens, &volume_prices);
        pool.cumulative.add(&increment);
        pool.rolling_daily.add(&increment);
        pool.rolling_weekly.add(&increment);

        match event.operation {
            Operation::Swap { .. } => pool.cumulative_swap_count += 1,
            Operation::Deposit => pool.cumulative_deposit_count += 1,
            Operation::Withdraw => pool.cumulative_withdraw_count += 1,
        }

        // 5. Activity
        pool.last_update_timestamp = block_timestamp;
        pool.last_update_block_number = block_number;

        Ok(volume_prices)
    }

    /// Refresh every pool token's price for `block_number`.
    ///
    /// Tokens without a price keep their last-known price but contribute
    /// zero USD volume for this update.
    fn refresh_prices(
        &self,
        pool: &Pool,
        tokens: &mut [Token],
        block_number: u64,
    ) -> EngineResult<Vec<BigDecimal>> {
        let mut volume_prices = Vec::with_capacity(tokens.len());
        for token in tokens.iter_mut() {
            match self.oracle.usd_price(&token.address, block_number)? {
                Some(price) => {
                    token.update_price(price.clone(), block_number);
                    volume_prices.push(price);
                }
                None => {
                    warn!(
                        "No USD price for token {} at block {} (pool {}), volume priced at 0",
                        token.address, block_number, pool.id
                    );
                    volume_prices.push(BigDecimal::zero());
                }
            }
        }
        Ok(volume_prices)
    }
}

/// Add the signed deltas, saturating reserves and LP supply at zero.
fn apply_reserve_delta(pool: &mut Pool, delta_reserves: &[BigInt], delta_lp: &BigInt) {
    let reserves = vectors::add(&pool.reserves, delta_reserves);
    for (i, reserve) in reserves.into_iter().enumerate() {
        let (reserve, saturated) = clamp_non_negative(reserve);
        if saturated {
            warn!(
                "Reserve {} of pool {} went negative, saturating at 0",
                i, pool.id
            );
        }
        pool.reserves[i] = reserve;
    }

    let (supply, saturated) = clamp_non_negative(&pool.lp_token_supply + delta_lp);
    if saturated {
        warn!("LP supply of pool {} went negative, saturating at 0", pool.id);
    }
    pool.lp_token_supply = supply;
}

fn update_liquidity_usd(pool: &mut Pool, tokens: &[Token]) {
    let mut total = BigDecimal::zero();
    for (i, token) in tokens.iter().enumerate() {
        let usd = amount_to_usd(&pool.reserves[i], token.decimals, &token.last_price_usd);
        total += &usd;
        pool.reserves_usd[i] = usd;
    }
    pool.total_liquidity_usd = total;
}

/// Counters added by one event.
fn volume_increment(
    attribution: &Attribution,
    tokens: &[Token],
    prices: &[BigDecimal],
) -> VolumeStats {
    let mut increment = VolumeStats::empty(tokens.len());

    for (i, token) in tokens.iter().enumerate() {
        let trade = &attribution.trade[i];
        let bought = if trade.is_positive() {
            trade.clone()
        } else {
            BigInt::zero()
        };
        let both_sides = trade.abs();
        let transfer = attribution.transfer[i].abs();

        let bought_usd = amount_to_usd(&bought, token.decimals, &prices[i]);
        let both_sides_usd = amount_to_usd(&both_sides, token.decimals, &prices[i]);
        let transfer_usd = amount_to_usd(&transfer, token.decimals, &prices[i]);

        increment.trade_volume_usd += &bought_usd;
        increment.transfer_volume_usd += &transfer_usd;

        increment.trade_volume_reserves[i] = bought;
        increment.trade_volume_reserves_usd[i] = bought_usd;
        increment.bi_trade_volume_reserves[i] = both_sides;
        increment.bi_trade_volume_reserves_usd[i] = both_sides_usd;
        increment.transfer_volume_reserves[i] = transfer;
        increment.transfer_volume_reserves_usd[i] = transfer_usd;
    }

    increment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::models::{CurveRef, PoolRegistration},
        error::EngineError,
        oracle::PriceBook,
    };
    use alloy::primitives::{address, Address, Bytes};
    use std::str::FromStr;

    const WELL: Address = address!("bea0e11282e2bb5893bece110cf199501e872bad");
    const BEAN: Address = address!("bea0000029ad1c77d3d5d23ba2d8893db9d1efab");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    struct FailingOracle;

    impl PriceOracle for FailingOracle {
        fn usd_price(&self, _token: &Address, _block: u64) -> EngineResult<Option<BigDecimal>> {
            Err(EngineError::Oracle("timeout".to_string()))
        }
    }

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn pool() -> Pool {
        let mut pool = Pool::from_registration(&PoolRegistration {
            pool: WELL,
            tokens: vec![BEAN, WETH],
            curve: CurveRef {
                id: "constant-product-2".to_string(),
                params: Bytes::new(),
            },
            block_number: 0,
            block_timestamp: 0,
        })
        .unwrap();
        pool.reserves = vec![BigInt::from(2_000_000_000u64), BigInt::from(10u64.pow(18))];
        pool.lp_token_supply = BigInt::from(1_000);
        pool
    }

    fn tokens() -> Vec<Token> {
        vec![
            Token::new(BEAN, "BEAN".to_string(), 6),
            Token::new(WETH, "WETH".to_string(), 18),
        ]
    }

    fn swap() -> (NormalizedEvent, Attribution) {
        // 500 BEAN in, 0.2 WETH out
        let event = NormalizedEvent {
            operation: Operation::Swap {
                from_index: 0,
                amount_in: BigInt::from(500_000_000u64),
                to_index: 1,
                amount_out: BigInt::from(200_000_000_000_000_000u64),
            },
            delta_reserves: vec![
                BigInt::from(500_000_000u64),
                BigInt::from(-200_000_000_000_000_000i64),
            ],
            delta_lp: BigInt::zero(),
        };
        let attribution = Attribution {
            trade: vec![BigInt::zero(), BigInt::from(200_000_000_000_000_000u64)],
            transfer: vec![
                BigInt::from(500_000_000u64),
                BigInt::from(200_000_000_000_000_000u64),
            ],
        };
        (event, attribution)
    }

    #[test]
    fn test_swap_updates_counters_and_usd() {
        let mut book = PriceBook::new();
        book.insert(BEAN, 0, dec("1"));
        book.insert(WETH, 0, dec("2500"));
        let aggregator = StatisticsAggregator::new(Arc::new(book));

        let mut pool = pool();
        let mut tokens = tokens();
        let (event, attribution) = swap();
        let prices = aggregator
            .apply(&mut pool, &mut tokens, &event, &attribution, 7, 3_600)
            .unwrap();

        assert_eq!(prices, vec![dec("1"), dec("2500")]);
        assert_eq!(pool.reserves[0], BigInt::from(2_500_000_000u64));
        assert_eq!(pool.reserves[1], BigInt::from(800_000_000_000_000_000u64));
        assert_eq!(pool.cumulative_swap_count, 1);

        // 0.2 WETH * 2500 = 500 USD bought
        assert_eq!(pool.cumulative.trade_volume_usd, dec("500"));
        assert_eq!(pool.cumulative.trade_volume_reserves_usd[1], dec("500"));
        // 500 BEAN + 500 USD of WETH moved
        assert_eq!(pool.cumulative.transfer_volume_usd, dec("1000"));
        assert_eq!(pool.rolling_daily, pool.cumulative);
        assert_eq!(pool.rolling_weekly, pool.cumulative);

        // 2500 BEAN + 0.8 WETH * 2500
        assert_eq!(pool.total_liquidity_usd, dec("4500"));
        assert_eq!(pool.last_update_block_number, 7);
        assert_eq!(tokens[1].last_price_usd, dec("2500"));
    }

    #[test]
    fn test_missing_price_counts_zero_but_keeps_last_price() {
        let mut book = PriceBook::new();
        book.insert(BEAN, 0, dec("1"));
        let aggregator = StatisticsAggregator::new(Arc::new(book));

        let mut pool = pool();
        let mut tokens = tokens();
        tokens[1].update_price(dec("3000"), 1);
        let (event, attribution) = swap();
        aggregator
            .apply(&mut pool, &mut tokens, &event, &attribution, 7, 3_600)
            .unwrap();

        // WETH volume priced at zero
        assert_eq!(pool.cumulative.trade_volume_usd, BigDecimal::zero());
        assert_eq!(pool.cumulative.transfer_volume_usd, dec("500"));
        // but liquidity still uses the retained WETH price
        assert_eq!(tokens[1].last_price_usd, dec("3000"));
        assert_eq!(pool.reserves_usd[1], dec("2400"));
    }

    #[test]
    fn test_oracle_error_propagates() {
        let aggregator = StatisticsAggregator::new(Arc::new(FailingOracle));
        let mut pool = pool();
        let mut tokens = tokens();
        let (event, attribution) = swap();
        let result = aggregator.apply(&mut pool, &mut tokens, &event, &attribution, 7, 3_600);
        assert!(matches!(result, Err(EngineError::Oracle(_))));
    }

    #[test]
    fn test_negative_reserve_saturates() {
        let mut pool = pool();
        apply_reserve_delta(
            &mut pool,
            &[BigInt::from(-3_000_000_000i64), BigInt::zero()],
            &BigInt::from(-5_000),
        );
        assert_eq!(pool.reserves[0], BigInt::zero());
        assert_eq!(pool.lp_token_supply, BigInt::zero());
    }

    #[test]
    fn test_sold_side_counts_in_bidirectional_only() {
        let tokens = tokens();
        let attribution = Attribution {
            trade: vec![BigInt::from(-621), BigInt::from(292)],
            transfer: vec![BigInt::from(1500), BigInt::zero()],
        };
        let increment = volume_increment(&attribution, &tokens, &[dec("1"), dec("1")]);
        assert_eq!(increment.trade_volume_reserves, vec![BigInt::zero(), BigInt::from(292)]);
        assert_eq!(
            increment.bi_trade_volume_reserves,
            vec![BigInt::from(621), BigInt::from(292)]
        );
        assert_eq!(increment.transfer_volume_reserves[0], BigInt::from(1500));
    }
}
