use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::utils::vec_bigint_string;

/// One full set of volume counters, per token and in USD.
///
/// The same shape is used for the lifetime cumulative counters, the rolling
/// 24h/7d windows, the snapshot copies and the snapshot deltas, so that every
/// maintenance step (add an event, evict a bucket, diff two snapshots) is a
/// single field-by-field operation.
///
/// All vectors are index-aligned with the owning pool's token list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    // Trade volume: bought side only
    #[serde(with = "vec_bigint_string")]
    pub trade_volume_reserves: Vec<BigInt>,
    pub trade_volume_reserves_usd: Vec<BigDecimal>,
    pub trade_volume_usd: BigDecimal,

    // Trade volume: both sides (absolute value of the signed trade vector)
    #[serde(with = "vec_bigint_string")]
    pub bi_trade_volume_reserves: Vec<BigInt>,
    pub bi_trade_volume_reserves_usd: Vec<BigDecimal>,

    // Gross token movement in/out of the pool
    #[serde(with = "vec_bigint_string")]
    pub transfer_volume_reserves: Vec<BigInt>,
    pub transfer_volume_reserves_usd: Vec<BigDecimal>,
    pub transfer_volume_usd: BigDecimal,
}

impl VolumeStats {
    /// All-zero counters for a pool of `token_count` tokens.
    pub fn empty(token_count: usize) -> Self {
        let zero_ints = vec![BigInt::from(0); token_count];
        let zero_usd = vec![BigDecimal::from(0); token_count];
        Self {
            trade_volume_reserves: zero_ints.clone(),
            trade_volume_reserves_usd: zero_usd.clone(),
            trade_volume_usd: BigDecimal::from(0),
            bi_trade_volume_reserves: zero_ints.clone(),
            bi_trade_volume_reserves_usd: zero_usd.clone(),
            transfer_volume_reserves: zero_ints,
            transfer_volume_reserves_usd: zero_usd,
            transfer_volume_usd: BigDecimal::from(0),
        }
    }

    pub fn token_count(&self) -> usize {
        self.trade_volume_reserves.len()
    }

    /// Add every counter of `other` into `self`.
    pub fn add(&mut self, other: &VolumeStats) {
        add_ints(&mut self.trade_volume_reserves, &other.trade_volume_reserves);
        add_usd(&mut self.trade_volume_reserves_usd, &other.trade_volume_reserves_usd);
        self.trade_volume_usd += &other.trade_volume_usd;

        add_ints(&mut self.bi_trade_volume_reserves, &other.bi_trade_volume_reserves);
        add_usd(
            &mut self.bi_trade_volume_reserves_usd,
            &other.bi_trade_volume_reserves_usd,
        );

        add_ints(&mut self.transfer_volume_reserves, &other.transfer_volume_reserves);
        add_usd(
            &mut self.transfer_volume_reserves_usd,
            &other.transfer_volume_reserves_usd,
        );
        self.transfer_volume_usd += &other.transfer_volume_usd;
    }

    /// Subtract every counter of `other` from `self`.
    ///
    /// Used to evict an expired hourly bucket from a rolling window.
    pub fn subtract(&mut self, other: &VolumeStats) {
        sub_ints(&mut self.trade_volume_reserves, &other.trade_volume_reserves);
        sub_usd(&mut self.trade_volume_reserves_usd, &other.trade_volume_reserves_usd);
        self.trade_volume_usd -= &other.trade_volume_usd;

        sub_ints(&mut self.bi_trade_volume_reserves, &other.bi_trade_volume_reserves);
        sub_usd(
            &mut self.bi_trade_volume_reserves_usd,
            &other.bi_trade_volume_reserves_usd,
        );

        sub_ints(&mut self.transfer_volume_reserves, &other.transfer_volume_reserves);
        sub_usd(
            &mut self.transfer_volume_reserves_usd,
            &other.transfer_volume_reserves_usd,
        );
        self.transfer_volume_usd -= &other.transfer_volume_usd;
    }

    /// `self − earlier`, field by field.
    pub fn difference(&self, earlier: &VolumeStats) -> VolumeStats {
        let mut delta = self.clone();
        delta.subtract(earlier);
        delta
    }
}

fn add_ints(target: &mut [BigInt], other: &[BigInt]) {
    for (t, o) in target.iter_mut().zip(other) {
        *t += o;
    }
}

fn sub_ints(target: &mut [BigInt], other: &[BigInt]) {
    for (t, o) in target.iter_mut().zip(other) {
        *t -= o;
    }
}

fn add_usd(target: &mut [BigDecimal], other: &[BigDecimal]) {
    for (t, o) in target.iter_mut().zip(other) {
        *t += o;
    }
}

fn sub_usd(target: &mut [BigDecimal], other: &[BigDecimal]) {
    for (t, o) in target.iter_mut().zip(other) {
        *t -= o;
    }
}
