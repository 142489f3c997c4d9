#![allow(dead_code)]

use std::{str::FromStr, sync::Arc};

use alloy::primitives::{address, Address, Bytes, B256, U256};
use bigdecimal::BigDecimal;
use cistern::{
    config::TokenSettings,
    curves::{ConstantProduct2, CurveRegistry, CurveStrategy, Stable2},
    db::models::{CurveRef, EventKind, PoolEvent, PoolRegistration},
    oracle::{PriceBook, PriceOracle, TokenRegistry},
    EventProcessor, MemoryStore,
};
use num_bigint::BigInt;

pub const WELL: Address = address!("bea0e11282e2bb5893bece110cf199501e872bad");
pub const BEAN: Address = address!("bea0000029ad1c77d3d5d23ba2d8893db9d1efab");
pub const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
pub const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
pub const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");

pub const HOUR: u64 = 3_600;
/// 1 WETH in wei
pub const ONE_ETH: u128 = 1_000_000_000_000_000_000;
/// 1 BEAN in its 6-decimal base unit
pub const ONE_BEAN: u128 = 1_000_000;
/// 1 USDC in its 6-decimal base unit
pub const ONE_USDC: u128 = 1_000_000;
/// 1 DAI in its 18-decimal base unit
pub const ONE_DAI: u128 = 1_000_000_000_000_000_000;

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn big(value: u128) -> BigInt {
    BigInt::from(value)
}

pub fn token_registry() -> TokenRegistry {
    TokenRegistry::from_settings(
        &[
            TokenSettings {
                address: BEAN,
                symbol: "BEAN".to_string(),
                decimals: 6,
            },
            TokenSettings {
                address: WETH,
                symbol: "WETH".to_string(),
                decimals: 18,
            },
            TokenSettings {
                address: USDC,
                symbol: "USDC".to_string(),
                decimals: 6,
            },
            TokenSettings {
                address: DAI,
                symbol: "DAI".to_string(),
                decimals: 18,
            },
        ],
        18,
    )
}

pub fn price_book() -> PriceBook {
    let mut book = PriceBook::new();
    book.insert(BEAN, 0, dec("1"));
    book.insert(WETH, 0, dec("2000"));
    book.insert(USDC, 0, dec("1"));
    book.insert(DAI, 0, dec("1"));
    book
}

pub fn processor_with_oracle(
    store: Arc<MemoryStore>,
    oracle: Arc<dyn PriceOracle>,
) -> EventProcessor {
    EventProcessor::new(
        store,
        CurveRegistry::with_defaults(),
        token_registry(),
        oracle,
        8 * 3_600,
    )
}

pub fn processor(store: Arc<MemoryStore>) -> EventProcessor {
    processor_with_oracle(store, Arc::new(price_book()))
}

pub fn registration(curve_id: &str) -> PoolRegistration {
    PoolRegistration {
        pool: WELL,
        tokens: vec![BEAN, WETH],
        curve: CurveRef {
            id: curve_id.to_string(),
            params: Bytes::new(),
        },
        block_number: 1,
        block_timestamp: 0,
    }
}

/// ABI-encode `words` as consecutive 32-byte big-endian words.
pub fn abi_words(words: &[u32]) -> Vec<u8> {
    words
        .iter()
        .flat_map(|w| U256::from(*w).to_be_bytes::<32>())
        .collect()
}

/// USDC (6dp) / DAI (18dp) stable-swap pool with decimals in the params.
pub fn stable_registration() -> PoolRegistration {
    PoolRegistration {
        pool: WELL,
        tokens: vec![USDC, DAI],
        curve: CurveRef {
            id: Stable2::ID.to_string(),
            params: Bytes::from(abi_words(&[6, 18])),
        },
        block_number: 1,
        block_timestamp: 0,
    }
}

pub fn event(block: u64, timestamp: u64, kind: EventKind) -> PoolEvent {
    PoolEvent {
        pool: WELL,
        block_number: block,
        block_timestamp: timestamp,
        tx_hash: B256::left_padding_from(&block.to_be_bytes()),
        log_index: 0,
        account: address!("1111111111111111111111111111111111111111"),
        kind,
    }
}

/// LP minted by a constant-product-2 pool moving from `before` to `after`.
pub fn minted(before: &[BigInt], after: &[BigInt]) -> BigInt {
    let curve = ConstantProduct2;
    curve.lp_token_supply(after, &[]).unwrap() - curve.lp_token_supply(before, &[]).unwrap()
}

pub fn add_liquidity(amounts: [u128; 2], lp: BigInt) -> EventKind {
    EventKind::AddLiquidity {
        tokens: vec![],
        token_amounts_in: amounts.iter().map(|a| big(*a)).collect(),
        lp_amount_out: lp,
    }
}

pub fn swap_bean_for_weth(amount_in: u128, amount_out: u128) -> EventKind {
    EventKind::Swap {
        from_token: BEAN,
        amount_in: big(amount_in),
        to_token: WETH,
        amount_out: big(amount_out),
    }
}
