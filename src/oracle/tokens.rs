use alloy::primitives::Address;
use log::warn;
use rustc_hash::FxHashMap;

use crate::{config::TokenSettings, db::models::Token};

/// Token metadata source used when a pool first references a token.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    known: FxHashMap<Address, TokenSettings>,
    default_decimals: u8,
}

impl TokenRegistry {
    pub fn new(default_decimals: u8) -> Self {
        Self {
            known: FxHashMap::default(),
            default_decimals,
        }
    }

    pub fn from_settings(tokens: &[TokenSettings], default_decimals: u8) -> Self {
        let mut registry = Self::new(default_decimals);
        for token in tokens {
            registry.insert(token.clone());
        }
        registry
    }

    pub fn insert(&mut self, token: TokenSettings) {
        self.known.insert(token.address, token);
    }

    /// Build a fresh Token entity for `address`.
    ///
    /// Unknown tokens get the default decimals and an empty symbol.
    pub fn create_token(&self, address: &Address) -> Token {
        match self.known.get(address) {
            Some(meta) => Token::new(*address, meta.symbol.clone(), meta.decimals),
            None => {
                warn!(
                    "No metadata for token {}, assuming {} decimals",
                    address, self.default_decimals
                );
                Token::new(*address, String::new(), self.default_decimals)
            }
        }
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new(18)
    }
}
