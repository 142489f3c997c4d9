use std::{collections::HashMap, path::Path, str::FromStr};

use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use config::{Config, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;

/// Aggregation engine configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    /// Shift of the daily snapshot boundary away from UTC midnight
    #[serde(default = "default_day_offset_seconds")]
    pub day_offset_seconds: i64,
    /// Decimals assumed for tokens without known metadata
    #[serde(default = "default_token_decimals")]
    pub default_token_decimals: u8,
}

fn default_day_offset_seconds() -> i64 {
    8 * 3600
}

fn default_token_decimals() -> u8 {
    18
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            day_offset_seconds: default_day_offset_seconds(),
            default_token_decimals: default_token_decimals(),
        }
    }
}

/// Event feed replay configuration.
///
/// Events are sharded by pool across `shards` workers; each pool's events
/// stay on one worker so they are applied in source order.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySettings {
    /// JSON-lines feed file (registrations and events)
    #[serde(default)]
    pub feed_path: Option<String>,
    #[serde(default = "default_shards")]
    pub shards: usize,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Emit heartbeats for every pool when stream time crosses an hour
    #[serde(default = "default_heartbeats")]
    pub heartbeats: bool,
    /// Where to write the final store dump (JSON)
    #[serde(default)]
    pub output_path: Option<String>,
}

fn default_shards() -> usize {
    4
}

fn default_channel_capacity() -> usize {
    1_024
}

fn default_heartbeats() -> bool {
    true
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            feed_path: None,
            shards: default_shards(),
            channel_capacity: default_channel_capacity(),
            heartbeats: default_heartbeats(),
            output_path: None,
        }
    }
}

/// A USD price observed for a token from `block` onwards.
#[derive(Debug, Deserialize, Clone)]
pub struct PricePoint {
    pub block: u64,
    pub price_usd: BigDecimal,
}

/// Price oracle configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct OracleSettings {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Block-indexed price schedule per token
    #[serde(default)]
    pub prices: HashMap<Address, Vec<PricePoint>>,
}

fn default_cache_capacity() -> u64 {
    10_000
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            prices: HashMap::new(),
        }
    }
}

/// Known token metadata.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenSettings {
    pub address: Address,
    #[serde(default)]
    pub symbol: String,
    pub decimals: u8,
}

/// Curve registry configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CurveSettings {
    /// External curve id (e.g. well-function address) -> built-in strategy id
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

/// Root application configuration.
///
/// Loaded from `config.{toml,yaml,json}` and `CISTERN__*` environment
/// variables (e.g. `CISTERN__REPLAY__SHARDS=8`). Every section has defaults,
/// so an empty file is valid.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub replay: ReplaySettings,
    #[serde(default)]
    pub oracle: OracleSettings,
    #[serde(default)]
    pub tokens: Vec<TokenSettings>,
    #[serde(default)]
    pub curves: CurveSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            replay: ReplaySettings::default(),
            oracle: OracleSettings::default(),
            tokens: Vec::new(),
            curves: CurveSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("CISTERN").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Load from an explicit file (format picked from the extension).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CISTERN").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Configured log level, falling back to `Info` when unparseable.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let settings = Settings::from_path(file.path()).unwrap();
        assert_eq!(settings.engine.day_offset_seconds, 28_800);
        assert_eq!(settings.engine.default_token_decimals, 18);
        assert_eq!(settings.replay.shards, 4);
        assert!(settings.replay.heartbeats);
        assert_eq!(settings.oracle.cache_capacity, 10_000);
        assert!(settings.tokens.is_empty());
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_full_file() {
        let file = write_config(
            r#"
log_level = "debug"

[engine]
day_offset_seconds = 0

[replay]
feed_path = "events.jsonl"
shards = 2

[[tokens]]
address = "0xbea0000029ad1c77d3d5d23ba2d8893db9d1efab"
symbol = "BEAN"
decimals = 6

[oracle.prices]
"0xbea0000029ad1c77d3d5d23ba2d8893db9d1efab" = [
    { block = 1, price_usd = "1.01" },
    { block = 50, price_usd = "0.99" },
]

[curves.aliases]
"0xba510e11eeb387fad877812108a3406ca3f43a4b" = "constant-product-2"
"#,
        );
        let settings = Settings::from_path(file.path()).unwrap();
        assert_eq!(settings.level_filter(), LevelFilter::Debug);
        assert_eq!(settings.engine.day_offset_seconds, 0);
        assert_eq!(settings.replay.feed_path.as_deref(), Some("events.jsonl"));
        assert_eq!(settings.replay.shards, 2);
        assert_eq!(settings.tokens.len(), 1);
        assert_eq!(settings.tokens[0].decimals, 6);

        let bean: Address = "0xbea0000029ad1c77d3d5d23ba2d8893db9d1efab"
            .parse()
            .unwrap();
        let points = &settings.oracle.prices[&bean];
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].block, 50);
        assert_eq!(points[1].price_usd, BigDecimal::from_str("0.99").unwrap());
        assert_eq!(settings.curves.aliases.len(), 1);
    }
}
