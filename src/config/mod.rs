#[allow(clippy::module_inception)]
mod config;

pub use self::config::{
    CurveSettings, EngineSettings, OracleSettings, PricePoint, ReplaySettings, Settings,
    TokenSettings,
};
