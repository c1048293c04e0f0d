// Utility modules

pub mod config;
pub mod polling;

pub use config::{ConfigError, ConfigResult, GatewayConfig, ModelCatalog, StudioConfig};
pub use polling::{poll_until, PollOutcome, PollPolicy, PollStep};
