//! Global configuration types for Parley.
//!
//! `GlobalConfig` represents the top-level `config.toml` that tunes reply
//! orchestration and the response cache. Every field has a default, so an
//! empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration for the Parley server.
///
/// Loaded from `~/.parley/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// How bot members of a group are chosen to answer a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStrategy {
    /// Every bot member answers.
    All,
    /// One bot member, chosen uniformly at random.
    Random,
    /// The bot whose persona keywords best match the message; random fallback.
    Smart,
}

impl Default for ResponseStrategy {
    fn default() -> Self {
        ResponseStrategy::Smart
    }
}

impl fmt::Display for ResponseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStrategy::All => write!(f, "all"),
            ResponseStrategy::Random => write!(f, "random"),
            ResponseStrategy::Smart => write!(f, "smart"),
        }
    }
}

impl FromStr for ResponseStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(ResponseStrategy::All),
            "random" => Ok(ResponseStrategy::Random),
            "smart" => Ok(ResponseStrategy::Smart),
            other => Err(format!("invalid response strategy: '{other}'")),
        }
    }
}

/// Inclusive millisecond bounds for a randomized reply delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that always yields `ms`.
    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// Bounds with `min <= max` and a floor of 1ms, so no delay is ever zero.
    pub fn normalized(&self) -> (u64, u64) {
        let min = self.min_ms.max(1);
        let max = self.max_ms.max(min);
        (min, max)
    }
}

/// Reply orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    #[serde(default)]
    pub strategy: ResponseStrategy,

    /// Delay before each group bot reply.
    #[serde(default = "default_bot_delay")]
    pub bot_delay_ms: DelayRange,

    /// Delay before each filler reply from another human member.
    #[serde(default = "default_filler_delay")]
    pub filler_delay_ms: DelayRange,

    /// Delay before the reply in a one-to-one conversation.
    #[serde(default = "default_direct_delay")]
    pub direct_delay_ms: DelayRange,

    /// Artificial latency of a persona reply that misses the cache.
    #[serde(default = "default_persona_latency_ms")]
    pub persona_latency_ms: u64,

    /// How many recent messages the loop guard inspects.
    #[serde(default = "default_loop_window")]
    pub loop_window: u32,
}

fn default_bot_delay() -> DelayRange {
    DelayRange::new(500, 2000)
}

fn default_filler_delay() -> DelayRange {
    DelayRange::new(1000, 3000)
}

fn default_direct_delay() -> DelayRange {
    DelayRange::fixed(800)
}

fn default_persona_latency_ms() -> u64 {
    100
}

fn default_loop_window() -> u32 {
    3
}

impl OrchestrationConfig {
    pub fn persona_latency(&self) -> Duration {
        Duration::from_millis(self.persona_latency_ms)
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            strategy: ResponseStrategy::default(),
            bot_delay_ms: default_bot_delay(),
            filler_delay_ms: default_filler_delay(),
            direct_delay_ms: default_direct_delay(),
            persona_latency_ms: default_persona_latency_ms(),
            loop_window: default_loop_window(),
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    5 * 60
}

fn default_max_entries() -> usize {
    1000
}

fn default_sweep_interval_secs() -> u64 {
    10 * 60
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}
