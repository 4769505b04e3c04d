use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::cache::CacheTtls;
use crate::prediction::PredictionThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    Matching,
    Pricing,
    Prediction,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub matching: bool,
    pub pricing: bool,
    pub prediction: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            matching: true,
            pricing: true,
            prediction: true,
        }
    }
}

impl FeatureFlags {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Matching => self.matching,
            Feature::Pricing => self.pricing,
            Feature::Prediction => self.prediction,
        }
    }

    pub fn from_env() -> Self {
        Self {
            matching: env_flag("MM_FEATURE_MATCHING").unwrap_or(true),
            pricing: env_flag("MM_FEATURE_PRICING").unwrap_or(true),
            prediction: env_flag("MM_FEATURE_PREDICTION").unwrap_or(true),
        }
    }
}

/// Where the optional external intelligence service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub features: FeatureFlags,
    pub ttls: CacheTtls,
    pub sweep_interval: Duration,
    pub external: Option<ExternalServiceConfig>,
    pub prediction: PredictionThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            features: FeatureFlags::default(),
            ttls: CacheTtls::default(),
            sweep_interval: Duration::from_secs(3600),
            external: None,
            prediction: PredictionThresholds::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = CacheTtls::default();
        let ttls = CacheTtls {
            market: env_secs("MM_TTL_MARKET_SECS").unwrap_or(defaults.market),
            score: env_secs("MM_TTL_SCORE_SECS").unwrap_or(defaults.score),
            profile: env_secs("MM_TTL_PROFILE_SECS").unwrap_or(defaults.profile),
        };

        let external = env::var("MM_EXTERNAL_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .map(|base_url| ExternalServiceConfig {
                base_url,
                timeout: Duration::from_millis(
                    env_u64("MM_EXTERNAL_TIMEOUT_MS").unwrap_or(2_000),
                ),
            });

        Self {
            features: FeatureFlags::from_env(),
            ttls,
            sweep_interval: env_secs("MM_CACHE_SWEEP_SECS").unwrap_or(Duration::from_secs(3600)),
            external,
            prediction: PredictionThresholds::default(),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|value| {
        let value = value.trim();
        value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("on")
    })
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn env_secs(name: &str) -> Option<Duration> {
    env_u64(name).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn with_envs(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_GUARD.lock().unwrap();

        let previous: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(var, value)| {
                let old = env::var(var).ok();
                match value {
                    Some(v) => unsafe { env::set_var(var, v) },
                    None => unsafe { env::remove_var(var) },
                }
                (*var, old)
            })
            .collect();

        f();

        for (var, previous_value) in previous {
            match previous_value {
                Some(v) => unsafe { env::set_var(var, v) },
                None => unsafe { env::remove_var(var) },
            }
        }
    }

    #[test]
    fn feature_flags_default_to_enabled() {
        with_envs(
            &[
                ("MM_FEATURE_MATCHING", None),
                ("MM_FEATURE_PRICING", Some("false")),
                ("MM_FEATURE_PREDICTION", Some("1")),
            ],
            || {
                let flags = FeatureFlags::from_env();
                assert!(flags.is_enabled(Feature::Matching));
                assert!(!flags.is_enabled(Feature::Pricing));
                assert!(flags.is_enabled(Feature::Prediction));
            },
        );
    }

    #[test]
    fn engine_config_reads_ttls_and_external_service() {
        with_envs(
            &[
                ("MM_TTL_MARKET_SECS", Some("30")),
                ("MM_TTL_SCORE_SECS", Some("not-a-number")),
                ("MM_TTL_PROFILE_SECS", None),
                ("MM_EXTERNAL_URL", Some("http://scoring.internal:8080/")),
                ("MM_EXTERNAL_TIMEOUT_MS", Some("750")),
                ("MM_CACHE_SWEEP_SECS", None),
            ],
            || {
                let config = EngineConfig::from_env();
                assert_eq!(config.ttls.market, Duration::from_secs(30));
                assert_eq!(config.ttls.score, Duration::from_secs(300));
                assert_eq!(config.ttls.profile, Duration::from_secs(1800));
                assert_eq!(config.sweep_interval, Duration::from_secs(3600));
                assert_eq!(
                    config.external,
                    Some(ExternalServiceConfig {
                        base_url: "http://scoring.internal:8080".into(),
                        timeout: Duration::from_millis(750),
                    })
                );
            },
        );
    }

    #[test]
    fn blank_external_url_disables_external_service() {
        with_envs(&[("MM_EXTERNAL_URL", Some("  "))], || {
            assert!(EngineConfig::from_env().external.is_none());
        });
    }
}
