//! Configuration file support for stackdebt.
//!
//! Provides YAML-based configuration through `stackdebt.config.yml` files,
//! including data structures, file loading, validation and conversion into
//! the runtime settings of the analysis pipeline.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::cache::CacheSettings;
use crate::application::resilience::{ServiceConfig, GITHUB_API, HTTP_SCRAPER, REFERENCE_LOOKUP};
use crate::application::runtime::{Deadlines, RuntimeSettings};
use crate::application::throttle::ThrottleLimits;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "stackdebt.config.yml";

/// Environment variable consulted for a GitHub token when the config names none
pub const DEFAULT_GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

type UnknownFields = HashMap<String, serde_yaml_ng::Value>;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Per-service resilience overrides keyed by service name
    #[serde(default)]
    pub services: BTreeMap<String, ServiceOverrides>,
    pub cache: Option<CacheOverrides>,
    pub throttle: Option<ThrottleOverrides>,
    pub deadlines: Option<DeadlineOverrides>,
    /// Reference table replacing the built-in one
    pub reference_table: Option<PathBuf>,
    /// Name of the environment variable holding a GitHub token
    pub github_token_env: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServiceOverrides {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub exponential_base: Option<f64>,
    pub jitter: Option<bool>,
    pub failure_threshold: Option<u32>,
    pub recovery_timeout_secs: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct CacheOverrides {
    pub max_entries: Option<usize>,
    pub website_ttl_minutes: Option<u64>,
    pub repository_ttl_minutes: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct ThrottleOverrides {
    pub short_window_limit: Option<usize>,
    pub long_window_limit: Option<usize>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct DeadlineOverrides {
    pub website_secs: Option<u64>,
    pub repository_secs: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

impl ConfigFile {
    /// Builds the runtime settings, starting from built-in values and
    /// applying every override present in the file.
    pub fn to_runtime_settings(&self) -> RuntimeSettings {
        let services = self
            .services
            .iter()
            .map(|(name, overrides)| (name.clone(), overrides.apply(ServiceConfig::builtin(name))))
            .collect();

        let mut cache = CacheSettings::default();
        if let Some(overrides) = &self.cache {
            if let Some(max_entries) = overrides.max_entries {
                cache.max_entries = max_entries;
            }
            if let Some(minutes) = overrides.website_ttl_minutes {
                cache.website_ttl = minutes_to_duration(minutes);
            }
            if let Some(minutes) = overrides.repository_ttl_minutes {
                cache.repository_ttl = minutes_to_duration(minutes);
            }
            if let Some(secs) = overrides.sweep_interval_secs {
                cache.sweep_interval = Duration::from_secs(secs);
            }
        }

        let mut throttle = ThrottleLimits::default();
        if let Some(overrides) = &self.throttle {
            if let Some(limit) = overrides.short_window_limit {
                throttle.short_limit = limit;
            }
            if let Some(limit) = overrides.long_window_limit {
                throttle.long_limit = limit;
            }
        }

        let mut deadlines = Deadlines::default();
        if let Some(overrides) = &self.deadlines {
            if let Some(secs) = overrides.website_secs {
                deadlines.website = Duration::from_secs(secs);
            }
            if let Some(secs) = overrides.repository_secs {
                deadlines.repository = Duration::from_secs(secs);
            }
        }

        RuntimeSettings {
            services,
            cache,
            throttle,
            deadlines,
        }
    }

    /// Environment variable the GitHub token is read from
    pub fn github_token_env(&self) -> &str {
        self.github_token_env
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_GITHUB_TOKEN_ENV)
    }
}

impl ServiceOverrides {
    fn apply(&self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(ms) = self.base_delay_ms {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.max_delay_ms {
            config.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(base) = self.exponential_base {
            config.retry.exponential_base = base;
        }
        if let Some(jitter) = self.jitter {
            config.retry.jitter = jitter;
        }
        if let Some(threshold) = self.failure_threshold {
            config.breaker.failure_threshold = threshold;
        }
        if let Some(secs) = self.recovery_timeout_secs {
            config.breaker.recovery_timeout = Duration::from_secs(secs);
        }
        config
    }
}

fn minutes_to_duration(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    // An empty file deserializes to YAML null; treat it as "no overrides"
    let config: ConfigFile = if content.trim().is_empty() {
        ConfigFile::default()
    } else {
        serde_yaml_ng::from_str(&content).with_context(|| {
            format!(
                "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
                path.display()
            )
        })?
    };

    validate_config(&config)?;
    warn_unknown_fields(&config);

    tracing::debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    for (name, service) in &config.services {
        if service.max_attempts == Some(0) {
            bail!(
                "Invalid config: services.{}.max_attempts must be at least 1.\n\n\
                 💡 Hint: Use max_attempts: 1 to disable retries.",
                name
            );
        }
        if service.failure_threshold == Some(0) {
            bail!(
                "Invalid config: services.{}.failure_threshold must be at least 1.\n\n\
                 💡 Hint: The circuit opens after this many consecutive failures.",
                name
            );
        }
        if let Some(base) = service.exponential_base {
            if !base.is_finite() || base < 1.0 {
                bail!(
                    "Invalid config: services.{}.exponential_base must be 1.0 or greater (got {}).\n\n\
                     💡 Hint: 2.0 doubles the delay after each failed attempt.",
                    name,
                    base
                );
            }
        }
        if let (Some(base), Some(max)) = (service.base_delay_ms, service.max_delay_ms) {
            if base > max {
                bail!(
                    "Invalid config: services.{}.base_delay_ms ({}) exceeds max_delay_ms ({}).\n\n\
                     💡 Hint: max_delay_ms caps every backoff delay.",
                    name,
                    base,
                    max
                );
            }
        }
    }

    if let Some(cache) = &config.cache {
        if cache.max_entries == Some(0) {
            bail!(
                "Invalid config: cache.max_entries must be at least 1.\n\n\
                 💡 Hint: The default capacity is 1000 entries."
            );
        }
        if cache.sweep_interval_secs == Some(0) {
            bail!(
                "Invalid config: cache.sweep_interval_secs must be at least 1.\n\n\
                 💡 Hint: Expired entries are also dropped lazily on lookup, so a long interval is fine."
            );
        }
    }

    if let Some(throttle) = &config.throttle {
        if throttle.short_window_limit == Some(0) || throttle.long_window_limit == Some(0) {
            bail!(
                "Invalid config: throttle limits must be at least 1.\n\n\
                 💡 Hint: Defaults are 60 requests per minute and 1000 per hour."
            );
        }
    }

    if let Some(deadlines) = &config.deadlines {
        if deadlines.website_secs == Some(0) || deadlines.repository_secs == Some(0) {
            bail!(
                "Invalid config: deadlines must be at least 1 second.\n\n\
                 💡 Hint: Defaults are 10s for websites and 30s for repositories."
            );
        }
    }

    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    let warn = |section: &str, fields: &UnknownFields| {
        for key in fields.keys() {
            tracing::warn!(field = %format!("{}{}", section, key), "unknown config field will be ignored");
        }
    };

    warn("", &config.unknown_fields);
    for (name, service) in &config.services {
        if ![GITHUB_API, HTTP_SCRAPER, REFERENCE_LOOKUP].contains(&name.as_str()) {
            tracing::warn!(service = %name, "config names a service the analyzer does not call");
        }
        warn(&format!("services.{}.", name), &service.unknown_fields);
    }
    if let Some(cache) = &config.cache {
        warn("cache.", &cache.unknown_fields);
    }
    if let Some(throttle) = &config.throttle {
        warn("throttle.", &throttle.unknown_fields);
    }
    if let Some(deadlines) = &config.deadlines {
        warn("deadlines.", &deadlines.unknown_fields);
    }
}
