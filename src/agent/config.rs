//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use super::refinement::RefinementPolicy;
use crate::core::QueryCategory;
use crate::error::AgentError;

/// Default completion model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default completion token ceiling.
const DEFAULT_MAX_TOKENS: u32 = 1500;
/// Default provider-call budget per specialist.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Provider-call budget for the emergency specialist.
const DEFAULT_EMERGENCY_MAX_ATTEMPTS: u32 = 4;
/// Default acceptance threshold (0–100).
const DEFAULT_ACCEPT_THRESHOLD: f64 = 80.0;
/// Acceptance threshold for the emergency specialist.
const DEFAULT_EMERGENCY_ACCEPT_THRESHOLD: f64 = 70.0;
/// Confidence deducted for every round after the first.
const DEFAULT_ATTEMPT_PENALTY: f64 = 0.1;
/// Default end-to-end consultation timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default number of specialists consulted in consensus mode.
const DEFAULT_CONSENSUS_AGENTS: usize = 2;

/// Configuration for the consultation engine.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Completion model used by every specialist.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Provider-call budget per consultation.
    pub max_attempts: u32,
    /// Provider-call budget for emergency consultations.
    pub emergency_max_attempts: u32,
    /// Score at or above which an answer is accepted.
    pub accept_threshold: f64,
    /// Acceptance threshold for emergency consultations.
    pub emergency_accept_threshold: f64,
    /// Confidence deducted per extra round.
    pub attempt_penalty: f64,
    /// End-to-end deadline for one consultation.
    pub timeout: Duration,
    /// Specialists consulted in consensus mode.
    pub consensus_agents: usize,
    /// Directory containing persona and template overrides.
    ///
    /// Missing files fall back to compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }

    /// Refinement budget and threshold for a category.
    #[must_use]
    pub const fn refinement_policy(&self, category: QueryCategory) -> RefinementPolicy {
        match category {
            QueryCategory::Emergency => RefinementPolicy {
                max_attempts: self.emergency_max_attempts,
                accept_threshold: self.emergency_accept_threshold,
            },
            _ => RefinementPolicy {
                max_attempts: self.max_attempts,
                accept_threshold: self.accept_threshold,
            },
        }
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_attempts: Option<u32>,
    emergency_max_attempts: Option<u32>,
    accept_threshold: Option<f64>,
    emergency_accept_threshold: Option<f64>,
    attempt_penalty: Option<f64>,
    timeout: Option<Duration>,
    consensus_agents: Option<usize>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from an arbitrary key lookup.
    ///
    /// Reads the same keys as [`from_env`](Self::from_env).
    #[must_use]
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.provider.is_none() {
            self.provider = lookup("CONSULT_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = lookup("OPENAI_API_KEY").or_else(|| lookup("CONSULT_API_KEY"));
        }
        if self.base_url.is_none() {
            self.base_url = lookup("OPENAI_BASE_URL").or_else(|| lookup("CONSULT_BASE_URL"));
        }
        if self.model.is_none() {
            self.model = lookup("CONSULT_MODEL");
        }
        if self.temperature.is_none() {
            self.temperature = parse_var(&lookup, "CONSULT_TEMPERATURE");
        }
        if self.max_tokens.is_none() {
            self.max_tokens = parse_var(&lookup, "CONSULT_MAX_TOKENS");
        }
        if self.max_attempts.is_none() {
            self.max_attempts = parse_var(&lookup, "CONSULT_MAX_ATTEMPTS");
        }
        if self.emergency_max_attempts.is_none() {
            self.emergency_max_attempts = parse_var(&lookup, "CONSULT_EMERGENCY_MAX_ATTEMPTS");
        }
        if self.accept_threshold.is_none() {
            self.accept_threshold = parse_var(&lookup, "CONSULT_ACCEPT_THRESHOLD");
        }
        if self.emergency_accept_threshold.is_none() {
            self.emergency_accept_threshold =
                parse_var(&lookup, "CONSULT_EMERGENCY_ACCEPT_THRESHOLD");
        }
        if self.attempt_penalty.is_none() {
            self.attempt_penalty = parse_var(&lookup, "CONSULT_ATTEMPT_PENALTY");
        }
        if self.timeout.is_none() {
            self.timeout = parse_var(&lookup, "CONSULT_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = lookup("CONSULT_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the completion model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the completion token ceiling.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the provider-call budget.
    #[must_use]
    pub const fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    /// Sets the emergency provider-call budget.
    #[must_use]
    pub const fn emergency_max_attempts(mut self, n: u32) -> Self {
        self.emergency_max_attempts = Some(n);
        self
    }

    /// Sets the acceptance threshold.
    #[must_use]
    pub const fn accept_threshold(mut self, score: f64) -> Self {
        self.accept_threshold = Some(score);
        self
    }

    /// Sets the emergency acceptance threshold.
    #[must_use]
    pub const fn emergency_accept_threshold(mut self, score: f64) -> Self {
        self.emergency_accept_threshold = Some(score);
        self
    }

    /// Sets the per-round confidence penalty.
    #[must_use]
    pub const fn attempt_penalty(mut self, penalty: f64) -> Self {
        self.attempt_penalty = Some(penalty);
        self
    }

    /// Sets the consultation timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the consensus fan-out width.
    #[must_use]
    pub const fn consensus_agents(mut self, n: usize) -> Self {
        self.consensus_agents = Some(n);
        self
    }

    /// Sets the prompt override directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, or
    /// [`AgentError::InvalidConfig`] if a budget or the timeout is zero,
    /// or a threshold falls outside `0..=100`.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        let config = AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            emergency_max_attempts: self
                .emergency_max_attempts
                .unwrap_or(DEFAULT_EMERGENCY_MAX_ATTEMPTS),
            accept_threshold: self.accept_threshold.unwrap_or(DEFAULT_ACCEPT_THRESHOLD),
            emergency_accept_threshold: self
                .emergency_accept_threshold
                .unwrap_or(DEFAULT_EMERGENCY_ACCEPT_THRESHOLD),
            attempt_penalty: self.attempt_penalty.unwrap_or(DEFAULT_ATTEMPT_PENALTY),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            consensus_agents: self.consensus_agents.unwrap_or(DEFAULT_CONSENSUS_AGENTS),
            prompt_dir: self.prompt_dir,
        };
        validate(&config)?;
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn validate(config: &AgentConfig) -> Result<(), AgentError> {
    let invalid = |message: &str| {
        Err(AgentError::InvalidConfig {
            message: message.to_string(),
        })
    };
    if config.max_attempts == 0 || config.emergency_max_attempts == 0 {
        return invalid("attempt budget must be at least 1");
    }
    for threshold in [config.accept_threshold, config.emergency_accept_threshold] {
        if !(0.0..=100.0).contains(&threshold) {
            return invalid("acceptance threshold must be within 0..=100");
        }
    }
    if !(0.0..=1.0).contains(&config.attempt_penalty) {
        return invalid("attempt penalty must be within 0..=1");
    }
    if config.consensus_agents == 0 {
        return invalid("consensus needs at least one agent");
    }
    if config.timeout.is_zero() {
        return invalid("timeout must be greater than zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.emergency_max_attempts, 4);
        assert_eq!(config.consensus_agents, 2);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_builder_missing_api_key() {
        assert!(matches!(
            AgentConfig::builder().build(),
            Err(AgentError::ApiKeyMissing)
        ));
        assert!(matches!(
            AgentConfig::builder().api_key("  ").build(),
            Err(AgentError::ApiKeyMissing)
        ));
    }

    #[test]
    fn test_builder_rejects_zero_budget() {
        let result = AgentConfig::builder().api_key("k").max_attempts(0).build();
        assert!(matches!(result, Err(AgentError::InvalidConfig { .. })));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = AgentConfig::builder()
            .api_key("k")
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(AgentError::InvalidConfig { .. })));

        let env: HashMap<&str, &str> = [("CONSULT_API_KEY", "k"), ("CONSULT_TIMEOUT_SECS", "0")]
            .into_iter()
            .collect();
        let result = AgentConfig::builder()
            .from_lookup(|k| env.get(k).map(|v| (*v).to_string()))
            .build();
        assert!(matches!(result, Err(AgentError::InvalidConfig { .. })));
    }

    #[test]
    fn test_builder_rejects_out_of_range_threshold() {
        let result = AgentConfig::builder()
            .api_key("k")
            .accept_threshold(120.0)
            .build();
        assert!(matches!(result, Err(AgentError::InvalidConfig { .. })));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .provider("custom")
            .model("gpt-4o")
            .max_attempts(5)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "custom");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("CONSULT_API_KEY", "from-env"),
            ("CONSULT_MODEL", "gpt-4o"),
            ("CONSULT_MAX_ATTEMPTS", "2"),
            ("CONSULT_TIMEOUT_SECS", "15"),
            ("CONSULT_PROMPT_DIR", "/tmp/prompts"),
        ]
        .into_iter()
        .collect();
        let config = AgentConfig::builder()
            .model("explicit")
            .from_lookup(|k| env.get(k).map(|v| (*v).to_string()))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.model, "explicit");
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.prompt_dir, Some(PathBuf::from("/tmp/prompts")));
    }

    #[test]
    fn test_refinement_policy_per_category() {
        let config = AgentConfig::builder()
            .api_key("k")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let emergency = config.refinement_policy(QueryCategory::Emergency);
        let general = config.refinement_policy(QueryCategory::General);
        assert_eq!(emergency.max_attempts, 4);
        assert!((emergency.accept_threshold - 70.0).abs() < f64::EPSILON);
        assert_eq!(general.max_attempts, 3);
        assert!((general.accept_threshold - 80.0).abs() < f64::EPSILON);
    }
}
