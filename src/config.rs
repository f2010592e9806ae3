use dotenvy;
use std::{env, fmt, str::FromStr};

use crate::error::{Error, Result};

const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";

/// How the dispatcher keeps at most `max_concurrency` batches in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Fixed groups of `max_concurrency` batches; each group must fully
    /// resolve before the next starts, so the tail of a group runs below
    /// the cap even when more work is pending.
    Windowed,
    /// Every batch is submitted at once and takes a permit from a counting
    /// semaphore around its remote call.
    #[default]
    Gated
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windowed" | "window" | "manual" => Ok(Strategy::Windowed),
            "gated" | "semaphore" => Ok(Strategy::Gated),
            other => Err(format!("unknown strategy `{}` (expected windowed or gated)", other))
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Windowed => write!(f, "windowed"),
            Strategy::Gated => write!(f, "gated")
        }
    }
}

/// What happens to a run when one remote call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort outstanding work and report the first failure.
    #[default]
    FailFast,
    /// Finish every batch, recording a failure marker for each item of a
    /// failed batch.
    BestEffort
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "best-effort" | "besteffort" => Ok(FailurePolicy::BestEffort),
            other => Err(format!("unknown failure policy `{}` (expected fail-fast or best-effort)", other))
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::BestEffort => write!(f, "best-effort")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    pub chunk_size: usize,
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub strategy: Strategy,
    pub failure_policy: FailurePolicy,
    pub chat_model: String,
    pub embedding_model: String
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            chunk_size: 500,
            batch_size: 8,
            max_concurrency: 4,
            strategy: Strategy::default(),
            failure_policy: FailurePolicy::default(),
            chat_model: String::from(DEFAULT_CHAT_MODEL),
            embedding_model: String::from(DEFAULT_EMBEDDING_MODEL)
        }
    }
}

impl DispatchConfig {
    /// Reads overrides from the process environment, loading `.env` first
    /// when one exists. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        // a missing .env file is fine, OPENAI_API_KEY may already be exported.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup("CHUNK_SIZE") {
            config.chunk_size = parse_positive("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("BATCH_SIZE") {
            config.batch_size = parse_positive("BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("MAX_CONCURRENCY") {
            config.max_concurrency = parse_positive("MAX_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("STRATEGY") {
            config.strategy = v.parse().map_err(Error::InvalidConfiguration)?;
        }
        if let Some(v) = lookup("FAILURE_POLICY") {
            config.failure_policy = v.parse().map_err(Error::InvalidConfiguration)?;
        }
        if let Some(v) = lookup("CHAT_MODEL") {
            config.chat_model = v;
        }
        if let Some(v) = lookup("EMBEDDING_MODEL") {
            config.embedding_model = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("chunk_size", self.chunk_size),
            ("batch_size", self.batch_size),
            ("max_concurrency", self.max_concurrency)
        ] {
            if value == 0 {
                return Err(Error::invalid_config(format!("{} must be positive", key)));
            }
        }
        if self.chat_model.trim().is_empty() || self.embedding_model.trim().is_empty() {
            return Err(Error::invalid_config("model identifiers must not be empty"));
        }
        Ok(())
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<usize> {
    let var: usize = raw.trim()
        .parse()
        .map_err(|_| Error::invalid_config(format!("failed to parse {} as a positive integer: `{}`", key, raw)))?;
    if var == 0 {
        return Err(Error::invalid_config(format!("{} must be positive", key)));
    }
    Ok(var)
}
