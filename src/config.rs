//! # Context Configuration Module
//!
//! Controls the two behaviours of a [`Context`](crate::chain::Context) that are a
//! matter of policy rather than mechanism.
//!
//! ## Environment Variables
//!
//! ### `CHAINCTX_CONTINUATION`
//!
//! How the chain reacts when a handler returns without calling `next()`:
//! - `explicit` (default): the handler short-circuits the rest of the chain
//! - `implicit`: the enclosing loop carries on with the following handler; only
//!   `fail()` stops the chain
//!
//! ### `CHAINCTX_RESPONSE_GUARD`
//!
//! What happens when a handler writes the status twice or sets headers after the
//! status line is out:
//! - `permissive` (default): the write is forwarded and the sink ignores it
//! - `strict`: the write is skipped and recorded as a
//!   [`ResponseError::AlreadyFinalized`](crate::error::ResponseError::AlreadyFinalized)
//!
//! ## Usage
//!
//! ```rust
//! use chainctx::config::{ContextConfig, Continuation, ResponseGuard};
//!
//! let config = ContextConfig::from_yaml_str("response_guard: strict\n").unwrap();
//! assert_eq!(config.continuation, Continuation::Explicit);
//! assert_eq!(config.response_guard, ResponseGuard::Strict);
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::Context as _;
use serde::Deserialize;
use tracing::warn;

pub const CONTINUATION_ENV: &str = "CHAINCTX_CONTINUATION";
pub const RESPONSE_GUARD_ENV: &str = "CHAINCTX_RESPONSE_GUARD";

/// What a handler returning without `next()` means for the rest of the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    /// Returning without `next()` short-circuits the suffix.
    #[default]
    Explicit,
    /// Returning without `next()` hands control back to the enclosing loop,
    /// which moves on to the following handler.
    Implicit,
}

/// Whether response misuse is tolerated or detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseGuard {
    #[default]
    Permissive,
    Strict,
}

/// Unrecognised value for one of the configuration enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub value: String,
    pub expected: &'static str,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}', expected one of: {}", self.value, self.expected)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Continuation {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(Continuation::Explicit),
            "implicit" => Ok(Continuation::Implicit),
            other => Err(UnknownVariant {
                value: other.to_string(),
                expected: "explicit, implicit",
            }),
        }
    }
}

impl FromStr for ResponseGuard {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(ResponseGuard::Permissive),
            "strict" => Ok(ResponseGuard::Strict),
            other => Err(UnknownVariant {
                value: other.to_string(),
                expected: "permissive, strict",
            }),
        }
    }
}

/// Policy knobs applied to every context built with [`crate::chain::Context::with_config`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub continuation: Continuation,
    #[serde(default)]
    pub response_guard: ResponseGuard,
}

impl ContextConfig {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unknown values fall back to the default and are logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        ContextConfig {
            continuation: parse_or_default(CONTINUATION_ENV, lookup(CONTINUATION_ENV)),
            response_guard: parse_or_default(RESPONSE_GUARD_ENV, lookup(RESPONSE_GUARD_ENV)),
        }
    }

    /// Parse a YAML document such as
    ///
    /// ```yaml
    /// continuation: implicit
    /// response_guard: strict
    /// ```
    pub fn from_yaml_str(source: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(source).context("failed to parse context configuration")
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>) -> T
where
    T: FromStr<Err = UnknownVariant> + Default,
{
    match raw {
        None => T::default(),
        Some(raw) => raw.parse().unwrap_or_else(|err: UnknownVariant| {
            warn!(variable = key, error = %err, "Ignoring invalid configuration value");
            T::default()
        }),
    }
}
