//! Hasher Settings
//!
//! Tunables for the typed-data engine with:
//! - Presets (standard, strict)
//! - Environment overrides for the command-line tool
//! - Validation of settings

use crate::eip712::Eip712Error;
use std::env;
use std::str::FromStr;

/// Upper bound accepted for `max_depth`
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// Environment variable overriding `max_depth`
pub const ENV_MAX_DEPTH: &str = "EIP712_MAX_DEPTH";
/// Environment variable overriding `domain_type` (`declared` | `synthesized`)
pub const ENV_DOMAIN_TYPE: &str = "EIP712_DOMAIN_TYPE";
/// Environment variable overriding `accept_hex_integers` (`true` | `false`)
pub const ENV_HEX_INTEGERS: &str = "EIP712_HEX_INTEGERS";

/// Where the `EIP712Domain` field list comes from when hashing an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainTypeSource {
    /// Use the declared `EIP712Domain` entry if the envelope has one
    DeclaredIfPresent,
    /// Always synthesize from the populated domain fields
    Synthesized,
}

impl FromStr for DomainTypeSource {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "declared" => Ok(Self::DeclaredIfPresent),
            "synthesized" => Ok(Self::Synthesized),
            other => Err(Eip712Error::InvalidSettings(format!(
                "unknown domain type source: {}",
                other
            ))),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasherSettings {
    /// Maximum struct/array nesting while encoding a value
    pub max_depth: usize,
    /// Source of the domain type for envelopes
    pub domain_type: DomainTypeSource,
    /// Accept `0x`-prefixed hex strings for integer values
    pub accept_hex_integers: bool,
}

impl Default for HasherSettings {
    fn default() -> Self {
        Self::standard()
    }
}

impl HasherSettings {
    /// Standard preset, compatible with common wallet payloads
    pub fn standard() -> Self {
        Self {
            max_depth: 64,
            domain_type: DomainTypeSource::DeclaredIfPresent,
            accept_hex_integers: true,
        }
    }

    /// Strict preset
    pub fn strict() -> Self {
        Self {
            max_depth: 16,
            domain_type: DomainTypeSource::Synthesized,
            accept_hex_integers: false,
        }
    }

    /// Standard preset with environment overrides applied
    pub fn from_env() -> Result<Self, Eip712Error> {
        let mut settings = Self::standard();

        if let Ok(depth) = env::var(ENV_MAX_DEPTH) {
            settings.max_depth = depth.trim().parse().map_err(|_| {
                Eip712Error::InvalidSettings(format!("{} must be an integer: {}", ENV_MAX_DEPTH, depth))
            })?;
        }
        if let Ok(source) = env::var(ENV_DOMAIN_TYPE) {
            settings.domain_type = source.parse()?;
        }
        if let Ok(flag) = env::var(ENV_HEX_INTEGERS) {
            settings.accept_hex_integers = parse_flag(ENV_HEX_INTEGERS, &flag)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject unusable settings
    pub fn validate(&self) -> Result<(), Eip712Error> {
        if self.max_depth == 0 {
            return Err(Eip712Error::InvalidSettings(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(Eip712Error::InvalidSettings(format!(
                "max_depth {} exceeds limit {}",
                self.max_depth, MAX_DEPTH_LIMIT
            )));
        }
        Ok(())
    }

    /// Non-fatal observations about the settings
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_depth < 4 {
            warnings.push("Warning: max_depth below 4 rejects most nested payloads".to_string());
        }
        if self.max_depth > 256 {
            warnings.push("Warning: max_depth above 256 allows very deep recursion".to_string());
        }

        warnings
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, Eip712Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Eip712Error::InvalidSettings(format!(
            "{} must be true or false: {}",
            name, other
        ))),
    }
}
