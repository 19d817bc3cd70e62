//! Loop configuration, validation, and TOML loading.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glimmer_arena::{ArenaConfig, ArenaError};
use glimmer_ops::DEFAULT_OP_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::signal::PHASE_RATE;

/// Default iteration period in milliseconds.
pub const DEFAULT_PERIOD_MS: u64 = 20;

/// Default tensor arena size in bytes.
pub const DEFAULT_ARENA_BYTES: usize = ArenaConfig::DEFAULT_CAPACITY_BYTES;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while loading or validating a [`LoopConfig`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Arena configuration is invalid.
    Arena(ArenaError),
    /// `phase_rate` is NaN, infinite, zero, or negative.
    InvalidPhaseRate {
        /// The invalid value.
        value: f64,
    },
    /// `period_ms` is zero.
    ZeroPeriod,
    /// `op_capacity` is zero.
    ZeroOpCapacity,
    /// The TOML text could not be parsed.
    Parse {
        /// Parser message.
        reason: String,
    },
    /// The configuration file could not be read.
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error message.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::InvalidPhaseRate { value } => {
                write!(f, "phase_rate must be finite and positive, got {value}")
            }
            Self::ZeroPeriod => write!(f, "period_ms must be at least 1"),
            Self::ZeroOpCapacity => write!(f, "op_capacity must be at least 1"),
            Self::Parse { reason } => write!(f, "invalid config: {reason}"),
            Self::Io { path, reason } => {
                write!(f, "cannot read config {}: {reason}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

// ── LoopConfig ─────────────────────────────────────────────────────

/// Tunables of the inference loop.
///
/// Every field has a default, so a TOML file only needs to name the
/// values it changes:
///
/// ```
/// use glimmer_engine::LoopConfig;
///
/// let cfg = LoopConfig::from_toml_str("period_ms = 50").unwrap();
/// assert_eq!(cfg.period_ms, 50);
/// assert_eq!(cfg.arena_bytes, 8192);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    /// Radians of phase per second of elapsed time. Default: 1.57.
    pub phase_rate: f64,
    /// Delay between iterations in milliseconds. Default: 20.
    pub period_ms: u64,
    /// Tensor arena size in bytes. Default: 8192, the fixed arena of
    /// the firmware build. Other values are a host-side override for
    /// larger experimental graphs.
    pub arena_bytes: usize,
    /// Operator registry capacity. Default: 6, the fixed slot count of
    /// the firmware build. Other values are a host-side override.
    pub op_capacity: usize,
    /// Graph input that receives the phase. Default: 0.
    pub input_index: usize,
    /// Graph output read as the prediction. Default: 0.
    pub output_index: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            phase_rate: PHASE_RATE,
            period_ms: DEFAULT_PERIOD_MS,
            arena_bytes: DEFAULT_ARENA_BYTES,
            op_capacity: DEFAULT_OP_CAPACITY,
            input_index: 0,
            output_index: 0,
        }
    }
}

impl LoopConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.phase_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidPhaseRate { value: rate });
        }
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.op_capacity == 0 {
            return Err(ConfigError::ZeroOpCapacity);
        }
        self.arena_config().validate()?;
        Ok(())
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Delay between iterations.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Arena configuration derived from `arena_bytes`.
    pub fn arena_config(&self) -> ArenaConfig {
        ArenaConfig::new(self.arena_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_board_constants() {
        let cfg = LoopConfig::default();
        assert_eq!(cfg.phase_rate, 1.57);
        assert_eq!(cfg.period(), Duration::from_millis(20));
        assert_eq!(cfg.arena_bytes, 8 * 1024);
        assert_eq!(cfg.op_capacity, 6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_file_keeps_firmware_bounds() {
        let cfg = LoopConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.arena_bytes, ArenaConfig::DEFAULT_CAPACITY_BYTES);
        assert_eq!(cfg.op_capacity, DEFAULT_OP_CAPACITY);
        assert_eq!(cfg, LoopConfig::default());
    }

    #[test]
    fn rejects_bad_phase_rate() {
        for value in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let cfg = LoopConfig {
                phase_rate: value,
                ..LoopConfig::default()
            };
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::InvalidPhaseRate { .. })
            ));
        }
    }

    #[test]
    fn rejects_zero_period_and_capacity() {
        let cfg = LoopConfig {
            period_ms: 0,
            ..LoopConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPeriod));
        let cfg = LoopConfig {
            op_capacity: 0,
            ..LoopConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroOpCapacity));
    }

    #[test]
    fn rejects_zero_arena() {
        let cfg = LoopConfig {
            arena_bytes: 0,
            ..LoopConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::Arena(ArenaError::ZeroCapacity)));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = LoopConfig::from_toml_str("phase_rate = 2.5\narena_bytes = 4096\n").unwrap();
        assert_eq!(cfg.phase_rate, 2.5);
        assert_eq!(cfg.arena_bytes, 4096);
        assert_eq!(cfg.period_ms, DEFAULT_PERIOD_MS);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = LoopConfig::from_toml_str("perod_ms = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn toml_values_are_validated() {
        let err = LoopConfig::from_toml_str("period_ms = 0").unwrap_err();
        assert_eq!(err, ConfigError::ZeroPeriod);
    }

    #[test]
    fn serialized_config_parses_back() {
        let cfg = LoopConfig {
            period_ms: 7,
            ..LoopConfig::default()
        };
        let text = toml::to_string(&cfg).unwrap();
        assert_eq!(LoopConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LoopConfig::load("/nonexistent/glimmer.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/glimmer.toml"));
    }
}
