//! Process-wide runtime configuration.
//!
//! Configuration is written in TOML:
//!
//! ```toml
//! max_slots = 255
//! trace_invocations = false
//! check_exact_arguments = true
//! ```
//!
//! Missing keys take their defaults. The active configuration is published through an
//! [`ArcSwap`], so readers never block and [`install`] replaces it atomically.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Hard ceiling on argument slots; configurations above it are rejected.
pub const SLOT_CEILING: usize = 255;

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A field value is outside its permitted range.
	#[error("invalid value for {field}: {reason}")]
	Invalid {
		/// Name of the offending field.
		field: &'static str,
		/// What was wrong with it.
		reason: String,
	},
}

/// Tunables of the linkage runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
	/// Maximum argument slots of any signature; `long` and `double` take two.
	pub max_slots: usize,
	/// Wraps every top-level exact invocation in a `linkage.invoke` span.
	pub trace_invocations: bool,
	/// Checks each actual value against its declared kind on exact invocation.
	pub check_exact_arguments: bool,
}

impl Default for RuntimeConfig {
	fn default() -> Self {
		Self {
			max_slots: SLOT_CEILING,
			trace_invocations: false,
			check_exact_arguments: true,
		}
	}
}

impl RuntimeConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(src)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_slots == 0 || self.max_slots > SLOT_CEILING {
			return Err(ConfigError::Invalid {
				field: "max_slots",
				reason: format!("{} is not in 1..={SLOT_CEILING}", self.max_slots),
			});
		}
		Ok(())
	}
}

static CURRENT: LazyLock<ArcSwap<RuntimeConfig>> = LazyLock::new(|| ArcSwap::from_pointee(RuntimeConfig::default()));

/// The active configuration.
pub fn current() -> Arc<RuntimeConfig> {
	CURRENT.load_full()
}

/// Validates and publishes `config`, returning the one it replaced.
pub fn install(config: RuntimeConfig) -> Result<Arc<RuntimeConfig>, ConfigError> {
	config.validate()?;
	debug!(
		max_slots = config.max_slots,
		trace_invocations = config.trace_invocations,
		check_exact_arguments = config.check_exact_arguments,
		"linkage.config.install"
	);
	Ok(CURRENT.swap(Arc::new(config)))
}
