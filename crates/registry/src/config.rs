//! Registry construction options.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Registry`](crate::Registry) and its sub-registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
	/// Name attached to every trace event the registry emits.
	#[serde(default = "default_label")]
	pub label: String,
	/// Adapter cache size at which slots of dropped objects are swept.
	///
	/// After a sweep the mark is reset to twice the surviving slots, never
	/// below this value.
	#[serde(default = "default_sweep_threshold")]
	pub sweep_threshold: usize,
}

fn default_label() -> String {
	"registry".to_string()
}

fn default_sweep_threshold() -> usize {
	64
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			label: default_label(),
			sweep_threshold: default_sweep_threshold(),
		}
	}
}

impl RegistryConfig {
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
		self.sweep_threshold = threshold;
		self
	}
}
