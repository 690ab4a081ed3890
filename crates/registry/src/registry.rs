use std::any::Any;
use std::sync::Arc;

use crate::adapters::{Adapter, AdapterRegistry};
use crate::config::RegistryConfig;
use crate::core::{Lineage, Result};
use crate::utilities::{Utility, UtilityRegistry, UtilityRule};

/// One utility registry and one adapter registry behind a single handle.
pub struct Registry {
	utilities: UtilityRegistry,
	adapters: AdapterRegistry,
}

/// Creates an empty registry with the default configuration.
pub fn create_registry() -> Registry {
	Registry::new()
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Registry {
	pub fn new() -> Self {
		Self::with_config(&RegistryConfig::default())
	}

	pub fn with_config(config: &RegistryConfig) -> Self {
		Self {
			utilities: UtilityRegistry::with_label(config.label.as_str()),
			adapters: AdapterRegistry::with_config(config),
		}
	}

	/// Registers a utility under tag `T`. See [`UtilityRegistry::register`].
	pub fn register<T: ?Sized + 'static>(&self, instance: Utility) -> Result<()> {
		self.utilities.register::<T>(instance)
	}

	/// Resolves tag `T` to a utility. See [`UtilityRegistry::lookup`].
	pub fn lookup_utility<T: Lineage + ?Sized>(&self) -> Result<Utility> {
		self.utilities.lookup::<T>()
	}

	pub fn add_rule<T: ?Sized + 'static>(&self, rule: UtilityRule) {
		self.utilities.add_rule::<T>(rule);
	}

	pub fn validation_rules_for<T: ?Sized + 'static>(&self) -> Vec<UtilityRule> {
		self.utilities.rules_for::<T>()
	}

	/// Returns the adapter for `object`. See [`AdapterRegistry::lookup`].
	pub fn adapt_object<T: Lineage>(&self, object: &Arc<T>) -> Result<Arc<Adapter>> {
		self.adapters.lookup(object)
	}

	pub fn register_adapter_capability<T, Args, R, F>(&self, name: impl Into<Arc<str>>, f: F) -> Result<()>
	where
		T: Lineage + ?Sized,
		Args: Any,
		R: Any,
		F: Fn(&T, Args) -> R + Send + Sync + 'static,
	{
		self.adapters.register_capability::<T, Args, R, F>(name, f)
	}

	pub fn utilities(&self) -> &UtilityRegistry {
		&self.utilities
	}

	pub fn adapters(&self) -> &AdapterRegistry {
		&self.adapters
	}
}
