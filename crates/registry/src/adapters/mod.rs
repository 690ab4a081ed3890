//! Adapter lookup: live object to a synthesized capability view.
//!
//! # Role
//!
//! Capabilities are registered per type and collected into one
//! [`AdapterFactory`] per type. Adapting an object resolves the factory for the
//! object's concrete type with the same memoized ancestry walk used for
//! utilities, then builds an [`Adapter`] bound to the object.
//!
//! # Instance cache
//!
//! Each object gets at most one adapter for as long as it lives. The cache is
//! keyed by the object's address and never holds a strong reference to it:
//!
//! - the adapter's weak reference pins the allocation, so an address cannot be
//!   reused by another object while its slot exists;
//! - slots whose object is gone are unobservable and are reclaimed by
//!   [`AdapterRegistry::purge`] or by the sweep that runs when the cache grows
//!   past its high-water mark.

mod capability;
mod factory;

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, trace};

pub use self::capability::{BoundCapability, Capability};
pub use self::factory::{Adapter, AdapterFactory};
use crate::config::RegistryConfig;
use crate::core::resolve::Resolver;
use crate::core::{Ancestry, Lineage, Result, TypeKey};
use crate::validation::{RuleTable, ValidationRule};

/// A validation rule gating capability registration.
pub type CapabilityRule = ValidationRule<AdapterRegistry, Capability>;

struct InstanceCache {
	slots: HashMap<usize, Arc<Adapter>>,
	sweep_at: usize,
	min_sweep: usize,
}

impl InstanceCache {
	fn new(min_sweep: usize) -> Self {
		let min_sweep = min_sweep.max(1);
		Self {
			slots: HashMap::default(),
			sweep_at: min_sweep,
			min_sweep,
		}
	}

	fn sweep(&mut self) -> usize {
		let before = self.slots.len();
		self.slots.retain(|_, adapter| adapter.is_attached());
		self.sweep_at = (self.slots.len() * 2).max(self.min_sweep);
		before - self.slots.len()
	}
}

fn identity<T>(object: &Arc<T>) -> usize {
	Arc::as_ptr(object).cast::<()>() as usize
}

/// Type to [`AdapterFactory`] registry with a per-object adapter cache.
pub struct AdapterRegistry {
	factories: Resolver<Arc<AdapterFactory>>,
	rules: RuleTable<AdapterRegistry, Capability>,
	instances: Mutex<InstanceCache>,
}

impl Default for AdapterRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl AdapterRegistry {
	pub fn new() -> Self {
		Self::with_config(&RegistryConfig::default())
	}

	pub fn with_config(config: &RegistryConfig) -> Self {
		Self {
			factories: Resolver::new(Arc::from(config.label.as_str()), "adapters"),
			rules: RuleTable::new(),
			instances: Mutex::new(InstanceCache::new(config.sweep_threshold)),
		}
	}

	/// Registers `f` as capability `name` on adapters of `T`.
	///
	/// Creates the factory for `T` if it does not exist yet.
	pub fn register_capability<T, Args, R, F>(&self, name: impl Into<Arc<str>>, f: F) -> Result<()>
	where
		T: Lineage + ?Sized,
		Args: Any,
		R: Any,
		F: Fn(&T, Args) -> R + Send + Sync + 'static,
	{
		self.register(Capability::new::<T, Args, R, F>(name, f))
	}

	/// Installs a prebuilt capability on the factory of its receiver type.
	///
	/// Rules added for the receiver run first; a rejection leaves both the
	/// factory table and the factory untouched.
	pub fn register(&self, capability: Capability) -> Result<()> {
		let owner = capability.receiver();
		self.rules.check(self, owner, &capability)?;

		let factory = self.factories.get_or_insert_with(owner, || Arc::new(AdapterFactory::new(owner)));
		let replaced = factory.set_capability(capability.clone());
		debug!(
			registry = self.factories.label(),
			%owner,
			capability = capability.name(),
			replaced = replaced.is_some(),
			"adapter capability registered"
		);
		Ok(())
	}

	/// Resolves the factory answering for `T`, walking its ancestry if `T` has none of its own.
	pub fn resolve_factory<T: Lineage + ?Sized>(&self) -> Result<Arc<AdapterFactory>> {
		self.factories.resolve(TypeKey::of::<T>(), Ancestry::of::<T>)
	}

	/// Resolves the factory for the subject of a host-supplied ancestry.
	///
	/// The answer is not memoized and never affects [`lookup`](Self::lookup),
	/// which only follows declared bases.
	pub fn resolve_factory_in(&self, ancestry: &Ancestry) -> Result<Arc<AdapterFactory>> {
		self.factories.find_in(ancestry)
	}

	/// The factory registered directly for `T`, if any.
	pub fn factory<T: ?Sized + 'static>(&self) -> Option<Arc<AdapterFactory>> {
		self.factories.direct(TypeKey::of::<T>())
	}

	/// Returns the adapter for `object`, building it on first use.
	///
	/// Repeated calls with the same live object return the same adapter.
	///
	/// # Errors
	///
	/// [`ComponentNotFound`](crate::RegistryError::ComponentNotFound) carrying
	/// `T` if no factory exists anywhere in `T`'s ancestry.
	pub fn lookup<T: Lineage>(&self, object: &Arc<T>) -> Result<Arc<Adapter>> {
		let id = identity(object);
		if let Some(adapter) = self.cached(id) {
			trace!(registry = self.factories.label(), object = %TypeKey::of::<T>(), "adapter cache hit");
			return Ok(adapter);
		}

		let factory = self.resolve_factory::<T>()?;
		let adapter = Arc::new(factory.instantiate(object)?);

		let mut cache = self.instances.lock();
		if let Some(existing) = cache.slots.get(&id).filter(|existing| existing.is_attached()) {
			return Ok(existing.clone());
		}
		if cache.slots.len() >= cache.sweep_at {
			let evicted = cache.sweep();
			debug!(registry = self.factories.label(), evicted, live = cache.slots.len(), "swept adapter cache");
		}
		cache.slots.insert(id, adapter.clone());
		debug!(
			registry = self.factories.label(),
			object = %TypeKey::of::<T>(),
			owner = %factory.owner(),
			"adapter created"
		);
		Ok(adapter)
	}

	fn cached(&self, id: usize) -> Option<Arc<Adapter>> {
		let cache = self.instances.lock();
		cache.slots.get(&id).filter(|adapter| adapter.is_attached()).cloned()
	}

	/// Drops cache slots whose objects are gone, returning how many were dropped.
	pub fn purge(&self) -> usize {
		let evicted = self.instances.lock().sweep();
		if evicted > 0 {
			debug!(registry = self.factories.label(), evicted, "purged adapter cache");
		}
		evicted
	}

	/// Number of cached adapters whose objects are still alive.
	pub fn cached_adapters(&self) -> usize {
		let cache = self.instances.lock();
		cache.slots.values().filter(|adapter| adapter.is_attached()).count()
	}

	/// Number of cache slots, including ones not yet purged.
	pub fn cache_slots(&self) -> usize {
		self.instances.lock().slots.len()
	}

	/// Appends a rule checked on every capability registered for `T`.
	pub fn add_rule<T: ?Sized + 'static>(&self, rule: CapabilityRule) {
		self.rules.add(TypeKey::of::<T>(), rule);
	}

	pub fn rules_for<T: ?Sized + 'static>(&self) -> Vec<CapabilityRule> {
		self.rules.rules_for(TypeKey::of::<T>())
	}

	/// Returns true if a factory lookup of `T` has recorded an ancestor's factory.
	pub fn is_memoized<T: ?Sized + 'static>(&self) -> bool {
		self.factories.is_memoized(TypeKey::of::<T>())
	}

	/// Number of types with a factory of their own.
	pub fn len(&self) -> usize {
		self.factories.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
