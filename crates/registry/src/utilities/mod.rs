//! Utility lookup: capability tag to shared singleton instance.
//!
//! A query for a tag with no direct registration walks the tag's ancestry and
//! answers with the nearest registered ancestor, memoizing that answer under
//! the queried tag for the lifetime of the registry.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::resolve::Resolver;
use crate::core::{Ancestry, Lineage, Result, TypeKey};
use crate::validation::{Candidate, RuleTable, ValidationRule};

/// A validation rule gating utility registration.
pub type UtilityRule = ValidationRule<UtilityRegistry, Utility>;

/// A shared, type-erased utility instance.
///
/// Clones share the same allocation; compare identity with [`Utility::ptr_eq`].
#[derive(Clone)]
pub struct Utility {
	inner: Arc<dyn Any + Send + Sync>,
	type_name: &'static str,
}

impl Utility {
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self::from_arc(Arc::new(value))
	}

	/// Wraps an existing allocation without copying it.
	pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
		Self {
			inner: value,
			type_name: type_name::<T>(),
		}
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn is<T: Any>(&self) -> bool {
		self.inner.is::<T>()
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.inner.downcast_ref::<T>()
	}

	pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		self.inner.clone().downcast::<T>().ok()
	}

	/// Returns true if both handles point at the same instance.
	pub fn ptr_eq(a: &Self, b: &Self) -> bool {
		Arc::ptr_eq(&a.inner, &b.inner)
	}

	/// Returns true if this utility is the allocation behind `other`.
	pub fn is_instance<T: ?Sized>(&self, other: &Arc<T>) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(other))
	}
}

impl fmt::Debug for Utility {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Utility")
			.field("type", &self.type_name)
			.field("ptr", &Arc::as_ptr(&self.inner))
			.finish()
	}
}

impl Candidate for Utility {
	fn describe(&self) -> String {
		self.type_name.to_string()
	}
}

/// Capability tag to instance registry with memoized ancestor fallback.
pub struct UtilityRegistry {
	resolver: Resolver<Utility>,
	rules: RuleTable<UtilityRegistry, Utility>,
}

impl Default for UtilityRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl UtilityRegistry {
	pub fn new() -> Self {
		Self::with_label("registry")
	}

	/// Creates a registry whose trace events carry `label`.
	pub fn with_label(label: impl Into<Arc<str>>) -> Self {
		Self {
			resolver: Resolver::new(label.into(), "utilities"),
			rules: RuleTable::new(),
		}
	}

	/// Registers `instance` under tag `T`, replacing any previous instance for `T`.
	///
	/// Every rule added for `T` runs first; a rejection leaves the registry untouched.
	pub fn register<T: ?Sized + 'static>(&self, instance: Utility) -> Result<()> {
		self.register_key(TypeKey::of::<T>(), instance)
	}

	pub fn register_key(&self, key: TypeKey, instance: Utility) -> Result<()> {
		self.rules.check(self, key, &instance)?;
		let replaced = self.resolver.insert(key, instance);
		debug!(registry = self.resolver.label(), %key, replaced = replaced.is_some(), "utility registered");
		Ok(())
	}

	/// Resolves tag `T` to an instance.
	///
	/// # Errors
	///
	/// [`ComponentNotFound`](crate::RegistryError::ComponentNotFound) if neither `T`
	/// nor any ancestor (including [`Root`](crate::Root)) has a registration.
	pub fn lookup<T: Lineage + ?Sized>(&self) -> Result<Utility> {
		self.resolver.resolve(TypeKey::of::<T>(), Ancestry::of::<T>)
	}

	/// Resolves the subject of an ancestry the host computed itself.
	pub fn lookup_in(&self, ancestry: &Ancestry) -> Result<Utility> {
		self.resolver.resolve_in(ancestry)
	}

	/// Appends a rule checked on every registration under `T`.
	pub fn add_rule<T: ?Sized + 'static>(&self, rule: UtilityRule) {
		self.rules.add(TypeKey::of::<T>(), rule);
	}

	pub fn rules_for<T: ?Sized + 'static>(&self) -> Vec<UtilityRule> {
		self.rules.rules_for(TypeKey::of::<T>())
	}

	/// Returns true if `T` has a direct registration.
	pub fn contains<T: ?Sized + 'static>(&self) -> bool {
		self.resolver.direct(TypeKey::of::<T>()).is_some()
	}

	/// Returns true if a lookup of `T` has recorded an ancestor's answer.
	pub fn is_memoized<T: ?Sized + 'static>(&self) -> bool {
		self.resolver.is_memoized(TypeKey::of::<T>())
	}

	/// Number of direct registrations.
	pub fn len(&self) -> usize {
		self.resolver.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests;
