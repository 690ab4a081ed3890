use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;

use super::capability::{BoundCapability, Capability};
use crate::core::lineage::{Subject, view_of};
use crate::core::{Lineage, RegistryError, Result, Root, TypeKey};

type CapabilityMap = HashMap<Arc<str>, Capability>;

/// Capabilities registered for one type, shared by every adapter built from it.
///
/// The capability set is published through an [`ArcSwap`]; adapters read it at
/// call time, so a capability added after an adapter was created is visible
/// through that adapter.
pub struct AdapterFactory {
	owner: TypeKey,
	capabilities: ArcSwap<CapabilityMap>,
}

impl AdapterFactory {
	pub fn new(owner: TypeKey) -> Self {
		Self {
			owner,
			capabilities: ArcSwap::from_pointee(CapabilityMap::default()),
		}
	}

	/// The type this factory was created for.
	pub fn owner(&self) -> TypeKey {
		self.owner
	}

	/// Installs `capability`, returning the one it replaced under the same name.
	pub fn set_capability(&self, capability: Capability) -> Option<Capability> {
		loop {
			let cur = self.capabilities.load_full();
			let mut next = (*cur).clone();
			let replaced = next.insert(capability.shared_name(), capability.clone());

			let prev = self.capabilities.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return replaced;
			}
		}
	}

	pub fn capability(&self, name: &str) -> Option<Capability> {
		self.capabilities.load().get(name).cloned()
	}

	/// Capability names, sorted.
	pub fn capability_names(&self) -> Vec<Arc<str>> {
		let mut names: Vec<_> = self.capabilities.load().keys().cloned().collect();
		names.sort();
		names
	}

	/// Builds an adapter viewing `object` as this factory's owner type.
	///
	/// # Errors
	///
	/// [`LineageError::Unreachable`](crate::LineageError::Unreachable) if no
	/// declared base of `T` leads to the owner.
	pub fn instantiate<T: Lineage>(self: &Arc<Self>, object: &Arc<T>) -> Result<Adapter> {
		let subject = view_of(object, self.owner)?;
		let origin: Weak<Root> = Arc::downgrade(object) as Weak<Root>;
		Ok(Adapter {
			factory: self.clone(),
			subject,
			object: TypeKey::of::<T>(),
			origin,
		})
	}
}

impl fmt::Debug for AdapterFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AdapterFactory")
			.field("owner", &self.owner)
			.field("capabilities", &self.capability_names())
			.finish()
	}
}

/// A per-object view exposing the capabilities of one factory.
///
/// Holds only a weak reference to the object; once the object is dropped,
/// capability calls fail with [`RegistryError::Detached`].
pub struct Adapter {
	factory: Arc<AdapterFactory>,
	subject: Subject,
	object: TypeKey,
	origin: Weak<Root>,
}

impl Adapter {
	/// The type whose factory built this adapter.
	pub fn owner(&self) -> TypeKey {
		self.factory.owner
	}

	/// The concrete type of the adapted object.
	pub fn object_type(&self) -> TypeKey {
		self.object
	}

	pub fn factory(&self) -> &Arc<AdapterFactory> {
		&self.factory
	}

	pub fn has(&self, name: &str) -> bool {
		self.factory.capabilities.load().contains_key(name)
	}

	/// Looks up capability `name` on this adapter.
	///
	/// # Errors
	///
	/// [`RegistryError::MissingCapability`] if the factory has no such capability.
	pub fn capability(&self, name: &str) -> Result<BoundCapability<'_>> {
		let capability = self.factory.capability(name).ok_or_else(|| RegistryError::MissingCapability {
			owner: self.factory.owner,
			name: name.to_string(),
		})?;
		Ok(BoundCapability::new(self, capability))
	}

	/// Shorthand for `self.capability(name)?.call(args)`.
	pub fn call<Args: Any, R: Any>(&self, name: &str, args: Args) -> Result<R> {
		self.capability(name)?.call(args)
	}

	/// Returns true while the adapted object is alive.
	pub fn is_attached(&self) -> bool {
		self.origin.strong_count() > 0
	}

	/// Returns true if this adapter was built for `object`.
	pub fn is_for<T: ?Sized>(&self, object: &Arc<T>) -> bool {
		std::ptr::addr_eq(self.origin.as_ptr(), Arc::as_ptr(object))
	}

	pub(crate) fn subject(&self) -> &Subject {
		&self.subject
	}
}

impl fmt::Debug for Adapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Adapter")
			.field("owner", &self.factory.owner)
			.field("object", &self.object)
			.field("attached", &self.is_attached())
			.finish_non_exhaustive()
	}
}
