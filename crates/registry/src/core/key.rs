use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The sentinel root of every ancestry.
///
/// Every `'static + Send + Sync` value is an `Any`, so this plays the part of a
/// universal base type. Registering under `Root` makes a catch-all default.
pub type Root = dyn Any + Send + Sync;

/// Identifies a capability tag or concrete type.
///
/// Equality and hashing use the [`TypeId`] alone; the name is carried for
/// diagnostics only.
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Returns the key for `T`. Trait objects are valid keys.
	#[inline]
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: type_name::<T>(),
		}
	}

	/// Returns the key of the sentinel [`Root`].
	#[inline]
	pub fn root() -> Self {
		Self::of::<Root>()
	}

	#[inline]
	pub fn is_root(&self) -> bool {
		self.id == TypeId::of::<Root>()
	}

	pub fn type_id(&self) -> TypeId {
		self.id
	}

	/// Fully qualified type name, as reported by [`std::any::type_name`].
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TypeKey").field(&self.name).finish()
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}
