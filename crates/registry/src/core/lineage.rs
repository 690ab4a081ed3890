//! Type ancestry declarations and linearization.
//!
//! Rust has no class inheritance, so the host declares each type's direct bases
//! through [`Lineage`] (usually via [`lineage!`](crate::lineage)). Bases are
//! trait objects the type implements, which lets an adapter hand the object to a
//! capability registered against any ancestor.
//!
//! # Linearization
//!
//! [`Ancestry::of`] orders a type and all of its ancestors with C3, the rule
//! behind Python's method resolution order:
//!
//! - the type itself comes first;
//! - every type precedes its own bases;
//! - bases keep their declaration order;
//! - [`Root`] is always last.
//!
//! ```
//! use garakta_registry::{Ancestry, Root, TypeKey, lineage};
//!
//! trait Storage: Send + Sync {}
//! struct FileStorage;
//! impl Storage for FileStorage {}
//!
//! lineage!(dyn Storage);
//! lineage!(FileStorage: dyn Storage);
//!
//! let ancestry = Ancestry::of::<FileStorage>().unwrap();
//! assert_eq!(
//! 	ancestry.keys(),
//! 	&[TypeKey::of::<FileStorage>(), TypeKey::of::<dyn Storage>(), TypeKey::of::<Root>()]
//! );
//! ```

use std::any::Any;
use std::sync::{Arc, Weak};

use super::error::LineageError;
use super::key::{Root, TypeKey};

/// Declares the direct bases of a type.
///
/// `Send + Sync` is required because adapters may be shared across threads; trait
/// objects used as bases need `Send + Sync` supertraits.
pub trait Lineage: Send + Sync + 'static {
	/// Direct bases in precedence order. Empty means the type derives from [`Root`] only.
	fn bases() -> Vec<Base<Self>> {
		Vec::new()
	}
}

impl Lineage for Root {}

/// One declared base of `T`.
pub struct Base<T: ?Sized> {
	key: TypeKey,
	ancestry: fn(&mut Vec<TypeKey>) -> Result<Ancestry, LineageError>,
	view: Box<dyn Fn(Weak<T>, TypeKey, &mut Vec<TypeKey>) -> Option<Subject> + Send + Sync>,
}

impl<T: ?Sized + 'static> Base<T> {
	/// Declares `B` as a base of `T`. `upcast` is normally the unsizing coercion
	/// `|this| this`.
	pub fn new<B: Lineage + ?Sized>(upcast: fn(Weak<T>) -> Weak<B>) -> Self {
		Self {
			key: TypeKey::of::<B>(),
			ancestry: Ancestry::of_inner::<B>,
			view: Box::new(move |this: Weak<T>, target: TypeKey, visiting: &mut Vec<TypeKey>| {
				view_as::<B>(upcast(this), target, visiting)
			}),
		}
	}

	pub fn key(&self) -> TypeKey {
		self.key
	}
}

/// Linearized ancestry, from the type itself down to [`Root`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ancestry(Arc<[TypeKey]>);

impl Ancestry {
	/// Computes the ancestry of `T` from its declared bases.
	///
	/// A type that is its own ancestor, directly or through a cycle of
	/// declarations, is [`LineageError::Inconsistent`].
	pub fn of<T: Lineage + ?Sized>() -> Result<Self, LineageError> {
		Self::of_inner::<T>(&mut Vec::new())
	}

	/// `resolving` holds the types whose ancestry is being computed further up the stack.
	fn of_inner<T: Lineage + ?Sized>(resolving: &mut Vec<TypeKey>) -> Result<Self, LineageError> {
		let subject = TypeKey::of::<T>();
		if resolving.contains(&subject) {
			return Err(LineageError::Inconsistent(subject));
		}
		resolving.push(subject);
		let bases = T::bases()
			.iter()
			.map(|base| (base.ancestry)(resolving))
			.collect::<Result<Vec<_>, _>>();
		resolving.pop();
		Self::linearize(subject, &bases?)
	}

	/// Builds an ancestry from an order the host already computed.
	///
	/// Duplicates keep their first position and [`Root`] is moved to the end.
	pub fn explicit(subject: TypeKey, ancestors: impl IntoIterator<Item = TypeKey>) -> Self {
		let mut keys = vec![subject];
		for key in ancestors {
			if !key.is_root() && !keys.contains(&key) {
				keys.push(key);
			}
		}
		if !subject.is_root() {
			keys.push(TypeKey::root());
		}
		Self(keys.into())
	}

	/// C3-merges the ancestries of `subject`'s direct bases.
	pub fn linearize(subject: TypeKey, bases: &[Ancestry]) -> Result<Self, LineageError> {
		if bases.is_empty() {
			return Ok(Self::explicit(subject, []));
		}
		if bases.iter().any(|base| base.contains(subject)) {
			return Err(LineageError::Inconsistent(subject));
		}

		let heads: Vec<TypeKey> = bases.iter().map(Ancestry::subject).collect();
		let mut seqs: Vec<&[TypeKey]> = bases.iter().map(|base| base.keys()).collect();
		seqs.push(&heads);

		let mut out = vec![subject];
		loop {
			seqs.retain(|seq| !seq.is_empty());
			if seqs.is_empty() {
				break;
			}
			let next = seqs
				.iter()
				.map(|seq| seq[0])
				.find(|candidate| !seqs.iter().any(|seq| seq[1..].contains(candidate)))
				.ok_or(LineageError::Inconsistent(subject))?;
			for seq in &mut seqs {
				let rest: &[TypeKey] = *seq;
				if rest[0] == next {
					*seq = &rest[1..];
				}
			}
			out.push(next);
		}
		Ok(Self(out.into()))
	}

	/// The most specific key (the type itself).
	pub fn subject(&self) -> TypeKey {
		self.0[0]
	}

	pub fn keys(&self) -> &[TypeKey] {
		&self.0
	}

	pub fn iter(&self) -> impl Iterator<Item = TypeKey> + '_ {
		self.0.iter().copied()
	}

	pub fn contains(&self, key: TypeKey) -> bool {
		self.0.contains(&key)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// A non-owning, type-erased view of an object as one of its ancestors.
///
/// Holds a `Weak<A>` where `A` is the ancestor the view was taken as.
#[derive(Debug)]
pub(crate) struct Subject {
	view: Box<dyn Any + Send + Sync>,
	key: TypeKey,
}

impl Subject {
	fn new<A: ?Sized + Send + Sync + 'static>(view: Weak<A>) -> Self {
		Self {
			view: Box::new(view),
			key: TypeKey::of::<A>(),
		}
	}

	/// The ancestor this view was taken as.
	pub(crate) fn key(&self) -> TypeKey {
		self.key
	}

	/// Returns the view as `Weak<A>`, or `None` if it was taken as another type.
	pub(crate) fn weak<A: ?Sized + Send + Sync + 'static>(&self) -> Option<&Weak<A>> {
		self.view.downcast_ref::<Weak<A>>()
	}
}

/// Views `this` as the ancestor `target`.
pub(crate) fn view_of<T: Lineage>(this: &Arc<T>, target: TypeKey) -> Result<Subject, LineageError> {
	let weak = Arc::downgrade(this);
	if target.is_root() {
		let erased: Weak<Root> = weak;
		return Ok(Subject::new(erased));
	}
	view_as::<T>(weak, target, &mut Vec::new()).ok_or(LineageError::Unreachable {
		from: TypeKey::of::<T>(),
		to: target,
	})
}

fn view_as<T: Lineage + ?Sized>(this: Weak<T>, target: TypeKey, visiting: &mut Vec<TypeKey>) -> Option<Subject> {
	let key = TypeKey::of::<T>();
	if target == key {
		return Some(Subject::new(this));
	}
	if visiting.contains(&key) {
		return None;
	}
	visiting.push(key);
	let found = T::bases()
		.into_iter()
		.find_map(|base| (base.view)(this.clone(), target, visiting));
	visiting.pop();
	found
}

/// Implements [`Lineage`] for a type.
///
/// ```ignore
/// lineage!(dyn Storage);                          // no bases besides Root
/// lineage!(FileStorage: dyn Storage);             // FileStorage implements Storage
/// lineage!(Mirror: dyn Readable, dyn Writable);   // bases in precedence order
/// ```
#[macro_export]
macro_rules! lineage {
	($ty:ty : $($base:ty),+ $(,)?) => {
		impl $crate::Lineage for $ty {
			fn bases() -> ::std::vec::Vec<$crate::Base<Self>> {
				::std::vec![$(
					$crate::Base::new::<$base>(
						|this: ::std::sync::Weak<$ty>| -> ::std::sync::Weak<$base> { this },
					)
				),+]
			}
		}
	};
	($ty:ty) => {
		impl $crate::Lineage for $ty {}
	};
}
