//! Memoized ancestry-walk resolution.
//!
//! # Role
//!
//! Shared by the utility registry (values are instances) and the adapter
//! registry (values are factories). Each resolver keeps two maps under one
//! coarse lock:
//!
//! - `entries`: direct registrations, one winner per key;
//! - `memo`: answers derived by walking a queried type's ancestry.
//!
//! # Invariants
//!
//! - A direct entry for the queried key always wins over the memo, so
//!   re-registering a key is observed immediately.
//! - The memo is monotonic: once a queried key is recorded it is never
//!   re-derived, even if a closer ancestor is registered later.
//! - Walks consult direct entries only and stop at the first match in
//!   ancestry order. Reaching the end of the ancestry (the root) without a
//!   match is [`RegistryError::ComponentNotFound`] carrying the queried key.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, trace};

use crate::core::error::{LineageError, RegistryError, Result};
use crate::core::key::TypeKey;
use crate::core::lineage::Ancestry;

struct ResolverState<V> {
	entries: HashMap<TypeKey, V>,
	memo: HashMap<TypeKey, V>,
}

pub(crate) struct Resolver<V> {
	label: Arc<str>,
	domain: &'static str,
	state: RwLock<ResolverState<V>>,
}

impl<V: Clone> Resolver<V> {
	pub(crate) fn new(label: Arc<str>, domain: &'static str) -> Self {
		Self {
			label,
			domain,
			state: RwLock::new(ResolverState {
				entries: HashMap::default(),
				memo: HashMap::default(),
			}),
		}
	}

	pub(crate) fn label(&self) -> &str {
		&self.label
	}

	/// Stores a direct entry, returning the one it replaced.
	pub(crate) fn insert(&self, key: TypeKey, value: V) -> Option<V> {
		self.state.write().entries.insert(key, value)
	}

	/// Returns the direct entry for `key`, creating it with `make` if absent.
	pub(crate) fn get_or_insert_with(&self, key: TypeKey, make: impl FnOnce() -> V) -> V {
		self.state.write().entries.entry(key).or_insert_with(make).clone()
	}

	pub(crate) fn direct(&self, key: TypeKey) -> Option<V> {
		self.state.read().entries.get(&key).cloned()
	}

	pub(crate) fn is_memoized(&self, key: TypeKey) -> bool {
		self.state.read().memo.contains_key(&key)
	}

	pub(crate) fn len(&self) -> usize {
		self.state.read().entries.len()
	}

	/// Resolves `key`, computing its ancestry only if neither a direct entry nor
	/// a memoized answer exists.
	pub(crate) fn resolve(&self, key: TypeKey, ancestry: impl FnOnce() -> Result<Ancestry, LineageError>) -> Result<V> {
		{
			let state = self.state.read();
			if let Some(value) = state.entries.get(&key).or_else(|| state.memo.get(&key)) {
				trace!(registry = %self.label, domain = self.domain, %key, "resolution hit");
				return Ok(value.clone());
			}
		}
		let ancestry = ancestry()?;
		self.resolve_in(&ancestry)
	}

	/// Resolves the subject of `ancestry` by walking it in order.
	pub(crate) fn resolve_in(&self, ancestry: &Ancestry) -> Result<V> {
		let key = ancestry.subject();
		let mut guard = self.state.write();
		let state = &mut *guard;

		if let Some(value) = state.entries.get(&key).or_else(|| state.memo.get(&key)) {
			return Ok(value.clone());
		}

		let Some((found, value)) = ancestry
			.iter()
			.find_map(|candidate| state.entries.get(&candidate).map(|value| (candidate, value.clone())))
		else {
			debug!(registry = %self.label, domain = self.domain, %key, depth = ancestry.len(), "no registered ancestor");
			return Err(RegistryError::ComponentNotFound(key));
		};

		state.memo.insert(key, value.clone());
		debug!(registry = %self.label, domain = self.domain, %key, via = %found, "memoized ancestor resolution");
		Ok(value)
	}

	/// Walks `ancestry` like [`Resolver::resolve_in`] without recording the answer.
	pub(crate) fn find_in(&self, ancestry: &Ancestry) -> Result<V> {
		let key = ancestry.subject();
		let state = self.state.read();
		if let Some(value) = state.entries.get(&key).or_else(|| state.memo.get(&key)) {
			return Ok(value.clone());
		}
		ancestry
			.iter()
			.find_map(|candidate| state.entries.get(&candidate).cloned())
			.ok_or(RegistryError::ComponentNotFound(key))
	}
}
