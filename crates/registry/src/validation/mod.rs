//! Registration-time validation hooks.
//!
//! Rules are attached to a key and run, in the order they were added, against
//! every candidate registered under that exact key. They never run at lookup
//! time. A rule that answers `false` or raises its own error aborts the
//! registration before anything is stored.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use tracing::debug;

use crate::core::{RegistryError, Result, RuleError, TypeKey};

/// Something that can be named in a rejection.
pub trait Candidate {
	fn describe(&self) -> String;
}

type CheckFn<R, C> = dyn Fn(&R, &C) -> Result<bool, RuleError> + Send + Sync;

/// A named predicate over `(registry, candidate)`.
pub struct ValidationRule<R, C> {
	name: Cow<'static, str>,
	check: Arc<CheckFn<R, C>>,
}

impl<R: 'static, C: 'static> ValidationRule<R, C> {
	/// Creates a rule from an infallible predicate.
	pub fn new<F>(name: impl Into<Cow<'static, str>>, check: F) -> Self
	where
		F: Fn(&R, &C) -> bool + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			check: Arc::new(move |registry: &R, candidate: &C| Ok::<_, RuleError>(check(registry, candidate))),
		}
	}

	/// Creates a rule whose predicate may raise.
	///
	/// A raised error aborts the registration like `false` does, but surfaces as
	/// [`RegistryError::RuleFailed`] with the original error as its source.
	pub fn fallible<F, E>(name: impl Into<Cow<'static, str>>, check: F) -> Self
	where
		F: Fn(&R, &C) -> Result<bool, E> + Send + Sync + 'static,
		E: Error + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			check: Arc::new(move |registry: &R, candidate: &C| check(registry, candidate).map_err(|err| Arc::new(err) as RuleError)),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn check(&self, registry: &R, candidate: &C) -> Result<bool, RuleError> {
		(self.check)(registry, candidate)
	}
}

impl<R, C> Clone for ValidationRule<R, C> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			check: self.check.clone(),
		}
	}
}

impl<R, C> fmt::Debug for ValidationRule<R, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValidationRule").field("name", &self.name).finish_non_exhaustive()
	}
}

/// Per-key ordered lists of [`ValidationRule`]s. Append-only.
pub struct RuleTable<R, C> {
	rules: RwLock<HashMap<TypeKey, Vec<ValidationRule<R, C>>>>,
}

impl<R, C> Default for RuleTable<R, C> {
	fn default() -> Self {
		Self {
			rules: RwLock::new(HashMap::default()),
		}
	}
}

impl<R: 'static, C: Candidate + 'static> RuleTable<R, C> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `rule` to the rules for `key`.
	pub fn add(&self, key: TypeKey, rule: ValidationRule<R, C>) {
		self.rules.write().entry(key).or_default().push(rule);
	}

	/// Rules for `key` in insertion order; empty if none were added.
	pub fn rules_for(&self, key: TypeKey) -> Vec<ValidationRule<R, C>> {
		self.rules.read().get(&key).cloned().unwrap_or_default()
	}

	/// Runs every rule for `key` against `candidate`, stopping at the first rejection.
	///
	/// The table lock is released before any rule runs, so rules may query the registry.
	pub fn check(&self, registry: &R, key: TypeKey, candidate: &C) -> Result<()> {
		for rule in self.rules_for(key) {
			match rule.check(registry, candidate) {
				Ok(true) => {}
				Ok(false) => {
					let candidate = candidate.describe();
					debug!(rule = rule.name(), %key, %candidate, "candidate rejected");
					return Err(RegistryError::InvalidComponent {
						rule: rule.name.clone(),
						candidate,
					});
				}
				Err(source) => {
					let candidate = candidate.describe();
					debug!(rule = rule.name(), %key, %candidate, error = %source, "rule failed");
					return Err(RegistryError::RuleFailed {
						rule: rule.name.clone(),
						candidate,
						source,
					});
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
