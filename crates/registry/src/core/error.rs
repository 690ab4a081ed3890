use std::borrow::Cow;
use std::error::Error;
use std::sync::Arc;

use super::key::TypeKey;

/// Shared, cloneable error raised by a validation predicate.
pub type RuleError = Arc<dyn Error + Send + Sync + 'static>;

/// Failures while computing a type's ancestry or viewing an object as one of its ancestors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LineageError {
	/// The declared bases admit no C3 linearization.
	#[error("inconsistent bases for {0}: no linearization preserves declaration order")]
	Inconsistent(TypeKey),
	/// The ancestor appears in the ancestry but no declared base leads to it.
	#[error("{from} cannot be viewed as {to}")]
	Unreachable { from: TypeKey, to: TypeKey },
}

/// Generic registry error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
	/// No entry was found anywhere in the queried type's ancestry.
	///
	/// Carries the queried key, never the root.
	#[error("component not found: {0}")]
	ComponentNotFound(TypeKey),

	/// A validation rule returned `false`; nothing was stored.
	#[error("invalid component: rule {rule:?} rejected {candidate}")]
	InvalidComponent { rule: Cow<'static, str>, candidate: String },

	/// A validation rule raised its own error; nothing was stored.
	#[error("rule {rule:?} failed while checking {candidate}")]
	RuleFailed {
		rule: Cow<'static, str>,
		candidate: String,
		#[source]
		source: RuleError,
	},

	/// The adapter exists but has no capability with this name.
	#[error("{owner} adapter has no capability {name:?}")]
	MissingCapability { owner: TypeKey, name: String },

	/// A capability was called with argument or return types other than the registered ones.
	#[error("capability {name:?} expects {expected}, got {got}")]
	SignatureMismatch {
		name: String,
		expected: &'static str,
		got: &'static str,
	},

	/// The adapted object has been dropped.
	#[error("adapted {0} object is no longer alive")]
	Detached(TypeKey),

	#[error(transparent)]
	Lineage(#[from] LineageError),
}

impl RegistryError {
	/// Returns true for [`RegistryError::ComponentNotFound`].
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::ComponentNotFound(_))
	}

	/// Returns true when a validation rule blocked a registration.
	pub fn is_rejection(&self) -> bool {
		matches!(self, Self::InvalidComponent { .. } | Self::RuleFailed { .. })
	}
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
