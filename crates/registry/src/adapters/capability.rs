use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use super::factory::Adapter;
use crate::core::lineage::Subject;
use crate::core::{Lineage, RegistryError, Result, TypeKey};
use crate::validation::Candidate;

type ErasedFn = dyn Fn(&Subject, Box<dyn Any>) -> Result<Box<dyn Any>> + Send + Sync;

/// A named function bound to adapters of its receiver type.
///
/// Built from a typed `Fn(&A, Args) -> R`; argument and return types are
/// checked when the capability is called.
#[derive(Clone)]
pub struct Capability {
	name: Arc<str>,
	receiver: TypeKey,
	args: TypeKey,
	output: TypeKey,
	call: Arc<ErasedFn>,
}

impl Capability {
	pub fn new<A, Args, R, F>(name: impl Into<Arc<str>>, f: F) -> Self
	where
		A: Lineage + ?Sized,
		Args: Any,
		R: Any,
		F: Fn(&A, Args) -> R + Send + Sync + 'static,
	{
		let name: Arc<str> = name.into();
		let call_name = name.clone();
		let call = move |subject: &Subject, args: Box<dyn Any>| -> Result<Box<dyn Any>> {
			let weak = subject.weak::<A>().ok_or_else(|| RegistryError::SignatureMismatch {
				name: call_name.to_string(),
				expected: type_name::<A>(),
				got: subject.key().name(),
			})?;
			let this = weak.upgrade().ok_or(RegistryError::Detached(subject.key()))?;
			let args = args.downcast::<Args>().map_err(|_| RegistryError::SignatureMismatch {
				name: call_name.to_string(),
				expected: type_name::<Args>(),
				got: "another argument type",
			})?;
			Ok(Box::new(f(&*this, *args)) as Box<dyn Any>)
		};

		Self {
			name,
			receiver: TypeKey::of::<A>(),
			args: TypeKey::of::<Args>(),
			output: TypeKey::of::<R>(),
			call: Arc::new(call),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn shared_name(&self) -> Arc<str> {
		self.name.clone()
	}

	/// The type whose adapters carry this capability.
	pub fn receiver(&self) -> TypeKey {
		self.receiver
	}

	/// Argument and return types, in that order.
	pub fn signature(&self) -> (TypeKey, TypeKey) {
		(self.args, self.output)
	}

	pub(crate) fn invoke<Args: Any, R: Any>(&self, subject: &Subject, args: Args) -> Result<R> {
		if TypeKey::of::<Args>() != self.args {
			return Err(self.mismatch(self.args, type_name::<Args>()));
		}
		if TypeKey::of::<R>() != self.output {
			return Err(self.mismatch(self.output, type_name::<R>()));
		}
		let out = (self.call)(subject, Box::new(args))?;
		out.downcast::<R>().map(|out| *out).map_err(|_| self.mismatch(self.output, type_name::<R>()))
	}

	fn mismatch(&self, expected: TypeKey, got: &'static str) -> RegistryError {
		RegistryError::SignatureMismatch {
			name: self.name.to_string(),
			expected: expected.name(),
			got,
		}
	}
}

impl fmt::Debug for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Capability")
			.field("name", &self.name)
			.field("receiver", &self.receiver)
			.field("args", &self.args)
			.field("output", &self.output)
			.finish_non_exhaustive()
	}
}

impl Candidate for Capability {
	fn describe(&self) -> String {
		format!("capability {:?} of {}", self.name, self.receiver)
	}
}

/// A capability looked up on a live adapter, ready to call.
pub struct BoundCapability<'a> {
	adapter: &'a Adapter,
	capability: Capability,
}

impl<'a> BoundCapability<'a> {
	pub(crate) fn new(adapter: &'a Adapter, capability: Capability) -> Self {
		Self { adapter, capability }
	}

	pub fn capability(&self) -> &Capability {
		&self.capability
	}

	/// Calls the capability with the adapted object prepended to `args`.
	pub fn call<Args: Any, R: Any>(&self, args: Args) -> Result<R> {
		self.capability.invoke(self.adapter.subject(), args)
	}
}
