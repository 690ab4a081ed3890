//! Shared registry infrastructure.

pub mod error;
pub mod key;
pub mod lineage;
pub(crate) mod resolve;

pub use error::{LineageError, RegistryError, Result, RuleError};
pub use key::{Root, TypeKey};
pub use lineage::{Ancestry, Base, Lineage};
