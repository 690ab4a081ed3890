//! Component resolution registry.
//!
//! Resolves abstract capability tags to concrete implementations, falling back
//! to the nearest registered ancestor of the queried type and remembering the
//! answer.
//!
//! # Modules
//!
//! - [`utilities`] - tag to shared singleton instance
//! - [`adapters`] - live object to a synthesized view exposing named capabilities
//! - [`validation`] - predicates run when something is registered
//! - [`core`] - type keys, ancestry linearization, errors
//! - [`config`] - construction options
//!
//! [`Registry`] composes one utility registry and one adapter registry.
//!
//! # Declaring ancestry
//!
//! Types take part in ancestor fallback through [`Lineage`], usually declared
//! with [`lineage!`]:
//!
//! ```
//! use std::sync::Arc;
//!
//! use garakta_registry::{Utility, create_registry, lineage};
//!
//! trait Storage: Send + Sync {
//! 	fn name(&self) -> &str;
//! }
//!
//! struct FileStorage(String);
//!
//! impl Storage for FileStorage {
//! 	fn name(&self) -> &str {
//! 		&self.0
//! 	}
//! }
//!
//! lineage!(dyn Storage);
//! lineage!(FileStorage: dyn Storage);
//!
//! let registry = create_registry();
//! registry.register::<dyn Storage>(Utility::new(FileStorage("savedata.json".into()))).unwrap();
//! assert!(registry.lookup_utility::<FileStorage>().is_ok());
//!
//! registry
//! 	.register_adapter_capability::<dyn Storage, (), String, _>("display_name", |storage, ()| {
//! 		format!("loc: {}", storage.name())
//! 	})
//! 	.unwrap();
//! let object = Arc::new(FileStorage("hmm".into()));
//! let adapter = registry.adapt_object(&object).unwrap();
//! assert_eq!(adapter.call::<(), String>("display_name", ()).unwrap(), "loc: hmm");
//! ```

pub mod adapters;
pub mod config;
pub mod core;
mod registry;
pub mod utilities;
pub mod validation;

pub use crate::adapters::{Adapter, AdapterFactory, AdapterRegistry, BoundCapability, Capability, CapabilityRule};
pub use crate::config::RegistryConfig;
pub use crate::core::{Ancestry, Base, Lineage, LineageError, RegistryError, Result, Root, RuleError, TypeKey};
pub use crate::registry::{Registry, create_registry};
pub use crate::utilities::{Utility, UtilityRegistry, UtilityRule};
pub use crate::validation::{Candidate, RuleTable, ValidationRule};
