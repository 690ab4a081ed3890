use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::core::RegistryError;
use crate::lineage;

trait Storage: Send + Sync {}
trait Archive: Storage {}

struct FileStorage {
	name: String,
}
struct MockStorage;
struct TapeArchive;
struct Config;

impl Storage for FileStorage {}
impl Storage for MockStorage {}
impl Storage for TapeArchive {}
impl Archive for TapeArchive {}

lineage!(dyn Storage);
lineage!(dyn Archive: dyn Storage);
lineage!(FileStorage: dyn Storage);
lineage!(MockStorage: dyn Storage);
lineage!(TapeArchive: dyn Archive);
lineage!(Config);

fn file(name: &str) -> Utility {
	Utility::new(FileStorage { name: name.to_string() })
}

#[test]
fn test_direct_hit_returns_same_instance() {
	let registry = UtilityRegistry::new();
	let component = Arc::new(FileStorage {
		name: "savedata.json".to_string(),
	});
	registry.register::<dyn Storage>(Utility::from_arc(component.clone())).unwrap();

	let found = registry.lookup::<dyn Storage>().unwrap();
	assert!(found.is_instance(&component));
	assert_eq!(found.downcast_ref::<FileStorage>().unwrap().name, "savedata.json");
}

#[test]
fn test_nothing_registered_is_not_found() {
	let registry = UtilityRegistry::new();
	let err = registry.lookup::<dyn Storage>().unwrap_err();
	assert!(matches!(err, RegistryError::ComponentNotFound(key) if key == TypeKey::of::<dyn Storage>()));
}

#[test]
fn test_nearest_registered_ancestor_answers() {
	let registry = UtilityRegistry::new();
	let component = Utility::new(MockStorage);
	registry.register::<FileStorage>(file("savedata.json")).unwrap();
	registry.register::<dyn Storage>(component.clone()).unwrap();

	let found = registry.lookup::<MockStorage>().unwrap();
	assert!(Utility::ptr_eq(&found, &component));
}

#[rstest]
#[case::direct_parent(TypeKey::of::<dyn Archive>())]
#[case::grand_parent(TypeKey::of::<dyn Storage>())]
#[case::root(TypeKey::root())]
fn test_any_ancestor_level_answers(#[case] registered_at: TypeKey) {
	let registry = UtilityRegistry::new();
	let component = file("tape");
	registry.register_key(registered_at, component.clone()).unwrap();

	let found = registry.lookup::<TapeArchive>().unwrap();
	assert!(Utility::ptr_eq(&found, &component));
}

#[test]
fn test_lookup_memoizes_only_queried_tag() {
	let registry = UtilityRegistry::new();
	registry.register::<dyn Storage>(Utility::new(MockStorage)).unwrap();

	registry.lookup::<MockStorage>().unwrap();
	assert!(registry.is_memoized::<MockStorage>());
	assert!(!registry.is_memoized::<FileStorage>());
	assert!(!registry.contains::<MockStorage>(), "memoized answers are not registrations");
	assert_eq!(registry.len(), 1);
}

/// Later registrations do not correct memoized answers.
#[test]
fn test_memoized_answer_survives_closer_registration() {
	let registry = UtilityRegistry::new();
	let first = Utility::new(MockStorage);
	registry.register::<dyn Storage>(first.clone()).unwrap();
	assert!(Utility::ptr_eq(&registry.lookup::<TapeArchive>().unwrap(), &first));

	let second = file("archive");
	registry.register::<dyn Archive>(second.clone()).unwrap();

	assert!(Utility::ptr_eq(&registry.lookup::<TapeArchive>().unwrap(), &first));
	assert!(Utility::ptr_eq(&registry.lookup::<dyn Archive>().unwrap(), &second));
}

#[test]
fn test_reregistration_replaces() {
	let registry = UtilityRegistry::new();
	let first = file("a");
	let second = file("b");
	registry.register::<dyn Storage>(first).unwrap();
	registry.lookup::<dyn Storage>().unwrap();
	registry.register::<dyn Storage>(second.clone()).unwrap();

	assert!(Utility::ptr_eq(&registry.lookup::<dyn Storage>().unwrap(), &second));
	assert_eq!(registry.len(), 1);
}

#[test]
fn test_rejected_candidate_is_not_stored() {
	let registry = UtilityRegistry::new();
	registry.add_rule::<dyn Storage>(UtilityRule::new("has_name", |_, candidate| candidate.is::<FileStorage>()));

	let err = registry.register::<dyn Storage>(Utility::new(MockStorage)).unwrap_err();
	match err {
		RegistryError::InvalidComponent { rule, candidate } => {
			assert_eq!(rule, "has_name");
			assert!(candidate.ends_with("MockStorage"));
		}
		other => panic!("unexpected error: {other:?}"),
	}
	assert!(registry.lookup::<dyn Storage>().unwrap_err().is_not_found());
	assert!(registry.is_empty());
}

#[test]
fn test_accepted_candidate_is_stored() {
	let registry = UtilityRegistry::new();
	registry.add_rule::<dyn Storage>(UtilityRule::new("has_name", |_, candidate| candidate.is::<FileStorage>()));

	registry.register::<dyn Storage>(file("hmm")).unwrap();
	assert!(registry.contains::<dyn Storage>());
	assert_eq!(registry.rules_for::<dyn Storage>().len(), 1);
	assert!(registry.rules_for::<FileStorage>().is_empty());
}

#[test]
fn test_rules_may_query_the_registry() {
	let registry = UtilityRegistry::new();
	registry.add_rule::<dyn Storage>(UtilityRule::new("configured", |registry, _| registry.lookup::<Config>().is_ok()));

	assert!(registry.register::<dyn Storage>(file("a")).unwrap_err().is_rejection());

	registry.register::<Config>(Utility::new(Config)).unwrap();
	registry.register::<dyn Storage>(file("a")).unwrap();
}

#[test]
fn test_lookup_in_host_supplied_ancestry() {
	let registry = UtilityRegistry::new();
	let component = file("x");
	registry.register::<Config>(component.clone()).unwrap();

	let ancestry = Ancestry::explicit(TypeKey::of::<MockStorage>(), [TypeKey::of::<Config>()]);
	assert!(Utility::ptr_eq(&registry.lookup_in(&ancestry).unwrap(), &component));
}

struct Recursive;
lineage!(Recursive: Recursive);

#[test]
fn test_cyclic_lineage_fails_lookup() {
	let registry = UtilityRegistry::new();
	registry.register_key(TypeKey::root(), Utility::new(Config)).unwrap();

	let err = registry.lookup::<Recursive>().unwrap_err();
	assert!(matches!(err, RegistryError::Lineage(crate::core::LineageError::Inconsistent(_))));
	assert!(!registry.is_memoized::<Recursive>());
}
