use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

struct Storage;

#[derive(Debug, thiserror::Error)]
#[error("disk unavailable")]
struct DiskUnavailable;

struct Named(&'static str);

impl Candidate for Named {
	fn describe(&self) -> String {
		self.0.to_string()
	}
}

type Table = RuleTable<(), Named>;

fn key() -> TypeKey {
	TypeKey::of::<Storage>()
}

#[test]
fn test_rules_for_unknown_key_is_empty() {
	let table = Table::new();
	assert!(table.rules_for(key()).is_empty());
	assert!(table.check(&(), key(), &Named("anything")).is_ok());
}

#[test]
fn test_rules_keep_insertion_order() {
	let table = Table::new();
	table.add(key(), ValidationRule::new("first", |_, _| true));
	table.add(key(), ValidationRule::new("second", |_, _| true));

	let names: Vec<String> = table.rules_for(key()).iter().map(|r| r.name().to_string()).collect();
	assert_eq!(names, ["first", "second"]);
}

#[test]
fn test_false_rejects_with_rule_and_candidate() {
	let table = Table::new();
	table.add(key(), ValidationRule::new("has_name", |_, c: &Named| !c.0.is_empty()));

	match table.check(&(), key(), &Named("")).unwrap_err() {
		RegistryError::InvalidComponent { rule, candidate } => {
			assert_eq!(rule, "has_name");
			assert_eq!(candidate, "");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[test]
fn test_first_rejection_stops_the_chain() {
	let calls = std::sync::Arc::new(AtomicUsize::new(0));
	let table = Table::new();
	table.add(key(), ValidationRule::new("reject", |_, _| false));
	let counter = calls.clone();
	table.add(
		key(),
		ValidationRule::new("after", move |_, _| {
			counter.fetch_add(1, Ordering::SeqCst);
			true
		}),
	);

	assert!(table.check(&(), key(), &Named("x")).is_err());
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_raised_error_keeps_its_identity() {
	let table = Table::new();
	table.add(key(), ValidationRule::fallible("probe", |_, _| Err::<bool, _>(DiskUnavailable)));

	let err = table.check(&(), key(), &Named("x")).unwrap_err();
	assert!(err.is_rejection());
	let RegistryError::RuleFailed { rule, source, .. } = err else {
		panic!("expected RuleFailed");
	};
	assert_eq!(rule, "probe");
	assert!(source.downcast_ref::<DiskUnavailable>().is_some());
}

#[test]
fn test_rules_are_scoped_to_their_key() {
	struct Other;
	let table = Table::new();
	table.add(key(), ValidationRule::new("reject", |_, _| false));
	assert!(table.check(&(), TypeKey::of::<Other>(), &Named("x")).is_ok());
}
