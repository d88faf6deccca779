//! End-to-end behaviour of the store through its public API.

use std::sync::Arc;

use keyed_store::{BatchUpdate, ItemStore, PatchOp, PathSegment, record};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
pub struct Nested {
	pub foo: String,
	pub boo: String,
}

record! {
	#[derive(Debug, Clone, PartialEq)]
	pub struct CustomItem {
		pub id: String,
		pub is_my_item: bool,
		pub name: String,
		pub nested: Nested,
	}
	#[derive(Debug, Clone, PartialEq)]
	pub enum CustomItemField;
}

fn custom_item(id: &str, is_my_item: bool) -> CustomItem {
	CustomItem {
		id: id.into(),
		is_my_item,
		name: "some name".into(),
		nested: Nested {
			foo: "bar".into(),
			boo: "far".into(),
		},
	}
}

fn two_item_store() -> ItemStore<CustomItem> {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	let store = ItemStore::new();
	store.add("some-id", custom_item("some-id", false)).confirm().unwrap();
	store.add("some-id-2", custom_item("some-id-2", false)).confirm().unwrap();
	store
}

mod add {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn produces_draft_with_patches() {
		let store = ItemStore::new();
		let op = store.add("some-id", custom_item("some-id", false));

		assert_eq!(op.items_draft.len(), 1);
		assert_eq!(op.patches.len(), 1);
		assert_eq!(op.patches[0].op, PatchOp::Add);
		assert_eq!(op.patches[0].path.as_slice(), &[PathSegment::from("some-id")]);
		assert_eq!(op.inverse_patches[0].op, PatchOp::Remove);
	}

	#[test]
	fn leaves_store_untouched_without_confirm() {
		let store: ItemStore<CustomItem> = ItemStore::new();
		let _op = store.add("some-id", custom_item("some-id", false));
		assert!(store.get("some-id").is_none());
		assert!(store.items_array().is_empty());
	}

	#[test]
	fn confirm_commits_draft() {
		let store = ItemStore::new();
		let op = store.add("some-id", custom_item("some-id", false));
		op.confirm().unwrap();
		assert_eq!(*store.items(), *op.items_draft);
		assert_eq!(
			store.get("some-id").as_deref(),
			Some(&custom_item("some-id", false))
		);
	}
}

mod update {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn merges_partial_props() {
		let store = two_item_store();
		let op = store.update("some-id", [CustomItemField::IsMyItem(true)]);

		assert_eq!(
			op.patches[0].path.as_slice(),
			&[PathSegment::from("some-id"), PathSegment::from("is_my_item")]
		);
		assert!(!store.get("some-id").unwrap().is_my_item);

		op.confirm().unwrap();
		let item = store.get("some-id").unwrap();
		assert!(item.is_my_item);
		assert_eq!(item.name, "some name");
		assert_eq!(item.nested.foo, "bar");
	}

	#[test]
	fn replaces_nested_value_wholesale() {
		let store = two_item_store();
		let nested = Nested {
			foo: "new".into(),
			boo: "far".into(),
		};
		store
			.update("some-id", [CustomItemField::Nested(nested.clone())])
			.confirm()
			.unwrap();

		assert_eq!(store.get("some-id").unwrap().nested, nested);
	}

	#[test]
	fn untouched_records_are_shared() {
		let store = two_item_store();
		let before = store.items();
		store
			.update("some-id", [CustomItemField::Name("renamed".into())])
			.confirm()
			.unwrap();

		let after = store.items();
		assert!(after.shares(&before, "some-id-2"));
		assert!(!after.shares(&before, "some-id"));
	}
}

mod remove {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn removes_after_confirm() {
		let store = two_item_store();
		let op = store.remove("some-id");
		assert_eq!(store.len(), 2);
		assert_eq!(op.items_draft.len(), 1);

		op.confirm().unwrap();
		assert_eq!(
			store.items_array(),
			vec![Arc::new(custom_item("some-id-2", false))]
		);
	}

	#[test]
	fn undo_reappends_record() {
		let store = two_item_store();
		let op = store.remove("some-id");
		op.confirm().unwrap();
		store.apply_patches(&op.inverse_patches).unwrap();

		let ids: Vec<String> = store.items_array().iter().map(|i| i.id.clone()).collect();
		assert_eq!(ids, vec!["some-id-2", "some-id"]);
	}
}

mod batch_update {
	use pretty_assertions::assert_eq;

	use super::*;

	fn updates() -> Vec<BatchUpdate<CustomItem>> {
		vec![
			BatchUpdate::new("some-id", [CustomItemField::IsMyItem(true)]),
			BatchUpdate::new("some-id-2", [CustomItemField::Name("some name 3".into())]),
		]
	}

	#[test]
	fn produces_combined_draft() {
		let store = two_item_store();
		let op = store.batch_update(updates());

		assert_eq!(op.patches.len(), 2);
		assert_eq!(op.inverse_patches.len(), 2);
		assert!(op.items_draft.get("some-id").unwrap().is_my_item);
		assert_eq!(op.items_draft.get("some-id-2").unwrap().name, "some name 3");
	}

	#[test]
	fn leaves_store_untouched_without_confirm() {
		let store = two_item_store();
		let _op = store.batch_update(updates());
		assert!(!store.get("some-id").unwrap().is_my_item);
		assert_eq!(store.get("some-id-2").unwrap().name, "some name");
	}

	#[test]
	fn confirm_commits_both() {
		let store = two_item_store();
		let op = store.batch_update(updates());
		op.confirm().unwrap();

		let first = custom_item("some-id", true);
		let mut second = custom_item("some-id-2", false);
		second.name = "some name 3".into();
		assert_eq!(store.items_array(), vec![Arc::new(first), Arc::new(second)]);
	}
}

#[test]
fn items_array_in_insertion_order() {
	let store = two_item_store();
	assert_eq!(
		store.items_array(),
		vec![
			Arc::new(custom_item("some-id", false)),
			Arc::new(custom_item("some-id-2", false)),
		]
	);
}

#[test]
fn concurrent_confirms_do_not_lose_updates() {
	let store: ItemStore<CustomItem> = ItemStore::new();
	std::thread::scope(|scope| {
		for t in 0..4 {
			let store = &store;
			scope.spawn(move || {
				for i in 0..25 {
					let id = format!("{t}-{i}");
					store.add(id.as_str(), custom_item(&id, false)).confirm().unwrap();
				}
			});
		}
	});
	assert_eq!(store.len(), 100);
}
