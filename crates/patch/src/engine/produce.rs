use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::items::{ItemMap, Items};
use crate::patch::{Patch, PatchSet};
use crate::record::Record;

/// Result of [`produce_with_patches`].
#[derive(Debug, Clone)]
pub struct Produced<T: Record> {
	/// The next snapshot. Pointer-equal to the base when nothing changed.
	pub items: Arc<Items<T>>,
	/// Edits turning the base into `items`.
	pub patches: PatchSet<T>,
	/// Edits turning `items` back into the base.
	pub inverse_patches: PatchSet<T>,
}

/// How a key was touched while drafting.
#[derive(Debug)]
enum Touch {
	/// The whole entry was inserted, overwritten or removed.
	Assigned,
	/// Only these fields were merged into an existing record.
	Merged(Vec<&'static str>),
}

/// Mutable view over a snapshot that records which entries change.
///
/// The base map is copied on the first write and a record is cloned only when
/// a merge first touches it, so every untouched record stays shared with the
/// base.
pub struct ItemsDraft<'b, T: Record> {
	base: &'b Items<T>,
	copy: Option<ItemMap<T>>,
	touched: IndexMap<Arc<str>, Touch, FxBuildHasher>,
}

impl<'b, T: Record> ItemsDraft<'b, T> {
	fn new(base: &'b Items<T>) -> Self {
		Self {
			base,
			copy: None,
			touched: IndexMap::default(),
		}
	}

	fn current(&self) -> &ItemMap<T> {
		self.copy.as_ref().unwrap_or_else(|| self.base.map())
	}

	fn copy_mut(&mut self) -> &mut ItemMap<T> {
		let base = self.base;
		self.copy.get_or_insert_with(|| base.map().clone())
	}

	/// Returns the drafted record under `id`.
	pub fn get(&self, id: &str) -> Option<&Arc<T>> {
		self.current().get(id)
	}

	/// Returns true if the draft holds a record under `id`.
	pub fn contains_key(&self, id: &str) -> bool {
		self.current().contains_key(id)
	}

	/// Returns the number of drafted records.
	pub fn len(&self) -> usize {
		self.current().len()
	}

	/// Returns true if the draft holds no records.
	pub fn is_empty(&self) -> bool {
		self.current().is_empty()
	}

	/// Inserts `item` under `id`, overwriting any existing record in place.
	pub fn insert(&mut self, id: impl Into<Arc<str>>, item: impl Into<Arc<T>>) {
		let id = id.into();
		self.touched.insert(Arc::clone(&id), Touch::Assigned);
		self.copy_mut().insert(id, item.into());
	}

	/// Removes the record under `id`, keeping the order of the others.
	///
	/// Removing an absent id records nothing.
	pub fn remove(&mut self, id: &str) -> Option<Arc<T>> {
		let key = Arc::clone(self.current().get_key_value(id)?.0);
		self.touched.insert(key, Touch::Assigned);
		self.copy_mut().shift_remove(id)
	}

	/// Shallow-merges `fields` into the record under `id`, in order.
	///
	/// Returns false and records nothing when `id` is absent.
	pub fn merge(&mut self, id: &str, fields: impl IntoIterator<Item = T::Field>) -> bool {
		let Some((key, _)) = self.current().get_key_value(id) else {
			return false;
		};
		let key = Arc::clone(key);

		let mut names = Vec::new();
		if let Some(slot) = self.copy_mut().get_mut(id) {
			let mut fields = fields.into_iter().peekable();
			if fields.peek().is_some() {
				let item = Arc::make_mut(slot);
				for field in fields {
					names.push(T::field_name(&field));
					item.set_field(field);
				}
			}
		}

		match self.touched.get_mut(id) {
			Some(Touch::Assigned) => {}
			Some(Touch::Merged(seen)) => {
				for name in names {
					if !seen.contains(&name) {
						seen.push(name);
					}
				}
			}
			None => {
				let mut seen: Vec<&'static str> = Vec::with_capacity(names.len());
				for name in names {
					if !seen.contains(&name) {
						seen.push(name);
					}
				}
				self.touched.insert(key, Touch::Merged(seen));
			}
		}
		true
	}

	/// Diffs the draft against its base.
	///
	/// Returns the finished map, or `None` when nothing was written.
	fn finish(self) -> (Option<ItemMap<T>>, PatchSet<T>, PatchSet<T>) {
		let mut patches = Vec::new();
		let mut inverse = Vec::new();
		let Some(mut map) = self.copy else {
			return (None, patches, inverse);
		};

		for (key, touch) in self.touched {
			let before = self.base.get(&key);
			match touch {
				Touch::Assigned => match (before, map.get(&*key)) {
					(None, None) => {}
					(None, Some(new)) => {
						patches.push(Patch::add_item(&key, Arc::clone(new)));
						inverse.push(Patch::remove_item(&key));
					}
					(Some(old), None) => {
						patches.push(Patch::remove_item(&key));
						inverse.push(Patch::add_item(&key, Arc::clone(old)));
					}
					(Some(old), Some(new)) => {
						if !Arc::ptr_eq(old, new) {
							patches.push(Patch::replace_item(&key, Arc::clone(new)));
							inverse.push(Patch::replace_item(&key, Arc::clone(old)));
						}
					}
				},
				Touch::Merged(names) => {
					let (Some(old), Some(new)) = (before, map.get(&*key).map(Arc::clone)) else {
						continue;
					};
					let mut forward = Vec::with_capacity(names.len());
					let mut backward = Vec::with_capacity(names.len());
					let mut readable = true;
					for name in names {
						match (old.field(name), new.field(name)) {
							(Some(old_field), Some(new_field)) => {
								if old_field != new_field {
									forward.push(Patch::replace_field(&key, new_field));
									backward.push(Patch::replace_field(&key, old_field));
								}
							}
							_ => {
								readable = false;
								break;
							}
						}
					}

					if !readable {
						if **old != *new {
							patches.push(Patch::replace_item(&key, new));
							inverse.push(Patch::replace_item(&key, Arc::clone(old)));
							continue;
						}
					} else if !forward.is_empty() {
						patches.append(&mut forward);
						inverse.append(&mut backward);
						continue;
					}
					if let Some(slot) = map.get_mut(&*key) {
						// Merged back to the original values; keep sharing the base record.
						*slot = Arc::clone(old);
					}
				}
			}
		}

		(Some(map), patches, inverse)
	}
}

/// Runs `recipe` against a draft of `base` and returns the next snapshot with
/// its forward and inverse patch sets.
///
/// `base` is never modified. When the recipe leaves no net change, the
/// returned snapshot is `base` itself and both patch sets are empty.
pub fn produce_with_patches<T, F>(base: &Arc<Items<T>>, recipe: F) -> Produced<T>
where
	T: Record,
	F: FnOnce(&mut ItemsDraft<'_, T>),
{
	let mut draft = ItemsDraft::new(base);
	recipe(&mut draft);

	let (map, patches, inverse_patches) = draft.finish();
	let items = match map {
		Some(map) if !patches.is_empty() => Arc::new(Items::from_map(map)),
		_ => Arc::clone(base),
	};

	tracing::trace!(
		patches = patches.len(),
		inverse_patches = inverse_patches.len(),
		"produced draft"
	);

	Produced {
		items,
		patches,
		inverse_patches,
	}
}
