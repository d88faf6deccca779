use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use keyed_patch::{
	Items, ItemsDraft, Patch, PatchError, PatchSet, Produced, Record, apply_patches,
	produce_with_patches,
};


/// One entry of [`ItemStore::batch_update`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUpdate<T: Record> {
	/// Id of the record to merge into.
	pub id: String,
	/// Fields to assign, in order.
	pub item_props: Vec<T::Field>,
}

impl<T: Record> BatchUpdate<T> {
	/// Creates an update merging `item_props` into the record under `id`.
	///
	/// ```
	/// use keyed_store::{BatchUpdate, ItemStore, record};
	///
	/// record! {
	///     #[derive(Debug, Clone, PartialEq)]
	///     pub struct Todo {
	///         pub done: bool,
	///     }
	///     #[derive(Debug, Clone, PartialEq)]
	///     pub enum TodoField;
	/// }
	///
	/// let store = ItemStore::with_items([("a", Todo { done: false })]);
	/// let update: BatchUpdate<Todo> = BatchUpdate::new("a", [TodoField::Done(true)]);
	/// assert_eq!(update.id, "a");
	/// store.batch_update([update]).confirm()?;
	/// assert!(store.get("a").unwrap().done);
	/// # Ok::<(), keyed_store::PatchError>(())
	/// ```
	pub fn new(id: impl Into<String>, item_props: impl IntoIterator<Item = T::Field>) -> Self {
		Self {
			id: id.into(),
			item_props: item_props.into_iter().collect(),
		}
	}
}

/// Outcome of a mutation intent: a draft that is not yet authoritative.
///
/// The patch sets were computed against the snapshot that was authoritative
/// when the intent was made. [`confirm`](Self::confirm) replays the forward
/// patches against the snapshot that is authoritative when it is called; there
/// is no staleness check.
#[must_use = "a draft changes nothing until it is confirmed"]
pub struct OpResult<'s, T: Record> {
	store: &'s ItemStore<T>,
	/// Prospective snapshot.
	pub items_draft: Arc<Items<T>>,
	/// Edits from the base snapshot to the draft.
	pub patches: PatchSet<T>,
	/// Edits from the draft back to the base snapshot.
	pub inverse_patches: PatchSet<T>,
}

impl<'s, T: Record> OpResult<'s, T> {
	fn new(store: &'s ItemStore<T>, produced: Produced<T>) -> Self {
		Self {
			store,
			items_draft: produced.items,
			patches: produced.patches,
			inverse_patches: produced.inverse_patches,
		}
	}

	/// Commits the captured patches to the store and returns the new
	/// authoritative snapshot.
	///
	/// Calling it again replays the same patches again.
	pub fn confirm(&self) -> Result<Arc<Items<T>>, PatchError> {
		self.store.apply_patches(&self.patches)
	}

	/// Detaches the draft and patch sets from the store.
	pub fn into_parts(self) -> (Arc<Items<T>>, PatchSet<T>, PatchSet<T>) {
		(self.items_draft, self.patches, self.inverse_patches)
	}
}

impl<T: Record> fmt::Debug for OpResult<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OpResult")
			.field("items_draft", &self.items_draft)
			.field("patches", &self.patches)
			.field("inverse_patches", &self.inverse_patches)
			.finish_non_exhaustive()
	}
}

/// Authoritative keyed collection with draft-then-confirm mutations.
///
/// The current snapshot is swapped wholesale on every commit, so a snapshot
/// obtained from [`items`](Self::items) never changes underneath its holder.
pub struct ItemStore<T: Record> {
	items: ArcSwap<Items<T>>,
}

impl<T: Record> ItemStore<T> {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self {
			items: ArcSwap::from_pointee(Items::new()),
		}
	}

	/// Creates a store already holding `items`, as if each pair had been added
	/// and confirmed in order.
	pub fn with_items<I, K>(items: I) -> Self
	where
		I: IntoIterator<Item = (K, T)>,
		K: Into<Arc<str>>,
	{
		let empty = Arc::new(Items::new());
		let produced = produce_with_patches(&empty, |draft| {
			for (id, item) in items {
				draft.insert(id, item);
			}
		});
		Self {
			items: ArcSwap::new(produced.items),
		}
	}

	/// Returns the current authoritative snapshot.
	pub fn items(&self) -> Arc<Items<T>> {
		self.items.load_full()
	}

	/// Returns the record stored under `id`.
	pub fn get(&self, id: &str) -> Option<Arc<T>> {
		self.items.load().get(id).cloned()
	}

	/// Returns the current records in insertion order.
	pub fn items_array(&self) -> Vec<Arc<T>> {
		self.items.load().to_vec()
	}

	/// Returns true if a record is stored under `id`.
	pub fn contains(&self, id: &str) -> bool {
		self.items.load().contains_key(id)
	}

	/// Returns the number of records.
	pub fn len(&self) -> usize {
		self.items.load().len()
	}

	/// Returns true if the store holds no records.
	pub fn is_empty(&self) -> bool {
		self.items.load().is_empty()
	}

	fn draft<F>(&self, recipe: F) -> OpResult<'_, T>
	where
		F: FnOnce(&mut ItemsDraft<'_, T>),
	{
		let base = self.items.load_full();
		OpResult::new(self, produce_with_patches(&base, recipe))
	}

	/// Drafts storing `item` under `id`, overwriting any existing record.
	pub fn add(&self, id: impl Into<Arc<str>>, item: T) -> OpResult<'_, T> {
		let id = id.into();
		self.draft(move |draft| draft.insert(id, item))
	}

	/// Drafts merging `item_props` into the record under `id`.
	///
	/// An absent id yields the current snapshot and empty patch sets.
	pub fn update(
		&self,
		id: &str,
		item_props: impl IntoIterator<Item = T::Field>,
	) -> OpResult<'_, T> {
		self.draft(|draft| {
			draft.merge(id, item_props);
		})
	}

	/// Drafts removing the record under `id`.
	///
	/// An absent id yields the current snapshot and empty patch sets.
	pub fn remove(&self, id: &str) -> OpResult<'_, T> {
		self.draft(|draft| {
			draft.remove(id);
		})
	}

	/// Drafts several merges as one combined change.
	///
	/// Updates are merged in order, so later entries win on overlapping
	/// fields. Absent ids are skipped.
	pub fn batch_update(
		&self,
		updates: impl IntoIterator<Item = BatchUpdate<T>>,
	) -> OpResult<'_, T> {
		self.draft(|draft| {
			for BatchUpdate { id, item_props } in updates {
				draft.merge(&id, item_props);
			}
		})
	}

	/// Replays `patches` against the current snapshot, makes the result
	/// authoritative and returns it.
	///
	/// This is what [`OpResult::confirm`] calls; pass an inverse patch set to
	/// undo a confirmed change. On error the store is left unchanged.
	pub fn apply_patches(&self, patches: &[Patch<T>]) -> Result<Arc<Items<T>>, PatchError> {
		if patches.is_empty() {
			return Ok(self.items.load_full());
		}

		loop {
			let cur = self.items.load_full();
			let next = match apply_patches(&cur, patches) {
				Ok(next) => Arc::new(next),
				Err(err) => {
					tracing::debug!(patches = patches.len(), error = %err, "patch replay rejected");
					return Err(err);
				}
			};

			let prev = self.items.compare_and_swap(&cur, Arc::clone(&next));
			if Arc::ptr_eq(&prev, &cur) {
				tracing::debug!(patches = patches.len(), items = next.len(), "committed patches");
				return Ok(next);
			}
			tracing::trace!("snapshot changed during replay, retrying");
		}
	}
}

impl<T: Record> Default for ItemStore<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Record> fmt::Debug for ItemStore<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ItemStore")
			.field("items", &**self.items.load())
			.finish()
	}
}
