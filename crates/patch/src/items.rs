use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Backing map for a snapshot.
pub(crate) type ItemMap<T> = IndexMap<Arc<str>, Arc<T>, FxBuildHasher>;

/// An immutable, insertion-ordered snapshot of string-keyed records.
///
/// Cloning a snapshot copies key and item pointers only; the records
/// themselves are shared with every version that did not change them. The
/// public API exposes shared references only, so a snapshot never changes
/// once constructed. New versions come from
/// [`produce_with_patches`](crate::produce_with_patches) or
/// [`apply_patches`](crate::apply_patches).
///
/// Equality compares key sets and record values and ignores order.
#[derive(Clone)]
pub struct Items<T> {
	map: ItemMap<T>,
}

impl<T> Items<T> {
	/// Creates an empty snapshot.
	pub fn new() -> Self {
		Self {
			map: IndexMap::default(),
		}
	}

	/// Creates an empty snapshot with room for `capacity` records.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			map: IndexMap::with_capacity_and_hasher(capacity, FxBuildHasher),
		}
	}

	pub(crate) fn from_map(map: ItemMap<T>) -> Self {
		Self { map }
	}

	pub(crate) fn map(&self) -> &ItemMap<T> {
		&self.map
	}

	/// Returns the record stored under `id`.
	#[inline]
	pub fn get(&self, id: &str) -> Option<&Arc<T>> {
		self.map.get(id)
	}

	/// Returns true if a record is stored under `id`.
	#[inline]
	pub fn contains_key(&self, id: &str) -> bool {
		self.map.contains_key(id)
	}

	/// Returns the number of records.
	pub fn len(&self) -> usize {
		self.map.len()
	}

	/// Returns true if the snapshot holds no records.
	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}

	/// Iterates `(id, record)` pairs in insertion order.
	pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Arc<T>)> {
		self.map.iter().map(|(k, v)| (&**k, v))
	}

	/// Iterates ids in insertion order.
	pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
		self.map.keys().map(|k| &**k)
	}

	/// Iterates records in insertion order.
	pub fn values(&self) -> impl ExactSizeIterator<Item = &Arc<T>> {
		self.map.values()
	}

	/// Collects the records into a vector in insertion order.
	pub fn to_vec(&self) -> Vec<Arc<T>> {
		self.map.values().cloned().collect()
	}

	/// Returns true if both snapshots store the very same record under `id`.
	///
	/// Used to observe structural sharing between versions.
	pub fn shares(&self, other: &Self, id: &str) -> bool {
		match (self.map.get(id), other.map.get(id)) {
			(Some(a), Some(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl<T> Default for Items<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: PartialEq> PartialEq for Items<T> {
	fn eq(&self, other: &Self) -> bool {
		self.map == other.map
	}
}

impl<T: Eq> Eq for Items<T> {}

impl<T: fmt::Debug> fmt::Debug for Items<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.map.iter()).finish()
	}
}
