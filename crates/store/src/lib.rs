//! Keyed collection store with draft-then-confirm mutations.
//!
//! [`ItemStore`] owns the authoritative snapshot of a string-keyed collection.
//! Every mutation (`add`, `update`, `remove`, `batch_update`) only computes a
//! draft: it returns an [`OpResult`] holding the prospective snapshot, the
//! forward patch set and its inverse. Nothing changes until
//! [`OpResult::confirm`] replays the forward patches against whatever is
//! authoritative at that moment. Replaying the inverse patches through
//! [`ItemStore::apply_patches`] undoes a confirmed change.
//!
//! ```
//! use keyed_store::{ItemStore, record};
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Todo {
//!         pub id: String,
//!         pub done: bool,
//!     }
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum TodoField;
//! }
//!
//! let store = ItemStore::new();
//! let op = store.add("a", Todo { id: "a".into(), done: false });
//! assert!(store.get("a").is_none());
//! op.confirm()?;
//! assert!(!store.get("a").unwrap().done);
//!
//! let op = store.update("a", [TodoField::Done(true)]);
//! op.confirm()?;
//! assert!(store.get("a").unwrap().done);
//!
//! store.apply_patches(&op.inverse_patches)?;
//! assert!(!store.get("a").unwrap().done);
//! # Ok::<(), keyed_store::PatchError>(())
//! ```

mod store;

pub use keyed_patch::{
	FieldSerde, Items, Patch, PatchError, PatchOp, PatchPath, PatchSet, PatchValue, PathSegment,
	Record, record,
};
pub use store::{BatchUpdate, ItemStore, OpResult};
