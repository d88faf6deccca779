//! Structural-sharing keyed collections with patch generation.
//!
//! An [`Items`] value is an immutable, insertion-ordered snapshot of
//! string-keyed records. New versions are produced with
//! [`produce_with_patches`], which runs a recipe against a recording
//! [`ItemsDraft`] and returns the next snapshot together with a forward
//! [`PatchSet`] and its inverse. [`apply_patches`] replays a patch set against
//! any snapshot, which is how drafts are committed and how undo/redo works.
//!
//! Unchanged records are shared between versions through [`Arc`]. Snapshots
//! only hand out shared references, so a returned collection cannot be edited
//! in place:
//!
//! ```compile_fail
//! use keyed_patch::{Items, record};
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Counter {
//!         pub v: u32,
//!     }
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum CounterField;
//! }
//!
//! let items: Items<Counter> = Items::new();
//! let item = items.get("a").unwrap();
//! item.v = 2;
//! ```
//!
//! Nor can keys be inserted or removed outside of a draft:
//!
//! ```compile_fail
//! use std::sync::Arc;
//! use keyed_patch::{Items, record};
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Counter {
//!         pub v: u32,
//!     }
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum CounterField;
//! }
//!
//! let items: Arc<Items<Counter>> = Arc::new(Items::new());
//! items.insert("a", Counter { v: 1 });
//! ```
//!
//! [`Arc`]: std::sync::Arc

/// Patch production and replay.
pub mod engine;
/// Errors raised while replaying patches.
pub mod error;
/// Immutable keyed snapshots.
pub mod items;
/// Patch records and their path/value types.
pub mod patch;
/// Field-addressable record trait and the [`record!`] macro.
pub mod record;

#[doc(hidden)]
pub use paste as __paste;
#[doc(hidden)]
pub use serde as __serde;

pub use engine::{ItemsDraft, Produced, apply_patches, produce_with_patches};
pub use error::PatchError;
pub use items::Items;
pub use patch::{Patch, PatchOp, PatchPath, PatchSet, PatchValue, PathSegment};
pub use record::{FieldSerde, Record};
