//! Draft production and patch replay.
//!
//! [`produce_with_patches`] runs a recipe against an [`ItemsDraft`] and diffs
//! the final draft against its base to build the forward and inverse patch
//! sets. [`apply_patches`] is the replay counterpart, used both to commit a
//! draft and to undo one with its inverse patches.

mod apply;
mod produce;


pub use apply::apply_patches;
pub use produce::{ItemsDraft, Produced, produce_with_patches};
