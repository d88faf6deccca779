use std::sync::Arc;

use crate::error::PatchError;
use crate::items::{ItemMap, Items};
use crate::patch::{Patch, PatchOp, PatchValue, PathSegment, display_path};
use crate::record::Record;

/// Replays `patches` in order against `base` and returns the resulting
/// snapshot.
///
/// - `add`/`replace` at `[id]` stores the carried record, keeping the
///   position of an existing id.
/// - `remove` at `[id]` deletes the record; an absent id is a no-op.
/// - `add`/`replace` at `[id, field]` assigns the carried field on a copy of
///   the record; the record must exist.
/// - `remove` at `[id, field]` is rejected, record fields cannot be deleted.
///
/// Any other path fails to resolve. On error nothing is applied.
pub fn apply_patches<T: Record>(
	base: &Items<T>,
	patches: &[Patch<T>],
) -> Result<Items<T>, PatchError> {
	if patches.is_empty() {
		return Ok(base.clone());
	}

	let mut map = base.map().clone();
	for patch in patches {
		apply_one(&mut map, patch)?;
	}
	tracing::trace!(patches = patches.len(), "replayed patches");
	Ok(Items::from_map(map))
}

fn apply_one<T: Record>(map: &mut ItemMap<T>, patch: &Patch<T>) -> Result<(), PatchError> {
	match patch.path.as_slice() {
		[PathSegment::Key(id)] => apply_item(map, id, patch),
		[PathSegment::Key(id), PathSegment::Key(name)] => apply_field(map, id, name, patch),
		_ => Err(unresolved(patch)),
	}
}

fn apply_item<T: Record>(
	map: &mut ItemMap<T>,
	id: &str,
	patch: &Patch<T>,
) -> Result<(), PatchError> {
	match patch.op {
		PatchOp::Add | PatchOp::Replace => {
			let item = match &patch.value {
				Some(PatchValue::Item(item)) => Arc::clone(item),
				Some(PatchValue::Field(_)) => return Err(mismatch(patch, "expected a record")),
				None => return Err(mismatch(patch, "missing value")),
			};
			match map.get_mut(id) {
				Some(slot) => *slot = item,
				None => {
					map.insert(Arc::from(id), item);
				}
			}
		}
		PatchOp::Remove => {
			map.shift_remove(id);
		}
	}
	Ok(())
}

fn apply_field<T: Record>(
	map: &mut ItemMap<T>,
	id: &str,
	name: &str,
	patch: &Patch<T>,
) -> Result<(), PatchError> {
	if patch.op == PatchOp::Remove {
		return Err(PatchError::UnsupportedOperation {
			op: patch.op,
			path: display_path(&patch.path),
		});
	}

	let field = match &patch.value {
		Some(PatchValue::Field(field)) => field,
		Some(PatchValue::Item(_)) => return Err(mismatch(patch, "expected a field")),
		None => return Err(mismatch(patch, "missing value")),
	};
	if T::field_name(field) != name {
		return Err(mismatch(patch, "field name differs from path"));
	}

	let slot = map.get_mut(id).ok_or_else(|| unresolved(patch))?;
	Arc::make_mut(slot).set_field(field.clone());
	Ok(())
}

fn unresolved<T: Record>(patch: &Patch<T>) -> PatchError {
	PatchError::UnresolvedPath {
		path: display_path(&patch.path),
	}
}

fn mismatch<T: Record>(patch: &Patch<T>, reason: &'static str) -> PatchError {
	PatchError::ValueMismatch {
		path: display_path(&patch.path),
		reason,
	}
}
