use thiserror::Error;

use crate::patch::PatchOp;

/// Errors raised while replaying a patch set.
///
/// Replay is all-or-nothing: when any patch fails, the base snapshot is left
/// as it was and no new snapshot is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
	/// The path does not address a record or a field of an existing record.
	#[error("cannot apply patch, path {path} does not resolve")]
	UnresolvedPath {
		/// Rendered path of the failing patch.
		path: String,
	},
	/// The patch value does not fit the path it targets.
	#[error("patch value does not match path {path}: {reason}")]
	ValueMismatch {
		/// Rendered path of the failing patch.
		path: String,
		/// What was wrong with the value.
		reason: &'static str,
	},
	/// The operation is not supported at this path.
	#[error("unsupported patch operation {op} at {path}")]
	UnsupportedOperation {
		/// The rejected operation.
		op: PatchOp,
		/// Rendered path of the failing patch.
		path: String,
	},
}
