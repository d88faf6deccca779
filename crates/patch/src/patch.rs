use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::record::{FieldSerde, Record};

/// Kind of edit a [`Patch`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
	/// Create the value at the path.
	Add,
	/// Overwrite the value at the path.
	Replace,
	/// Delete the value at the path.
	Remove,
}

impl fmt::Display for PatchOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Add => "add",
			Self::Replace => "replace",
			Self::Remove => "remove",
		})
	}
}

/// One step of a patch path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
	/// A map key or field name.
	Key(Box<str>),
	/// A sequence index.
	Index(usize),
}

impl From<&str> for PathSegment {
	fn from(key: &str) -> Self {
		Self::Key(key.into())
	}
}

impl From<usize> for PathSegment {
	fn from(index: usize) -> Self {
		Self::Index(index)
	}
}

impl fmt::Display for PathSegment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Key(key) => write!(f, "{key:?}"),
			Self::Index(index) => write!(f, "{index}"),
		}
	}
}

/// Location of an edit: `[id]` for whole records, `[id, field]` for fields.
pub type PatchPath = SmallVec<[PathSegment; 2]>;

/// Value carried by `add` and `replace` patches.
///
/// Serializes as the bare record or the bare field value. Which of the two a
/// serialized value is follows from the patch path, so it is only
/// deserialized as part of a [`Patch`].
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue<T: Record> {
	/// A whole record, for `[id]` paths.
	Item(Arc<T>),
	/// A single field assignment, for `[id, field]` paths.
	Field(T::Field),
}

/// A single recorded edit.
///
/// Serialized as `{"operation", "path", "value"?}`; `value` is left out when
/// absent and must follow `path` when deserializing.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch<T: Record> {
	/// Kind of edit.
	pub op: PatchOp,
	/// Edit site.
	pub path: PatchPath,
	/// New value, present for `add` and `replace`.
	pub value: Option<PatchValue<T>>,
}

/// Ordered list of patches. Order is significant on replay.
pub type PatchSet<T> = Vec<Patch<T>>;

impl<T: Record> Patch<T> {
	/// `add [id] item`.
	pub fn add_item(id: &str, item: Arc<T>) -> Self {
		Self {
			op: PatchOp::Add,
			path: item_path(id),
			value: Some(PatchValue::Item(item)),
		}
	}

	/// `replace [id] item`.
	pub fn replace_item(id: &str, item: Arc<T>) -> Self {
		Self {
			op: PatchOp::Replace,
			path: item_path(id),
			value: Some(PatchValue::Item(item)),
		}
	}

	/// `remove [id]`.
	pub fn remove_item(id: &str) -> Self {
		Self {
			op: PatchOp::Remove,
			path: item_path(id),
			value: None,
		}
	}

	/// `replace [id, field] value`.
	pub fn replace_field(id: &str, field: T::Field) -> Self {
		let mut path = item_path(id);
		path.push(T::field_name(&field).into());
		Self {
			op: PatchOp::Replace,
			path,
			value: Some(PatchValue::Field(field)),
		}
	}
}

fn item_path(id: &str) -> PatchPath {
	let mut path = PatchPath::new();
	path.push(id.into());
	path
}

/// Renders a path as `[seg, seg]` for error messages.
pub(crate) fn display_path(path: &[PathSegment]) -> String {
	let parts: Vec<String> = path.iter().map(ToString::to_string).collect();
	format!("[{}]", parts.join(", "))
}

impl<T: Serialize + FieldSerde> Serialize for PatchValue<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Item(item) => Serialize::serialize(&**item, serializer),
			Self::Field(field) => T::serialize_field(field, serializer),
		}
	}
}

impl<T: Serialize + FieldSerde> Serialize for Patch<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let len = if self.value.is_some() { 3 } else { 2 };
		let mut state = serializer.serialize_struct("Patch", len)?;
		state.serialize_field("operation", &self.op)?;
		state.serialize_field("path", &self.path)?;
		match &self.value {
			Some(value) => state.serialize_field("value", value)?,
			None => state.skip_field("value")?,
		}
		state.end()
	}
}

const PATCH_FIELDS: &[&str] = &["operation", "path", "value"];

#[derive(Deserialize)]
#[serde(field_identifier, rename_all = "lowercase")]
enum PatchKey {
	Operation,
	Path,
	Value,
	#[serde(other)]
	Other,
}

/// Deserializes a value in the shape its path calls for.
struct ValueSeed<'p, T> {
	path: &'p [PathSegment],
	marker: PhantomData<T>,
}

impl<'de, T> DeserializeSeed<'de> for ValueSeed<'_, T>
where
	T: Deserialize<'de> + FieldSerde,
{
	type Value = PatchValue<T>;

	fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
		match self.path {
			[PathSegment::Key(_)] => {
				T::deserialize(deserializer).map(|item| PatchValue::Item(Arc::new(item)))
			}
			[PathSegment::Key(_), PathSegment::Key(name)] => {
				T::deserialize_field(name, deserializer).map(PatchValue::Field)
			}
			path => Err(de::Error::custom(format_args!(
				"path {} cannot carry a value",
				display_path(path)
			))),
		}
	}
}

struct PatchVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for PatchVisitor<T>
where
	T: Deserialize<'de> + FieldSerde,
{
	type Value = Patch<T>;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a patch with operation, path and optional value")
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Patch<T>, A::Error> {
		let op = seq
			.next_element()?
			.ok_or_else(|| de::Error::invalid_length(0, &self))?;
		let path: PatchPath = seq
			.next_element()?
			.ok_or_else(|| de::Error::invalid_length(1, &self))?;
		let value = seq.next_element_seed(ValueSeed {
			path: &path,
			marker: PhantomData,
		})?;
		Ok(Patch { op, path, value })
	}

	fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Patch<T>, A::Error> {
		let mut op: Option<PatchOp> = None;
		let mut path: Option<PatchPath> = None;
		let mut value = None;
		while let Some(key) = map.next_key()? {
			match key {
				PatchKey::Operation => {
					if op.is_some() {
						return Err(de::Error::duplicate_field("operation"));
					}
					op = Some(map.next_value()?);
				}
				PatchKey::Path => {
					if path.is_some() {
						return Err(de::Error::duplicate_field("path"));
					}
					path = Some(map.next_value()?);
				}
				PatchKey::Value => {
					if value.is_some() {
						return Err(de::Error::duplicate_field("value"));
					}
					let Some(path) = path.as_deref() else {
						return Err(de::Error::custom("`value` must come after `path`"));
					};
					value = Some(map.next_value_seed(ValueSeed {
						path,
						marker: PhantomData,
					})?);
				}
				PatchKey::Other => {
					map.next_value::<IgnoredAny>()?;
				}
			}
		}
		Ok(Patch {
			op: op.ok_or_else(|| de::Error::missing_field("operation"))?,
			path: path.ok_or_else(|| de::Error::missing_field("path"))?,
			value,
		})
	}
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
	T: Deserialize<'de> + FieldSerde,
{
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_struct("Patch", PATCH_FIELDS, PatchVisitor(PhantomData))
	}
}
