use std::fmt;

use serde::{Deserializer, Serializer};

/// A record whose fields can be read and assigned one at a time.
///
/// Partial updates are expressed as a sequence of [`Record::Field`] values,
/// each carrying a field name and its new value. The engine uses this to
/// merge partial updates shallowly and to emit field-level patches.
///
/// Implement it by hand or generate it with [`record!`](crate::record!).
pub trait Record: Clone + PartialEq + fmt::Debug {
	/// A single field assignment.
	type Field: Clone + PartialEq + fmt::Debug;

	/// Returns the name of the field `field` assigns.
	fn field_name(field: &Self::Field) -> &'static str;

	/// Returns the current value of the field called `name`.
	///
	/// Must return `Some` for every name [`Record::field_name`] can produce.
	/// Draft merges diff field values through this method. When it returns
	/// `None` for a merged field, the merge is recorded as a whole-record
	/// `replace` instead of field patches.
	fn field(&self, name: &str) -> Option<Self::Field>;

	/// Assigns `field`, returning the previous value of the same field.
	fn set_field(&mut self, field: Self::Field) -> Self::Field;
}

/// Serde support for single field values of a [`Record`].
///
/// A field patch carries the bare value of one field; the field itself is
/// named by the last segment of the patch path. Generated by
/// [`record!`](crate::record!) when its input ends with `impl serde;`.
///
/// ```
/// use keyed_patch::{Patch, record};
///
/// record! {
///     #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
///     pub struct Counter {
///         pub v: u32,
///     }
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum CounterField;
///     impl serde;
/// }
///
/// let patch = Patch::<Counter>::replace_field("a", CounterField::V(2));
/// let json = serde_json::to_string(&patch).unwrap();
/// assert_eq!(json, r#"{"operation":"replace","path":["a","v"],"value":2}"#);
/// assert_eq!(serde_json::from_str::<Patch<Counter>>(&json).unwrap(), patch);
/// ```
pub trait FieldSerde: Record {
	/// Serializes the value `field` carries, without its name.
	fn serialize_field<S>(field: &Self::Field, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer;

	/// Deserializes the value of the field called `name`.
	fn deserialize_field<'de, D>(name: &str, deserializer: D) -> Result<Self::Field, D::Error>
	where
		D: Deserializer<'de>;
}

/// Declares a struct together with its field enum and [`Record`] impl.
///
/// The field enum gets one variant per struct field, named in UpperCamelCase
/// and holding the field's type. Attributes written above the struct and above
/// the enum are applied to each. Ending the input with `impl serde;` also
/// implements [`FieldSerde`], which patch (de)serialization needs; every field
/// type must then implement serde's traits.
///
/// ```
/// use keyed_patch::{Record, record};
///
/// record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Client {
///         pub id: String,
///         pub is_my_item: bool,
///     }
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum ClientField;
/// }
///
/// let mut client = Client { id: "a".into(), is_my_item: false };
/// let old = client.set_field(ClientField::IsMyItem(true));
/// assert_eq!(old, ClientField::IsMyItem(false));
/// assert_eq!(Client::field_name(&old), "is_my_item");
/// assert_eq!(client.field("id"), Some(ClientField::Id("a".into())));
/// ```
#[macro_export]
macro_rules! record {
	(@serde $name:ident $field_enum:ident { $($field:ident : $ty:ty),* }) => {
		$crate::__paste::paste! {
			impl $crate::FieldSerde for $name {
				fn serialize_field<S>(
					field: &Self::Field,
					serializer: S,
				) -> ::std::result::Result<S::Ok, S::Error>
				where
					S: $crate::__serde::Serializer,
				{
					match field {
						$(
							$field_enum::[<$field:camel>](value) => {
								$crate::__serde::Serialize::serialize(value, serializer)
							}
						)*
					}
				}

				fn deserialize_field<'de, D>(
					name: &str,
					deserializer: D,
				) -> ::std::result::Result<Self::Field, D::Error>
				where
					D: $crate::__serde::Deserializer<'de>,
				{
					$(
						if name == stringify!($field) {
							return <$ty as $crate::__serde::Deserialize<'de>>::deserialize(deserializer)
								.map($field_enum::[<$field:camel>]);
						}
					)*
					::std::result::Result::Err(<D::Error as $crate::__serde::de::Error>::unknown_field(
						name,
						&[$(stringify!($field)),*],
					))
				}
			}
		}
	};
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident {
			$(
				$(#[$fmeta:meta])*
				$fvis:vis $field:ident : $ty:ty
			),* $(,)?
		}
		$(#[$emeta:meta])*
		$evis:vis enum $field_enum:ident;
		impl serde;
	) => {
		$crate::record! {
			$(#[$meta])*
			$vis struct $name {
				$(
					$(#[$fmeta])*
					$fvis $field: $ty,
				)*
			}
			$(#[$emeta])*
			$evis enum $field_enum;
		}
		$crate::record! { @serde $name $field_enum { $($field: $ty),* } }
	};
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident {
			$(
				$(#[$fmeta:meta])*
				$fvis:vis $field:ident : $ty:ty
			),* $(,)?
		}
		$(#[$emeta:meta])*
		$evis:vis enum $field_enum:ident;
	) => {
		$crate::__paste::paste! {
			$(#[$meta])*
			$vis struct $name {
				$(
					$(#[$fmeta])*
					$fvis $field: $ty,
				)*
			}

			$(#[$emeta])*
			$evis enum $field_enum {
				$(
					[<$field:camel>]($ty),
				)*
			}

			impl $crate::Record for $name {
				type Field = $field_enum;

				fn field_name(field: &Self::Field) -> &'static str {
					match field {
						$(
							$field_enum::[<$field:camel>](_) => stringify!($field),
						)*
					}
				}

				fn field(&self, name: &str) -> ::std::option::Option<Self::Field> {
					$(
						if name == stringify!($field) {
							return ::std::option::Option::Some(
								$field_enum::[<$field:camel>](::std::clone::Clone::clone(&self.$field)),
							);
						}
					)*
					::std::option::Option::None
				}

				fn set_field(&mut self, field: Self::Field) -> Self::Field {
					match field {
						$(
							$field_enum::[<$field:camel>](value) => {
								$field_enum::[<$field:camel>](::std::mem::replace(&mut self.$field, value))
							}
						)*
					}
				}
			}
		}
	};
}
