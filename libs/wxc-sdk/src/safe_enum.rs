//! Open enums for wire values.
//!
//! The API adds enum values over time. A `safe_enum!` type keeps the known
//! values as variants and carries anything else in `Unknown(String)`, so
//! deserialization never fails on a new value and serialization writes back
//! exactly what was received.
//!
//! ```
//! wxc_sdk::safe_enum! {
//!     /// Kind of phone number.
//!     pub enum NumberType {
//!         Work => "work",
//!         Mobile => "mobile",
//!     }
//! }
//!
//! let t: NumberType = serde_json::from_str("\"pager\"").unwrap();
//! assert_eq!(t, NumberType::Unknown("pager".into()));
//! assert_eq!(t.as_str(), "pager");
//! assert_eq!(NumberType::Work.as_str(), "work");
//! ```

/// Declares an open enum with an `Unknown(String)` fallback.
///
/// Generates `as_str`, `From<&str>`, `Display`, serde impls and
/// [`QueryValue`](crate::params::QueryValue).
#[macro_export]
macro_rules! safe_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this client does not know yet.
            Unknown(::std::string::String),
        }

        impl $name {
            /// Wire representation.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown(value) => value.as_str(),
                }
            }
        }

        impl ::std::convert::From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $($wire => Self::$variant,)+
                    other => Self::Unknown(other.to_owned()),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let value = <::std::string::String as $crate::__private::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Ok(Self::from(value.as_str()))
            }
        }

        impl $crate::params::QueryValue for $name {
            fn to_query_value(&self) -> ::std::string::String {
                self.as_str().to_owned()
            }
        }
    };
}
