//! Macro for defining typed ID types.

/// Defines a `Copy` newtype over [`Ulid`](crate::Ulid) implementing
/// [`PrefixedId`](crate::PrefixedId).
///
/// The generated type gets `new`, inherent `parse`/`from_ulid`/`ulid`, and
/// `Display`, `FromStr` and string-based serde. Ordering follows the ULID, so
/// IDs sort by creation time.
///
/// ```ignore
/// define_id!(
///     /// Identity of a lifecycle-tracked event.
///     EventId,
///     "evt"
/// );
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::Ulid);

        impl $crate::PrefixedId for $name {
            const PREFIX: &'static str = $prefix;

            fn from_ulid(ulid: $crate::Ulid) -> Self {
                Self(ulid)
            }

            fn ulid(&self) -> $crate::Ulid {
                self.0
            }
        }

        impl $name {
            /// Mints a fresh ID.
            #[must_use]
            pub fn new() -> Self {
                Self($crate::Ulid::new())
            }

            #[must_use]
            pub const fn from_ulid(ulid: $crate::Ulid) -> Self {
                Self(ulid)
            }

            #[must_use]
            pub const fn ulid(&self) -> $crate::Ulid {
                self.0
            }

            pub fn timestamp_ms(&self) -> u64 {
                <Self as $crate::PrefixedId>::timestamp_ms(self)
            }

            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                <Self as $crate::PrefixedId>::parse_prefixed(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                $crate::PrefixedId::fmt_prefixed(self, f)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S: $crate::__serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D: $crate::__serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <::std::borrow::Cow<'de, str> as $crate::__serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&raw).map_err($crate::__serde::de::Error::custom)
            }
        }
    };
}
