//! The `{prefix}_{ulid}` text form shared by every ID type.

use std::fmt;

use ulid::Ulid;

use crate::IdError;

const SEPARATOR: char = '_';

/// An identifier rendered as `{PREFIX}_{ulid}`.
///
/// Implemented by [`define_id!`](crate::define_id); the provided methods hold
/// the parsing and formatting rules so each generated type stays a thin shell.
pub trait PrefixedId: Sized + Copy {
    /// Short lowercase tag naming the kind of ID, e.g. `evt`.
    const PREFIX: &'static str;

    fn from_ulid(ulid: Ulid) -> Self;

    fn ulid(&self) -> Ulid;

    /// Milliseconds since the Unix epoch at which the ID was minted.
    fn timestamp_ms(&self) -> u64 {
        self.ulid().timestamp_ms()
    }

    /// Parses the canonical text form, rejecting any other prefix.
    fn parse_prefixed(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let (prefix, body) = s
            .split_once(SEPARATOR)
            .ok_or(IdError::MissingSeparator)?;

        if prefix != Self::PREFIX {
            return Err(IdError::InvalidPrefix {
                expected: Self::PREFIX,
                actual: prefix.to_string(),
            });
        }

        Ulid::from_string(body)
            .map(Self::from_ulid)
            .map_err(|e| IdError::InvalidUlid {
                value: body.to_string(),
                reason: e.to_string(),
            })
    }

    /// Writes the canonical text form.
    fn fmt_prefixed(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", Self::PREFIX, SEPARATOR, self.ulid())
    }
}
