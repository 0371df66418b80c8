//! Typed change-sets parsed from request bodies.
//!
//! A change-set arrives as a JSON object mapping pool names to new values.
//! It is parsed into an ordered list of entries before any validation so
//! that submission order survives. A value of the wrong JSON type does not
//! fail the whole body; it is kept as an entry without text and rejected
//! alongside the others.

use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

/// One proposed `pool name -> value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// Pool name or alias as submitted.
    pub name: String,
    /// The proposed value, unvalidated. `None` when the submitted value was
    /// neither a string nor an integer.
    pub raw_value: Option<String>,
}

/// An ordered batch of proposed changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    /// Build a change-set from `(name, value)` pairs.
    #[must_use]
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(name, value)| ChangeEntry {
                name: name.into(),
                raw_value: Some(value.into()),
            })
            .collect();
        Self { entries }
    }

    /// Iterate over entries in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the change-set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A change-set value: JSON strings are taken as-is, integers as decimal
/// text, anything else as `None`.
struct RawValue(Option<String>);

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawValueVisitor;

        impl<'de> Visitor<'de> for RawValueVisitor {
            type Value = RawValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("any JSON value")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
                Ok(RawValue(Some(v.to_string())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
                Ok(RawValue(Some(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
                Ok(RawValue(Some(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
                Ok(RawValue(Some(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawValue, E> {
                Ok(RawValue(None))
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawValue, E> {
                Ok(RawValue(None))
            }

            fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
                Ok(RawValue(None))
            }

            fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
                Ok(RawValue(None))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawValue, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(RawValue(None))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawValue, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(RawValue(None))
            }
        }

        deserializer.deserialize_any(RawValueVisitor)
    }
}

impl<'de> Deserialize<'de> for ChangeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChangeSetVisitor;

        impl<'de> Visitor<'de> for ChangeSetVisitor {
            type Value = ChangeSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping pool names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ChangeSet, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, RawValue(raw_value))) =
                    map.next_entry::<String, RawValue>()?
                {
                    entries.push(ChangeEntry { name, raw_value });
                }
                Ok(ChangeSet { entries })
            }
        }

        deserializer.deserialize_map(ChangeSetVisitor)
    }
}
