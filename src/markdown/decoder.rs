//! Typed decoding of flat front matter.
//!
//! Front matter is a flat `key -> value` map. The target type drives decoding:
//!
//! | Target | Source |
//! |--------|--------|
//! | struct field `a` of `x` | key `x.a`, or any key below `x.a.` |
//! | `Vec<T>` / tuple | comma separated value |
//! | `Option<T>` | `None` when the key (and every key below it) is absent or blank |
//! | map | every key below the prefix, flattened |
//! | [`MetadataDate`] | value parsed with the site's date format |
//! | unit enum | variant name |
//! | primitives | [`FromStr`](std::str::FromStr) |

use super::parse_date;
use chrono::{DateTime, Utc};
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, Visitor,
    value::{MapDeserializer, SeqDeserializer, StrDeserializer},
};
use serde::{Deserialize, Deserializer};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Newtype name recognised by the decoder as a date request.
const DATE_TOKEN: &str = "$plume::MetadataDate";

/// Decode `T` from a flat front matter map.
pub fn decode_metadata<T: DeserializeOwned>(
    entries: &BTreeMap<String, String>,
    date_format: &str,
) -> Result<T, DecodeError> {
    let deserializer = MetadataDeserializer {
        source: Source::Entries(entries),
        path: String::new(),
        date_format,
    };
    T::deserialize(deserializer).map_err(|e| e.qualify(""))
}

// ============================================================================
// Errors
// ============================================================================

/// A missing or unparsable metadata value, with the dotted key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    path: String,
    message: String,
    qualified: bool,
}

impl DecodeError {
    pub(crate) fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            qualified: true,
        }
    }

    /// Dotted key path of the offending value. Empty for the whole map.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Anchor an error raised below `base` to its full key path.
    fn qualify(mut self, base: &str) -> Self {
        if !self.qualified {
            self.path = join_key(base, &self.path);
            self.qualified = true;
        }
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "`{}`: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for DecodeError {}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            path: String::new(),
            message: msg.to_string(),
            qualified: false,
        }
    }

    fn missing_field(field: &'static str) -> Self {
        Self {
            path: field.to_owned(),
            message: "missing value".to_owned(),
            qualified: false,
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// A date written in front matter, in the site's date format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetadataDate(pub DateTime<Utc>);

impl Default for MetadataDate {
    fn default() -> Self {
        Self(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl<'de> Deserialize<'de> for MetadataDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DATE_TOKEN, DateVisitor)
    }
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = MetadataDate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC 3339 date")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        DateTime::parse_from_rfc3339(value)
            .map(|date| MetadataDate(date.with_timezone(&Utc)))
            .map_err(E::custom)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_str(self)
    }
}

// ============================================================================
// Deserializer
// ============================================================================

#[derive(Clone, Copy)]
enum Source<'de> {
    Entries(&'de BTreeMap<String, String>),
    /// One element of a comma separated list, or one flattened map value.
    Value(&'de str),
}

struct MetadataDeserializer<'de> {
    source: Source<'de>,
    path: String,
    date_format: &'de str,
}

fn join_key(base: &str, key: &str) -> String {
    match (base.is_empty(), key.is_empty()) {
        (true, _) => key.to_owned(),
        (false, true) => base.to_owned(),
        (false, false) => format!("{base}.{key}"),
    }
}

impl<'de> MetadataDeserializer<'de> {
    fn value(&self) -> Option<&'de str> {
        match self.source {
            Source::Entries(entries) => entries.get(self.path.as_str()).map(String::as_str),
            Source::Value(value) => Some(value),
        }
    }

    fn require(&self) -> Result<&'de str, DecodeError> {
        self.value()
            .ok_or_else(|| DecodeError::at(&self.path, "missing value"))
    }

    /// Entries below the current path, keyed by the remaining suffix.
    fn entries_below(&self) -> Vec<(&'de str, &'de str)> {
        let Source::Entries(entries) = self.source else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|(key, value)| {
                let suffix = if self.path.is_empty() {
                    Some(key.as_str())
                } else {
                    key.strip_prefix(self.path.as_str())
                        .and_then(|rest| rest.strip_prefix('.'))
                };
                suffix.map(|suffix| (suffix, value.as_str()))
            })
            .collect()
    }

    fn is_present(&self) -> bool {
        self.value().is_some_and(|value| !value.trim().is_empty())
            || !self.entries_below().is_empty()
    }

    fn child(&self, path: String, source: Source<'de>) -> Self {
        Self {
            source,
            path,
            date_format: self.date_format,
        }
    }

    fn parse<T: FromStr>(&self, expected: &str) -> Result<T, DecodeError> {
        let value = self.require()?;
        value.trim().parse().map_err(|_| {
            DecodeError::at(&self.path, format!("cannot parse `{value}` as {expected}"))
        })
    }
}

impl<'de> IntoDeserializer<'de, DecodeError> for MetadataDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! parse_primitive {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
            visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
        }
    )*};
}

impl<'de> Deserializer<'de> for MetadataDeserializer<'de> {
    type Error = DecodeError;

    parse_primitive! {
        deserialize_bool => visit_bool: bool,
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
        deserialize_char => visit_char: char,
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value() {
            Some(value) => visitor.visit_borrowed_str(value),
            None if !self.entries_below().is_empty() => self.deserialize_map(visitor),
            None => Err(DecodeError::at(&self.path, "missing value")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_borrowed_str(self.require()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_borrowed_bytes(self.require()?.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        if self.is_present() {
            visitor.visit_some(self)
        } else {
            visitor.visit_none()
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        if name != DATE_TOKEN {
            return visitor.visit_newtype_struct(self);
        }
        let value = self.require()?;
        let date = parse_date(value, self.date_format).ok_or_else(|| {
            DecodeError::at(
                &self.path,
                format!("cannot parse `{value}` as a date with format `{}`", self.date_format),
            )
        })?;
        visitor.visit_string(date.to_rfc3339())
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let value = self.require()?;
        let elements: Vec<_> = value
            .split(',')
            .map(str::trim)
            .filter(|element| !element.is_empty())
            .enumerate()
            .map(|(index, element)| {
                self.child(format!("{}[{index}]", self.path), Source::Value(element))
            })
            .collect();

        let mut seq: SeqDeserializer<_, DecodeError> = SeqDeserializer::new(elements.into_iter());
        let result = visitor.visit_seq(&mut seq).map_err(|e| e.qualify(&self.path))?;
        seq.end()?;
        Ok(result)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let entries: Vec<_> = self
            .entries_below()
            .into_iter()
            .map(|(key, value)| {
                let child = self.child(join_key(&self.path, key), Source::Value(value));
                (key, child)
            })
            .collect();

        let mut map: MapDeserializer<'de, _, DecodeError> = MapDeserializer::new(entries.into_iter());
        let result = visitor.visit_map(&mut map).map_err(|e| e.qualify(&self.path))?;
        map.end()?;
        Ok(result)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let present: Vec<&'static str> = fields
            .iter()
            .copied()
            .filter(|field| {
                let path = join_key(&self.path, field);
                self.child(path, self.source).is_present()
            })
            .collect();

        let access = StructAccess {
            de: &self,
            fields: present.into_iter(),
            pending: None,
        };
        visitor.visit_map(access).map_err(|e| e.qualify(&self.path))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let value: StrDeserializer<'de, DecodeError> = self.require()?.trim().into_deserializer();
        visitor.visit_enum(value).map_err(|e| e.qualify(&self.path))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}

/// Yields the struct fields that have a value (or nested values).
struct StructAccess<'a, 'de> {
    de: &'a MetadataDeserializer<'de>,
    fields: std::vec::IntoIter<&'static str>,
    pending: Option<String>,
}

impl<'de> MapAccess<'de> for StructAccess<'_, 'de> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        let Some(field) = self.fields.next() else {
            return Ok(None);
        };
        self.pending = Some(join_key(&self.de.path, field));
        let key: StrDeserializer<'_, DecodeError> = field.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DecodeError> {
        let path = self
            .pending
            .take()
            .ok_or_else(|| <DecodeError as de::Error>::custom("value requested before key"))?;
        let child = self.de.child(path.clone(), self.de.source);
        seed.deserialize(child).map_err(|e| e.qualify(&path))
    }
}
