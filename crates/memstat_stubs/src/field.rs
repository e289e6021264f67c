use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Number;

use crate::error::ParseError;

/// A snapshot type whose fields are described by a static registry.
///
/// The registry order is the rendering order and the registry keys are the
/// external names consumers key off, so both are part of the output
/// contract.
pub trait Snapshot: Default + Sized + 'static {
  /// Ordered list of every field of the snapshot.
  fn fields() -> &'static [Field<Self>];
}

/// The value of a single registry field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
  /// A byte amount or an event counter.
  Count(u64),
  /// A percentage.
  Percent(f64),
}

impl Serialize for FieldValue {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match *self {
      FieldValue::Count(val) => serializer.serialize_u64(val),
      // 50.0 renders as `50`
      FieldValue::Percent(val) if is_whole(val) => {
        serializer.serialize_u64(val as u64)
      }
      FieldValue::Percent(val) => serializer.serialize_f64(val),
    }
  }
}

fn is_whole(val: f64) -> bool {
  val.is_finite() && val >= 0.0 && val < 1e15 && val.fract() == 0.0
}

enum Accessor<T> {
  Count {
    get: fn(&T) -> u64,
    set: fn(&mut T, u64),
  },
  Percent {
    get: fn(&T) -> f64,
    set: fn(&mut T, f64),
  },
}

/// A named field of a snapshot type.
pub struct Field<T> {
  key: &'static str,
  accessor: Accessor<T>,
}

impl<T> Field<T> {
  pub(crate) const fn count(
    key: &'static str,
    get: fn(&T) -> u64,
    set: fn(&mut T, u64),
  ) -> Self {
    Self {
      key,
      accessor: Accessor::Count { get, set },
    }
  }

  pub(crate) const fn percent(
    key: &'static str,
    get: fn(&T) -> f64,
    set: fn(&mut T, f64),
  ) -> Self {
    Self {
      key,
      accessor: Accessor::Percent { get, set },
    }
  }

  /// The external name of the field.
  pub fn key(&self) -> &'static str {
    self.key
  }

  /// Read the field out of a snapshot.
  pub fn value(&self, stat: &T) -> FieldValue {
    match &self.accessor {
      Accessor::Count { get, .. } => FieldValue::Count(get(stat)),
      Accessor::Percent { get, .. } => FieldValue::Percent(get(stat)),
    }
  }

  fn assign(&self, stat: &mut T, raw: &Number) -> Result<(), ParseError> {
    match &self.accessor {
      Accessor::Count { set, .. } => {
        let val = raw.as_u64().ok_or_else(|| ParseError::InvalidValue {
          key: self.key,
          reason: format!("expected a non-negative integer, got {raw}"),
        })?;
        set(stat, val);
      }
      Accessor::Percent { set, .. } => {
        let val = raw.as_f64().ok_or_else(|| ParseError::InvalidValue {
          key: self.key,
          reason: format!("expected a number, got {raw}"),
        })?;
        set(stat, val);
      }
    }
    Ok(())
  }
}

impl<T> fmt::Debug for Field<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Field").field("key", &self.key).finish()
  }
}

/// Serializes a snapshot as a map following its registry order.
pub(crate) struct Fields<'a, T>(pub(crate) &'a T);

impl<T: Snapshot> Serialize for Fields<'_, T> {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let fields = T::fields();
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for field in fields {
      map.serialize_entry(field.key, &field.value(self.0))?;
    }
    map.end()
  }
}

pub(crate) fn write_fields<T: Snapshot>(
  stat: &T,
  f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
  let text = serde_json::to_string(&Fields(stat)).map_err(|_| fmt::Error)?;
  f.write_str(&text)
}

/// Key/number pairs of a rendered snapshot, each key seen once.
pub(crate) struct Entries(BTreeMap<String, Number>);

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
  type Value = Entries;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a map of field names to numbers")
  }

  fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
  where
    A: MapAccess<'de>,
  {
    let mut map = BTreeMap::new();
    while let Some((key, val)) = access.next_entry::<String, Number>()? {
      if map.contains_key(&key) {
        return Err(de::Error::custom(format!("Duplicate key: {key}")));
      }
      map.insert(key, val);
    }
    Ok(Entries(map))
  }
}

impl<'de> Deserialize<'de> for Entries {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_map(EntriesVisitor)
  }
}

/// Build a snapshot from its rendered entries.
///
/// Every registry key must be present and no other key is accepted.
pub(crate) fn from_map<T: Snapshot>(
  Entries(mut map): Entries,
) -> Result<T, ParseError> {
  let mut stat = T::default();
  for field in T::fields() {
    let raw = map
      .remove(field.key)
      .ok_or(ParseError::MissingKey(field.key))?;
    field.assign(&mut stat, &raw)?;
  }
  if let Some(key) = map.into_keys().next() {
    return Err(ParseError::UnknownKey(key));
  }
  Ok(stat)
}

pub(crate) fn parse<T: Snapshot>(text: &str) -> Result<T, ParseError> {
  let map = serde_json::from_str::<Entries>(text)?;
  from_map(map)
}
