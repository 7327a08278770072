use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

// ============================================================================
// OrderedMap
// ============================================================================

/// A string-keyed map that remembers insertion order.
///
/// Specification documents are read in file order and the example index is
/// built in discovery order, so both need a map that iterates the way it was
/// filled. Backed by [`IndexMap`], so lookups stay constant time on large
/// documents.
///
/// Serializes as a plain JSON/YAML mapping. Non-string keys (YAML allows
/// unquoted `200:` status codes) are accepted on input and stringified.
#[derive(Debug, Clone)]
pub struct OrderedMap<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

/// Two maps are equal only when they hold the same entries in the same order.
impl<T: PartialEq> PartialEq for OrderedMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<T> OrderedMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a value. An existing key keeps its position and has its value
    /// replaced; the previous value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        self.entries.insert(key.into(), value)
    }

    /// Mutable access to the value for `key`, inserting `T::default()` at the
    /// end if the key is new.
    pub fn entry_or_default(&mut self, key: &str) -> &mut T
    where
        T: Default,
    {
        if let Some(idx) = self.entries.get_index_of(key) {
            return &mut self.entries[idx];
        }
        self.entries.entry(key.to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<T> IntoIterator for OrderedMap<T> {
    type Item = (String, T);
    type IntoIter = indexmap::map::IntoIter<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T> FromIterator<(String, T)> for OrderedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<T: Serialize> Serialize for OrderedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for MapVisitor<T> {
            type Value = OrderedMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping")
            }

            // `paths:` with nothing under it decodes as null
            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(OrderedMap::new())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(OrderedMap::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some(MapKey(key)) = access.next_key()? {
                    let value = access.next_value()?;
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_any(MapVisitor(PhantomData))
    }
}

/// A mapping key accepted in any scalar form and kept as a string.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = MapKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a scalar mapping key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<MapKey, E> {
                Ok(MapKey(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_unit<E: de::Error>(self) -> Result<MapKey, E> {
                Ok(MapKey("null".to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

// ============================================================================
// SpecValue
// ============================================================================

/// A decoded specification tree (or an example value taken from one).
///
/// Mappings keep the key order of the source file. Numbers are carried as
/// [`serde_json::Number`] so integers survive unchanged; non-finite floats
/// have no JSON form and decode as [`SpecValue::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SpecValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<SpecValue>),
    Mapping(OrderedMap<SpecValue>),
}

impl SpecValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SpecValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SpecValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&OrderedMap<SpecValue>> {
        match self {
            SpecValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Look up `key` if this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Walk a chain of mapping keys.
    pub fn pointer(&self, keys: &[&str]) -> Option<&SpecValue> {
        keys.iter().try_fold(self, |value, key| value.get(key))
    }
}

fn number_from_f64(f: f64) -> SpecValue {
    serde_json::Number::from_f64(f)
        .map(SpecValue::Number)
        .unwrap_or(SpecValue::Null)
}

pub(crate) fn yaml_key_to_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key_to_string(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<serde_yaml::Value> for SpecValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => SpecValue::Null,
            serde_yaml::Value::Bool(b) => SpecValue::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    SpecValue::Number(u.into())
                } else if let Some(i) = n.as_i64() {
                    SpecValue::Number(i.into())
                } else {
                    n.as_f64().map(number_from_f64).unwrap_or(SpecValue::Null)
                }
            }
            serde_yaml::Value::String(s) => SpecValue::String(s),
            serde_yaml::Value::Sequence(seq) => {
                SpecValue::Sequence(seq.into_iter().map(SpecValue::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => SpecValue::Mapping(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key_to_string(k), SpecValue::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => SpecValue::from(tagged.value),
        }
    }
}

impl From<serde_json::Value> for SpecValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SpecValue::Null,
            serde_json::Value::Bool(b) => SpecValue::Bool(b),
            serde_json::Value::Number(n) => SpecValue::Number(n),
            serde_json::Value::String(s) => SpecValue::String(s),
            serde_json::Value::Array(items) => {
                SpecValue::Sequence(items.into_iter().map(SpecValue::from).collect())
            }
            serde_json::Value::Object(map) => SpecValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, SpecValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for SpecValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SpecValue::Null => serializer.serialize_unit(),
            SpecValue::Bool(b) => serializer.serialize_bool(*b),
            SpecValue::Number(n) => n.serialize(serializer),
            SpecValue::String(s) => serializer.serialize_str(s),
            SpecValue::Sequence(items) => serializer.collect_seq(items),
            SpecValue::Mapping(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SpecValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = SpecValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("any specification value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<SpecValue, E> {
                Ok(SpecValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<SpecValue, E> {
                Ok(SpecValue::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<SpecValue, D::Error> {
                SpecValue::deserialize(d)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<SpecValue, E> {
                Ok(SpecValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SpecValue, E> {
                Ok(SpecValue::Number(v.into()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SpecValue, E> {
                Ok(SpecValue::Number(v.into()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<SpecValue, E> {
                Ok(number_from_f64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SpecValue, E> {
                Ok(SpecValue::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<SpecValue, E> {
                Ok(SpecValue::String(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<SpecValue, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = access.next_element()? {
                    items.push(item);
                }
                Ok(SpecValue::Sequence(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SpecValue, A::Error> {
                let mut map = OrderedMap::new();
                while let Some(MapKey(key)) = access.next_key()? {
                    let value = access.next_value()?;
                    map.insert(key, value);
                }
                Ok(SpecValue::Mapping(map))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordered_map_keeps_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        map.insert("mid", 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_ordered_map_insert_replaces_in_place() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 10), Some(1));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&10));
    }

    #[test]
    fn test_entry_or_default_appends_new_keys() {
        let mut map: OrderedMap<Vec<u32>> = OrderedMap::new();
        map.entry_or_default("x").push(1);
        map.entry_or_default("y").push(2);
        map.entry_or_default("x").push(3);
        assert_eq!(map.get("x"), Some(&vec![1, 3]));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_ordered_map_equality_respects_order() {
        let ab: OrderedMap<u32> = [("a".to_string(), 1), ("b".to_string(), 2)]
            .into_iter()
            .collect();
        let ba: OrderedMap<u32> = [("b".to_string(), 2), ("a".to_string(), 1)]
            .into_iter()
            .collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn test_ordered_map_large_fill() {
        let map: OrderedMap<usize> = (0..20_000).map(|i| (format!("k{i}"), i)).collect();
        assert_eq!(map.len(), 20_000);
        assert_eq!(map.get("k19999"), Some(&19_999));
        assert_eq!(map.keys().next(), Some("k0"));
    }

    #[test]
    fn test_yaml_mapping_order_survives_to_json() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("b: 1\na: 2\nc: 3\n").unwrap();
        let value = SpecValue::from(yaml);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"b":1,"a":2,"c":3}"#
        );
    }

    #[test]
    fn test_yaml_numeric_keys_become_strings() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("responses:\n  200:\n    description: ok\n").unwrap();
        let value = SpecValue::from(yaml);
        assert_eq!(
            value
                .pointer(&["responses", "200", "description"])
                .and_then(SpecValue::as_str),
            Some("ok")
        );
    }

    #[test]
    fn test_non_finite_float_is_null() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("x: .inf").unwrap();
        let value = SpecValue::from(yaml);
        assert_eq!(value.get("x"), Some(&SpecValue::Null));
    }

    #[test]
    fn test_deserialize_from_yaml_with_int_keys() {
        let value: SpecValue = serde_yaml::from_str("404: missing\n200: found\n").unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["404", "200"]);
    }

    #[test]
    fn test_json_value_conversion() {
        let value = SpecValue::from(json!({"name": "Rex", "tags": [1, true, null]}));
        assert_eq!(value.get("name").and_then(SpecValue::as_str), Some("Rex"));
        assert_eq!(
            value.get("tags"),
            Some(&SpecValue::Sequence(vec![
                SpecValue::Number(1.into()),
                SpecValue::Bool(true),
                SpecValue::Null,
            ]))
        );
    }

    #[test]
    fn test_ordered_map_null_is_empty() {
        let map: OrderedMap<u32> = serde_yaml::from_str("~").unwrap();
        assert!(map.is_empty());
    }
}
