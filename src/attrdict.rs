//! Nested Attribute Dictionary
//!
//! [`AttrDict`] is an insertion-ordered mapping used for every free-form
//! section of a configuration or metadata document (`files`, `parameters`,
//! `resources`, per-rule metadata, ...).
//!
//! Two access styles are supported on both [`AttrDict`] and [`Node`]:
//!
//! - indexing (`dict["a"]["b"]`), which panics on a missing key like
//!   `HashMap` indexing does;
//! - named access (`dict.get("a").and_then(|a| a.get("b"))`), which returns
//!   `None` for a missing key.
//!
//! Conversion from a parsed document is deep and eager: every nested mapping
//! becomes an [`AttrDict`] at construction time, so there is no lazy wrapping
//! and nested values are owned by their parent.
//!
//! ```
//! use gardnersnake::AttrDict;
//! use serde_json::json;
//!
//! let dict = AttrDict::from_value(json!({"a": {"b": 1}})).unwrap();
//! assert_eq!(dict["a"]["b"], 1);
//! assert_eq!(dict.get("a").and_then(|a| a.get("b")).and_then(|b| b.as_i64()), Some(1));
//! ```

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// A value stored inside an [`AttrDict`].
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Node>),
    Dict(AttrDict),
}

/// Insertion-ordered mapping with recursive [`Node`] values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct AttrDict(IndexMap<String, Node>);

impl AttrDict {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Builds a dictionary from a parsed document section.
    ///
    /// A mapping is converted deeply; `null` (an empty YAML section) yields an
    /// empty dictionary. Any other value returns `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from(map)),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }

    /// Returns the value for `key`, or `None` when absent.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.0.get_mut(key)
    }

    /// Sets `key`, returning the previous value if there was one.
    ///
    /// New keys are appended; existing keys keep their position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.0.insert(key.into(), value.into())
    }

    /// Deletes `key`, preserving the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Node> {
        self.0.iter()
    }

    /// Follows `path` through nested dictionaries and lists.
    ///
    /// Segments index dictionaries by key and lists by position.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.get(first.as_ref())?;
        for segment in rest {
            node = node.child(segment.as_ref())?;
        }
        Some(node)
    }

    /// Converts back into a plain JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl Node {
    /// Dictionary key access; `None` for missing keys and non-dictionaries.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Dict(dict) => dict.get(key),
            _ => None,
        }
    }

    /// One step of a key path: a key for dictionaries, a position for lists.
    pub fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Node::Dict(dict) => dict.get(segment),
            Node::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Node::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&AttrDict> {
        match self {
            Node::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::List(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            Node::Dict(d) => d.to_value(),
        }
    }
}

impl From<Map<String, Value>> for AttrDict {
    fn from(map: Map<String, Value>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => Node::Dict(AttrDict::from(map)),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(n.into())
    }
}

impl From<f64> for Node {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Node::Number).unwrap_or(Node::Null)
    }
}

impl From<AttrDict> for Node {
    fn from(d: AttrDict) -> Self {
        Node::Dict(d)
    }
}

impl FromIterator<(String, Node)> for AttrDict {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AttrDict {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Node::from)
    }
}

impl<'de> Deserialize<'de> for AttrDict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(AttrDict::from(map))
    }
}

impl Index<&str> for AttrDict {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        match self.0.get(key) {
            Some(node) => node,
            None => panic!("key '{}' not found in AttrDict", key),
        }
    }
}

impl Index<&str> for Node {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        match self {
            Node::Dict(d) => &d[key],
            other => panic!("cannot index {} with key '{}'", other.kind(), key),
        }
    }
}

impl Index<usize> for Node {
    type Output = Node;

    fn index(&self, i: usize) -> &Node {
        match self {
            Node::List(items) => &items[i],
            other => panic!("cannot index {} with position {}", other.kind(), i),
        }
    }
}

impl Node {
    fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "a bool",
            Node::Number(_) => "a number",
            Node::String(_) => "a string",
            Node::List(_) => "a list",
            Node::Dict(_) => "a dict",
        }
    }
}

impl PartialEq<&str> for Node {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Node {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<i32> for Node {
    fn eq(&self, other: &i32) -> bool {
        self.as_i64() == Some(i64::from(*other))
    }
}

impl PartialEq<f64> for Node {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> AttrDict {
        AttrDict::from_value(json!({
            "a": {"b": 1},
            "files": {"reads": ["r1.fq", "r2.fq"], "ref": {"fasta": "hg38.fa"}},
            "empty": null
        }))
        .unwrap()
    }

    #[test]
    fn test_index_and_named_access_agree() {
        let dict = sample();
        assert_eq!(dict["a"]["b"], 1);
        assert_eq!(dict.get("a").and_then(|a| a.get("b")), Some(&Node::from(1i64)));
    }

    #[test]
    fn test_conversion_is_deep() {
        let dict = sample();
        let reference = dict["files"]["ref"].as_dict().unwrap();
        assert_eq!(reference["fasta"], "hg38.fa");
        assert!(dict["files"]["reads"].as_list().is_some());
    }

    #[test]
    fn test_missing_key_is_none() {
        let dict = sample();
        assert!(dict.get("nope").is_none());
        assert!(dict["a"].get("nope").is_none());
        assert!(dict["empty"].is_null());
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_index_missing_key_panics() {
        let dict = sample();
        let _ = &dict["nope"];
    }

    #[test]
    fn test_set_and_remove_keep_order() {
        let mut dict = AttrDict::new();
        dict.set("first", 1i64);
        dict.set("second", "two");
        dict.set("third", true);
        assert_eq!(dict.set("first", 10i64), Some(Node::from(1i64)));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["first", "second", "third"]);

        assert_eq!(dict.remove("second"), Some(Node::from("two")));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["first", "third"]);
        assert!(dict.remove("second").is_none());
    }

    #[test]
    fn test_lookup_descends_lists_and_dicts() {
        let dict = sample();
        assert_eq!(dict.lookup(&["files", "reads", "1"]), Some(&Node::from("r2.fq")));
        assert_eq!(dict.lookup(&["files", "ref", "fasta"]), Some(&Node::from("hg38.fa")));
        assert!(dict.lookup(&["files", "reads", "7"]).is_none());
        assert!(dict.lookup::<&str>(&[]).is_none());
    }

    #[test]
    fn test_from_value_rejects_scalars() {
        assert!(AttrDict::from_value(json!(3)).is_none());
        assert!(AttrDict::from_value(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_to_value_round_trips() {
        let value = json!({"x": [1, {"y": null}], "z": "s"});
        let dict = AttrDict::from_value(value.clone()).unwrap();
        assert_eq!(dict.to_value(), value);
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(sample(), sample());
        let mut other = sample();
        other.set("extra", 0i64);
        assert_ne!(sample(), other);
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let dict: AttrDict = serde_yaml::from_str("walltime: '02:00:00'\nnodes: 1\n").unwrap();
        assert_eq!(dict["walltime"], "02:00:00");
        assert_eq!(dict["nodes"], 1);
    }

    #[test]
    fn test_display_strings_are_bare() {
        assert_eq!(Node::from("logs/").to_string(), "logs/");
        assert_eq!(Node::from(4i64).to_string(), "4");
    }
}
