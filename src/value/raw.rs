// ============================================================================
// spark-tree - Raw Values
// The caller's nested data: scalars plus shared, in-place mutable containers
// ============================================================================
//
// Containers are reference types: cloning a `Value::List` or `Value::Map`
// clones the handle, not the contents. That is what lets a node's `value` be
// *the same* container the parent holds, and what lets `push` grow a list
// without changing its identity.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Number;

use crate::core::types::Kind;
use crate::value::path::Seg;

// =============================================================================
// LIST
// =============================================================================

/// A shared list container.
#[derive(Clone, Default)]
pub struct List(Rc<RefCell<Vec<Value>>>);

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// The item at `index` (a handle clone for containers).
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replace the item at `index`, returning the previous one.
    ///
    /// Returns `None` and leaves the list untouched when `index` is out of bounds.
    pub fn replace(&self, index: usize, value: Value) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        let slot = items.get_mut(index)?;
        Some(std::mem::replace(slot, value))
    }

    /// Append in place. The list keeps its identity.
    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Snapshot of the current items.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Same container?
    pub fn ptr_eq(a: &List, b: &List) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        List::ptr_eq(self, other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

// =============================================================================
// MAP
// =============================================================================

/// A shared map container. Keys keep insertion order.
#[derive(Clone, Default)]
pub struct Map(Rc<RefCell<IndexMap<String, Value>>>);

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: IndexMap<String, Value>) -> Self {
        Self(Rc::new(RefCell::new(entries)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Insert or replace in place, returning the previous value.
    ///
    /// A replaced key keeps its position; a new key goes last.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the current entries.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn ptr_eq(a: &Map, b: &Map) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        Map::ptr_eq(self, other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A raw value stored in a tree.
///
/// `PartialEq` compares structurally; use [`Value::is_identical`] for the
/// identity check change detection relies on.
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    List(List),
    Map(Map),
}

/// Classify a raw value.
pub fn classify(value: &Value) -> Kind {
    match value {
        Value::List(_) => Kind::List,
        Value::Map(_) => Kind::Map,
        _ => Kind::Leaf,
    }
}

impl Value {
    /// Shorthand for [`classify`].
    pub fn kind(&self) -> Kind {
        classify(self)
    }

    /// Reference identity for containers, equality for scalars.
    ///
    /// ```
    /// use spark_tree::Value;
    /// use serde_json::json;
    ///
    /// let a = Value::from(json!({ "x": 1 }));
    /// let b = Value::from(json!({ "x": 1 }));
    /// assert_eq!(a, b);
    /// assert!(!Value::is_identical(&a, &b));
    /// assert!(Value::is_identical(&a, &a.clone()));
    /// ```
    pub fn is_identical(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::List(a), Value::List(b)) => List::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Map::ptr_eq(a, b),
            (Value::List(_) | Value::Map(_), _) | (_, Value::List(_) | Value::Map(_)) => false,
            (a, b) => a == b,
        }
    }

    /// The child reached by `seg`, if the segment fits this value.
    pub fn child(&self, seg: &Seg) -> Option<Value> {
        match (self, seg) {
            (Value::List(list), Seg::Index(i)) => list.get(*i),
            (Value::Map(map), Seg::Key(k)) => map.get(k),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// A copy sharing no container with `self`, at any depth.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::List(list) => Value::List(List::from_vec(
                list.0.borrow().iter().map(Value::deep_copy).collect(),
            )),
            Value::Map(map) => Value::Map(Map::from_entries(
                map.0
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy()))
                    .collect(),
            )),
            scalar => scalar.clone(),
        }
    }

    /// Deep copy into a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::List(list) => {
                serde_json::Value::Array(list.0.borrow().iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.0
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(list) => list.fmt(f),
            Value::Map(map) => map.fmt(f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        self.to_json() == *other
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => {
                Value::List(List::from_vec(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(entries) => Value::Map(Map::from_entries(
                entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number((n as u64).into())
    }
}

/// Non-finite floats become `Null`, as in `serde_json`.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(List::from_vec(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// TESTS
// =============================================================================
