//! Form Values
//!
//! Dynamic payloads carried by elements and exchanged with hydrators, plus
//! the shared handle used to bind domain objects to fieldsets.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

/// Ordered string-keyed map of values
pub type ValueMap = IndexMap<String, Value>;

/// A value of any shape
///
/// `Object` holds a shared handle: cloning a `Value` shares bound objects,
/// while [`Value::deep_clone`] duplicates them.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
    Object(ObjectRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Whether this is a list or a map
    pub fn is_keyed(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// View a list or map as a keyed map; list entries are keyed by index
    pub fn to_keyed(&self) -> Option<ValueMap> {
        match self {
            Self::Map(map) => Some(map.clone()),
            Self::List(list) => Some(
                list.iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Render a scalar as the string a browser would submit
    pub fn to_form_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }

    /// Copy the value, duplicating every bound object it contains
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::List(list) => Self::List(list.iter().map(Value::deep_clone).collect()),
            Self::Map(map) => Self::Map(deep_clone_map(map)),
            Self::Object(object) => Self::Object(object.deep_clone()),
            other => other.clone(),
        }
    }

    /// Convert to plain JSON; objects are flattened through their fields
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(list) => serde_json::Value::Array(list.iter().map(Value::to_json).collect()),
            Self::Map(map) => map_to_json(map),
            Self::Object(object) => map_to_json(&object.borrow().to_map()),
        }
    }
}

pub(crate) fn deep_clone_map(map: &ValueMap) -> ValueMap {
    map.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect()
}

fn map_to_json(map: &ValueMap) -> serde_json::Value {
    serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(list) => Self::List(list.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Self::Object(object)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Self::List(list)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => serialize_map(map, serializer),
            Self::Object(object) => serialize_map(&object.borrow().to_map(), serializer),
        }
    }
}

fn serialize_map<S: Serializer>(map: &ValueMap, serializer: S) -> Result<S::Ok, S::Error> {
    let mut out = serializer.serialize_map(Some(map.len()))?;
    for (k, v) in map {
        out.serialize_entry(k, v)?;
    }
    out.end()
}

/// A domain object that can be bound to a fieldset
pub trait DomainObject: fmt::Debug {
    /// Runtime class name used for binding checks
    fn class_name(&self) -> &str;

    /// Whether the object satisfies a class or interface name
    fn is_a(&self, class: &str) -> bool {
        self.class_name() == class
    }

    /// Current field values
    fn to_map(&self) -> ValueMap;

    /// Assign a field; returns false when the object has no such field
    fn set_field(&mut self, name: &str, value: Value) -> bool;

    /// Deep copy
    fn duplicate(&self) -> Box<dyn DomainObject>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared handle to a bound domain object
///
/// Equality is identity: two handles are equal when they point at the same
/// object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Box<dyn DomainObject>>>);

impl ObjectRef {
    pub fn new(object: impl DomainObject + 'static) -> Self {
        Self::from_box(Box::new(object))
    }

    pub fn from_box(object: Box<dyn DomainObject>) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn class_name(&self) -> String {
        self.0.borrow().class_name().to_string()
    }

    pub fn is_a(&self, class: &str) -> bool {
        self.0.borrow().is_a(class)
    }

    pub fn borrow(&self) -> Ref<'_, dyn DomainObject> {
        Ref::map(self.0.borrow(), |object| &**object)
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn DomainObject> {
        RefMut::map(self.0.borrow_mut(), |object| &mut **object)
    }

    /// Duplicate the underlying object into a new, unshared handle
    pub fn deep_clone(&self) -> Self {
        Self::from_box(self.0.borrow().duplicate())
    }

    /// Run `f` against the concrete type, if it matches
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let object = self.0.borrow();
        object.as_any().downcast_ref::<T>().map(f)
    }

    /// Run `f` against the concrete type mutably, if it matches
    pub fn with_mut<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut object = self.0.borrow_mut();
        object.as_any_mut().downcast_mut::<T>().map(f)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => fmt::Debug::fmt(&**object, f),
            Err(_) => f.write_str("ObjectRef(<borrowed>)"),
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Generic domain object: a class name plus ordered fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    class: String,
    fields: ValueMap,
}

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: ValueMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> ObjectRef {
        ObjectRef::new(self)
    }
}

impl DomainObject for Record {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn to_map(&self) -> ValueMap {
        self.fields.clone()
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        self.fields.insert(name.to_string(), value);
        true
    }

    fn duplicate(&self) -> Box<dyn DomainObject> {
        Box::new(Record {
            class: self.class.clone(),
            fields: deep_clone_map(&self.fields),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
