//! Element Attributes
//!
//! Ordered attribute bag: get, set, remove, has, toggle.

use std::collections::HashMap;

use serde_json::Value as AttrValue;

/// Single attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether the attribute counts as set for boolean attributes
    /// (`disabled`, `multiple`, ...)
    pub fn is_truthy(&self) -> bool {
        match &self.value {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::String(s) => !s.is_empty() && s != "0" && s != "false",
            AttrValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => true,
        }
    }
}

/// Attribute collection, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    attributes: Vec<Attr>,
    by_name: HashMap<String, usize>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Get attribute by name
    pub fn get_named_item(&self, name: &str) -> Option<&Attr> {
        self.by_name.get(name).and_then(|&i| self.attributes.get(i))
    }

    /// Get attribute value
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.get_named_item(name).map(|a| &a.value)
    }

    /// Get attribute value as a string slice
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    /// Set attribute, overwriting any previous value in place
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<Attr> {
        let attr = Attr::new(name, value);
        if let Some(&index) = self.by_name.get(&attr.name) {
            Some(std::mem::replace(&mut self.attributes[index], attr))
        } else {
            let index = self.attributes.len();
            self.by_name.insert(attr.name.clone(), index);
            self.attributes.push(attr);
            None
        }
    }

    /// Remove attribute by name
    pub fn remove(&mut self, name: &str) -> Option<Attr> {
        let index = self.by_name.remove(name)?;
        // Update indices for items after removed
        for idx in self.by_name.values_mut() {
            if *idx > index {
                *idx -= 1;
            }
        }
        Some(self.attributes.remove(index))
    }

    /// Check if attribute exists
    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Whether a boolean attribute is set
    pub fn is_set(&self, name: &str) -> bool {
        self.get_named_item(name).is_some_and(Attr::is_truthy)
    }

    /// Toggle a boolean attribute
    pub fn toggle(&mut self, name: &str, force: Option<bool>) -> bool {
        let on = force.unwrap_or(!self.is_set(name));
        if on {
            self.set(name, true);
        } else {
            self.remove(name);
        }
        on
    }

    /// Drop every attribute
    pub fn clear(&mut self) {
        self.attributes.clear();
        self.by_name.clear();
    }

    /// Get attribute names
    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Iterate over attributes
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}
