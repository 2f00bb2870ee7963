//! Hydrators
//!
//! Strategies that move data between a bound object and a flat value map.

use std::fmt;
use std::rc::Rc;

use crate::elements::{option_bool, Options};
use crate::error::{FormError, Result};
use crate::value::{ObjectRef, ValueMap};

/// Two-way object/map conversion
pub trait Hydrator: fmt::Debug {
    /// Read the object's fields into a map
    fn extract(&self, object: &ObjectRef) -> Result<ValueMap>;

    /// Write `data` into `object`; may return a different instance
    fn hydrate(&self, data: &ValueMap, object: &ObjectRef) -> Result<ObjectRef>;
}

/// Shared hydrator handle, cloned along with the fieldset that owns it
pub type HydratorRef = Rc<dyn Hydrator>;

/// Hydrator used when a fieldset has none configured
pub fn default_hydrator() -> HydratorRef {
    Rc::new(PropertyHydrator::default())
}

/// Writes fields in place on the bound object
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyHydrator {
    /// Reject fields the object does not accept
    pub strict: bool,
}

impl PropertyHydrator {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn from_options(options: &Options) -> Self {
        Self {
            strict: option_bool(options, "strict", false),
        }
    }
}

impl Hydrator for PropertyHydrator {
    fn extract(&self, object: &ObjectRef) -> Result<ValueMap> {
        Ok(object.borrow().to_map())
    }

    fn hydrate(&self, data: &ValueMap, object: &ObjectRef) -> Result<ObjectRef> {
        let mut target = object.borrow_mut();
        for (name, value) in data {
            let accepted = target.set_field(name, value.clone());
            if !accepted && self.strict {
                return Err(FormError::invalid(format!(
                    "{} has no field \"{}\"",
                    target.class_name(),
                    name
                )));
            }
            if !accepted {
                tracing::trace!("{} ignored field {}", target.class_name(), name);
            }
        }
        Ok(object.clone())
    }
}

/// Leaves the bound object untouched and returns a hydrated copy
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmutableHydrator;

impl Hydrator for ImmutableHydrator {
    fn extract(&self, object: &ObjectRef) -> Result<ValueMap> {
        Ok(object.borrow().to_map())
    }

    fn hydrate(&self, data: &ValueMap, object: &ObjectRef) -> Result<ObjectRef> {
        let mut copy = object.borrow().duplicate();
        for (name, value) in data {
            copy.set_field(name, value.clone());
        }
        Ok(ObjectRef::from_box(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Record, Value};
    use std::any::Any;

    use crate::value::DomainObject;

    #[derive(Debug, Clone, Default)]
    struct Point {
        x: i64,
    }

    impl DomainObject for Point {
        fn class_name(&self) -> &str {
            "Point"
        }

        fn to_map(&self) -> ValueMap {
            ValueMap::from([("x".to_string(), Value::from(self.x))])
        }

        fn set_field(&mut self, name: &str, value: Value) -> bool {
            match (name, value.as_i64()) {
                ("x", Some(x)) => {
                    self.x = x;
                    true
                }
                _ => false,
            }
        }

        fn duplicate(&self) -> Box<dyn DomainObject> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn data(pairs: &[(&str, Value)]) -> ValueMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_property_hydrator_in_place() {
        let object = Record::new("User").with_field("name", "old").into_ref();
        let hydrated = PropertyHydrator::default()
            .hydrate(&data(&[("name", Value::from("new"))]), &object)
            .unwrap();

        assert!(hydrated.ptr_eq(&object));
        let extracted = PropertyHydrator::default().extract(&object).unwrap();
        assert_eq!(extracted.get("name"), Some(&Value::from("new")));
    }

    #[test]
    fn test_property_hydrator_lenient_and_strict() {
        let object = ObjectRef::new(Point::default());
        let input = data(&[("x", Value::from(3)), ("y", Value::from(4))]);

        assert!(PropertyHydrator::default().hydrate(&input, &object).is_ok());
        assert_eq!(object.with(|p: &Point| p.x), Some(3));

        let err = PropertyHydrator::strict().hydrate(&input, &object).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_immutable_hydrator_returns_copy() {
        let object = ObjectRef::new(Point { x: 1 });
        let hydrated = ImmutableHydrator
            .hydrate(&data(&[("x", Value::from(9))]), &object)
            .unwrap();

        assert!(!hydrated.ptr_eq(&object));
        assert_eq!(object.with(|p: &Point| p.x), Some(1));
        assert_eq!(hydrated.with(|p: &Point| p.x), Some(9));
    }
}
