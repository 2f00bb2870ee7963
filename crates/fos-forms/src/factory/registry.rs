//! Type Registry
//!
//! Named constructors for element types, hydrators, domain objects and
//! input filters, plus named sub-factories.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{Factory, Product};
use crate::collection::Collection;
use crate::elements::{Element, ElementKind, Options};
use crate::error::{FormError, Result};
use crate::fieldset::Fieldset;
use crate::form::{Form, InputFilter};
use crate::hydrator::{HydratorRef, ImmutableHydrator, PropertyHydrator};
use crate::value::ObjectRef;

pub type ElementConstructor = Rc<dyn Fn() -> Product>;
pub type HydratorConstructor = Rc<dyn Fn(&Options) -> Result<HydratorRef>>;
pub type ObjectConstructor = Rc<dyn Fn() -> ObjectRef>;
pub type InputFilterConstructor = Rc<dyn Fn() -> Box<dyn InputFilter>>;

/// Builds input filters from declarative specs
pub trait InputFilterFactory {
    fn create_input_filter(&self, spec: &Options) -> Result<Box<dyn InputFilter>>;
}

/// Element types resolved without registration
pub const BUILTIN_ELEMENT_TYPES: [&str; 17] = [
    "element", "text", "password", "hidden", "textarea", "search", "tel", "url", "color",
    "button", "submit", "email", "number", "range", "checkbox", "select", "date",
];

/// Registry of named constructors
#[derive(Default)]
pub struct TypeRegistry {
    elements: HashMap<String, ElementConstructor>,
    hydrators: HashMap<String, HydratorConstructor>,
    objects: HashMap<String, ObjectConstructor>,
    input_filters: HashMap<String, InputFilterConstructor>,
    input_filter_factory: Option<Rc<dyn InputFilterFactory>>,
    factories: HashMap<String, Factory>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut elements: Vec<_> = self.elements.keys().collect();
        elements.sort();
        let mut hydrators: Vec<_> = self.hydrators.keys().collect();
        hydrators.sort();
        let mut objects: Vec<_> = self.objects.keys().collect();
        objects.sort();
        f.debug_struct("TypeRegistry")
            .field("elements", &elements)
            .field("hydrators", &hydrators)
            .field("objects", &objects)
            .field("input_filters", &self.input_filters.len())
            .field("input_filter_factory", &self.input_filter_factory.is_some())
            .field("factories", &self.factories.len())
            .finish()
    }
}

impl TypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in element type, `fieldset`, `collection`,
    /// `form`, and the `property`/`immutable` hydrators
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for name in BUILTIN_ELEMENT_TYPES {
            if let Some(kind) = ElementKind::from_type(name) {
                registry
                    .elements
                    .insert(name.to_string(), Rc::new(move || Product::Element(Element::unnamed(kind.clone()))));
            }
        }
        registry
            .elements
            .insert("fieldset".into(), Rc::new(|| Product::Fieldset(Fieldset::default())));
        registry
            .elements
            .insert("collection".into(), Rc::new(|| Product::Collection(Collection::default())));
        registry
            .elements
            .insert("form".into(), Rc::new(|| Product::Form(Form::default())));
        registry.hydrators.insert(
            "property".into(),
            Rc::new(|options: &Options| -> Result<HydratorRef> {
                Ok(Rc::new(PropertyHydrator::from_options(options)))
            }),
        );
        registry.hydrators.insert(
            "immutable".into(),
            Rc::new(|_: &Options| -> Result<HydratorRef> { Ok(Rc::new(ImmutableHydrator)) }),
        );
        registry
    }

    /// Type names must be non-empty and start with a lowercase letter
    pub fn is_valid_name(name: &str) -> bool {
        name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    fn check_name<T>(map: &HashMap<String, T>, name: &str, what: &str) -> Result<()> {
        if !Self::is_valid_name(name) {
            return Err(FormError::invalid(format!("invalid {what} name \"{name}\"")));
        }
        if map.contains_key(name) {
            return Err(FormError::domain(format!("{what} \"{name}\" is already defined")));
        }
        Ok(())
    }

    /// Define an element type
    pub fn define_element(&mut self, name: &str, constructor: impl Fn() -> Product + 'static) -> Result<()> {
        Self::check_name(&self.elements, name, "element type")?;
        self.elements.insert(name.to_string(), Rc::new(constructor));
        Ok(())
    }

    pub fn define_hydrator(
        &mut self,
        name: &str,
        constructor: impl Fn(&Options) -> Result<HydratorRef> + 'static,
    ) -> Result<()> {
        Self::check_name(&self.hydrators, name, "hydrator")?;
        self.hydrators.insert(name.to_string(), Rc::new(constructor));
        Ok(())
    }

    /// Define a domain object class; class names may be capitalized
    pub fn define_object(&mut self, class: &str, constructor: impl Fn() -> ObjectRef + 'static) -> Result<()> {
        if class.is_empty() {
            return Err(FormError::invalid("object class name must not be empty"));
        }
        if self.objects.contains_key(class) {
            return Err(FormError::domain(format!("object class \"{class}\" is already defined")));
        }
        self.objects.insert(class.to_string(), Rc::new(constructor));
        Ok(())
    }

    pub fn define_input_filter(
        &mut self,
        name: &str,
        constructor: impl Fn() -> Box<dyn InputFilter> + 'static,
    ) -> Result<()> {
        Self::check_name(&self.input_filters, name, "input filter")?;
        self.input_filters.insert(name.to_string(), Rc::new(constructor));
        Ok(())
    }

    /// Define a named sub-factory for specs that select one
    pub fn define_factory(&mut self, name: &str, factory: Factory) -> Result<()> {
        Self::check_name(&self.factories, name, "factory")?;
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    pub fn set_input_filter_factory(&mut self, factory: impl InputFilterFactory + 'static) {
        self.input_filter_factory = Some(Rc::new(factory));
    }

    /// Check if an element type is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    pub fn element(&self, name: &str) -> Option<&ElementConstructor> {
        self.elements.get(name)
    }

    pub fn hydrator(&self, name: &str) -> Option<&HydratorConstructor> {
        self.hydrators.get(name)
    }

    pub fn object(&self, class: &str) -> Option<&ObjectConstructor> {
        self.objects.get(class)
    }

    pub fn input_filter(&self, name: &str) -> Option<&InputFilterConstructor> {
        self.input_filters.get(name)
    }

    pub fn input_filter_factory(&self) -> Option<&dyn InputFilterFactory> {
        self.input_filter_factory.as_deref()
    }

    pub fn factory(&self, name: &str) -> Option<&Factory> {
        self.factories.get(name)
    }
}
