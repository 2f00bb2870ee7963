//! Form Factory
//!
//! Builds elements, fieldsets, collections and forms from declarative
//! specs. Type names, hydrators, object classes and input filters resolve
//! through a [`TypeRegistry`].

mod registry;
mod spec;

pub use registry::{
    BUILTIN_ELEMENT_TYPES, ElementConstructor, HydratorConstructor, InputFilterConstructor,
    InputFilterFactory, ObjectConstructor, TypeRegistry,
};
pub use spec::{ElementSpec, HydratorSpec, InputFilterRef, NestedSpec};

use std::fmt;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::collection::Collection;
use crate::elements::Element;
use crate::error::{FormError, Result};
use crate::fieldset::{Fieldset, Member, ValidationGroup};
use crate::form::Form;
use crate::hydrator::HydratorRef;

/// Anything the factory can build
#[derive(Debug)]
pub enum Product {
    Element(Element),
    Fieldset(Fieldset),
    Collection(Collection),
    Form(Form),
}

impl Product {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Element(element) => element.name(),
            Self::Fieldset(fieldset) => fieldset.name(),
            Self::Collection(collection) => collection.name(),
            Self::Form(form) => form.name(),
        }
    }

    /// Convert into a member; a nested form keeps only its fieldset part
    pub fn into_member(self) -> Member {
        match self {
            Self::Element(element) => Member::Element(element),
            Self::Fieldset(fieldset) => Member::Fieldset(Box::new(fieldset)),
            Self::Collection(collection) => Member::Collection(Box::new(collection)),
            Self::Form(form) => Member::Fieldset(Box::new(form.into_fieldset())),
        }
    }

    pub fn into_element(self) -> Option<Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn into_fieldset(self) -> Option<Fieldset> {
        match self {
            Self::Fieldset(fieldset) => Some(fieldset),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn into_form(self) -> Option<Form> {
        match self {
            Self::Form(form) => Some(form),
            _ => None,
        }
    }

    fn kind_str(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Fieldset(_) => "fieldset",
            Self::Collection(_) => "collection",
            Self::Form(_) => "form",
        }
    }
}

/// Form factory
///
/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct Factory {
    registry: Rc<TypeRegistry>,
}

impl Default for Factory {
    fn default() -> Self {
        Self::new(TypeRegistry::with_builtins())
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").finish_non_exhaustive()
    }
}

impl Factory {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry: Rc::new(registry),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Build from a JSON value; anything but a map is an invalid argument
    pub fn create_from_value(&self, value: &JsonValue) -> Result<Product> {
        let spec = ElementSpec::from_value(value)?;
        self.create(&spec)
    }

    /// Build from JSON text
    pub fn create_from_json(&self, json: &str) -> Result<Product> {
        let value: JsonValue = serde_json::from_str(json)?;
        self.create_from_value(&value)
    }

    /// Build a product from a spec
    pub fn create(&self, spec: &ElementSpec) -> Result<Product> {
        let type_name = spec.type_name();
        let constructor = self
            .registry
            .element(type_name)
            .or_else(|| self.registry.element(&type_name.to_lowercase()))
            .ok_or_else(|| FormError::invalid(format!("unknown element type \"{type_name}\"")))?;

        let mut product = constructor();
        tracing::debug!(
            "factory creating {} \"{}\" from type \"{}\"",
            product.kind_str(),
            spec.name.as_deref().unwrap_or_default(),
            type_name
        );

        match &mut product {
            Product::Element(element) => self.configure_element(element, spec),
            Product::Fieldset(fieldset) => {
                self.prepare_container(fieldset, spec)?;
                fieldset.set_options(&spec.options)?;
                self.configure_fieldset(fieldset, spec)
            }
            Product::Collection(collection) => {
                self.prepare_container(collection, spec)?;
                collection.set_options(&spec.options)?;
                self.configure_collection(collection, spec)
            }
            Product::Form(form) => {
                self.prepare_container(form, spec)?;
                form.set_options(&spec.options)?;
                self.configure_form(form, spec)
            }
        }?;
        Ok(product)
    }

    /// Build a plain element
    pub fn create_element(&self, spec: &ElementSpec) -> Result<Element> {
        self.create(spec)?.into_element().ok_or_else(|| {
            FormError::invalid(format!("type \"{}\" does not build an element", spec.type_name()))
        })
    }

    pub fn create_fieldset(&self, spec: &ElementSpec) -> Result<Fieldset> {
        self.create(spec)?.into_fieldset().ok_or_else(|| {
            FormError::invalid(format!("type \"{}\" does not build a fieldset", spec.type_name()))
        })
    }

    pub fn create_collection(&self, spec: &ElementSpec) -> Result<Collection> {
        self.create(spec)?.into_collection().ok_or_else(|| {
            FormError::invalid(format!("type \"{}\" does not build a collection", spec.type_name()))
        })
    }

    pub fn create_form(&self, spec: &ElementSpec) -> Result<Form> {
        self.create(spec)?.into_form().ok_or_else(|| {
            FormError::invalid(format!("type \"{}\" does not build a form", spec.type_name()))
        })
    }

    fn configure_element(&self, element: &mut Element, spec: &ElementSpec) -> Result<()> {
        if let Some(name) = &spec.name {
            element.set_name(name.clone());
        }
        if !spec.options.is_empty() {
            element.set_options(spec.options.clone());
        }
        element.set_attributes(spec.attributes.clone());
        if !spec.elements.is_empty() || !spec.fieldsets.is_empty() {
            tracing::warn!(
                "nested members ignored for element \"{}\"",
                element.name().unwrap_or_default()
            );
        }
        Ok(())
    }

    /// Factory and name come first so options can build nested specs
    fn prepare_container(&self, fieldset: &mut Fieldset, spec: &ElementSpec) -> Result<()> {
        let factory = match &spec.factory {
            Some(name) => self
                .registry
                .factory(name)
                .cloned()
                .ok_or_else(|| FormError::invalid(format!("unknown factory \"{name}\"")))?,
            None => self.clone(),
        };
        fieldset.set_form_factory(factory);
        if let Some(name) = &spec.name {
            fieldset.set_name(name.clone());
        }
        Ok(())
    }

    fn configure_fieldset(&self, fieldset: &mut Fieldset, spec: &ElementSpec) -> Result<()> {
        fieldset.base_mut().set_attributes(spec.attributes.clone());
        if let Some(class) = &spec.object {
            let object = self.create_object(class)?;
            fieldset.set_object(object)?;
        }
        if let Some(hydrator) = &spec.hydrator {
            fieldset.set_hydrator_ref(self.create_hydrator(hydrator)?);
        }
        for nested in spec.elements.iter().chain(&spec.fieldsets) {
            fieldset.add_spec(&nested.spec, nested.flags.clone())?;
        }
        Ok(())
    }

    fn configure_collection(&self, collection: &mut Collection, spec: &ElementSpec) -> Result<()> {
        collection.base_mut().set_attributes(spec.attributes.clone());
        if let Some(class) = &spec.object {
            let object = self.create_object(class)?;
            collection.set_object(object)?;
        }
        if let Some(hydrator) = &spec.hydrator {
            collection.set_hydrator_ref(self.create_hydrator(hydrator)?);
        }
        for nested in spec.elements.iter().chain(&spec.fieldsets) {
            collection.add_spec(&nested.spec, nested.flags.clone())?;
        }
        Ok(())
    }

    fn configure_form(&self, form: &mut Form, spec: &ElementSpec) -> Result<()> {
        form.base_mut().set_attributes(spec.attributes.clone());
        if let Some(class) = &spec.object {
            let object = self.create_object(class)?;
            form.set_object(object)?;
        }
        if let Some(hydrator) = &spec.hydrator {
            form.set_hydrator_ref(self.create_hydrator(hydrator)?);
        }
        for nested in spec.elements.iter().chain(&spec.fieldsets) {
            form.add_spec(&nested.spec, nested.flags.clone())?;
        }

        match &spec.input_filter {
            Some(InputFilterRef::Name(name)) => {
                let constructor = self
                    .registry
                    .input_filter(name)
                    .ok_or_else(|| FormError::domain(format!("unknown input filter \"{name}\"")))?;
                form.set_input_filter(constructor());
            }
            Some(InputFilterRef::Spec(options)) => {
                let factory = self.registry.input_filter_factory().ok_or_else(|| {
                    FormError::invalid("input filter specification given but no input filter factory is set")
                })?;
                form.set_input_filter(factory.create_input_filter(options)?);
            }
            None => {}
        }
        if let Some(group) = &spec.validation_group {
            form.set_validation_group(ValidationGroup::try_from(group)?);
        }
        Ok(())
    }

    fn create_object(&self, class: &str) -> Result<crate::value::ObjectRef> {
        let constructor = self
            .registry
            .object(class)
            .ok_or_else(|| FormError::domain(format!("unknown object class \"{class}\"")))?;
        Ok(constructor())
    }

    fn create_hydrator(&self, spec: &HydratorSpec) -> Result<HydratorRef> {
        let empty = crate::elements::Options::new();
        let (name, options) = match spec {
            HydratorSpec::Name(name) => (name.as_str(), &empty),
            HydratorSpec::Spec { kind, options } => (kind.as_str(), options),
        };
        let constructor = self
            .registry
            .hydrator(name)
            .ok_or_else(|| FormError::domain(format!("unknown hydrator \"{name}\"")))?;
        constructor(options)
    }
}
