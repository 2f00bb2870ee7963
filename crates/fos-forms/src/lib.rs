//! fOS Forms - Form Object Model
//!
//! Element, fieldset, collection and form trees with two-way data binding:
//! populate from submitted data, bind to domain objects through hydrators,
//! extract back, and hand validation rules to an input filter.

mod attributes;
mod collection;
mod elements;
mod error;
mod factory;
mod fieldset;
mod form;
mod hydrator;
mod input_spec;
mod label;
mod messages;
mod priority_list;
mod submission;
mod value;

pub use attributes::{Attr, Attributes};
pub use collection::{Collection, CollectionOptions, DEFAULT_TEMPLATE_PLACEHOLDER};
pub use elements::{
    CheckboxOptions, DateOptions, Element, ElementKind, InputType, NumberOptions, NumericBounds,
    Options, SelectOptions, ValueOption, DEFAULT_DATE_FORMAT, EMAIL_PATTERN,
};
pub use error::{ErrorKind, FormError, Result};
pub use factory::{
    ElementConstructor, ElementSpec, Factory, HydratorConstructor, HydratorSpec,
    InputFilterConstructor, InputFilterFactory, InputFilterRef, NestedSpec, ObjectConstructor,
    Product, TypeRegistry, BUILTIN_ELEMENT_TYPES,
};
pub use fieldset::{AddFlags, Fieldset, Member, ValidationGroup};
pub use form::{
    prepare_bind_data, BindAs, Form, InputFilter, PassthroughFilter, ValidatedData, ValuesFlag,
};
pub use hydrator::{default_hydrator, Hydrator, HydratorRef, ImmutableHydrator, PropertyHydrator};
pub use input_spec::{
    FilterSpec, InputFilterProvider, InputFilterSpec, InputProvider, InputSpec, ValidatorSpec,
};
pub use label::{Label, LabelAware};
pub use messages::{MessageTree, Messages};
pub use priority_list::PriorityList;
pub use submission::{FormData, FormEnctype, FormMethod};
pub use value::{DomainObject, ObjectRef, Record, Value, ValueMap};
