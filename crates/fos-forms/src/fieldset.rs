//! Fieldset Implementation
//!
//! Ordered container of elements, nested fieldsets and collections, plus
//! the binding protocol that moves data between the tree and a bound
//! object.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::attributes::Attributes;
use crate::collection::Collection;
use crate::elements::{option_bool, option_string, Element, Options};
use crate::error::{FormError, Result};
use crate::factory::{ElementSpec, Factory};
use crate::hydrator::{default_hydrator, Hydrator, HydratorRef};
use crate::input_spec::{InputFilterProvider, InputFilterSpec, InputProvider, InputSpec};
use crate::label::{Label, LabelAware};
use crate::messages::{MessageTree, Messages};
use crate::priority_list::PriorityList;
use crate::value::{ObjectRef, Value, ValueMap};

/// Member of a container
#[derive(Debug, Clone)]
pub enum Member {
    Element(Element),
    Fieldset(Box<Fieldset>),
    Collection(Box<Collection>),
}

impl Member {
    pub fn name(&self) -> Option<&str> {
        self.base().name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.base_mut().set_name(name);
    }

    /// The element part shared by every member kind
    pub fn base(&self) -> &Element {
        match self {
            Self::Element(element) => element,
            Self::Fieldset(fieldset) => &fieldset.base,
            Self::Collection(collection) => &collection.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut Element {
        match self {
            Self::Element(element) => element,
            Self::Fieldset(fieldset) => &mut fieldset.base,
            Self::Collection(collection) => &mut collection.base,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Container view; collections are fieldsets too
    pub fn as_fieldset(&self) -> Option<&Fieldset> {
        match self {
            Self::Element(_) => None,
            Self::Fieldset(fieldset) => Some(fieldset),
            Self::Collection(collection) => Some(collection),
        }
    }

    pub fn as_fieldset_mut(&mut self) -> Option<&mut Fieldset> {
        match self {
            Self::Element(_) => None,
            Self::Fieldset(fieldset) => Some(fieldset),
            Self::Collection(collection) => Some(collection),
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn is_fieldset(&self) -> bool {
        !matches!(self, Self::Element(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    pub fn is_disabled(&self) -> bool {
        self.base().is_disabled()
    }

    /// Element value; containers carry no value of their own
    pub fn value(&self) -> Option<&Value> {
        self.as_element().and_then(Element::value)
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        match self {
            Self::Element(element) => element.set_value(value),
            other => tracing::warn!(
                "ignoring plain value set on container {}",
                other.name().unwrap_or_default()
            ),
        }
    }

    /// Route submitted data to this member
    pub fn populate(&mut self, value: &Value) -> Result<()> {
        match self {
            Self::Element(element) => {
                element.set_value(value.clone());
                Ok(())
            }
            Self::Fieldset(fieldset) => match value.to_keyed() {
                Some(data) => fieldset.populate_values(&data),
                None => {
                    tracing::warn!("ignoring scalar data for fieldset {}", fieldset.name().unwrap_or_default());
                    Ok(())
                }
            },
            Self::Collection(collection) => match value {
                Value::Null => collection.populate_values(&ValueMap::new()),
                other => match other.to_keyed() {
                    Some(data) => collection.populate_values(&data),
                    None => {
                        tracing::warn!("ignoring scalar data for collection {}", collection.name().unwrap_or_default());
                        Ok(())
                    }
                },
            },
        }
    }

    pub fn prepare_element(&mut self) -> Result<()> {
        match self {
            Self::Element(_) => Ok(()),
            Self::Fieldset(fieldset) => fieldset.prepare_element(),
            Self::Collection(collection) => collection.prepare_element(),
        }
    }

    /// Bind an object (fieldset) or a list/map of entries (collection)
    pub fn set_object(&mut self, object: Value) -> Result<()> {
        match self {
            Self::Element(element) => Err(FormError::invalid(format!(
                "element {} cannot bind an object",
                element.name().unwrap_or_default()
            ))),
            Self::Fieldset(fieldset) => fieldset.set_object(object),
            Self::Collection(collection) => collection.set_object(object),
        }
    }

    pub fn extract(&mut self) -> Result<Value> {
        match self {
            Self::Element(element) => Ok(element.value().cloned().unwrap_or_default()),
            Self::Fieldset(fieldset) => fieldset.extract().map(Value::Map),
            Self::Collection(collection) => collection.extract().map(Value::Map),
        }
    }

    pub fn allow_object_binding(&self, object: &Value) -> bool {
        match self {
            Self::Element(_) => false,
            Self::Fieldset(fieldset) => fieldset.allow_object_binding(object),
            Self::Collection(collection) => collection.allow_object_binding(object),
        }
    }

    pub fn allow_value_binding(&self) -> bool {
        match self {
            Self::Element(_) => false,
            Self::Fieldset(fieldset) => fieldset.allow_value_binding(),
            Self::Collection(collection) => collection.allow_value_binding(),
        }
    }

    /// Turn submitted values into the shape the parent hydrates with
    pub fn bind_values(&mut self, values: &Value, group: Option<&ValidationGroup>) -> Result<Value> {
        let data = values.to_keyed().unwrap_or_default();
        match self {
            Self::Element(_) => Ok(values.clone()),
            Self::Fieldset(fieldset) => Ok(fieldset.bind_values(&data, group)?.map(Value::Object).unwrap_or_default()),
            Self::Collection(collection) => collection.bind_values(&data, group).map(Value::List),
        }
    }

    pub fn set_options(&mut self, options: &Options) -> Result<()> {
        match self {
            Self::Element(element) => {
                element.set_options(options.clone());
                Ok(())
            }
            Self::Fieldset(fieldset) => fieldset.set_options(options),
            Self::Collection(collection) => collection.set_options(options),
        }
    }

    pub fn set_messages(&mut self, messages: Messages) {
        match (self, messages) {
            (Self::Element(element), Messages::List(list)) => element.set_messages(list),
            (Self::Element(element), Messages::Nested(tree)) => {
                element.set_messages(tree.into_values().flat_map(|m| m.as_list().to_vec()).collect())
            }
            (Self::Fieldset(fieldset), messages) => fieldset.set_member_messages(messages),
            (Self::Collection(collection), messages) => collection.set_member_messages(messages),
        }
    }

    /// Messages of this member, `None` when there are none
    pub fn messages(&self) -> Option<Messages> {
        let messages = match self {
            Self::Element(element) => Messages::List(element.messages().to_vec()),
            Self::Fieldset(fieldset) => fieldset.member_messages(),
            Self::Collection(collection) => collection.member_messages(),
        };
        (!messages.is_empty()).then_some(messages)
    }

    /// Validation rules for this member, keyed under `key`
    pub fn input_filter_spec(&self, key: &str) -> InputFilterSpec {
        match self {
            Self::Element(element) => {
                let mut spec = element
                    .input_specification()
                    .unwrap_or_else(|| InputSpec::optional(key));
                spec.name = Some(key.to_string());
                InputFilterSpec::Input(spec)
            }
            Self::Fieldset(fieldset) => fieldset.input_filter_spec(),
            Self::Collection(collection) => collection.input_filter_spec(),
        }
    }
}

impl From<Element> for Member {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Fieldset> for Member {
    fn from(fieldset: Fieldset) -> Self {
        Self::Fieldset(Box::new(fieldset))
    }
}

impl From<Collection> for Member {
    fn from(collection: Collection) -> Self {
        Self::Collection(Box::new(collection))
    }
}

/// Flags for [`Fieldset::add`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddFlags {
    /// Alias; renames the member when non-empty
    pub name: Option<String>,
    pub priority: i32,
}

impl AddFlags {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Subset of members to validate and bind
///
/// Each entry either selects a whole member (`None`) or narrows into a
/// nested container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationGroup(IndexMap<String, Option<ValidationGroup>>);

impl ValidationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a whole member
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), None);
        self
    }

    /// Narrow into a nested container
    pub fn with_group(mut self, name: impl Into<String>, group: ValidationGroup) -> Self {
        self.0.insert(name.into(), Some(group));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Nested group for `name`, if one narrows it
    pub fn subgroup(&self, name: &str) -> Option<&ValidationGroup> {
        self.0
            .get(name)
            .and_then(Option::as_ref)
            .filter(|group| !group.is_empty())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ValidationGroup>)> {
        self.0.iter().map(|(name, group)| (name.as_str(), group.as_ref()))
    }

    pub(crate) fn entry_mut(&mut self, name: &str) -> Option<&mut Option<ValidationGroup>> {
        self.0.get_mut(name)
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, group: Option<ValidationGroup>) {
        self.0.insert(name.into(), group);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.0.shift_remove(name);
    }

    /// Render as the JSON shape external filters understand
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(name, group)| {
                    let value = group.as_ref().map_or(JsonValue::Null, ValidationGroup::to_json);
                    (name.clone(), value)
                })
                .collect(),
        )
    }
}

impl<S: Into<String>> FromIterator<S> for ValidationGroup {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|name| (name.into(), None)).collect())
    }
}

impl From<Vec<&str>> for ValidationGroup {
    fn from(names: Vec<&str>) -> Self {
        names.into_iter().collect()
    }
}

impl TryFrom<&JsonValue> for ValidationGroup {
    type Error = FormError;

    /// Accepts `["a", {"nested": ["b"]}]` or `{"a": null, "nested": ["b"]}`
    fn try_from(value: &JsonValue) -> Result<Self> {
        let mut group = ValidationGroup::new();
        match value {
            JsonValue::Array(items) => {
                for item in items {
                    match item {
                        JsonValue::String(name) => group.insert(name.clone(), None),
                        JsonValue::Object(_) => group.0.extend(ValidationGroup::try_from(item)?.0),
                        other => {
                            return Err(FormError::invalid(format!("invalid validation group entry {other}")));
                        }
                    }
                }
            }
            JsonValue::Object(map) => {
                for (name, nested) in map {
                    let nested = match nested {
                        JsonValue::Null | JsonValue::Bool(true) => None,
                        other => Some(ValidationGroup::try_from(other)?),
                    };
                    group.insert(name.clone(), nested);
                }
            }
            other => {
                return Err(FormError::invalid(format!("validation group must be a list or a map, got {other}")));
            }
        }
        Ok(group)
    }
}

/// Fieldset
#[derive(Debug, Default)]
pub struct Fieldset {
    pub(crate) base: Element,
    pub(crate) iterator: PriorityList<Member>,
    pub(crate) object: Option<ObjectRef>,
    pub(crate) hydrator: Option<HydratorRef>,
    factory: Option<Factory>,
    use_as_base_fieldset: bool,
    allowed_object_binding_class: Option<String>,
    declared_inputs: IndexMap<String, InputSpec>,
    /// Keys of children already renamed under this fieldset's name
    prefixed: HashSet<String>,
}

impl Clone for Fieldset {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            iterator: self.iterator.clone(),
            object: self.object.as_ref().map(ObjectRef::deep_clone),
            hydrator: self.hydrator.clone(),
            factory: self.factory.clone(),
            use_as_base_fieldset: self.use_as_base_fieldset,
            allowed_object_binding_class: self.allowed_object_binding_class.clone(),
            declared_inputs: self.declared_inputs.clone(),
            prefixed: self.prefixed.clone(),
        }
    }
}

impl Fieldset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Element::new(name),
            ..Default::default()
        }
    }

    /// Builder: bind an object
    pub fn with_object(mut self, object: ObjectRef) -> Self {
        self.object = Some(object);
        self
    }

    /// Builder: add a member, failing when it has no usable name
    pub fn with(mut self, member: impl Into<Member>) -> Result<Self> {
        self.add(member, AddFlags::default())?;
        Ok(self)
    }

    pub fn name(&self) -> Option<&str> {
        self.base.name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.base.set_name(name);
    }

    /// The element part of this fieldset
    pub fn base(&self) -> &Element {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut Element {
        &mut self.base
    }

    pub fn attributes(&self) -> &Attributes {
        self.base.attributes()
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.base.set_attribute(key, value);
    }

    pub fn attribute(&self, key: &str) -> Option<&JsonValue> {
        self.base.attribute(key)
    }

    pub fn is_disabled(&self) -> bool {
        self.base.is_disabled()
    }

    /// Apply an options bag; recognizes `use_as_base_fieldset` and
    /// `allowed_object_binding_class`
    pub fn set_options(&mut self, options: &Options) -> Result<()> {
        self.base.set_options(options.clone());
        if options.contains_key("use_as_base_fieldset") {
            self.use_as_base_fieldset = option_bool(options, "use_as_base_fieldset", false);
        }
        if let Some(class) = option_string(options, "allowed_object_binding_class") {
            self.allowed_object_binding_class = Some(class);
        }
        Ok(())
    }

    pub fn options(&self) -> &Options {
        self.base.options()
    }

    pub fn use_as_base_fieldset(&self) -> bool {
        self.use_as_base_fieldset
    }

    pub fn set_use_as_base_fieldset(&mut self, flag: bool) {
        self.use_as_base_fieldset = flag;
    }

    pub fn allowed_object_binding_class(&self) -> Option<&str> {
        self.allowed_object_binding_class.as_deref()
    }

    pub fn set_allowed_object_binding_class(&mut self, class: impl Into<String>) {
        self.allowed_object_binding_class = Some(class.into());
    }

    /// Factory used to realize declarative member specs
    pub fn form_factory(&mut self) -> &Factory {
        self.factory.get_or_insert_with(Factory::default)
    }

    pub fn set_form_factory(&mut self, factory: Factory) {
        self.factory = Some(factory);
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Add a member.
    ///
    /// The member is stored under `flags.name` (renaming it) when given,
    /// otherwise under its own name. A member with neither is rejected.
    pub fn add(&mut self, member: impl Into<Member>, flags: AddFlags) -> Result<&mut Self> {
        let mut member = member.into();
        let name = match flags.name.filter(|n| !n.is_empty()) {
            Some(alias) => {
                member.set_name(alias.clone());
                alias
            }
            None => match member.name().filter(|n| !n.is_empty()) {
                Some(name) => name.to_string(),
                None => {
                    return Err(FormError::domain(format!(
                        "{} is unable to add an element without a name",
                        self.describe()
                    )));
                }
            },
        };
        tracing::trace!("{} add {} at priority {}", self.describe(), name, flags.priority);
        self.prefixed.remove(&name);
        self.iterator.insert(name, member, flags.priority);
        Ok(self)
    }

    /// Realize a declarative spec through the composed factory and add it
    pub fn add_spec(&mut self, spec: &ElementSpec, flags: AddFlags) -> Result<&mut Self> {
        let member = self.form_factory().create(spec)?.into_member();
        self.add(member, flags)
    }

    pub fn has(&self, name: &str) -> bool {
        self.iterator.contains(name)
    }

    pub fn get(&self, name: &str) -> Result<&Member> {
        self.iterator
            .get(name)
            .ok_or_else(|| FormError::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Member> {
        self.iterator
            .get_mut(name)
            .ok_or_else(|| FormError::NotFound(name.to_string()))
    }

    /// Remove a member; missing names are ignored
    pub fn remove(&mut self, name: &str) -> Option<Member> {
        self.prefixed.remove(name);
        self.iterator.remove(name)
    }

    /// Move a member without removing it
    pub fn set_priority(&mut self, name: &str, priority: i32) -> Result<()> {
        if self.iterator.set_priority(name, priority) {
            Ok(())
        } else {
            Err(FormError::NotFound(name.to_string()))
        }
    }

    pub fn len(&self) -> usize {
        self.iterator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterator.is_empty()
    }

    /// Members in priority order, keyed by the name they were added under
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.iterator.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Member)> {
        self.iterator.iter_mut()
    }

    pub fn names(&self) -> Vec<&str> {
        self.iterator.names().collect()
    }

    /// Leaf members only
    pub fn elements(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.iterator
            .iter()
            .filter_map(|(name, member)| member.as_element().map(|e| (name, e)))
    }

    /// Container members only, collections included
    pub fn fieldsets(&self) -> impl Iterator<Item = (&str, &Fieldset)> {
        self.iterator
            .iter()
            .filter_map(|(name, member)| member.as_fieldset().map(|f| (name, f)))
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    /// Rename every direct child to `parent[child]` and recurse.
    ///
    /// Children already renamed by an earlier call are left alone, so only
    /// members added since then pick up the prefix.
    pub fn prepare_element(&mut self) -> Result<()> {
        let parent = self.name().unwrap_or_default().to_string();
        for (key, member) in self.iterator.iter_mut() {
            if !parent.is_empty() && !self.prefixed.contains(key) {
                let child = member.name().unwrap_or(key).to_string();
                member.set_name(format!("{parent}[{child}]"));
                self.prefixed.insert(key.to_string());
            }
            member.prepare_element()?;
        }
        Ok(())
    }

    /// Prepare nested containers without renaming direct children
    pub(crate) fn prepare_children(&mut self) -> Result<()> {
        for (_, member) in self.iterator.iter_mut() {
            member.prepare_element()?;
        }
        Ok(())
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Push submitted data into the tree
    pub fn populate_values(&mut self, data: &ValueMap) -> Result<()> {
        for (name, member) in self.iterator.iter_mut() {
            let value = data.get(name);
            match (member, value) {
                (Member::Collection(collection), None | Some(Value::Null)) => {
                    collection.populate_values(&ValueMap::new())?;
                }
                (member, Some(value)) if member.is_fieldset() && value.is_keyed() => {
                    member.populate(value)?;
                }
                (member, Some(value)) => {
                    tracing::trace!("populate {}", name);
                    member.set_value(value.clone());
                }
                (_, None) => {}
            }
        }
        Ok(())
    }

    /// Bind an object
    pub fn set_object(&mut self, object: impl Into<Value>) -> Result<()> {
        match object.into() {
            Value::Object(object) => {
                self.object = Some(object);
                Ok(())
            }
            other => Err(FormError::invalid(format!(
                "{} expects an object to bind, got {}",
                self.describe(),
                other.to_json()
            ))),
        }
    }

    pub fn object(&self) -> Option<&ObjectRef> {
        self.object.as_ref()
    }

    /// Detach the bound object
    pub fn take_object(&mut self) -> Option<ObjectRef> {
        self.object.take()
    }

    pub fn set_hydrator(&mut self, hydrator: impl Hydrator + 'static) {
        self.hydrator = Some(Rc::new(hydrator));
    }

    pub fn set_hydrator_ref(&mut self, hydrator: HydratorRef) {
        self.hydrator = Some(hydrator);
    }

    /// Configured hydrator, or the default property hydrator
    pub fn hydrator(&self) -> HydratorRef {
        self.hydrator.clone().unwrap_or_else(default_hydrator)
    }

    pub fn has_hydrator(&self) -> bool {
        self.hydrator.is_some()
    }

    /// Whether `object` may be bound to this fieldset
    pub fn allow_object_binding(&self, object: &Value) -> bool {
        let Some(object) = object.as_object() else {
            return false;
        };
        let allowed = self
            .allowed_object_binding_class
            .as_deref()
            .is_some_and(|class| object.is_a(class));
        allowed
            || self
                .object
                .as_ref()
                .is_some_and(|bound| object.is_a(&bound.class_name()))
    }

    pub fn allow_value_binding(&self) -> bool {
        self.object.is_some()
    }

    /// Read the bound object into a map, descending into nested fieldsets
    /// and collections that accept the nested values
    pub fn extract(&mut self) -> Result<ValueMap> {
        let Some(object) = self.object.clone() else {
            return Ok(ValueMap::new());
        };
        let mut values = self.hydrator().extract(&object)?;
        for (name, member) in self.iterator.iter_mut() {
            if !member.is_fieldset() {
                continue;
            }
            let Some(nested) = values.get(name).filter(|v| !v.is_null()).cloned() else {
                continue;
            };
            if member.allow_object_binding(&nested) {
                member.set_object(nested)?;
                let extracted = member.extract()?;
                values.insert(name.to_string(), extracted);
            }
        }
        Ok(values)
    }

    /// Hydrate the bound object from validated values.
    ///
    /// Returns the bound object afterwards, which the hydrator may have
    /// replaced.
    pub fn bind_values(&mut self, values: &ValueMap, group: Option<&ValidationGroup>) -> Result<Option<ObjectRef>> {
        let object_data = self.extract()?;
        let group = group.filter(|g| !g.is_empty());
        let mut hydratable = ValueMap::new();

        for (name, member) in self.iterator.iter_mut() {
            if group.is_some_and(|g| !g.contains(name)) {
                continue;
            }
            let value = match values.get(name) {
                Some(value) => value.clone(),
                None if member.is_collection() => Value::List(Vec::new()),
                None => continue,
            };
            let value = if member.is_fieldset() && member.allow_value_binding() {
                member.bind_values(&value, group.and_then(|g| g.subgroup(name)))?
            } else {
                value
            };

            if !member.is_disabled() {
                hydratable.insert(name.to_string(), value);
            } else if let Some(previous) = object_data.get(name) {
                hydratable.insert(name.to_string(), previous.clone());
            }
        }

        if let Some(object) = self.object.clone() {
            if !hydratable.is_empty() {
                tracing::trace!("{} hydrate {} values", self.describe(), hydratable.len());
                self.object = Some(self.hydrator().hydrate(&hydratable, &object)?);
            }
        }
        Ok(self.object.clone())
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Distribute messages to members; unknown names are skipped
    pub fn set_messages(&mut self, messages: MessageTree) {
        for (name, messages) in messages {
            if let Some(member) = self.iterator.get_mut(&name) {
                member.set_messages(messages);
            }
        }
    }

    pub(crate) fn set_member_messages(&mut self, messages: Messages) {
        match messages {
            Messages::Nested(tree) => self.set_messages(tree),
            Messages::List(list) => self.base.set_messages(list),
        }
    }

    /// Gather messages from every member that has some
    pub fn messages(&self) -> MessageTree {
        self.iterator
            .iter()
            .filter_map(|(name, member)| member.messages().map(|m| (name.to_string(), m)))
            .collect()
    }

    pub(crate) fn member_messages(&self) -> Messages {
        let tree = self.messages();
        if tree.is_empty() && !self.base.messages().is_empty() {
            Messages::List(self.base.messages().to_vec())
        } else {
            Messages::Nested(tree)
        }
    }

    /// Messages of one member
    pub fn messages_for(&self, name: &str) -> Result<Messages> {
        let member = self.get(name)?;
        Ok(member.messages().unwrap_or(Messages::List(Vec::new())))
    }

    // ========================================================================
    // Validation specification
    // ========================================================================

    /// Declare per-field rules that override what members provide
    pub fn set_input_filter_specification(&mut self, inputs: IndexMap<String, InputSpec>) {
        self.declared_inputs = inputs;
    }

    /// Validation tree for this fieldset
    pub fn input_filter_spec(&self) -> InputFilterSpec {
        let mut inputs: IndexMap<String, InputFilterSpec> = self
            .iterator
            .iter()
            .map(|(name, member)| (name.to_string(), member.input_filter_spec(name)))
            .collect();
        for (name, spec) in &self.declared_inputs {
            let mut spec = spec.clone();
            spec.name.get_or_insert_with(|| name.clone());
            inputs.insert(name.clone(), InputFilterSpec::Input(spec));
        }
        InputFilterSpec::Group { inputs }
    }

    fn describe(&self) -> String {
        format!("fieldset \"{}\"", self.name().unwrap_or_default())
    }
}

impl LabelAware for Fieldset {
    fn label_state(&self) -> &Label {
        self.base.label_state()
    }

    fn label_state_mut(&mut self) -> &mut Label {
        self.base.label_state_mut()
    }
}

impl InputFilterProvider for Fieldset {
    fn input_filter_specification(&self) -> IndexMap<String, InputSpec> {
        self.declared_inputs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::Record;
    use serde_json::json;

    fn map(value: JsonValue) -> ValueMap {
        Value::from(value).to_keyed().unwrap()
    }

    fn address() -> Fieldset {
        Fieldset::new("address")
            .with(Element::text("street"))
            .unwrap()
            .with(Element::text("city"))
            .unwrap()
    }

    #[test]
    fn test_add_requires_name() {
        let mut fieldset = Fieldset::new("user");
        let err = fieldset.add(Element::unnamed(Default::default()), AddFlags::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert!(fieldset.is_empty());
    }

    #[test]
    fn test_alias_renames_member() {
        let mut fieldset = Fieldset::new("user");
        fieldset.add(Element::text("a"), AddFlags::named("b")).unwrap();
        assert!(!fieldset.has("a"));
        assert_eq!(fieldset.get("b").unwrap().name(), Some("b"));
    }

    #[test]
    fn test_alias_double_add_keeps_both() {
        let mut fieldset = Fieldset::new("user");
        let element = Element::text("email");
        fieldset.add(element.clone(), AddFlags::default()).unwrap();
        fieldset.add(element, AddFlags::named("email_confirm")).unwrap();

        assert_eq!(fieldset.names(), vec!["email", "email_confirm"]);
        assert_eq!(fieldset.get("email").unwrap().name(), Some("email"));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let fieldset = Fieldset::new("user");
        assert_eq!(fieldset.get("nope").unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!fieldset.has("nope"));
    }

    #[test]
    fn test_priority_order() {
        let mut fieldset = Fieldset::new("user");
        fieldset.add(Element::text("a"), AddFlags::default()).unwrap();
        fieldset.add(Element::text("b"), AddFlags::default().with_priority(10)).unwrap();
        fieldset.add(Element::text("c"), AddFlags::default()).unwrap();
        assert_eq!(fieldset.names(), vec!["b", "a", "c"]);

        fieldset.set_priority("c", 20).unwrap();
        assert_eq!(fieldset.names(), vec!["c", "b", "a"]);
        assert!(fieldset.set_priority("zzz", 1).is_err());
    }

    #[test]
    fn test_prepare_element_renames_once() {
        let mut fieldset = Fieldset::new("user");
        fieldset.add(address(), AddFlags::default()).unwrap();
        fieldset.add(Element::text("name"), AddFlags::default()).unwrap();

        fieldset.prepare_element().unwrap();
        fieldset.prepare_element().unwrap();

        assert_eq!(fieldset.get("name").unwrap().name(), Some("user[name]"));
        let nested = fieldset.get("address").unwrap().as_fieldset().unwrap();
        assert_eq!(nested.name(), Some("user[address]"));
        assert_eq!(nested.get("city").unwrap().name(), Some("user[address][city]"));
    }

    #[test]
    fn test_populate_values() {
        let mut fieldset = Fieldset::new("user");
        fieldset.add(Element::text("name"), AddFlags::default()).unwrap();
        fieldset.add(address(), AddFlags::default()).unwrap();

        fieldset
            .populate_values(&map(json!({"name": "Ada", "address": {"city": "London"}, "extra": 1})))
            .unwrap();

        assert_eq!(fieldset.get("name").unwrap().value(), Some(&Value::from("Ada")));
        let city = fieldset.get("address").unwrap().as_fieldset().unwrap().get("city").unwrap();
        assert_eq!(city.value(), Some(&Value::from("London")));
    }

    #[test]
    fn test_extract_and_bind() {
        let user = Record::new("User").with_field("name", "Ada").into_ref();
        let mut fieldset = Fieldset::new("user").with_object(user.clone());
        fieldset.add(Element::text("name"), AddFlags::default()).unwrap();

        let extracted = fieldset.extract().unwrap();
        assert_eq!(extracted.get("name"), Some(&Value::from("Ada")));

        let bound = fieldset.bind_values(&map(json!({"name": "Grace"})), None).unwrap().unwrap();
        assert!(bound.ptr_eq(&user));
        assert_eq!(user.with(|r: &Record| r.get("name").cloned()).flatten(), Some(Value::from("Grace")));
    }

    #[test]
    fn test_bind_skips_members_outside_group() {
        let user = Record::new("User").with_field("name", "Ada").with_field("role", "admin").into_ref();
        let mut fieldset = Fieldset::new("user").with_object(user.clone());
        fieldset.add(Element::text("name"), AddFlags::default()).unwrap();
        fieldset.add(Element::text("role"), AddFlags::default()).unwrap();

        let group = ValidationGroup::from(vec!["name"]);
        fieldset
            .bind_values(&map(json!({"name": "Grace", "role": "root"})), Some(&group))
            .unwrap();

        let role = user.with(|r: &Record| r.get("role").cloned()).flatten();
        assert_eq!(role, Some(Value::from("admin")));
    }

    #[test]
    fn test_disabled_element_keeps_object_value() {
        let user = Record::new("User").with_field("id", 7).into_ref();
        let mut fieldset = Fieldset::new("user").with_object(user.clone());
        let mut id = Element::hidden("id");
        id.set_attribute("disabled", true);
        fieldset.add(id, AddFlags::default()).unwrap();

        fieldset.bind_values(&map(json!({"id": 99})), None).unwrap();
        let id = user.with(|r: &Record| r.get("id").cloned()).flatten();
        assert_eq!(id, Some(Value::from(7)));
    }

    #[test]
    fn test_set_object_rejects_scalars() {
        let mut fieldset = Fieldset::new("user");
        let err = fieldset.set_object(Value::from("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_allow_object_binding() {
        let mut fieldset = Fieldset::new("address");
        let candidate = Value::from(Record::new("Address").into_ref());
        assert!(!fieldset.allow_object_binding(&candidate));

        fieldset.set_allowed_object_binding_class("Address");
        assert!(fieldset.allow_object_binding(&candidate));
        assert!(!fieldset.allow_value_binding());
    }

    #[test]
    fn test_clone_deep_copies_object() {
        let original = Fieldset::new("user").with_object(Record::new("User").into_ref());
        let copy = original.clone();
        assert!(!copy.object().unwrap().ptr_eq(original.object().unwrap()));
    }

    #[test]
    fn test_messages_roundtrip() {
        let mut fieldset = Fieldset::new("user");
        fieldset.add(Element::email("email"), AddFlags::default()).unwrap();
        fieldset.add(address(), AddFlags::default()).unwrap();

        let tree: MessageTree = serde_json::from_value(json!({
            "email": ["Invalid"],
            "address": {"city": ["Required"]},
            "ghost": ["skipped"]
        }))
        .unwrap();
        fieldset.set_messages(tree);

        let gathered = fieldset.messages();
        assert_eq!(gathered.len(), 2);
        assert_eq!(fieldset.messages_for("email").unwrap().as_list(), ["Invalid"]);
        assert!(fieldset.messages_for("ghost").is_err());
    }

    #[test]
    fn test_validation_group_from_json() {
        let group = ValidationGroup::try_from(&json!(["name", {"address": ["city"]}])).unwrap();
        assert!(group.contains("name"));
        assert!(group.subgroup("name").is_none());
        assert!(group.subgroup("address").unwrap().contains("city"));
        assert!(ValidationGroup::try_from(&json!(3)).is_err());
    }

    #[test]
    fn test_input_filter_spec() {
        let mut fieldset = Fieldset::new("user");
        fieldset.add(Element::text("name"), AddFlags::default()).unwrap();
        fieldset.add(Element::email("email"), AddFlags::default()).unwrap();
        fieldset.add(address(), AddFlags::default()).unwrap();

        let spec = fieldset.input_filter_spec();
        let name = spec.get("name").and_then(InputFilterSpec::as_input).unwrap();
        assert!(!name.required);
        let email = spec.get("email").and_then(InputFilterSpec::as_input).unwrap();
        assert!(email.required);
        assert!(spec.find(&["address", "city"]).is_some());
    }

    #[test]
    fn test_declared_inputs_override() {
        let mut fieldset = Fieldset::new("user");
        fieldset.add(Element::text("name"), AddFlags::default()).unwrap();
        let mut inputs = IndexMap::new();
        inputs.insert("name".to_string(), InputSpec::default().required(true));
        fieldset.set_input_filter_specification(inputs);

        let spec = fieldset.input_filter_spec();
        let name = spec.get("name").and_then(InputFilterSpec::as_input).unwrap();
        assert!(name.required);
        assert_eq!(name.name.as_deref(), Some("name"));
        assert_eq!(fieldset.input_filter_specification().len(), 1);
    }
}
