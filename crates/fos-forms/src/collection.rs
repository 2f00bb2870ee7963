//! Collection Implementation
//!
//! A fieldset holding a variable number of clones of one target element,
//! bound to a variable number of entries (objects or scalars).

use std::ops::{Deref, DerefMut};

use serde_json::Value as JsonValue;

use crate::elements::{option_bool, option_i64, option_string, Options};
use crate::error::{FormError, Result};
use crate::fieldset::{AddFlags, Fieldset, Member, ValidationGroup};
use crate::input_spec::InputFilterSpec;
use crate::value::{deep_clone_map, Value, ValueMap};

/// Name under which the template instance is rendered
pub const DEFAULT_TEMPLATE_PLACEHOLDER: &str = "__index__";

/// Collection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Entries created on prepare when nothing was populated
    pub count: usize,
    pub allow_add: bool,
    pub allow_remove: bool,
    /// Bind fresh clones instead of reusing previously bound entries
    pub create_new_objects: bool,
    pub should_create_template: bool,
    pub template_placeholder: String,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            count: 1,
            allow_add: true,
            allow_remove: true,
            create_new_objects: false,
            should_create_template: false,
            template_placeholder: DEFAULT_TEMPLATE_PLACEHOLDER.to_string(),
        }
    }
}

impl CollectionOptions {
    /// Override the keys present in `options`; negative counts clamp to zero
    pub fn apply(&mut self, options: &Options) {
        if let Some(count) = option_i64(options, "count") {
            self.count = usize::try_from(count).unwrap_or(0);
        }
        self.allow_add = option_bool(options, "allow_add", self.allow_add);
        self.allow_remove = option_bool(options, "allow_remove", self.allow_remove);
        self.create_new_objects = option_bool(options, "create_new_objects", self.create_new_objects);
        self.should_create_template =
            option_bool(options, "should_create_template", self.should_create_template);
        if let Some(placeholder) = option_string(options, "template_placeholder") {
            self.template_placeholder = placeholder;
        }
    }
}

/// Collection
#[derive(Debug)]
pub struct Collection {
    fieldset: Fieldset,
    target_element: Option<Member>,
    config: CollectionOptions,
    template: Option<Member>,
    template_prepared: bool,
    /// Bound entries keyed like the live children
    object: Option<ValueMap>,
    last_child_index: Option<usize>,
    create_children_on_prepare: bool,
}

impl Clone for Collection {
    fn clone(&self) -> Self {
        Self {
            fieldset: self.fieldset.clone(),
            target_element: self.target_element.clone(),
            config: self.config.clone(),
            template: self.template.clone(),
            template_prepared: self.template_prepared,
            object: self.object.as_ref().map(deep_clone_map),
            last_child_index: self.last_child_index,
            create_children_on_prepare: self.create_children_on_prepare,
        }
    }
}

impl Deref for Collection {
    type Target = Fieldset;

    fn deref(&self) -> &Fieldset {
        &self.fieldset
    }
}

impl DerefMut for Collection {
    fn deref_mut(&mut self) -> &mut Fieldset {
        &mut self.fieldset
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self {
            fieldset: Fieldset::default(),
            target_element: None,
            config: CollectionOptions::default(),
            template: None,
            template_prepared: false,
            object: None,
            last_child_index: None,
            create_children_on_prepare: true,
        }
    }
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        let mut collection = Self::default();
        collection.set_name(name);
        collection
    }

    /// Builder: set the target element
    pub fn with_target_element(mut self, target: impl Into<Member>) -> Self {
        self.set_target_element(target);
        self
    }

    /// Builder: replace the configuration
    pub fn with_options(mut self, config: CollectionOptions) -> Self {
        self.config = config;
        self
    }

    pub fn set_target_element(&mut self, target: impl Into<Member>) {
        self.target_element = Some(target.into());
        self.template = None;
        self.template_prepared = false;
    }

    /// Build the target element from a declarative spec
    pub fn set_target_element_spec(&mut self, spec: &JsonValue) -> Result<()> {
        if !spec.is_object() {
            return Err(FormError::invalid(format!(
                "{} requires target_element to be an element specification, got {}",
                self.describe(),
                spec
            )));
        }
        let target = self.fieldset.form_factory().create_from_value(spec)?.into_member();
        self.set_target_element(target);
        Ok(())
    }

    pub fn target_element(&self) -> Option<&Member> {
        self.target_element.as_ref()
    }

    pub fn config(&self) -> &CollectionOptions {
        &self.config
    }

    /// Apply an options bag, collection keys included
    pub fn set_options(&mut self, options: &Options) -> Result<()> {
        self.fieldset.set_options(options)?;
        self.config.apply(options);
        if let Some(spec) = options.get("target_element") {
            self.set_target_element_spec(spec)?;
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.config.count
    }

    pub fn set_count(&mut self, count: usize) {
        self.config.count = count;
    }

    pub fn allow_add(&self) -> bool {
        self.config.allow_add
    }

    pub fn set_allow_add(&mut self, allow: bool) {
        self.config.allow_add = allow;
    }

    pub fn allow_remove(&self) -> bool {
        self.config.allow_remove
    }

    pub fn set_allow_remove(&mut self, allow: bool) {
        self.config.allow_remove = allow;
    }

    pub fn create_new_objects(&self) -> bool {
        self.config.create_new_objects
    }

    pub fn set_create_new_objects(&mut self, create: bool) {
        self.config.create_new_objects = create;
    }

    pub fn should_create_template(&self) -> bool {
        self.config.should_create_template
    }

    pub fn set_should_create_template(&mut self, create: bool) {
        self.config.should_create_template = create;
    }

    pub fn template_placeholder(&self) -> &str {
        &self.config.template_placeholder
    }

    pub fn set_template_placeholder(&mut self, placeholder: impl Into<String>) {
        self.config.template_placeholder = placeholder.into();
        self.template = None;
        self.template_prepared = false;
    }

    /// Highest integer key handed out so far
    pub fn last_child_index(&self) -> Option<usize> {
        self.last_child_index
    }

    /// Bind a list or map of entries; `count` grows to cover them
    pub fn set_object(&mut self, object: impl Into<Value>) -> Result<()> {
        let object = object.into();
        let Some(entries) = object.to_keyed() else {
            return Err(FormError::invalid(format!(
                "{} expects a list or a map of entries, got {}",
                self.describe(),
                object.to_json()
            )));
        };
        self.config.count = self.config.count.max(entries.len());
        self.object = Some(entries);
        Ok(())
    }

    /// Bound entries
    pub fn entries(&self) -> Option<&ValueMap> {
        self.object.as_ref()
    }

    pub fn allow_object_binding(&self, object: &Value) -> bool {
        object.is_keyed()
    }

    pub fn allow_value_binding(&self) -> bool {
        true
    }

    // ========================================================================
    // Population
    // ========================================================================

    /// Reconcile the live children with submitted entries.
    ///
    /// Every add/remove policy check runs before the first mutation, so a
    /// rejected submission leaves the children untouched.
    pub fn populate_values(&mut self, data: &ValueMap) -> Result<()> {
        if !self.config.allow_remove && data.len() < self.config.count {
            return Err(FormError::domain(format!(
                "There are fewer elements than specified in the collection ({}). Either set the allow_remove option to true, or re-submit the form.",
                self.describe()
            )));
        }

        let to_remove: Vec<String> = self
            .fieldset
            .names()
            .into_iter()
            .filter(|name| !data.contains_key(*name))
            .map(str::to_string)
            .collect();
        if !self.config.allow_remove && !to_remove.is_empty() {
            return Err(FormError::domain(format!(
                "Elements have been removed from the collection ({}) but the allow_remove option is not true.",
                self.describe()
            )));
        }

        let additions = match self.target_element {
            Some(_) => data.keys().filter(|key| !self.fieldset.has(key)).count(),
            None => 0,
        };
        if !self.config.allow_add
            && additions > 0
            && self.fieldset.len() - to_remove.len() + additions > self.config.count
        {
            return Err(self.too_many());
        }

        for name in &to_remove {
            self.fieldset.remove(name);
        }
        if !to_remove.is_empty() {
            tracing::debug!("{} removed {} entries", self.describe(), to_remove.len());
        }

        for (key, value) in data {
            if !self.fieldset.has(key) {
                if self.target_element.is_none() {
                    tracing::warn!("{} has no target element for entry {}", self.describe(), key);
                    continue;
                }
                self.add_new_target_element_instance(key)?;
                if let Ok(index) = key.parse::<usize>() {
                    if self.last_child_index.is_none_or(|last| index > last) {
                        self.last_child_index = Some(index);
                    }
                }
            }
            self.fieldset.get_mut(key)?.populate(value)?;
        }
        if additions > 0 {
            tracing::debug!("{} grew by {} entries", self.describe(), additions);
        }

        if !self.config.create_new_objects {
            self.replace_template_objects()?;
        }
        self.create_children_on_prepare = false;
        Ok(())
    }

    /// Put the bound entries back onto the live children that match them
    fn replace_template_objects(&mut self) -> Result<()> {
        let Some(objects) = &self.object else {
            return Ok(());
        };
        for (key, member) in self.fieldset.iterator.iter_mut() {
            let Some(entry) = objects.get(key) else {
                continue;
            };
            let accepts = match member {
                Member::Fieldset(_) => entry.as_object().is_some(),
                Member::Collection(_) => entry.is_keyed(),
                Member::Element(_) => false,
            };
            if accepts {
                member.set_object(entry.clone())?;
            }
        }
        Ok(())
    }

    /// Clone the target element under `name` and add it
    pub fn add_new_target_element_instance(&mut self, name: &str) -> Result<&mut Member> {
        self.create_children_on_prepare = false;
        if !self.config.allow_add && self.fieldset.len() + 1 > self.config.count {
            return Err(self.too_many());
        }
        let mut instance = self.create_new_target_element_instance()?;
        instance.set_name(name);
        self.fieldset.add(instance, AddFlags::default())?;
        self.fieldset.get_mut(name)
    }

    fn create_new_target_element_instance(&self) -> Result<Member> {
        self.target_element
            .clone()
            .ok_or_else(|| FormError::domain(format!("{} has no target element", self.describe())))
    }

    fn too_many(&self) -> FormError {
        FormError::domain(format!(
            "There are more elements than specified in the collection ({}). Either set the allow_add option to true, or re-submit the form.",
            self.describe()
        ))
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    /// Grow to `count` entries unless populated, prepare the template, then
    /// rename children like any fieldset
    pub fn prepare_element(&mut self) -> Result<()> {
        if self.create_children_on_prepare && self.target_element.is_some() && self.config.count > 0 {
            let before = self.fieldset.len();
            while self.config.count > self.next_index() {
                let index = self.next_index();
                self.last_child_index = Some(index);
                self.add_new_target_element_instance(&index.to_string())?;
            }
            tracing::debug!("{} created {} entries", self.describe(), self.fieldset.len() - before);
        }

        let template = if self.config.should_create_template && !self.template_prepared {
            self.template.take().or_else(|| self.build_template())
        } else {
            None
        };
        let with_template = template.is_some();
        if let Some(template) = template {
            self.fieldset.add(template, AddFlags::default())?;
        }

        self.fieldset.prepare_element()?;

        if with_template {
            let placeholder = self.config.template_placeholder.clone();
            self.template = self.fieldset.remove(&placeholder);
            self.template_prepared = true;
            tracing::debug!("{} materialized template {}", self.describe(), placeholder);
        }
        Ok(())
    }

    fn next_index(&self) -> usize {
        self.last_child_index.map_or(0, |last| last + 1)
    }

    fn build_template(&self) -> Option<Member> {
        let mut template = self.target_element.clone()?;
        template.set_name(self.config.template_placeholder.clone());
        Some(template)
    }

    /// Template instance, built on first use; never a live child
    pub fn template_element(&mut self) -> Option<&Member> {
        if self.template.is_none() {
            self.template = self.build_template();
        }
        self.template.as_ref()
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Extract every bound entry through the target element
    pub fn extract(&mut self) -> Result<ValueMap> {
        let Some(entries) = self.object.clone() else {
            return Ok(ValueMap::new());
        };
        let mut values = ValueMap::new();

        for (key, entry) in entries {
            if let Some(hydrator) = self.fieldset.hydrator.clone() {
                match entry.as_object() {
                    Some(object) => {
                        values.insert(key, Value::Map(hydrator.extract(object)?));
                    }
                    None => tracing::warn!("{} skipped non-object entry {}", self.describe(), key),
                }
                continue;
            }

            match &self.target_element {
                Some(target) if target.is_fieldset() => {
                    if !target.allow_object_binding(&entry) {
                        continue;
                    }
                    let mut instance = target.clone();
                    instance.set_object(entry.clone())?;
                    values.insert(key.clone(), instance.extract()?);
                    if !self.config.create_new_objects {
                        if let Some(live) = self.fieldset.iterator.get_mut(&key) {
                            live.set_object(entry)?;
                        }
                    }
                }
                Some(_) => {
                    values.insert(key.clone(), entry.clone());
                    if !self.config.create_new_objects {
                        if let Some(live) = self.fieldset.iterator.get_mut(&key) {
                            live.set_value(entry);
                        }
                    }
                }
                None => tracing::warn!("{} has no target element for entry {}", self.describe(), key),
            }
        }
        Ok(values)
    }

    /// Bind submitted entries; containers recurse, scalars pass through
    pub fn bind_values(&mut self, values: &ValueMap, group: Option<&ValidationGroup>) -> Result<Vec<Value>> {
        let mut bound = Vec::with_capacity(values.len());
        for (key, value) in values {
            let child_group = group.and_then(|g| g.subgroup(key));
            match self.fieldset.iterator.get_mut(key) {
                Some(member) if member.is_fieldset() => bound.push(member.bind_values(value, child_group)?),
                _ => bound.push(value.clone()),
            }
        }
        Ok(bound)
    }

    /// Validation tree: `count` entries checked against the target's rules
    pub fn input_filter_spec(&self) -> InputFilterSpec {
        let target = match &self.target_element {
            Some(target) => target.input_filter_spec(target.name().unwrap_or_default()),
            None => InputFilterSpec::Group { inputs: Default::default() },
        };
        InputFilterSpec::Collection {
            count: self.config.count,
            target: Box::new(target),
        }
    }

    /// Give up the collection-specific state
    pub fn into_fieldset(self) -> Fieldset {
        self.fieldset
    }

    fn describe(&self) -> String {
        format!("collection \"{}\"", self.fieldset.name().unwrap_or_default())
    }
}
