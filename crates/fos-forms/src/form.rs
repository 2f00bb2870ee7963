//! Form Implementation
//!
//! Top-level fieldset driving the data → validate → bind lifecycle.
//! Validation itself is delegated to an [`InputFilter`].

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde_json::Value as JsonValue;

use crate::elements::{option_bool, Options};
use crate::error::{FormError, Result};
use crate::factory::ElementSpec;
use crate::fieldset::{AddFlags, Fieldset, Member, ValidationGroup};
use crate::input_spec::InputFilterSpec;
use crate::messages::MessageTree;
use crate::submission::{FormData, FormEnctype, FormMethod};
use crate::value::{ObjectRef, Value, ValueMap};

/// External validation/filtering engine
pub trait InputFilter: fmt::Debug {
    /// Receive the rules derived from the element tree
    fn attach_defaults(&mut self, _spec: &InputFilterSpec) {}

    fn set_data(&mut self, data: &ValueMap);

    /// `None` validates everything
    fn set_validation_group(&mut self, group: Option<&ValidationGroup>);

    fn is_valid(&mut self) -> bool;

    /// Filtered values
    fn values(&self) -> ValueMap;

    /// Values as submitted
    fn raw_values(&self) -> ValueMap;

    fn messages(&self) -> MessageTree;
}

/// Filter used when none is configured: accepts everything unchanged
#[derive(Debug, Clone, Default)]
pub struct PassthroughFilter {
    data: ValueMap,
}

impl InputFilter for PassthroughFilter {
    fn set_data(&mut self, data: &ValueMap) {
        self.data = data.clone();
    }

    fn set_validation_group(&mut self, _group: Option<&ValidationGroup>) {}

    fn is_valid(&mut self) -> bool {
        true
    }

    fn values(&self) -> ValueMap {
        self.data.clone()
    }

    fn raw_values(&self) -> ValueMap {
        self.data.clone()
    }

    fn messages(&self) -> MessageTree {
        MessageTree::new()
    }
}

/// Which filter output hydrates the bound object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindAs {
    #[default]
    Normalized,
    Raw,
}

/// Shape requested from [`Form::data`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValuesFlag {
    /// The bound object if there is one, else filtered values
    #[default]
    Normalized,
    /// The bound object if there is one, else raw values
    Raw,
    /// Filtered values, even with a bound object
    AsArray,
}

/// Validated data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedData {
    Object(ObjectRef),
    Values(ValueMap),
}

impl ValidatedData {
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            Self::Values(_) => None,
        }
    }

    pub fn as_values(&self) -> Option<&ValueMap> {
        match self {
            Self::Values(values) => Some(values),
            Self::Object(_) => None,
        }
    }
}

/// Form
#[derive(Debug)]
pub struct Form {
    fieldset: Fieldset,
    data: Option<ValueMap>,
    input_filter: Option<Box<dyn InputFilter>>,
    defaults_attached: bool,
    validation_group: Option<ValidationGroup>,
    bind_as: BindAs,
    bind_on_validate: bool,
    has_validated: bool,
    is_valid: bool,
    is_prepared: bool,
    base_fieldset: Option<String>,
    wrap_elements: bool,
    use_input_filter_defaults: bool,
}

impl Deref for Form {
    type Target = Fieldset;

    fn deref(&self) -> &Fieldset {
        &self.fieldset
    }
}

impl DerefMut for Form {
    fn deref_mut(&mut self) -> &mut Fieldset {
        &mut self.fieldset
    }
}

impl Default for Form {
    fn default() -> Self {
        let mut fieldset = Fieldset::default();
        fieldset.set_attribute("method", "POST");
        Self {
            fieldset,
            data: None,
            input_filter: None,
            defaults_attached: false,
            validation_group: None,
            bind_as: BindAs::default(),
            bind_on_validate: true,
            has_validated: false,
            is_valid: false,
            is_prepared: false,
            base_fieldset: None,
            wrap_elements: false,
            use_input_filter_defaults: true,
        }
    }
}

impl Form {
    pub fn new(name: impl Into<String>) -> Self {
        let mut form = Self::default();
        form.set_name(name);
        form
    }

    /// Apply an options bag; recognizes the form-level switches
    pub fn set_options(&mut self, options: &Options) -> Result<()> {
        self.fieldset.set_options(options)?;
        self.wrap_elements = option_bool(options, "wrap_elements", self.wrap_elements);
        self.use_input_filter_defaults =
            option_bool(options, "use_input_filter_defaults", self.use_input_filter_defaults);
        self.bind_on_validate = option_bool(options, "bind_on_validate", self.bind_on_validate);
        Ok(())
    }

    pub fn wrap_elements(&self) -> bool {
        self.wrap_elements
    }

    /// Prefix top-level names with the form name on prepare
    pub fn set_wrap_elements(&mut self, wrap: bool) {
        self.wrap_elements = wrap;
    }

    pub fn use_input_filter_defaults(&self) -> bool {
        self.use_input_filter_defaults
    }

    pub fn set_use_input_filter_defaults(&mut self, flag: bool) {
        self.use_input_filter_defaults = flag;
    }

    pub fn bind_on_validate(&self) -> bool {
        self.bind_on_validate
    }

    pub fn set_bind_on_validate(&mut self, flag: bool) {
        self.bind_on_validate = flag;
    }

    pub fn method(&self) -> FormMethod {
        self.fieldset
            .attribute("method")
            .and_then(JsonValue::as_str)
            .map(FormMethod::parse)
            .unwrap_or_default()
    }

    pub fn enctype(&self) -> FormEnctype {
        self.fieldset
            .attribute("enctype")
            .and_then(JsonValue::as_str)
            .map(FormEnctype::parse)
            .unwrap_or_default()
    }

    /// Add a member; a fieldset flagged `use_as_base_fieldset` becomes the
    /// base fieldset
    pub fn add(&mut self, member: impl Into<Member>, flags: AddFlags) -> Result<&mut Self> {
        let member = member.into();
        let name = flags
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| member.name().map(str::to_string));
        let is_base = member.as_fieldset().is_some_and(Fieldset::use_as_base_fieldset);
        self.fieldset.add(member, flags)?;
        if is_base {
            self.base_fieldset = name;
        }
        self.is_prepared = false;
        Ok(self)
    }

    /// Realize a declarative spec and add it
    pub fn add_spec(&mut self, spec: &ElementSpec, flags: AddFlags) -> Result<&mut Self> {
        let member = self.fieldset.form_factory().create(spec)?.into_member();
        self.add(member, flags)
    }

    /// Name of the base fieldset
    pub fn base_fieldset(&self) -> Option<&str> {
        self.base_fieldset.as_deref()
    }

    pub fn set_base_fieldset(&mut self, name: &str) -> Result<()> {
        match self.fieldset.get_mut(name)?.as_fieldset_mut() {
            Some(fieldset) => fieldset.set_use_as_base_fieldset(true),
            None => {
                return Err(FormError::invalid(format!("\"{name}\" is not a fieldset")));
            }
        }
        self.base_fieldset = Some(name.to_string());
        Ok(())
    }

    fn base_fieldset_mut(&mut self) -> Result<Option<&mut Fieldset>> {
        let Some(name) = self.base_fieldset.clone() else {
            return Ok(None);
        };
        let member = self.fieldset.get_mut(&name)?;
        Ok(member.as_fieldset_mut())
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Set submitted data and populate the tree with it
    pub fn set_data(&mut self, data: ValueMap) -> Result<()> {
        self.has_validated = false;
        self.fieldset.populate_values(&data)?;
        self.data = Some(data);
        Ok(())
    }

    /// Set submitted data from decoded form fields
    pub fn set_submission(&mut self, submission: &FormData) -> Result<()> {
        self.set_data(submission.to_values())
    }

    pub fn raw_data(&self) -> Option<&ValueMap> {
        self.data.as_ref()
    }

    /// Bind an object and populate the tree from it
    pub fn bind(&mut self, object: ObjectRef, bind_as: BindAs) -> Result<()> {
        self.bind_as = bind_as;
        if let Some(base) = self.base_fieldset_mut()? {
            base.set_object(object.clone())?;
        }
        self.fieldset.set_object(object)?;
        self.extract()?;
        tracing::debug!("form {} bound {}", self.describe(), self.bind_as_str());
        Ok(())
    }

    /// Extract from the bound object (through the base fieldset if there is
    /// one) and populate the tree with the result
    pub fn extract(&mut self) -> Result<ValueMap> {
        if let Some(name) = self.base_fieldset.clone() {
            if let Some(base) = self.base_fieldset_mut()? {
                let values = base.extract()?;
                base.populate_values(&values)?;
                let mut wrapped = ValueMap::new();
                wrapped.insert(name, Value::Map(values));
                return Ok(wrapped);
            }
        }
        let values = self.fieldset.extract()?;
        self.fieldset.populate_values(&values)?;
        Ok(values)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    pub fn set_input_filter(&mut self, filter: Box<dyn InputFilter>) {
        self.input_filter = Some(filter);
        self.defaults_attached = false;
        self.has_validated = false;
    }

    pub fn input_filter(&self) -> Option<&dyn InputFilter> {
        self.input_filter.as_deref()
    }

    /// Validation tree derived from the elements
    pub fn input_filter_specification(&self) -> InputFilterSpec {
        self.fieldset.input_filter_spec()
    }

    pub fn set_validation_group(&mut self, group: impl Into<ValidationGroup>) {
        self.validation_group = Some(group.into());
        self.has_validated = false;
    }

    /// Validate everything again
    pub fn clear_validation_group(&mut self) {
        self.validation_group = None;
        self.has_validated = false;
    }

    pub fn validation_group(&self) -> Option<&ValidationGroup> {
        self.validation_group.as_ref()
    }

    pub fn has_validated(&self) -> bool {
        self.has_validated
    }

    /// Validate the current data.
    ///
    /// Without data, the bound object is extracted first; with neither this
    /// is a domain error. The result is cached until the data changes.
    pub fn is_valid(&mut self) -> Result<bool> {
        if self.has_validated {
            return Ok(self.is_valid);
        }
        self.is_valid = false;

        let data = match self.data.clone() {
            Some(data) => data,
            None => {
                if self.fieldset.object().is_none() {
                    return Err(FormError::domain(format!(
                        "{} is unable to validate as there is no data currently set",
                        self.describe()
                    )));
                }
                let data = self.extract()?;
                self.data = Some(data.clone());
                data
            }
        };

        let spec = (self.use_input_filter_defaults && !self.defaults_attached)
            .then(|| self.fieldset.input_filter_spec());
        let filter = self
            .input_filter
            .get_or_insert_with(|| Box::new(PassthroughFilter::default()));
        if let Some(spec) = spec {
            filter.attach_defaults(&spec);
            self.defaults_attached = true;
        }

        let group = self.validation_group.clone().map(|mut group| {
            expand_validation_group(&self.fieldset, &data, &mut group);
            group
        });
        filter.set_data(&data);
        filter.set_validation_group(group.as_ref());

        let result = filter.is_valid();
        let messages = (!result).then(|| filter.messages());
        self.is_valid = result;
        self.has_validated = true;
        tracing::debug!("form {} validated: {}", self.describe(), result);

        if let Some(messages) = messages {
            self.fieldset.set_messages(messages);
        }
        if result && self.bind_on_validate {
            self.bind_validated(group.as_ref())?;
        }
        Ok(result)
    }

    /// Hydrate the bound object from validated data.
    ///
    /// Passing values that have not been validated yet sets and validates
    /// them first. Invalid data binds nothing.
    pub fn bind_values(&mut self, values: Option<ValueMap>) -> Result<()> {
        let base_binds = self
            .base_fieldset
            .as_deref()
            .and_then(|name| self.fieldset.get(name).ok())
            .is_some_and(Member::allow_value_binding);
        if self.fieldset.object().is_none() && !base_binds {
            return Ok(());
        }

        match values.filter(|v| !v.is_empty()) {
            Some(values) if !self.has_validated => {
                self.set_data(values)?;
                let bound_on_validate = self.bind_on_validate;
                if !self.is_valid()? || bound_on_validate {
                    return Ok(());
                }
            }
            _ if !self.has_validated || !self.is_valid => return Ok(()),
            _ => {}
        }

        let group = match (&self.validation_group, &self.data) {
            (Some(group), Some(data)) => {
                let mut group = group.clone();
                expand_validation_group(&self.fieldset, data, &mut group);
                Some(group)
            }
            (group, _) => group.clone(),
        };
        self.bind_validated(group.as_ref())
    }

    fn bind_validated(&mut self, group: Option<&ValidationGroup>) -> Result<()> {
        let Some(filter) = self.input_filter.as_ref() else {
            return Ok(());
        };
        let values = match self.bind_as {
            BindAs::Normalized => filter.values(),
            BindAs::Raw => filter.raw_values(),
        };
        let empty = ValueMap::new();
        let data = prepare_bind_data(&values, self.data.as_ref().unwrap_or(&empty));

        if let Some(name) = self.base_fieldset.clone() {
            let nested = data.get(&name).and_then(Value::to_keyed).unwrap_or_default();
            let group = group.and_then(|g| g.subgroup(&name));
            if let Some(base) = self.base_fieldset_mut()? {
                let object = base.bind_values(&nested, group)?;
                self.fieldset.object = object;
            }
        } else {
            self.fieldset.bind_values(&data, group)?;
        }
        tracing::debug!("form {} bound validated values", self.describe());
        Ok(())
    }

    /// Validated data in the requested shape.
    ///
    /// Fails with a domain error until [`Form::is_valid`] has run.
    pub fn data(&self, flag: ValuesFlag) -> Result<ValidatedData> {
        if !self.has_validated {
            return Err(FormError::domain(format!(
                "{} cannot return data as validation has not yet occurred",
                self.describe()
            )));
        }
        if flag != ValuesFlag::AsArray {
            if let Some(object) = self.fieldset.object() {
                return Ok(ValidatedData::Object(object.clone()));
            }
        }
        let values = match (&self.input_filter, flag) {
            (Some(filter), ValuesFlag::Raw) => filter.raw_values(),
            (Some(filter), _) => filter.values(),
            (None, _) => self.data.clone().unwrap_or_default(),
        };
        Ok(ValidatedData::Values(values))
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    /// Prepare names for rendering.
    ///
    /// With `wrap_elements` every top-level name is prefixed by the form
    /// name; otherwise only nested containers rename their children.
    /// Running it again only touches members added since.
    pub fn prepare(&mut self) -> Result<()> {
        if self.wrap_elements {
            self.fieldset.prepare_element()?;
        } else {
            self.fieldset.prepare_children()?;
        }
        self.is_prepared = true;
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.is_prepared
    }

    /// Give up the form-specific state
    pub fn into_fieldset(self) -> Fieldset {
        self.fieldset
    }

    fn bind_as_str(&self) -> &'static str {
        match self.bind_as {
            BindAs::Normalized => "normalized",
            BindAs::Raw => "raw",
        }
    }

    fn describe(&self) -> String {
        format!("\"{}\"", self.fieldset.name().unwrap_or_default())
    }
}

/// Keep only filtered values whose keys were actually submitted
pub fn prepare_bind_data(values: &ValueMap, submitted: &ValueMap) -> ValueMap {
    let mut data = ValueMap::new();
    for (name, value) in values {
        let Some(matched) = submitted.get(name) else {
            continue;
        };
        let prepared = match (value, matched.to_keyed()) {
            (Value::Map(nested), Some(nested_match)) => Value::Map(prepare_bind_data(nested, &nested_match)),
            (Value::List(_), Some(nested_match)) => {
                let nested = value.to_keyed().unwrap_or_default();
                Value::List(prepare_bind_data(&nested, &nested_match).into_values().collect())
            }
            _ => value.clone(),
        };
        data.insert(name.clone(), prepared);
    }
    data
}

/// Expand every collection entry of `group` into one subgroup per submitted
/// collection key
fn expand_validation_group(fieldset: &Fieldset, data: &ValueMap, group: &mut ValidationGroup) {
    let names: Vec<String> = group.names().map(str::to_string).collect();
    for name in names {
        let Ok(member) = fieldset.get(&name) else {
            continue;
        };
        let nested_data = data.get(&name).and_then(Value::to_keyed);

        if let Member::Collection(collection) = member {
            let Some(Some(target_group)) = group.entry_mut(&name).map(|g| g.clone()) else {
                continue;
            };
            if nested_data.is_none() && collection.count() == 0 {
                group.remove(&name);
                continue;
            }
            let mut expanded = ValidationGroup::new();
            for (key, entry) in nested_data.unwrap_or_default() {
                let mut entry_group = target_group.clone();
                if let Ok(child) = collection.get(&key) {
                    if let Some(child) = child.as_fieldset() {
                        expand_validation_group(child, &entry.to_keyed().unwrap_or_default(), &mut entry_group);
                    }
                }
                expanded.insert(key, Some(entry_group));
            }
            group.insert(name, Some(expanded));
            continue;
        }

        if let (Some(child), Some(Some(subgroup))) = (member.as_fieldset(), group.entry_mut(&name)) {
            expand_validation_group(child, &nested_data.unwrap_or_default(), subgroup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::elements::Element;
    use crate::error::ErrorKind;
    use crate::value::Record;
    use serde_json::json;

    fn map(value: JsonValue) -> ValueMap {
        Value::from(value).to_keyed().unwrap()
    }

    /// Rejects everything, reporting one message per submitted key
    #[derive(Debug, Default)]
    struct RejectAll {
        data: ValueMap,
    }

    impl InputFilter for RejectAll {
        fn set_data(&mut self, data: &ValueMap) {
            self.data = data.clone();
        }

        fn set_validation_group(&mut self, _group: Option<&ValidationGroup>) {}

        fn is_valid(&mut self) -> bool {
            false
        }

        fn values(&self) -> ValueMap {
            ValueMap::new()
        }

        fn raw_values(&self) -> ValueMap {
            self.data.clone()
        }

        fn messages(&self) -> MessageTree {
            self.data
                .keys()
                .map(|k| (k.clone(), vec!["Rejected"].into()))
                .collect()
        }
    }

    fn user_form() -> Form {
        let mut form = Form::new("user");
        form.add(Element::text("name"), AddFlags::default()).unwrap();
        form.add(Element::email("email"), AddFlags::default()).unwrap();
        form
    }

    #[test]
    fn test_defaults() {
        let form = Form::new("login");
        assert_eq!(form.method(), FormMethod::Post);
        assert_eq!(form.enctype(), FormEnctype::UrlEncoded);
        assert!(form.bind_on_validate());
        assert!(!form.wrap_elements());
    }

    #[test]
    fn test_is_valid_without_data_fails() {
        let mut form = user_form();
        assert_eq!(form.is_valid().unwrap_err().kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_data_before_validation_fails() {
        let form = user_form();
        assert_eq!(form.data(ValuesFlag::Normalized).unwrap_err().kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_set_data_and_validate() {
        let mut form = user_form();
        form.set_data(map(json!({"name": "Ada", "email": "ada@example.com"}))).unwrap();
        assert_eq!(form.get("name").unwrap().value(), Some(&Value::from("Ada")));

        assert!(form.is_valid().unwrap());
        let data = form.data(ValuesFlag::Normalized).unwrap();
        assert_eq!(data.as_values().unwrap().get("email"), Some(&Value::from("ada@example.com")));
    }

    #[test]
    fn test_invalid_data_sets_messages() {
        let mut form = user_form();
        form.set_input_filter(Box::new(RejectAll::default()));
        form.set_data(map(json!({"name": "", "email": "nope"}))).unwrap();

        assert!(!form.is_valid().unwrap());
        assert_eq!(form.messages_for("email").unwrap().as_list(), ["Rejected"]);
    }

    #[test]
    fn test_bind_populates_and_validates() {
        let user = Record::new("User").with_field("name", "Ada").with_field("email", "a@b.c").into_ref();
        let mut form = user_form();
        form.bind(user.clone(), BindAs::Normalized).unwrap();
        assert_eq!(form.get("name").unwrap().value(), Some(&Value::from("Ada")));

        form.set_data(map(json!({"name": "Grace", "email": "g@h.i"}))).unwrap();
        assert!(form.is_valid().unwrap());

        let data = form.data(ValuesFlag::Normalized).unwrap();
        assert!(data.as_object().unwrap().ptr_eq(&user));
        let name = user.with(|r: &Record| r.get("name").cloned()).flatten();
        assert_eq!(name, Some(Value::from("Grace")));
    }

    #[test]
    fn test_validate_from_bound_object() {
        let user = Record::new("User").with_field("name", "Ada").into_ref();
        let mut form = user_form();
        form.bind(user, BindAs::Raw).unwrap();
        assert!(form.is_valid().unwrap());
        assert_eq!(form.raw_data().and_then(|d| d.get("name")), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_base_fieldset() {
        let user = Record::new("User").with_field("name", "Ada").into_ref();
        let mut fieldset = Fieldset::new("user").with(Element::text("name")).unwrap();
        fieldset.set_use_as_base_fieldset(true);

        let mut form = Form::new("profile");
        form.add(fieldset, AddFlags::default()).unwrap();
        form.add(Element::submit("save"), AddFlags::default()).unwrap();
        assert_eq!(form.base_fieldset(), Some("user"));

        form.bind(user.clone(), BindAs::Normalized).unwrap();
        form.set_data(map(json!({"user": {"name": "Grace"}, "save": "1"}))).unwrap();
        assert!(form.is_valid().unwrap());

        let name = user.with(|r: &Record| r.get("name").cloned()).flatten();
        assert_eq!(name, Some(Value::from("Grace")));
        let save = user.with(|r: &Record| r.get("save").cloned()).flatten();
        assert_eq!(save, None);
    }

    #[test]
    fn test_prepare_wraps_elements() {
        let mut form = user_form();
        form.set_wrap_elements(true);
        form.prepare().unwrap();
        form.prepare().unwrap();
        assert_eq!(form.get("name").unwrap().name(), Some("user[name]"));
        assert!(form.is_prepared());
    }

    #[test]
    fn test_prepare_bind_data() {
        let values = map(json!({"a": "1", "b": "2", "nested": {"x": "1", "y": "2"}}));
        let submitted = map(json!({"a": "", "nested": {"y": ""}}));
        let prepared = prepare_bind_data(&values, &submitted);
        assert_eq!(Value::Map(prepared).to_json(), json!({"a": "1", "nested": {"y": "2"}}));
    }

    #[test]
    fn test_validation_group_expands_collections() {
        let row = Fieldset::new("row")
            .with(Element::text("a"))
            .unwrap()
            .with(Element::text("b"))
            .unwrap();
        let mut form = Form::new("rows");
        form.add(Collection::new("items").with_target_element(row), AddFlags::default())
            .unwrap();

        let data = map(json!({"items": {"0": {"a": "x"}, "1": {"a": "y"}}}));
        let mut group = ValidationGroup::new().with_group("items", ValidationGroup::from(vec!["a"]));
        expand_validation_group(&form, &data, &mut group);

        let items = group.subgroup("items").unwrap();
        assert_eq!(items.names().collect::<Vec<_>>(), vec!["0", "1"]);
        assert!(items.subgroup("1").unwrap().contains("a"));
    }
}
