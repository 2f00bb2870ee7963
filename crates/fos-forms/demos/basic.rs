//! Example: Basic usage of fOS Forms

use fos_forms::{BindAs, Factory, FormData, Record, TypeRegistry, ValuesFlag};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Register the domain object the form binds to
    let mut registry = TypeRegistry::with_builtins();
    registry.define_object("Profile", || {
        Record::new("Profile")
            .with_field("name", "")
            .with_field("email", "")
            .into_ref()
    })?;
    let factory = Factory::new(registry);

    let mut form = factory.create_form(&serde_json::from_value(json!({
        "type": "form",
        "name": "profile",
        "elements": [
            {"spec": {"type": "text", "name": "name", "options": {"label": "Name"}}},
            {"spec": {"type": "email", "name": "email"}},
            {"spec": {"type": "submit", "name": "send"}, "flags": {"priority": -10}}
        ],
        "fieldsets": [
            {"spec": {
                "type": "collection",
                "name": "tags",
                "options": {"count": 2, "target_element": {"type": "text"}}
            }}
        ]
    }))?)?;

    let profile = Record::new("Profile")
        .with_field("name", "Ada")
        .with_field("email", "ada@example.com")
        .into_ref();
    form.bind(profile.clone(), BindAs::Normalized)?;
    form.prepare()?;

    for (key, member) in form.iter() {
        println!("{key}: {}", member.name().unwrap_or_default());
    }

    let submission = FormData::parse_url_encoded(
        "name=Grace&email=grace%40example.com&tags%5B0%5D=math&tags%5B1%5D=navy&send=Save",
    );
    form.set_submission(&submission)?;

    if form.is_valid()? {
        let data = form.data(ValuesFlag::Normalized)?;
        println!("bound: {:?}", data.as_object().map(|o| o.borrow().to_map()));
    } else {
        println!("invalid: {:?}", form.messages());
    }
    Ok(())
}
