//! Email Element

use crate::input_spec::{FilterSpec, ValidatorSpec};

/// HTML5 valid e-mail address pattern
pub const EMAIL_PATTERN: &str =
    r"/^[a-zA-Z0-9.!#$%&'*+\/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$/";

pub fn filters() -> Vec<FilterSpec> {
    vec![FilterSpec::new("StringTrim"), FilterSpec::new("StripNewlines")]
}

/// `multiple` accepts a comma separated list, each item checked alone
pub fn validators(multiple: bool) -> Vec<ValidatorSpec> {
    let regex = ValidatorSpec::new("Regex").with_option("pattern", EMAIL_PATTERN);
    if multiple {
        vec![regex.exploded().with_option("value_delimiter", ",")]
    } else {
        vec![regex]
    }
}
