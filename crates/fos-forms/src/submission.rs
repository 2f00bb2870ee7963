//! Form Submission
//!
//! Submitted name/value pairs, URL encoding, and folding of bracketed
//! names (`user[address][city]`, `tags[]`) back into nested values.

use std::fmt::Write;

use crate::value::{Value, ValueMap};

/// `method` attribute of a form; anything but `post` submits as `get`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

impl FormMethod {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("post") {
            Self::Post
        } else {
            Self::Get
        }
    }
}

/// `enctype` attribute of a form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormEnctype {
    #[default]
    UrlEncoded,
    Multipart,
}

impl FormEnctype {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("multipart/form-data") {
            Self::Multipart
        } else {
            Self::UrlEncoded
        }
    }
}

/// Submitted form data, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value submitted under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under `name`
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Delete all entries with name
    pub fn delete(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Convert to URL-encoded string
    pub fn to_url_encoded(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{}={}", urlencoding_encode(name), urlencoding_encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Parse an `application/x-www-form-urlencoded` body
    pub fn parse_url_encoded(body: &str) -> Self {
        let mut data = Self::new();
        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.append(urlencoding_decode(name), urlencoding_decode(value));
        }
        data
    }

    /// Fold entries into nested values.
    ///
    /// `a[b][c]=1` becomes `{a: {b: {c: "1"}}}`; an empty segment (`tags[]`)
    /// takes the next integer key. A later plain entry overwrites an earlier
    /// one with the same name.
    pub fn to_values(&self) -> ValueMap {
        let mut values = ValueMap::new();
        for (name, value) in &self.entries {
            let segments = split_name(name);
            insert_path(&mut values, &segments, value);
        }
        values
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (name, value) in iter {
            data.append(name, value);
        }
        data
    }
}

fn split_name(name: &str) -> Vec<String> {
    let open = match name.find('[') {
        Some(open) if open > 0 => open,
        _ => return vec![name.to_string()],
    };
    let mut segments = vec![name[..open].to_string()];
    let mut rest = &name[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        segments.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }
    segments
}

fn insert_path(map: &mut ValueMap, segments: &[String], value: &str) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let key = if first.is_empty() {
        next_index(map)
    } else {
        first.clone()
    };
    if rest.is_empty() {
        map.insert(key, Value::from(value));
        return;
    }
    let entry = map.entry(key).or_insert_with(|| Value::Map(ValueMap::new()));
    if !matches!(entry, Value::Map(_)) {
        *entry = Value::Map(ValueMap::new());
    }
    if let Value::Map(child) = entry {
        insert_path(child, rest, value);
    }
}

fn next_index(map: &ValueMap) -> String {
    map.keys()
        .filter_map(|k| k.parse::<usize>().ok())
        .max()
        .map_or(0, |max| max + 1)
        .to_string()
}

fn urlencoding_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b' ' => encoded.push('+'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

fn urlencoding_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        decoded.push(byte);
                        i += 2;
                    }
                    None => decoded.push(b'%'),
                }
            }
            other => decoded.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_data() {
        let mut data = FormData::new();
        data.append("name", "John");
        data.append("email", "john@example.com");
        data.append("name", "Jane");

        assert_eq!(data.get("name"), Some("John"));
        assert_eq!(data.get_all("name"), vec!["John", "Jane"]);
        assert!(data.has("email"));
        data.delete("name");
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_url_encoding() {
        let mut data = FormData::new();
        data.append("q", "hello world");
        data.append("user[name]", "Zoë");

        let encoded = data.to_url_encoded();
        assert_eq!(encoded, "q=hello+world&user%5Bname%5D=Zo%C3%AB");
        assert_eq!(FormData::parse_url_encoded(&encoded), data);
    }

    #[test]
    fn test_decode_lenient() {
        let data = FormData::parse_url_encoded("a=100%&b&&c=%zz");
        assert_eq!(data.get("a"), Some("100%"));
        assert_eq!(data.get("b"), Some(""));
        assert_eq!(data.get("c"), Some("%zz"));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("plain"), vec!["plain"]);
        assert_eq!(split_name("a[b][0]"), vec!["a", "b", "0"]);
        assert_eq!(split_name("tags[]"), vec!["tags", ""]);
        assert_eq!(split_name("[odd]"), vec!["[odd]"]);
        assert_eq!(split_name("a[b"), vec!["a"]);
    }

    #[test]
    fn test_to_values() {
        let data: FormData = [
            ("user[name]", "Ada"),
            ("user[addresses][0][city]", "London"),
            ("user[addresses][1][city]", "Paris"),
            ("tags[]", "a"),
            ("tags[]", "b"),
        ]
        .into_iter()
        .collect();

        let values = Value::Map(data.to_values()).to_json();
        assert_eq!(
            values,
            json!({
                "user": {
                    "name": "Ada",
                    "addresses": {"0": {"city": "London"}, "1": {"city": "Paris"}}
                },
                "tags": {"0": "a", "1": "b"}
            })
        );
    }

    #[test]
    fn test_method_and_enctype() {
        assert_eq!(FormMethod::parse("POST"), FormMethod::Post);
        assert_eq!(FormMethod::parse("dialog"), FormMethod::Get);
        assert_eq!(FormEnctype::parse("Multipart/Form-Data"), FormEnctype::Multipart);
        assert_eq!(FormEnctype::parse("text/plain"), FormEnctype::UrlEncoded);
    }
}
