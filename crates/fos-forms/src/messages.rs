//! Validation Messages
//!
//! Messages produced by an external input filter, shaped like the element
//! tree they belong to.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Messages keyed by member name
pub type MessageTree = IndexMap<String, Messages>;

/// Messages for one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Messages {
    /// Failures of a leaf element
    List(Vec<String>),
    /// Failures of a nested fieldset or collection
    Nested(MessageTree),
}

impl Messages {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(list) => list.is_empty(),
            Self::Nested(tree) => tree.values().all(Messages::is_empty),
        }
    }

    /// Flat list view; nested messages yield an empty slice
    pub fn as_list(&self) -> &[String] {
        match self {
            Self::List(list) => list,
            Self::Nested(_) => &[],
        }
    }

    pub fn as_tree(&self) -> Option<&MessageTree> {
        match self {
            Self::Nested(tree) => Some(tree),
            Self::List(_) => None,
        }
    }

    /// Total number of message strings at any depth
    pub fn count(&self) -> usize {
        match self {
            Self::List(list) => list.len(),
            Self::Nested(tree) => tree.values().map(Messages::count).sum(),
        }
    }
}

impl From<Vec<String>> for Messages {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl From<Vec<&str>> for Messages {
    fn from(list: Vec<&str>) -> Self {
        Self::List(list.into_iter().map(str::to_string).collect())
    }
}

impl From<MessageTree> for Messages {
    fn from(tree: MessageTree) -> Self {
        Self::Nested(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_nested() {
        let tree: MessageTree = serde_json::from_value(json!({
            "email": ["Invalid address"],
            "address": {"city": ["Required", "Too short"]}
        }))
        .unwrap();

        assert_eq!(tree["email"].as_list(), ["Invalid address"]);
        let address = tree["address"].as_tree().unwrap();
        assert_eq!(address["city"].count(), 2);
        assert_eq!(Messages::Nested(tree).count(), 3);
    }

    #[test]
    fn test_empty() {
        let mut tree = MessageTree::new();
        tree.insert("a".into(), Messages::from(Vec::<String>::new()));
        assert!(Messages::Nested(tree).is_empty());
        assert!(!Messages::from(vec!["x"]).is_empty());
    }
}
