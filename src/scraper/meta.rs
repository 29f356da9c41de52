//! Meta tag extraction
//!
//! Turns a page's `<meta>` tags into a [`PropertyMap`]. OpenGraph tags
//! (`property="og:..."`) lose their prefix; every key is lowercased with `:`
//! replaced by `_`, and the first tag to produce a key wins.

use crate::scraper::document::MetaTag;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Prefix of an OpenGraph `property` attribute
pub const OPEN_GRAPH_PREFIX: &str = "og:";

/// Ordered mapping of normalized meta keys to content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: Vec<(String, String)>,
    keys: HashSet<String>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` unless it is empty or already present.
    ///
    /// Returns whether the entry was added.
    pub fn insert_first(&mut self, key: String, value: String) -> bool {
        if key.is_empty() || self.keys.contains(&key) {
            return false;
        }
        self.keys.insert(key.clone());
        self.entries.push((key, value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Whether the tag's `property` starts with `og:`
pub fn is_open_graph(tag: &MetaTag) -> bool {
    tag.property
        .as_deref()
        .is_some_and(|property| property.starts_with(OPEN_GRAPH_PREFIX))
}

/// Normalize an OpenGraph property: `og:video:URL` becomes `video_url`
pub fn open_graph_key(property: &str) -> String {
    let name = property
        .strip_prefix(OPEN_GRAPH_PREFIX)
        .unwrap_or(property);
    name.replace(':', "_").to_lowercase()
}

/// Normalize a generic meta tag, preferring a non-empty `name` over `property`
pub fn generic_key(tag: &MetaTag) -> String {
    let name = match tag.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => tag.property.as_deref().unwrap_or_default(),
    };
    name.to_lowercase().replace(':', "_")
}

/// Derive the map key for a tag, or `None` if the tag should be skipped
fn tag_key(tag: &MetaTag, open_graph_only: bool) -> Option<String> {
    if is_open_graph(tag) {
        tag.property.as_deref().map(open_graph_key)
    } else if open_graph_only {
        None
    } else {
        Some(generic_key(tag))
    }
}

/// Build the property map for a page's meta tags
///
/// # Arguments
///
/// * `tags` - The page's `<meta>` tags in document order
/// * `open_graph_only` - Skip every tag that is not an OpenGraph tag
pub fn extract_properties(tags: &[MetaTag], open_graph_only: bool) -> PropertyMap {
    let mut properties = PropertyMap::new();

    for tag in tags {
        let Some(key) = tag_key(tag, open_graph_only) else {
            continue;
        };
        let content = tag.content.clone().unwrap_or_default();
        properties.insert_first(key, content);
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    fn og(property: &str, content: &str) -> MetaTag {
        MetaTag {
            property: Some(property.to_string()),
            name: None,
            content: Some(content.to_string()),
        }
    }

    fn named(name: &str, content: &str) -> MetaTag {
        MetaTag {
            property: None,
            name: Some(name.to_string()),
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn test_open_graph_title() {
        let properties = extract_properties(&[og("og:title", "X")], false);
        assert_eq!(properties.get("title"), Some("X"));
    }

    #[test]
    fn test_nested_open_graph_property() {
        assert_eq!(open_graph_key("og:video:url"), "video_url");
        assert_eq!(open_graph_key("og:Image:Secure_URL"), "image_secure_url");
        assert_eq!(open_graph_key("og:og:type"), "og_type");
    }

    #[test]
    fn test_first_key_wins() {
        let tags = [
            og("og:title", "first"),
            named("title", "second"),
            og("og:TITLE", "third"),
        ];
        let properties = extract_properties(&tags, false);

        assert_eq!(properties.len(), 1);
        assert_eq!(properties.get("title"), Some("first"));
    }

    #[test]
    fn test_open_graph_only_skips_generic_tags() {
        let tags = [og("og:type", "video"), named("description", "A page")];
        let properties = extract_properties(&tags, true);

        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["type"]);
    }

    #[test]
    fn test_generic_tags() {
        let tags = [
            named("Twitter:Card", "summary"),
            MetaTag {
                property: Some("fb:app_id".to_string()),
                name: Some(String::new()),
                content: Some("123".to_string()),
            },
            MetaTag {
                property: Some("article:author".to_string()),
                name: Some("author".to_string()),
                content: None,
            },
        ];
        let properties = extract_properties(&tags, false);

        assert_eq!(properties.get("twitter_card"), Some("summary"));
        assert_eq!(properties.get("fb_app_id"), Some("123"));
        assert_eq!(properties.get("author"), Some(""));
    }

    #[test]
    fn test_nameless_tags_are_skipped() {
        let tags = [
            MetaTag {
                property: None,
                name: None,
                content: Some("text/html".to_string()),
            },
            MetaTag::default(),
        ];
        assert!(extract_properties(&tags, false).is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let tags = [
            named("viewport", "width=device-width"),
            og("og:site_name", "Site"),
            named("author", "Someone"),
        ];
        let properties = extract_properties(&tags, false);

        assert_eq!(
            properties.iter().collect::<Vec<_>>(),
            vec![
                ("viewport", "width=device-width"),
                ("site_name", "Site"),
                ("author", "Someone"),
            ]
        );
        assert_eq!(
            serde_json::to_string(&properties).unwrap(),
            r#"{"viewport":"width=device-width","site_name":"Site","author":"Someone"}"#
        );
    }
}
