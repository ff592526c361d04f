//! Recovery of hand-written front matter from an existing page.

use std::collections::BTreeSet;

pub const DELIMITER: &str = "---";

/// Front-matter keys that bhugo owns and regenerates on every write.
///
/// `categories` and `tags` are only owned when the matching output is
/// enabled; otherwise a user-written line with that key is carried forward
/// like any other custom key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedKeys(BTreeSet<&'static str>);

impl ManagedKeys {
    pub fn new(categories: bool, tags: bool) -> Self {
        let mut keys = BTreeSet::from(["title", "date", "draft"]);
        if categories {
            keys.insert("categories");
        }
        if tags {
            keys.insert("tags");
        }
        Self(keys)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

/// Return the front-matter lines of `document` whose key isn't managed.
///
/// Lines are returned verbatim. A document that doesn't open with `---`, or
/// never closes its front matter, yields nothing.
pub fn parse_custom_front_matter(document: &str, managed: &ManagedKeys) -> Vec<String> {
    let mut lines = document.split('\n');
    if lines.next() != Some(DELIMITER) {
        return Vec::new();
    }

    let mut custom = Vec::new();
    for line in lines {
        if line == DELIMITER {
            return custom;
        }
        let key = line.split_once(':').map_or(line, |(key, _)| key);
        if managed.contains(key) {
            continue;
        }
        custom.push(line.to_string());
    }

    log::debug!("Front matter never closed, ignoring it");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_managed() -> ManagedKeys {
        ManagedKeys::new(true, true)
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_custom_front_matter("", &all_managed()).is_empty());
    }

    #[test]
    fn test_keeps_only_custom_keys() {
        let doc = "---\n\
title: \"Existing\"\n\
date: 2019-04-29T07:55:21-07:00\n\
draft: false\n\
custom: abc\n\
categories: [\"blog\"]\n\
tags: [\"custom-tag\"]\n\
custom-2: abcd\n\
---\n\
\n\
Body Text";
        assert_eq!(
            parse_custom_front_matter(doc, &all_managed()),
            vec!["custom: abc", "custom-2: abcd"]
        );
    }

    #[test]
    fn test_no_opening_delimiter() {
        let doc = "title: \"Existing\"\ncustom: abc\n---\n\nBody Text";
        assert!(parse_custom_front_matter(doc, &all_managed()).is_empty());
    }

    #[test]
    fn test_no_closing_delimiter() {
        let doc = "---\ntitle: \"Existing\"\ncustom: abc\n\nBody Text";
        assert!(parse_custom_front_matter(doc, &all_managed()).is_empty());
    }

    #[test]
    fn test_lines_kept_verbatim() {
        let doc = "---\nimages: [ 'a.png',  \"b.png\" ]\nno colon here\n  indented: yes\n---\n";
        assert_eq!(
            parse_custom_front_matter(doc, &all_managed()),
            vec![
                "images: [ 'a.png',  \"b.png\" ]",
                "no colon here",
                "  indented: yes",
            ]
        );
    }

    #[test]
    fn test_disabled_outputs_are_custom() {
        let doc = "---\ntitle: \"T\"\ncategories: [\"Mine\"]\ntags: [\"Kept\"]\n---\n";
        let managed = ManagedKeys::new(true, false);
        assert_eq!(
            parse_custom_front_matter(doc, &managed),
            vec!["tags: [\"Kept\"]"]
        );
    }
}
