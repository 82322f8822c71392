//! Table-of-contents anchor tree and the flat index built over it.
//!
//! Anchor trees are produced by the rendering stage ([`crate::render`]) and
//! mutated in place by the headline reconciler ([`crate::reconcile`]), which
//! attaches a [`Typeset`] record to each anchor it can match against a
//! re-rendered headline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toml::Table;

/// Rich-title attachment: the re-rendered, markup-preserving form of a
/// heading's text, as opposed to the plain-text title captured by the
/// default extraction path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typeset {
    /// Inner HTML of the re-rendered heading element.
    pub title: String,
}

/// One heading's location, identifier and hierarchy level within a page's
/// table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorNode {
    pub id: String,
    /// Heading hierarchy level, 1..=6.
    pub level: u8,
    #[serde(default)]
    pub children: Vec<AnchorNode>,
    #[serde(default)]
    pub typeset: Option<Typeset>,
}

impl AnchorNode {
    pub fn new(id: impl Into<String>, level: u8) -> Self {
        AnchorNode {
            id: id.into(),
            level,
            children: Vec::new(),
            typeset: None,
        }
    }
}

/// A documentation page as handed over by the host pipeline. The typeset
/// stage only writes `toc` (rich-title attachments), `typeset` and `title`;
/// everything else is read-only input.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Source path, used as the key into the per-build title-source map.
    pub src_path: String,
    /// Raw markdown source, line-oriented.
    pub markdown: String,
    /// Front-matter metadata. Only the presence of a `title` key is
    /// consulted here.
    #[serde(default)]
    pub meta: Table,
    /// Displayed page title, if one has been assigned so far.
    #[serde(default)]
    pub title: Option<String>,
    /// Anchor tree built by the rendering stage.
    #[serde(default)]
    pub toc: Vec<AnchorNode>,
    /// Rich-title attachment for the page itself, set when a top-level
    /// headline is promoted to the page title.
    #[serde(default)]
    pub typeset: Option<Typeset>,
}

/// Flatten a tree of anchors into an id -> typeset-slot index.
///
/// Depth-first, every node visited exactly once, nested children at
/// unbounded depth. Ids are unique within one page's tree by construction
/// of the upstream builder; should a duplicate slip through, the
/// last-flattened node wins.
pub fn flatten<'a>(items: &'a mut [AnchorNode]) -> BTreeMap<String, &'a mut Option<Typeset>> {
    let mut anchors = BTreeMap::new();
    for item in items {
        let AnchorNode {
            id,
            children,
            typeset,
            ..
        } = item;
        anchors.insert(id.clone(), typeset);
        if !children.is_empty() {
            anchors.extend(flatten(children));
        }
    }
    anchors
}

/// Normalize heading text into a stable anchor identifier.
///
/// Trims `/` and `#`, lowercases, replaces whitespace with `-` and drops
/// punctuation for HTML/URL compatibility.
pub fn to_anchor(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || c == '/' || c == '#')
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('-')
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}
