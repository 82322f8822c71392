//! Markdown-to-HTML rendering with stable heading anchors.
//!
//! [`Renderer`] wraps pulldown-cmark with the extension set the host build
//! configures. Every heading element receives a stable `id` attribute (an
//! explicit `{#custom}` attribute wins over the slug of the heading's plain
//! text), which is what the anchor tree and the headline reconciler key on.
//! The toc extension's `anchorlink` and `permalink` options wrap or follow
//! the heading content with link markup; [`Renderer::for_headlines`] builds
//! the restricted variant that forces both off.

use pulldown_cmark::{
    html, CowStr, Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag as MdTag,
    TagEnd as MdTagEnd,
};
use std::collections::BTreeMap;

use crate::{
    anchors::{to_anchor, AnchorNode},
    config::MarkdownConfig,
    error::TypesetError,
};

pub use pulldown_cmark;

/// Maps host extension names onto pulldown-cmark options. The `toc` and
/// `meta` extensions configure dedicated passes rather than parser flags.
fn markdown_options(extensions: &[String]) -> Result<Options, TypesetError> {
    let mut md_options = Options::empty();
    for name in extensions {
        match name.as_str() {
            "attr_list" => md_options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "def_list" => md_options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => md_options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => md_options.insert(Options::ENABLE_GFM),
            "math" => md_options.insert(Options::ENABLE_MATH),
            "meta" => md_options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS),
            "smarty" => md_options.insert(Options::ENABLE_SMART_PUNCTUATION),
            "strikethrough" => md_options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => md_options.insert(Options::ENABLE_TABLES),
            "tasklists" => md_options.insert(Options::ENABLE_TASKLISTS),
            "wikilinks" => md_options.insert(Options::ENABLE_WIKILINKS),
            "toc" => {}
            other => {
                return Err(TypesetError::Config(format!(
                    "unknown markdown extension '{other}'"
                )))
            }
        }
    }
    Ok(md_options)
}

/// Heading decoration options read from the toc extension's option table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct TocOptions {
    anchorlink: bool,
    permalink: Option<String>,
}

impl TocOptions {
    fn from_config(config: &MarkdownConfig) -> TocOptions {
        let mut options = TocOptions::default();
        if let Some(table) = config.extension_configs.get("toc") {
            if let Some(anchorlink) = table.get("anchorlink").and_then(|v| v.as_bool()) {
                options.anchorlink = anchorlink;
            }
            options.permalink = match table.get("permalink") {
                Some(toml::Value::Boolean(true)) => Some("\u{00b6}".to_string()),
                Some(toml::Value::String(symbol)) => Some(symbol.clone()),
                _ => None,
            };
        }
        options
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Deduplicate anchor ids within one render: `foo`, `foo_1`, `foo_2`, ...
fn unique(seen: &mut BTreeMap<String, usize>, slug: String) -> String {
    if let Some(count) = seen.get_mut(&slug) {
        *count += 1;
        let suffixed = format!("{slug}_{count}");
        seen.insert(suffixed.clone(), 0);
        suffixed
    } else {
        seen.insert(slug.clone(), 0);
        slug
    }
}

/// Insert a new anchor under the last open anchor whose level sits above it,
/// keeping source order within each sibling list.
fn push_nested(siblings: &mut Vec<AnchorNode>, node: AnchorNode) {
    match siblings.last_mut() {
        Some(last) if last.level < node.level => push_nested(&mut last.children, node),
        _ => siblings.push(node),
    }
}

/// Markdown renderer configured once per document-set build. Safe for
/// repeated reuse across pages; `render` holds no mutable state between
/// calls.
#[derive(Debug, Clone)]
pub struct Renderer {
    options: Options,
    toc: TocOptions,
}

impl Renderer {
    pub fn new(config: &MarkdownConfig) -> Result<Renderer, TypesetError> {
        Ok(Renderer {
            options: markdown_options(&config.extensions)?,
            toc: TocOptions::from_config(config),
        })
    }

    /// Headline variant: same extension set, anchor and permalink
    /// decorations forced off. Headline output must contain no injected
    /// links, otherwise the (id, title, level) extraction downstream would
    /// pick up link markup instead of the bare title content.
    pub fn for_headlines(config: &MarkdownConfig) -> Result<Renderer, TypesetError> {
        Renderer::new(&config.headline_variant())
    }

    /// Render markdown to HTML.
    pub fn render(&self, text: &str) -> Result<String, TypesetError> {
        let (html, _) = self.render_inner(text)?;
        Ok(html)
    }

    /// Render markdown to HTML and return the anchor tree for the document:
    /// every heading's id and level in source order, nested by level.
    pub fn render_with_toc(&self, text: &str) -> Result<(String, Vec<AnchorNode>), TypesetError> {
        self.render_inner(text)
    }

    fn render_inner(&self, text: &str) -> Result<(String, Vec<AnchorNode>), TypesetError> {
        let parsed: Vec<MdEvent<'_>> = MdParser::new_ext(text, self.options).collect();
        let mut headings = Vec::new();
        let events = self.decorate_headings(parsed, &mut headings);

        let mut output = String::with_capacity(text.len() + 128);
        html::write_html_fmt(&mut output, events.into_iter())?;

        let mut toc = Vec::new();
        for (id, level) in headings {
            push_nested(&mut toc, AnchorNode::new(id, level));
        }
        Ok((output, toc))
    }

    /// Assign each heading its anchor id and apply toc link decorations.
    /// The heading body is buffered so the id can be derived from its plain
    /// text before the start tag is emitted.
    fn decorate_headings<'a>(
        &self,
        events: Vec<MdEvent<'a>>,
        headings: &mut Vec<(String, u8)>,
    ) -> Vec<MdEvent<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut seen = BTreeMap::new();
        let mut iter = events.into_iter();
        while let Some(event) = iter.next() {
            let (level, id, classes, attrs) = match event {
                MdEvent::Start(MdTag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => (level, id, classes, attrs),
                other => {
                    out.push(other);
                    continue;
                }
            };

            let mut body = Vec::new();
            let mut plain = String::new();
            for inner in iter.by_ref() {
                if let MdEvent::End(MdTagEnd::Heading(_)) = inner {
                    break;
                }
                match &inner {
                    MdEvent::Text(s) | MdEvent::Code(s) => plain.push_str(s),
                    _ => {}
                }
                body.push(inner);
            }

            let slug = unique(
                &mut seen,
                match &id {
                    Some(explicit) => explicit.to_string(),
                    None => to_anchor(&plain),
                },
            );
            headings.push((slug.clone(), heading_depth(level)));

            out.push(MdEvent::Start(MdTag::Heading {
                level,
                id: Some(CowStr::from(slug.clone())),
                classes,
                attrs,
            }));
            if self.toc.anchorlink {
                out.push(MdEvent::InlineHtml(CowStr::from(format!(
                    "<a class=\"toclink\" href=\"#{slug}\">"
                ))));
            }
            out.extend(body);
            if self.toc.anchorlink {
                out.push(MdEvent::InlineHtml(CowStr::from("</a>")));
            }
            if let Some(symbol) = &self.toc.permalink {
                out.push(MdEvent::InlineHtml(CowStr::from(format!(
                    "<a class=\"headerlink\" href=\"#{slug}\" title=\"Permanent link\">{symbol}</a>"
                ))));
            }
            out.push(MdEvent::End(MdTagEnd::Heading(level)));
        }
        out
    }
}
