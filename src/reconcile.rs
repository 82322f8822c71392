//! Headline reconciliation: re-renders a page's heading lines and attaches
//! the markup-preserving result to its table-of-contents anchors.
//!
//! The default title extraction flattens headings to plain text. This stage
//! runs the heading lines through a second, restricted render pass, recovers
//! an (id, title, level) triple for each rendered heading and writes the
//! rich title back onto the matching anchor. A page whose title was not
//! explicitly set by configuration or front-matter metadata additionally
//! gets its first top-level headline promoted to the displayed title.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    anchors::{flatten, Page, Typeset},
    config::{MarkdownConfig, TypesetConfig},
    error::TypesetError,
    render::Renderer,
};

/// Which upstream mechanism already supplied an authoritative page title.
/// An existing record suppresses automatic headline promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleSource {
    /// Explicit per-page title in the build configuration.
    Config,
    /// `title` key in the page's front-matter metadata.
    Meta,
}

/// Extracts the anchor id, inner content and level of each rendered
/// headline. Non-greedy, so the content stops at the first close tag;
/// tolerates attributes between the id and the tag end.
static HEADLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?im)id="([^"]+).*?>(.*?)</h(\d)"#).unwrap());

/// Strips markup tags for the plain-text displayed title.
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Per-build headline reconciliation state: the restricted headline
/// renderer plus the title-source record for every page seen so far.
///
/// The host pipeline processes pages sequentially; one page's
/// [`on_pre_page`](HeadlineReconciler::on_pre_page) and
/// [`on_page_content`](HeadlineReconciler::on_page_content) must both
/// complete before another page's begin.
#[derive(Debug, Clone)]
pub struct HeadlineReconciler {
    config: TypesetConfig,
    renderer: Option<Renderer>,
    title_map: BTreeMap<String, TitleSource>,
}

impl HeadlineReconciler {
    /// Set up per-build state. The headline renderer reuses the host's
    /// markdown configuration with anchor and permalink decorations forced
    /// off. No state is initialized when the stage is disabled.
    pub fn new(config: TypesetConfig, markdown: &MarkdownConfig) -> Result<Self, TypesetError> {
        let renderer = match config.enabled {
            true => Some(Renderer::for_headlines(markdown)?),
            false => None,
        };
        Ok(HeadlineReconciler {
            config,
            renderer,
            title_map: BTreeMap::new(),
        })
    }

    /// Record the provenance of a configuration-assigned page title before
    /// the page is otherwise processed. First write wins per page path.
    pub fn on_pre_page(&mut self, page: &Page) {
        if !self.config.enabled {
            return;
        }
        if page.title.is_some() {
            tracing::debug!("page '{}' has a configured title", page.src_path);
            self.title_map
                .entry(page.src_path.clone())
                .or_insert(TitleSource::Config);
        }
    }

    /// Re-render the page's heading lines and attach their typeset form to
    /// the anchor tree. Runs once per page, after its anchor tree is built.
    ///
    /// A rendered headline whose id has no anchor in the tree is skipped:
    /// the heading-only re-render may diverge from the full render's anchor
    /// set, and under-attaching is acceptable degradation.
    pub fn on_page_content(&mut self, page: &mut Page) -> Result<(), TypesetError> {
        let Some(renderer) = self.renderer.as_ref() else {
            return Ok(());
        };

        // Re-render headline lines only, joined into one fragment.
        let headlines = page
            .markdown
            .lines()
            .filter(|line| line.starts_with('#'))
            .collect::<Vec<&str>>()
            .join("\n");
        let html = renderer.render(&headlines)?;
        tracing::trace!("re-rendered headlines for '{}':\n{html}", page.src_path);

        // A metadata title also suppresses promotion. Checked before the
        // per-headline loop so it gates the whole pass for this page.
        if !self.title_map.contains_key(&page.src_path) && page.meta.contains_key("title") {
            tracing::debug!("page '{}' has a metadata title", page.src_path);
            self.title_map
                .insert(page.src_path.clone(), TitleSource::Meta);
        }
        let promotable = !self.title_map.contains_key(&page.src_path);

        let mut anchors = flatten(&mut page.toc);
        for captures in HEADLINE.captures_iter(&html) {
            let (_, [id, title, level]) = captures.extract();
            let Some(slot) = anchors.get_mut(id) else {
                tracing::debug!(
                    "headline '{id}' has no anchor in '{}', skipping",
                    page.src_path
                );
                continue;
            };
            let typeset = Typeset {
                title: title.to_string(),
            };
            **slot = Some(typeset.clone());

            // The first top-level headline becomes the page title, unless
            // an explicit title source already won.
            if promotable && page.typeset.is_none() && level == "1" {
                page.title = Some(TAG.replace_all(title, "").into_owned());
                page.typeset = Some(typeset);
            }
        }
        Ok(())
    }

    /// Title-source record for a page path, if any. Exposed for hosts that
    /// template differently depending on where the title came from.
    pub fn title_source(&self, src_path: &str) -> Option<TitleSource> {
        self.title_map.get(src_path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::AnchorNode;

    fn markdown_config() -> MarkdownConfig {
        MarkdownConfig {
            extensions: vec!["toc".to_string(), "attr_list".to_string()],
            ..Default::default()
        }
    }

    fn reconciler() -> HeadlineReconciler {
        HeadlineReconciler::new(TypesetConfig::default(), &markdown_config()).unwrap()
    }

    /// Build a page whose anchor tree comes from the full render pass, the
    /// way the host pipeline hands pages over.
    fn page(src_path: &str, markdown: &str) -> Page {
        let renderer = Renderer::new(&markdown_config()).unwrap();
        let (_, toc) = renderer.render_with_toc(markdown).unwrap();
        Page {
            src_path: src_path.to_string(),
            markdown: markdown.to_string(),
            toc,
            ..Default::default()
        }
    }

    #[test]
    fn test_attaches_typeset_titles_to_anchors() {
        let mut page = page("docs/a.md", "# Alpha *fast*\n\nBody text.\n\n## Beta `code`\n");
        let mut reconciler = reconciler();
        reconciler.on_pre_page(&page);
        reconciler.on_page_content(&mut page).unwrap();

        assert_eq!(
            page.toc[0].typeset.as_ref().unwrap().title,
            "Alpha <em>fast</em>"
        );
        assert_eq!(
            page.toc[0].children[0].typeset.as_ref().unwrap().title,
            "Beta <code>code</code>"
        );
    }

    #[test]
    fn test_promotes_first_top_level_headline() {
        let mut page = page("docs/a.md", "# Alpha\n## Beta\n# Gamma\n");
        let mut reconciler = reconciler();
        reconciler.on_pre_page(&page);
        reconciler.on_page_content(&mut page).unwrap();

        assert_eq!(page.title.as_deref(), Some("Alpha"));
        assert_eq!(page.typeset.as_ref().unwrap().title, "Alpha");
        // All anchors still receive attachments, only the first level-1
        // headline is promoted.
        let ids: Vec<&str> = page
            .toc
            .iter()
            .map(|anchor| anchor.id.as_str())
            .collect();
        assert_eq!(ids, vec!["alpha", "gamma"]);
        assert!(page.toc.iter().all(|anchor| anchor.typeset.is_some()));
        assert!(page.toc[0].children[0].typeset.is_some());
    }

    #[test]
    fn test_promoted_title_is_plain_text() {
        let mut page = page("docs/a.md", "# Alpha *fast* `path`\n");
        let mut reconciler = reconciler();
        reconciler.on_page_content(&mut page).unwrap();
        assert_eq!(page.title.as_deref(), Some("Alpha fast path"));
        assert_eq!(
            page.typeset.as_ref().unwrap().title,
            "Alpha <em>fast</em> <code>path</code>"
        );
    }

    #[test]
    fn test_configured_title_suppresses_promotion() {
        let mut page = page("docs/a.md", "# Alpha\n");
        page.title = Some("Configured".to_string());
        let mut reconciler = reconciler();
        reconciler.on_pre_page(&page);
        reconciler.on_page_content(&mut page).unwrap();

        assert_eq!(page.title.as_deref(), Some("Configured"));
        assert!(page.typeset.is_none());
        assert_eq!(
            reconciler.title_source("docs/a.md"),
            Some(TitleSource::Config)
        );
        // Anchors still get their rich titles.
        assert!(page.toc[0].typeset.is_some());
    }

    #[test]
    fn test_metadata_title_suppresses_promotion() {
        let mut page = page("docs/a.md", "# Alpha\n");
        page.meta.insert(
            "title".to_string(),
            toml::Value::String("From meta".to_string()),
        );
        let mut reconciler = reconciler();
        reconciler.on_pre_page(&page);
        reconciler.on_page_content(&mut page).unwrap();

        assert!(page.title.is_none());
        assert!(page.typeset.is_none());
        assert_eq!(
            reconciler.title_source("docs/a.md"),
            Some(TitleSource::Meta)
        );
        assert!(page.toc[0].typeset.is_some());
    }

    #[test]
    fn test_config_wins_over_metadata() {
        let mut page = page("docs/a.md", "# Alpha\n");
        page.title = Some("Configured".to_string());
        page.meta.insert(
            "title".to_string(),
            toml::Value::String("From meta".to_string()),
        );
        let mut reconciler = reconciler();
        reconciler.on_pre_page(&page);
        reconciler.on_page_content(&mut page).unwrap();
        assert_eq!(
            reconciler.title_source("docs/a.md"),
            Some(TitleSource::Config)
        );
    }

    #[test]
    fn test_disabled_stage_is_a_no_op() {
        let config = TypesetConfig { enabled: false };
        let mut reconciler = HeadlineReconciler::new(config, &markdown_config()).unwrap();
        let mut page = page("docs/a.md", "# Alpha\n");
        let before = page.clone();
        reconciler.on_pre_page(&page);
        reconciler.on_page_content(&mut page).unwrap();
        assert_eq!(page, before);
        assert_eq!(reconciler.title_source("docs/a.md"), None);
    }

    #[test]
    fn test_unmatched_id_is_skipped() {
        let mut page = page("docs/a.md", "# Alpha\n");
        // Replace the tree with anchors that cannot match the re-render.
        page.toc = vec![AnchorNode::new("elsewhere", 1)];
        let mut reconciler = reconciler();
        reconciler.on_page_content(&mut page).unwrap();
        assert!(page.toc[0].typeset.is_none());
        // Promotion only applies to matched headlines.
        assert!(page.title.is_none());
        assert!(page.typeset.is_none());
    }

    #[test]
    fn test_idempotent_across_reruns() {
        let mut page = page("docs/a.md", "# Alpha *fast*\n## Beta\n");
        let mut reconciler = reconciler();
        reconciler.on_pre_page(&page);
        reconciler.on_page_content(&mut page).unwrap();
        let once = page.clone();
        reconciler.on_page_content(&mut page).unwrap();
        assert_eq!(page, once);
    }

    #[test]
    fn test_non_heading_lines_are_ignored() {
        let mut page = page(
            "docs/a.md",
            "Intro paragraph.\n\n# Alpha\n\ntext with # hash inside\n",
        );
        let mut reconciler = reconciler();
        reconciler.on_page_content(&mut page).unwrap();
        assert_eq!(page.toc.len(), 1);
        assert_eq!(page.title.as_deref(), Some("Alpha"));
    }
}
