//! # typeset-core
//!
//! Headline typesetting for static documentation builds.
//!
//! The default title extraction of a documentation pipeline flattens page
//! headings to plain text, losing inline markup (`*emphasis*`, `` `code` ``,
//! math, ...). This crate re-renders a page's heading lines through a
//! second, restricted pass of the markdown pipeline and attaches the
//! markup-preserving result to the page's table-of-contents anchors, so
//! navigation and headers can be typeset the way the author wrote them.
//!
//! ## Components
//!
//! - **[`render`]**: markdown-to-HTML rendering with stable heading anchors.
//!   [`render::Renderer::for_headlines`] builds the restricted variant used
//!   for headline re-rendering (toc anchor/permalink decorations off).
//! - **[`anchors`]**: the anchor tree ([`anchors::AnchorNode`]), the page
//!   record ([`anchors::Page`]) and the flat id index ([`anchors::flatten`]).
//! - **[`reconcile`]**: the per-build [`reconcile::HeadlineReconciler`] with
//!   its two page hooks, plus the title-source bookkeeping that keeps
//!   automatic title promotion from overriding configured or front-matter
//!   titles.
//! - **[`config`]**: the host build's markdown configuration and the
//!   administrative toggle.
//!
//! ## Quick Start
//!
//! ```rust
//! use typeset_core::{
//!     anchors::Page,
//!     config::{MarkdownConfig, TypesetConfig},
//!     reconcile::HeadlineReconciler,
//!     render::Renderer,
//! };
//!
//! fn main() -> Result<(), typeset_core::TypesetError> {
//!     let markdown = MarkdownConfig {
//!         extensions: vec!["toc".to_string(), "tables".to_string()],
//!         ..Default::default()
//!     };
//!
//!     // Full render pass: HTML body plus the anchor tree.
//!     let renderer = Renderer::new(&markdown)?;
//!     let source = "# Alpha *fast*\n\nBody.\n";
//!     let (_html, toc) = renderer.render_with_toc(source)?;
//!
//!     let mut page = Page {
//!         src_path: "docs/index.md".to_string(),
//!         markdown: source.to_string(),
//!         toc,
//!         ..Default::default()
//!     };
//!
//!     // Typeset pass: attach rich titles and promote the first headline.
//!     let mut reconciler = HeadlineReconciler::new(TypesetConfig::default(), &markdown)?;
//!     reconciler.on_pre_page(&page);
//!     reconciler.on_page_content(&mut page)?;
//!
//!     assert_eq!(page.title.as_deref(), Some("Alpha fast"));
//!     assert_eq!(
//!         page.toc[0].typeset.as_ref().unwrap().title,
//!         "Alpha <em>fast</em>"
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Host Contract
//!
//! The host pipeline owns page lifecycle and processes pages sequentially.
//! Per page it calls [`reconcile::HeadlineReconciler::on_pre_page`] while
//! the page still carries only its configuration-level title, then
//! [`reconcile::HeadlineReconciler::on_page_content`] once the anchor tree
//! is built. Rendering faults propagate unchanged; unmatched headlines and
//! unmatched anchor ids degrade silently (see [`reconcile`]).

pub mod anchors;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod render;

pub use error::*;
