//! Performance benchmarks for headline typesetting:
//! - Full-document rendering with anchor tree construction
//! - The per-page headline reconciliation pass
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use std::fmt::Write as _;

use typeset_core::{
    anchors::Page,
    config::{MarkdownConfig, TypesetConfig},
    reconcile::HeadlineReconciler,
    render::Renderer,
};

fn markdown_config() -> MarkdownConfig {
    MarkdownConfig {
        extensions: vec![
            "toc".to_string(),
            "tables".to_string(),
            "strikethrough".to_string(),
            "attr_list".to_string(),
        ],
        ..Default::default()
    }
}

/// Synthetic page: 200 sections with inline markup in the headings.
fn corpus() -> String {
    let mut source = String::new();
    for chapter in 0..20 {
        writeln!(source, "# Chapter {chapter}: *Overview*\n").unwrap();
        for section in 0..9 {
            writeln!(source, "## Section {chapter}.{section} with `code`\n").unwrap();
            writeln!(source, "Body paragraph for section {chapter}.{section}.\n").unwrap();
        }
    }
    source
}

fn bench_render_with_toc(c: &mut Criterion) {
    let renderer = Renderer::new(&markdown_config()).unwrap();
    let source = corpus();
    c.bench_function("render_with_toc", |b| {
        b.iter(|| renderer.render_with_toc(&source).unwrap())
    });
}

fn bench_headline_reconcile(c: &mut Criterion) {
    let config = markdown_config();
    let renderer = Renderer::new(&config).unwrap();
    let source = corpus();
    let (_, toc) = renderer.render_with_toc(&source).unwrap();

    c.bench_function("headline_reconcile", |b| {
        b.iter(|| {
            let mut page = Page {
                src_path: "bench.md".to_string(),
                markdown: source.clone(),
                toc: toc.clone(),
                ..Default::default()
            };
            let mut reconciler =
                HeadlineReconciler::new(TypesetConfig::default(), &config).unwrap();
            reconciler.on_pre_page(&page);
            reconciler.on_page_content(&mut page).unwrap();
            page
        })
    });
}

criterion_group!(benches, bench_render_with_toc, bench_headline_reconcile);
criterion_main!(benches);
