//! Document rewriting.
//!
//! One pre-order pass over a parsed document makes it self-contained once it
//! is published from the artifact store:
//!
//! 1. the stylesheet is appended to the first `<head>`,
//! 2. `<body>` gets the content class the stylesheet is scoped to,
//! 3. headings get an `id` derived from their text,
//! 4. links to markdown sources are pointed at the rendered documents,
//! 5. link `target`s are forced to `_self`,
//! 6. local images are copied from the source tree into the store.
//!
//! The node order is fixed before the pass starts, so nodes injected along
//! the way are not visited and attribute edits never change what comes next.

use std::fs;
use std::path::Path;

use mdsite_markup::{rewrite_link_target, slugify};
use percent_encoding::percent_decode_str;

use crate::assets::{Stylesheet, CONTENT_CLASS};
use crate::dom::{Document, NodeId};
use crate::store::{ArtifactStore, StoreError};

/// Rewrite rule selected by an element's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Head,
    Body,
    Heading,
    Anchor,
    Image,
}

impl Rule {
    fn for_tag(tag: &str) -> Option<Self> {
        match tag {
            "head" => Some(Rule::Head),
            "body" => Some(Rule::Body),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(Rule::Heading),
            "a" => Some(Rule::Anchor),
            "img" => Some(Rule::Image),
            _ => None,
        }
    }
}

/// Per-document inputs of the rewrite pass.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Slash-separated source path of the document being rewritten.
    pub source_path: &'a str,
    /// Root directory local assets are read from.
    pub source_root: &'a Path,
    /// Destination for relocated assets.
    pub store: &'a ArtifactStore,
    /// Stylesheet appended to the document head.
    pub stylesheet: &'a Stylesheet,
}

impl RewriteContext<'_> {
    /// Directory of the document, empty at the root.
    fn document_dir(&self) -> &str {
        self.source_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }
}

/// What a rewrite pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub style_injected: bool,
    pub headings: usize,
    pub links_rewritten: usize,
    pub assets_copied: usize,
    pub assets_skipped: usize,
}

/// Rewrite `doc` in place.
///
/// Unreadable local assets are logged and skipped. Only a failing store
/// write is returned as an error.
pub fn rewrite(doc: &mut Document, ctx: &RewriteContext<'_>) -> Result<RewriteReport, StoreError> {
    let mut report = RewriteReport::default();

    for id in doc.descendants(doc.root()) {
        let Some(rule) = doc.tag_name(id).and_then(Rule::for_tag) else {
            continue;
        };

        match rule {
            Rule::Head => {
                if !report.style_injected {
                    inject_style(doc, id, ctx.stylesheet);
                    report.style_injected = true;
                }
            }
            Rule::Body => mark_body(doc, id),
            Rule::Heading => {
                if identify_heading(doc, id) {
                    report.headings += 1;
                }
            }
            Rule::Anchor => rewrite_anchor(doc, id, &mut report),
            Rule::Image => relocate_image(doc, id, ctx, &mut report)?,
        }
    }

    Ok(report)
}

fn inject_style(doc: &mut Document, head: NodeId, stylesheet: &Stylesheet) {
    let style = doc.create_html_element("style");
    doc.append_text(style, stylesheet.css());
    doc.append(head, style);
}

fn mark_body(doc: &mut Document, body: NodeId) {
    let class = match doc.attr(body, "class") {
        Some(existing) if existing.split_whitespace().any(|c| c == CONTENT_CLASS) => return,
        Some(existing) if !existing.trim().is_empty() => format!("{existing} {CONTENT_CLASS}"),
        _ => CONTENT_CLASS.to_string(),
    };
    doc.set_attr(body, "class", class);
}

/// Attach an `id` derived from the heading's first text child.
///
/// Not every heading gets one: an empty `id` attribute is never written, so a
/// heading without a direct text child, or whose text slugs to nothing (for
/// example `!!!`), keeps its attributes unchanged and `false` is returned.
fn identify_heading(doc: &mut Document, heading: NodeId) -> bool {
    let Some(text) = doc.first_text_child(heading) else {
        return false;
    };

    let slug = slugify(text);
    if slug.is_empty() {
        return false;
    }
    doc.set_attr(heading, "id", slug)
}

fn rewrite_anchor(doc: &mut Document, anchor: NodeId, report: &mut RewriteReport) {
    if let Some(href) = doc.attr(anchor, "href") {
        let rewritten = rewrite_link_target(href);
        if rewritten != href {
            let rewritten = rewritten.into_owned();
            doc.set_attr(anchor, "href", rewritten);
            report.links_rewritten += 1;
        }
    }

    if doc.attr(anchor, "target").is_some() {
        doc.set_attr(anchor, "target", "_self");
    }
}

fn relocate_image(
    doc: &mut Document,
    image: NodeId,
    ctx: &RewriteContext<'_>,
    report: &mut RewriteReport,
) -> Result<(), StoreError> {
    let Some(src) = doc.attr(image, "src") else {
        return Ok(());
    };

    let stripped = strip_query(src).to_string();
    if stripped != src {
        doc.set_attr(image, "src", stripped.as_str());
    }

    if stripped.is_empty() || is_remote(&stripped) {
        return Ok(());
    }

    // The converter percent-encodes `src`; files on disk use the plain name.
    let Ok(reference) = percent_decode_str(&stripped).decode_utf8() else {
        tracing::warn!(
            "Skipping image {} in {}: it does not decode to UTF-8",
            stripped,
            ctx.source_path
        );
        report.assets_skipped += 1;
        return Ok(());
    };

    let Some(asset_path) = resolve(ctx.document_dir(), &reference) else {
        tracing::warn!(
            "Skipping image {} in {}: it points outside the source root",
            stripped,
            ctx.source_path
        );
        report.assets_skipped += 1;
        return Ok(());
    };

    match fs::read(ctx.source_root.join(&asset_path)) {
        Ok(bytes) => {
            ctx.store.write(&asset_path, bytes)?;
            tracing::debug!("Copied asset {}", asset_path);
            report.assets_copied += 1;
        }
        Err(e) => {
            tracing::warn!(
                "Skipping image {} in {}: {}",
                asset_path,
                ctx.source_path,
                e
            );
            report.assets_skipped += 1;
        }
    }

    Ok(())
}

/// The part of a reference before the first `?`.
pub fn strip_query(reference: &str) -> &str {
    reference.split('?').next().unwrap_or(reference)
}

/// Whether a reference points off the local source tree.
pub fn is_remote(reference: &str) -> bool {
    const SCHEMES: [&str; 4] = ["http://", "https://", "//", "data:"];
    let lower = reference.to_ascii_lowercase();
    SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Resolve `reference` against a document directory into a root-relative
/// source path. Leading `/` anchors at the root. Returns `None` when `..`
/// would leave the root or nothing is left to name a file.
pub fn resolve(dir: &str, reference: &str) -> Option<String> {
    let base = if reference.starts_with('/') { "" } else { dir };

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(reference.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct Fixture {
        store: ArtifactStore,
        stylesheet: Stylesheet,
        root: PathBuf,
    }

    impl Fixture {
        fn new(root: &Path) -> Self {
            Self {
                store: ArtifactStore::new(),
                stylesheet: Stylesheet::from_css(".body{color:red}"),
                root: root.to_path_buf(),
            }
        }

        fn run(&self, source_path: &str, html: &str) -> (Document, RewriteReport) {
            let mut doc = parse_document(html.as_bytes()).unwrap();
            let ctx = RewriteContext {
                source_path,
                source_root: &self.root,
                store: &self.store,
                stylesheet: &self.stylesheet,
            };
            let report = rewrite(&mut doc, &ctx).unwrap();
            (doc, report)
        }
    }

    fn no_root() -> Fixture {
        Fixture::new(Path::new("/nonexistent-mdsite-root"))
    }

    #[test]
    fn injects_style_into_head_once() {
        let fx = no_root();
        let (doc, report) = fx.run("a.md", "<p>x</p>");

        assert!(report.style_injected);
        let html = doc.to_html();
        assert_eq!(html.matches("<style>").count(), 1);
        assert!(html.contains("<head><style>.body{color:red}</style></head>"));
    }

    #[test]
    fn style_injection_without_head_is_a_no_op() {
        let fx = no_root();
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_html_element("p");
        doc.append(root, p);

        let ctx = RewriteContext {
            source_path: "a.md",
            source_root: &fx.root,
            store: &fx.store,
            stylesheet: &fx.stylesheet,
        };
        let report = rewrite(&mut doc, &ctx).unwrap();

        assert!(!report.style_injected);
        assert_eq!(doc.to_html(), "<p></p>");
    }

    #[test]
    fn marks_body() {
        let fx = no_root();
        let (doc, _) = fx.run("a.md", "<p>x</p>");
        let body = doc.find_first("body").unwrap();
        assert_eq!(doc.attr(body, "class"), Some("body"));
    }

    #[test]
    fn body_marking_keeps_existing_classes() {
        let fx = no_root();
        let (doc, _) = fx.run("a.md", r#"<body class="dark"><p>x</p></body>"#);
        let body = doc.find_first("body").unwrap();
        assert_eq!(doc.attr(body, "class"), Some("dark body"));
    }

    #[test]
    fn headings_get_ids() {
        let fx = no_root();
        let (doc, report) = fx.run(
            "a.md",
            "<h1>Hello, World!</h1><h2>A  B</h2><h6>Last one</h6><h3>Hello, World!</h3>",
        );

        let ids: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|id| doc.attr(id, "id"))
            .collect();
        assert_eq!(ids, vec!["hello-world", "a--b", "last-one", "hello-world"]);
        assert_eq!(report.headings, 4);
    }

    #[test]
    fn heading_slug_uses_first_text_child() {
        let fx = no_root();
        let (doc, _) = fx.run("a.md", "<h2><code>fn</code> Usage notes</h2>");
        let h2 = doc.find_first("h2").unwrap();
        assert_eq!(doc.attr(h2, "id"), Some("-usage-notes"));
    }

    #[test]
    fn heading_without_text_gets_no_id() {
        let fx = no_root();
        let (doc, report) = fx.run("a.md", "<h2><em>only</em></h2><h3>!!!</h3>");
        assert_eq!(doc.attr(doc.find_first("h2").unwrap(), "id"), None);
        assert_eq!(doc.attr(doc.find_first("h3").unwrap(), "id"), None);
        assert_eq!(report.headings, 0);
    }

    #[test]
    fn rewrites_markdown_links() {
        let fx = no_root();
        let (doc, report) = fx.run(
            "a.md",
            r#"<a href="guide.md">g</a><a href="guide.md#section">s</a><a href="notes.md.d/x.md">n</a>"#,
        );

        let hrefs: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|id| doc.attr(id, "href"))
            .collect();
        assert_eq!(
            hrefs,
            vec!["guide.html", "guide.md#section", "notes.html.d/x.html"]
        );
        assert_eq!(report.links_rewritten, 2);
    }

    #[test]
    fn forces_same_window_targets() {
        let fx = no_root();
        let (doc, _) = fx.run(
            "a.md",
            r#"<a href="https://example.com" target="_blank">x</a><a href="b.md">y</a>"#,
        );

        let targets: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|&id| doc.tag_name(id) == Some("a"))
            .map(|id| doc.attr(id, "target"))
            .collect();
        assert_eq!(targets, vec![Some("_self"), None]);
    }

    #[test]
    fn relocates_local_images() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/diagram.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let fx = Fixture::new(temp.path());
        let (doc, report) = fx.run("docs/readme.md", r#"<img src="diagram.png?v=2">"#);

        let img = doc.find_first("img").unwrap();
        assert_eq!(doc.attr(img, "src"), Some("diagram.png"));
        assert_eq!(
            fx.store.read("docs/diagram.png").as_deref(),
            Some(&[0x89, b'P', b'N', b'G'][..])
        );
        assert_eq!(report.assets_copied, 1);
    }

    #[test]
    fn relocates_percent_encoded_names() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("caf\u{e9}.png"), "c").unwrap();
        fs::write(temp.path().join("my pic.png"), "s").unwrap();

        let fx = Fixture::new(temp.path());
        let (doc, report) = fx.run(
            "a.md",
            r#"<img src="caf%C3%A9.png"><img src="my%20pic.png?x=1">"#,
        );

        assert_eq!(report.assets_copied, 2);
        assert_eq!(
            fx.store.paths(),
            vec!["caf\u{e9}.png".to_string(), "my pic.png".to_string()]
        );
        let srcs: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|id| doc.attr(id, "src"))
            .collect();
        assert_eq!(srcs, vec!["caf%C3%A9.png", "my%20pic.png"]);
    }

    #[test]
    fn undecodable_references_are_skipped() {
        let temp = tempdir().unwrap();
        let fx = Fixture::new(temp.path());
        let (_, report) = fx.run("a.md", r#"<img src="bad%FF.png">"#);

        assert_eq!(report.assets_skipped, 1);
        assert!(fx.store.is_empty());
    }

    #[test]
    fn resolves_parent_and_root_references() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("img")).unwrap();
        fs::write(temp.path().join("img/logo.svg"), "<svg/>").unwrap();

        let fx = Fixture::new(temp.path());
        fx.run(
            "docs/guide/intro.md",
            r#"<img src="../../img/logo.svg"><img src="/img/logo.svg">"#,
        );

        assert_eq!(fx.store.paths(), vec!["img/logo.svg".to_string()]);
    }

    #[test]
    fn remote_images_are_untouched() {
        let fx = no_root();
        let (doc, report) = fx.run(
            "a.md",
            r#"<img src="https://example.com/x.png?size=large"><img src="data:image/png;base64,AA">"#,
        );

        let img = doc.find_first("img").unwrap();
        assert_eq!(doc.attr(img, "src"), Some("https://example.com/x.png"));
        assert!(fx.store.is_empty());
        assert_eq!(report.assets_copied + report.assets_skipped, 0);
    }

    #[test]
    fn missing_assets_are_skipped() {
        let temp = tempdir().unwrap();
        let fx = Fixture::new(temp.path());
        let (doc, report) = fx.run("a.md", r#"<img src="missing.png"><h1>Still here</h1>"#);

        assert_eq!(report.assets_skipped, 1);
        assert!(fx.store.is_empty());
        let h1 = doc.find_first("h1").unwrap();
        assert_eq!(doc.attr(h1, "id"), Some("still-here"));
    }

    #[test]
    fn escaping_references_are_skipped() {
        let temp = tempdir().unwrap();
        let fx = Fixture::new(temp.path());
        let (_, report) = fx.run("a.md", r#"<img src="../../etc/passwd">"#);

        assert_eq!(report.assets_skipped, 1);
        assert!(fx.store.is_empty());
    }

    #[test]
    fn store_conflicts_are_errors() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("pic.png"), "x").unwrap();

        let fx = Fixture::new(temp.path());
        fx.store.ensure_container("pic.png").unwrap();

        let mut doc = parse_document(br#"<img src="pic.png">"#).unwrap();
        let ctx = RewriteContext {
            source_path: "a.md",
            source_root: &fx.root,
            store: &fx.store,
            stylesheet: &fx.stylesheet,
        };
        assert!(matches!(
            rewrite(&mut doc, &ctx),
            Err(StoreError::IsADirectory(_))
        ));
    }

    #[test]
    fn helpers() {
        assert_eq!(strip_query("a.png?v=1?x"), "a.png");
        assert_eq!(strip_query("a.png"), "a.png");
        assert!(is_remote("HTTPS://example.com/a.png"));
        assert!(is_remote("//cdn.example.com/a.png"));
        assert!(!is_remote("http-diagram.png"));
        assert_eq!(resolve("docs", "./a/../b.png").as_deref(), Some("docs/b.png"));
        assert_eq!(resolve("docs", "/b.png").as_deref(), Some("b.png"));
        assert_eq!(resolve("", "../b.png"), None);
        assert_eq!(resolve("docs", ".."), None);
    }
}
