//! Source and output path naming.

use std::borrow::Cow;

/// Extension of markdown sources.
pub const MARKUP_EXT: &str = ".md";

/// Extension of rendered documents.
pub const OUTPUT_EXT: &str = ".html";

/// Whether a source path names a markdown document.
pub fn is_markup_path(path: &str) -> bool {
    path.ends_with(MARKUP_EXT)
}

/// Map a source path to the path its rendered output is published under.
///
/// Only a trailing `.md` is substituted, so the mapping is idempotent and
/// asset paths pass through unchanged.
pub fn output_path(path: &str) -> String {
    match path.strip_suffix(MARKUP_EXT) {
        Some(stem) => format!("{stem}{OUTPUT_EXT}"),
        None => path.to_string(),
    }
}

/// Rewrite a link target that points at a markdown document.
///
/// A target qualifies only when it ends with `.md`, but every occurrence of
/// `.md` in a qualifying target is then replaced. `docs.md.d/guide.md`
/// therefore becomes `docs.html.d/guide.html`. Targets carrying a fragment or
/// query (`guide.md#intro`) do not end with the extension and are returned
/// untouched.
pub fn rewrite_link_target(target: &str) -> Cow<'_, str> {
    if target.ends_with(MARKUP_EXT) {
        Cow::Owned(target.replace(MARKUP_EXT, OUTPUT_EXT))
    } else {
        Cow::Borrowed(target)
    }
}
