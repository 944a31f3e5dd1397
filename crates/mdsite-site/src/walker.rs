//! Source discovery.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use mdsite_markup::is_markup_path;

/// Path prefixes skipped during discovery.
///
/// A file is skipped when the slash-separated path of its parent directory,
/// relative to the root, starts with one of the prefixes. The test is a
/// plain string prefix, so excluding `node_modules` also skips
/// `node_modules_old/`, while `docs/node_modules/` is only skipped by a
/// member such as `docs/node_modules` or `docs/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    prefixes: Vec<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(["node_modules"])
    }
}

impl ExclusionSet {
    /// Leading `./` and `/` are ignored; empty members are dropped.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .map(|p: String| {
                    p.trim_start_matches("./")
                        .trim_start_matches('/')
                        .to_string()
                })
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// An exclusion set that skips nothing.
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Whether files directly inside `dir`, a slash-separated path relative
    /// to the root, are skipped. Everything below such a directory starts
    /// with the same prefix, so the whole subtree is skipped with it.
    pub fn excludes(&self, dir: &str) -> bool {
        !dir.is_empty() && self.prefixes.iter().any(|p| dir.starts_with(p.as_str()))
    }
}

/// A file discovered under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Slash-separated path relative to the root.
    pub path: String,
    /// Location on disk.
    pub abs_path: PathBuf,
}

impl SourceEntry {
    /// Whether the entry is a markdown document.
    pub fn is_markup(&self) -> bool {
        is_markup_path(&self.path)
    }

    /// Slash-separated directory of the entry, empty at the root.
    pub fn dir(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }
}

/// Errors that stop a walk.
#[derive(Debug, thiserror::Error)]
#[error("Failed to walk {path}: {source}")]
pub struct WalkError {
    pub path: String,
    #[source]
    pub source: walkdir::Error,
}

/// Depth-first walk over the regular files of a source tree.
#[derive(Debug, Clone)]
pub struct SourceWalker {
    root: PathBuf,
    exclude: ExclusionSet,
}

impl SourceWalker {
    pub fn new(root: impl Into<PathBuf>, exclude: ExclusionSet) -> Self {
        Self {
            root: root.into(),
            exclude,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new walk.
    ///
    /// Entries come lazily in depth-first order with names sorted inside
    /// each directory. Every walk starts over from the root. An error is
    /// yielded for any entry that cannot be read; callers are expected to
    /// stop at the first one.
    pub fn walk(&self) -> impl Iterator<Item = Result<SourceEntry, WalkError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.prunes(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(self.source_entry(&entry))),
                Ok(_) => None,
                Err(source) => Some(Err(WalkError {
                    path: source
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string()),
                    source,
                })),
            })
    }

    fn prunes(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self.exclude.excludes(&self.relative_path(entry))
    }

    /// Slash-separated path of an entry relative to the root.
    fn relative_path(&self, entry: &DirEntry) -> String {
        let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn source_entry(&self, entry: &DirEntry) -> SourceEntry {
        SourceEntry {
            path: self.relative_path(entry),
            abs_path: entry.path().to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn walk_paths(walker: &SourceWalker) -> Vec<String> {
        walker.walk().map(|e| e.unwrap().path).collect()
    }

    #[test]
    fn walks_depth_first_sorted() {
        let temp = tempdir().unwrap();
        for rel in ["b.md", "a/z.md", "a/img/x.png", "a/b.md", "c/d/e.md"] {
            touch(temp.path(), rel);
        }

        let walker = SourceWalker::new(temp.path(), ExclusionSet::empty());
        assert_eq!(
            walk_paths(&walker),
            vec!["a/b.md", "a/img/x.png", "a/z.md", "b.md", "c/d/e.md"]
        );
    }

    #[test]
    fn walk_is_restartable() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "one.md");

        let walker = SourceWalker::new(temp.path(), ExclusionSet::empty());
        assert_eq!(walk_paths(&walker), walk_paths(&walker));
    }

    #[test]
    fn prunes_excluded_directories() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "readme.md");
        touch(temp.path(), "node_modules/pkg/readme.md");
        touch(temp.path(), "node_modules_old/notes.md");
        touch(temp.path(), "docs/node_modules/x.md");
        touch(temp.path(), "docs/guide.md");

        let walker = SourceWalker::new(temp.path(), ExclusionSet::default());
        assert_eq!(
            walk_paths(&walker),
            vec!["docs/guide.md", "docs/node_modules/x.md", "readme.md"]
        );
    }

    #[test]
    fn prunes_nested_path_members() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "docs/node_modules/x.md");
        touch(temp.path(), "docs/drafts/wip.md");
        touch(temp.path(), "docs/drafts/old/older.md");
        touch(temp.path(), "docs/ok.md");
        touch(temp.path(), "drafts/top.md");

        let walker = SourceWalker::new(
            temp.path(),
            ExclusionSet::new(["node_modules", "docs/drafts"]),
        );
        assert_eq!(
            walk_paths(&walker),
            vec!["docs/node_modules/x.md", "docs/ok.md", "drafts/top.md"]
        );
    }

    #[test]
    fn excluded_file_names_are_still_walked() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "node_modules.md");

        let walker = SourceWalker::new(temp.path(), ExclusionSet::default());
        assert_eq!(walk_paths(&walker), vec!["node_modules.md"]);
    }

    #[test]
    fn root_named_like_exclusion_is_walked() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("node_modules");
        touch(&root, "a.md");

        let walker = SourceWalker::new(&root, ExclusionSet::default());
        assert_eq!(walk_paths(&walker), vec!["a.md"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();
        let walker = SourceWalker::new(temp.path().join("missing"), ExclusionSet::empty());

        let first = walker.walk().next().expect("an error entry");
        assert!(first.is_err());
    }

    #[test]
    fn exclusion_prefix_test_on_directories() {
        let set = ExclusionSet::new(["node_modules", "./docs/vendor", ""]);

        assert!(set.excludes("node_modules"));
        assert!(set.excludes("node_modules/pkg"));
        assert!(set.excludes("node_modules_old"));
        assert!(set.excludes("docs/vendor/lib"));
        assert!(!set.excludes("docs/node_modules"));
        assert!(!set.excludes("docs"));
        assert!(!set.excludes(""));
        assert_eq!(set, ExclusionSet::new(["node_modules", "docs/vendor"]));
    }

    #[test]
    fn entry_helpers() {
        let entry = SourceEntry {
            path: "docs/readme.md".to_string(),
            abs_path: PathBuf::from("/src/docs/readme.md"),
        };
        assert!(entry.is_markup());
        assert_eq!(entry.dir(), "docs");

        let top = SourceEntry {
            path: "logo.png".to_string(),
            abs_path: PathBuf::from("/src/logo.png"),
        };
        assert!(!top.is_markup());
        assert_eq!(top.dir(), "");
    }
}
