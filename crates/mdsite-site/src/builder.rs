//! Site builder.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use mdsite_markup::{output_path, Converter, MarkdownConverter};

use crate::assets::Stylesheet;
use crate::dom::parse_document;
use crate::rewriter::{rewrite, RewriteContext};
use crate::store::{ArtifactStore, StoreError};
use crate::walker::{ExclusionSet, SourceEntry, SourceWalker, WalkError};

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the markdown source tree
    pub root_dir: PathBuf,

    /// Directory-name prefixes to skip
    pub exclude: ExclusionSet,

    /// Minify the injected stylesheet
    pub minify_css: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            exclude: ExclusionSet::default(),
            minify_css: false,
        }
    }
}

/// Result of a build operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Number of documents published
    pub documents: usize,

    /// Number of local assets copied into the store
    pub assets: usize,

    /// Number of documents skipped because they failed to parse
    pub skipped: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Cannot read root directory {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path} to the artifact store: {source}")]
    Store {
        path: String,
        #[source]
        source: StoreError,
    },
}

/// Builds a site from a markdown source tree into an [`ArtifactStore`].
pub struct SiteBuilder<C = MarkdownConverter> {
    config: BuildConfig,
    converter: C,
    stylesheet: Stylesheet,
}

impl SiteBuilder<MarkdownConverter> {
    /// Create a builder using the default markdown converter.
    pub fn new(config: BuildConfig) -> Self {
        Self::with_converter(config, MarkdownConverter::new())
    }
}

impl<C: Converter> SiteBuilder<C> {
    /// Create a builder with a custom converter.
    pub fn with_converter(config: BuildConfig, converter: C) -> Self {
        let stylesheet = Stylesheet::new(config.minify_css);
        Self {
            config,
            converter,
            stylesheet,
        }
    }

    /// Replace the injected stylesheet.
    pub fn stylesheet(mut self, stylesheet: Stylesheet) -> Self {
        self.stylesheet = stylesheet;
        self
    }

    /// Build the site into `store`.
    ///
    /// Documents are processed one after another in walk order. A document
    /// that fails to parse is logged and skipped. Any other failure aborts
    /// the build; files written before it stay in the store.
    pub fn build(&self, store: &ArtifactStore) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let root = &self.config.root_dir;

        fs::read_dir(root).map_err(|source| BuildError::Root {
            path: root.clone(),
            source,
        })?;

        let walker = SourceWalker::new(root, self.config.exclude.clone());
        let mut result = BuildResult::default();

        for entry in walker.walk() {
            let entry = entry?;
            if !entry.is_markup() {
                continue;
            }

            match self.build_document(&entry, store)? {
                Some(assets) => {
                    result.documents += 1;
                    result.assets += assets;
                }
                None => result.skipped += 1,
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Convert, rewrite and store one document. Returns the number of assets
    /// copied, or `None` when the document was skipped.
    fn build_document(
        &self,
        entry: &SourceEntry,
        store: &ArtifactStore,
    ) -> Result<Option<usize>, BuildError> {
        let store_err = |path: &str| {
            let path = path.to_string();
            move |source| BuildError::Store { path, source }
        };

        let source = fs::read(&entry.abs_path).map_err(|source| BuildError::Read {
            path: entry.abs_path.clone(),
            source,
        })?;

        let html = self.converter.render(&source);
        let mut doc = match parse_document(&html) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.path, e);
                return Ok(None);
            }
        };

        store
            .ensure_container(entry.dir())
            .map_err(store_err(entry.dir()))?;

        let ctx = RewriteContext {
            source_path: &entry.path,
            source_root: &self.config.root_dir,
            store,
            stylesheet: &self.stylesheet,
        };
        let report = rewrite(&mut doc, &ctx).map_err(store_err(&entry.path))?;

        let output = output_path(&entry.path);
        store
            .write(&output, doc.to_bytes())
            .map_err(store_err(&output))?;

        tracing::debug!(
            "Rendered {} -> {} ({} headings, {} links, {} assets)",
            entry.path,
            output,
            report.headings,
            report.links_rewritten,
            report.assets_copied
        );

        Ok(Some(report.assets_copied))
    }
}
