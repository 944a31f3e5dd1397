//! Site generation for mdsite.
//!
//! Walks a markdown source tree, renders every document, rewrites the
//! resulting HTML so it can be browsed on its own and publishes everything
//! into an in-memory [`ArtifactStore`].

pub mod assets;
pub mod builder;
pub mod dom;
pub mod rewriter;
pub mod store;
pub mod walker;

pub use assets::Stylesheet;
pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder};
pub use rewriter::{rewrite, RewriteContext, RewriteReport};
pub use store::{ArtifactStore, DirEntry, StoreError, StoreHandle};
pub use walker::{ExclusionSet, SourceEntry, SourceWalker, WalkError};
