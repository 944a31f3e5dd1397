//! Markdown conversion and naming rules for mdsite.
//!
//! This crate renders markdown sources to HTML fragments and owns the small,
//! pure naming functions the rest of the pipeline agrees on: heading slugs,
//! source-to-output path mapping and cross-document link rewriting.

pub mod convert;
pub mod paths;
pub mod slug;

pub use convert::{Converter, MarkdownConverter};
pub use paths::{is_markup_path, output_path, rewrite_link_target, MARKUP_EXT, OUTPUT_EXT};
pub use slug::slugify;
