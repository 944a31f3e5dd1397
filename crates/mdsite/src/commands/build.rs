//! In-memory build command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use mdsite_site::{ArtifactStore, BuildResult, SiteBuilder};

use crate::config::ConfigFile;

/// Build the site described by `config` into a fresh store.
pub fn build_site(
    config: &ConfigFile,
    root_dir: Option<PathBuf>,
) -> Result<(ArtifactStore, BuildResult)> {
    let build_config = config.build_config(root_dir);
    tracing::info!("Building site from {}", build_config.root_dir.display());

    let store = ArtifactStore::new();
    let result = SiteBuilder::new(build_config)
        .build(&store)
        .context("Build failed")?;

    tracing::info!(
        "Built {} documents with {} assets in {}ms",
        result.documents,
        result.assets,
        result.duration_ms
    );
    if result.skipped > 0 {
        tracing::warn!("Skipped {} documents that failed to parse", result.skipped);
    }

    Ok((store, result))
}

/// Run the build command: build, then list every artifact path.
pub fn run(config: &ConfigFile, root_dir: Option<PathBuf>) -> Result<()> {
    let (store, _) = build_site(config, root_dir)?;

    for path in store.paths() {
        println!("{}", path);
    }

    Ok(())
}
