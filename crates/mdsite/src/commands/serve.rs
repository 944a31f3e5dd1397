//! Build-then-serve command.

use anyhow::{Context, Result};
use mdsite_server::Publisher;

use super::build::build_site;
use crate::config::{ConfigFile, ServeOverrides};

/// Run the serve command.
///
/// The whole tree is built before the listener starts, so every request
/// sees the finished store.
pub async fn run(config: &ConfigFile, overrides: ServeOverrides) -> Result<()> {
    let publisher_config = config.publisher_config(&overrides);
    let (store, _) = build_site(config, overrides.root_dir)?;

    Publisher::new(publisher_config, store.serve_root())
        .serve()
        .await
        .context("Server failed")?;

    Ok(())
}
