//! Handler for `graft resolve`.

use std::path::Path;

use miette::Result;

pub fn exec(manifest: &Path, config: Option<&Path>) -> Result<()> {
    graft_util::status::status("Resolving", &manifest.display().to_string());
    graft_ops::ops_resolve::resolve(manifest, config)
}
